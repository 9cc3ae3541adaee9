// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Translation of type-checked Solidity contracts to Boogie.
//!
//! - context: state shared across one translation run
//! - type_mapper, names, arithmetic: types, names and integer operations in Boogie
//! - translation: the conversion of contracts, statements and expressions
//! - helpers: prelude declarations and the ether transfer procedures
//! - generator: entry points driving translation and verification
//! - boogie_backend: running boogie and reading back its results

pub mod arithmetic;
pub mod boogie_backend;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod names;
pub mod options;
pub mod translation;
pub mod type_mapper;

pub use context::BoogieContext;
pub use diagnostics::{DiagnosticKind, Diagnostics, SourceFiles, TranslationDiagnostic};
pub use error::TranslationError;
pub use generator::{translate, TranslationOutput};
pub use options::{BoogieOptions, Encoding};
pub use translation::{DocTagResolver, EmbeddedDocTags};

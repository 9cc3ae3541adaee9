// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Interaction with the boogie executable
//!
//! - runner: process execution with a hard timeout
//! - boogie_wrapper: boogie invocation and mapping of its errors to Solidity locations

pub mod boogie_wrapper;
pub mod runner;

// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use solidity_ast::SourceLocation;
use thiserror::Error;

/// Errors that abort a translation run.
///
/// Both variants mean an assumption about the upstream AST does not hold, so the partial output
/// cannot be trusted at all. Constructs that are merely unsupported are reported through
/// [`crate::diagnostics::Diagnostics`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("{loc}: internal invariant violated: {message}")]
    InternalInvariantViolation { loc: SourceLocation, message: String },

    #[error("{loc}: `{builtin}` expects {expected} argument(s), found {found}")]
    StructuralArityError {
        loc: SourceLocation,
        builtin: String,
        expected: &'static str,
        found: usize,
    },
}

impl TranslationError {
    pub fn invariant(loc: &SourceLocation, message: impl Into<String>) -> Self {
        TranslationError::InternalInvariantViolation {
            loc: loc.clone(),
            message: message.into(),
        }
    }

    pub fn arity(
        loc: &SourceLocation,
        builtin: impl Into<String>,
        expected: &'static str,
        found: usize,
    ) -> Self {
        TranslationError::StructuralArityError {
            loc: loc.clone(),
            builtin: builtin.into(),
            expected,
            found,
        }
    }
}

pub type Result<T, E = TranslationError> = std::result::Result<T, E>;

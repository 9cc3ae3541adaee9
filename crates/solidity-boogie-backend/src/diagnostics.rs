// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Sink for recoverable translation errors and warnings.
//!
//! A construct without a Boogie encoding does not stop the translation. It is recorded here with
//! its source location and the translator carries on with a sentinel, so that one run reports
//! as many problems as possible. Any error entry means the produced program must not be used
//! for verification.

use codespan_reporting::{
    diagnostic::{Diagnostic, Label, Severity},
    files::SimpleFiles,
    term::{self, termcolor::WriteColor},
};
use log::{debug, warn};
use solidity_ast::SourceLocation;
use std::{collections::BTreeMap, fmt, io::Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The construct has no encoding
    UnsupportedConstruct,
    /// The type has no Boogie representation
    TypeMapping,
    /// Reported by the prover on the generated program
    Verification,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationDiagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub loc: SourceLocation,
    pub message: String,
}

impl fmt::Display for TranslationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.loc,
            severity_name(self.severity),
            self.message
        )
    }
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Bug => "bug",
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Note => "note",
        Severity::Help => "help",
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<TranslationDiagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, kind: DiagnosticKind, loc: &SourceLocation, message: impl Into<String>) {
        let message = message.into();
        debug!("{}: error: {}", loc, message);
        self.push(TranslationDiagnostic {
            severity: Severity::Error,
            kind,
            loc: loc.clone(),
            message,
        });
    }

    pub fn warning(&mut self, loc: &SourceLocation, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {}", loc, message);
        self.push(TranslationDiagnostic {
            severity: Severity::Warning,
            kind: DiagnosticKind::Note,
            loc: loc.clone(),
            message,
        });
    }

    pub fn push(&mut self, diagnostic: TranslationDiagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[TranslationDiagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity >= Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Errors of the given kind, in reporting order
    pub fn errors_of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &TranslationDiagnostic> {
        self.entries
            .iter()
            .filter(move |d| d.kind == kind && d.severity >= Severity::Error)
    }

    /// Writes all entries at or above `min_severity`. Entries whose file is known to `sources`
    /// are rendered with a source snippet, the rest as plain `file:line:col` lines.
    pub fn render<W: WriteColor>(
        &self,
        writer: &mut W,
        sources: &SourceFiles,
        min_severity: Severity,
    ) -> anyhow::Result<()> {
        let config = term::Config::default();
        for entry in self.entries.iter().filter(|d| d.severity >= min_severity) {
            match sources.label_for(&entry.loc) {
                Some(label) => {
                    let diagnostic = Diagnostic::new(entry.severity)
                        .with_message(&entry.message)
                        .with_labels(vec![label]);
                    term::emit(writer, &config, &sources.files, &diagnostic)?;
                }
                None => writeln!(writer, "{}", entry)?,
            }
        }
        Ok(())
    }
}

/// Source texts diagnostics can point into, keyed by the path used in source locations
pub struct SourceFiles {
    files: SimpleFiles<String, String>,
    ids: BTreeMap<String, usize>,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: BTreeMap::new(),
        }
    }
}

impl SourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, text: impl Into<String>) {
        let path = path.into();
        let id = self.files.add(path.clone(), text.into());
        self.ids.insert(path, id);
    }

    fn label_for(&self, loc: &SourceLocation) -> Option<Label<usize>> {
        let id = *self.ids.get(&loc.file)?;
        let len = self.files.get(id).ok()?.source().len();
        let start = loc.start.min(len);
        let end = loc.end.max(start).min(len);
        Some(Label::primary(id, start..end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::term::termcolor::Buffer;

    fn loc(file: &str, start: usize, end: usize) -> SourceLocation {
        SourceLocation {
            file: file.to_string(),
            start,
            end,
            line: 1,
            column: start as u32 + 1,
        }
    }

    #[test]
    fn counts_by_severity() {
        let mut diags = Diagnostics::new();
        diags.warning(&loc("A.sol", 0, 1), "emit ignored");
        assert!(!diags.has_errors());
        diags.error(DiagnosticKind::TypeMapping, &loc("A.sol", 0, 1), "tuple");
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.errors_of_kind(DiagnosticKind::TypeMapping).count(), 1);
        assert_eq!(diags.errors_of_kind(DiagnosticKind::UnsupportedConstruct).count(), 0);
    }

    #[test]
    fn renders_plain_lines_without_source() {
        let mut diags = Diagnostics::new();
        diags.error(
            DiagnosticKind::UnsupportedConstruct,
            &loc("B.sol", 4, 5),
            "inline assembly is not supported",
        );
        let mut buffer = Buffer::no_color();
        diags
            .render(&mut buffer, &SourceFiles::new(), Severity::Warning)
            .unwrap();
        let out = String::from_utf8(buffer.into_inner()).unwrap();
        assert_eq!(out, "B.sol:1:5: error: inline assembly is not supported\n");
    }

    #[test]
    fn renders_snippet_with_source() {
        let mut sources = SourceFiles::new();
        sources.add("C.sol", "contract C { uint x; }");
        let mut diags = Diagnostics::new();
        diags.error(DiagnosticKind::TypeMapping, &loc("C.sol", 13, 19), "bad type");
        let mut buffer = Buffer::no_color();
        diags.render(&mut buffer, &sources, Severity::Error).unwrap();
        let out = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(out.contains("error: bad type"));
        assert!(out.contains("C.sol"));
    }
}

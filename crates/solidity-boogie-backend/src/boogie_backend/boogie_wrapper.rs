// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Running boogie and mapping its findings back to Solidity sources.
//!
//! Boogie reports positions in the generated `.bpl` file. Every check the translator emits
//! carries `{:sourceloc}` and `{:message}` attributes, so an error is mapped by looking up the
//! attributes on the reported line, or on the related location for pre- and postconditions.

use super::runner::{self, RunOutcome};
use crate::{
    diagnostics::{DiagnosticKind, Diagnostics},
    options::BoogieOptions,
};
use anyhow::anyhow;
use itertools::Itertools;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use solidity_ast::SourceLocation;
use std::{fs, time::Duration};

static DIAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<file>.*)\((?P<line>\d+),(?P<col>\d+)\): (?P<kind>Error|Related location)(?: BP\d+)?: ?(?P<msg>.*)$",
    )
    .unwrap()
});
static SOURCE_LOC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{:sourceloc "(?P<file>[^"]*)", (?P<line>\d+), (?P<col>\d+)\}"#).unwrap()
});
static MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{:message "(?P<msg>[^"]*)"\}"#).unwrap());
static FINISHED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^Boogie program verifier finished with (?P<verified>\d+) verified, (?P<errors>\d+) errors?(?:, (?P<timeouts>\d+) time outs?)?")
        .unwrap()
});

/// Represents the boogie wrapper.
pub struct BoogieWrapper<'env> {
    pub options: &'env BoogieOptions,
}

/// Output of a boogie run.
pub struct BoogieOutput {
    /// All errors which could be parsed from the output.
    pub errors: Vec<BoogieError>,

    /// Full output as a string.
    pub all_output: String,
}

/// A verification failure, located in the Solidity source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoogieError {
    pub loc: SourceLocation,
    pub message: String,
}

impl BoogieWrapper<'_> {
    /// Calls boogie on the given file. On success, returns a struct representing the analyzed
    /// output of boogie.
    pub fn call_boogie(&self, boogie_file: &str) -> anyhow::Result<BoogieOutput> {
        let args = self.options.get_boogie_command(boogie_file);
        info!("running boogie");
        debug!("command line: {}", args.iter().join(" "));

        let hard_timeout = (self.options.hard_timeout_secs > 0)
            .then(|| Duration::from_secs(self.options.hard_timeout_secs));
        let output = match runner::run_boogie(&args, hard_timeout)? {
            RunOutcome::Finished(output) => output,
            RunOutcome::TimedOut(timeout) => {
                let err = BoogieError {
                    loc: SourceLocation::default(),
                    message: format!(
                        "Boogie execution exceeded hard timeout of {}s",
                        timeout.as_secs()
                    ),
                };
                return Ok(BoogieOutput {
                    errors: vec![err],
                    all_output: String::new(),
                });
            }
        };

        debug!("analyzing boogie output");
        let out = String::from_utf8_lossy(&output.stdout).to_string();
        let err = String::from_utf8_lossy(&output.stderr).to_string();
        let bpl = fs::read_to_string(boogie_file)?;
        let mut errors = extract_errors(&bpl, &out);

        match FINISHED.captures(&out) {
            Some(cap) => {
                let timeouts = cap
                    .name("timeouts")
                    .and_then(|m| m.as_str().parse::<usize>().ok())
                    .unwrap_or(0);
                if timeouts > 0 {
                    errors.push(BoogieError {
                        loc: SourceLocation::default(),
                        message: format!("Verification timed out for {} procedure(s)", timeouts),
                    });
                }
            }
            None if errors.is_empty() => {
                return Err(anyhow!(
                    "boogie did not finish verification:\n{}{}",
                    out,
                    err
                ))
            }
            None => {}
        }
        Ok(BoogieOutput {
            errors,
            all_output: out + &err,
        })
    }

    /// Calls boogie and adds the errors it finds to `diagnostics`.
    pub fn call_boogie_and_verify_output(
        &self,
        boogie_file: &str,
        diagnostics: &mut Diagnostics,
    ) -> anyhow::Result<()> {
        let BoogieOutput { errors, all_output } = self.call_boogie(boogie_file)?;
        let boogie_log_file = self.options.get_boogie_log_file(boogie_file);
        let log_file_existed = std::path::Path::new(&boogie_log_file).exists();
        debug!("writing boogie log to {}", boogie_log_file);
        fs::write(&boogie_log_file, &all_output)?;

        for error in errors {
            diagnostics.error(DiagnosticKind::Verification, &error.loc, error.message);
        }

        if !log_file_existed && !self.options.keep_artifacts {
            std::fs::remove_file(boogie_log_file).unwrap_or_default();
        }
        Ok(())
    }
}

/// Parses the errors in boogie's output `out` for the program text `bpl`.
pub fn extract_errors(bpl: &str, out: &str) -> Vec<BoogieError> {
    let bpl_lines: Vec<&str> = bpl.lines().collect();
    let mut errors = vec![];
    let mut lines = out.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(cap) = DIAG_LINE.captures(line) else {
            continue;
        };
        if &cap["kind"] != "Error" {
            continue;
        }
        let error_line = cap["line"].parse::<usize>().unwrap_or(0);
        let related_line = lines
            .peek()
            .and_then(|next| DIAG_LINE.captures(next))
            .filter(|next| &next["kind"] == "Related location")
            .and_then(|next| next["line"].parse::<usize>().ok());
        if related_line.is_some() {
            lines.next();
        }

        let text_of = |n: usize| n.checked_sub(1).and_then(|i| bpl_lines.get(i)).copied();
        let message = related_line
            .and_then(text_of)
            .and_then(message_of)
            .or_else(|| text_of(error_line).and_then(message_of))
            .unwrap_or_else(|| cap["msg"].to_string());
        let related_loc = || related_line.and_then(text_of).and_then(source_loc_of);
        let enclosing_loc = || enclosing_source_loc(&bpl_lines, error_line);
        // a failing precondition is reported at the call, a postcondition at its function
        let fallback = if cap["msg"].contains("precondition") {
            enclosing_loc().or_else(related_loc)
        } else {
            related_loc().or_else(enclosing_loc)
        };
        let loc = text_of(error_line)
            .and_then(source_loc_of)
            .or(fallback)
            .unwrap_or_default();
        errors.push(BoogieError { loc, message });
    }
    errors
}

fn message_of(line: &str) -> Option<String> {
    MESSAGE.captures(line).map(|cap| cap["msg"].to_string())
}

fn source_loc_of(line: &str) -> Option<SourceLocation> {
    let cap = SOURCE_LOC.captures(line)?;
    Some(SourceLocation {
        file: cap["file"].to_string(),
        start: 0,
        end: 0,
        line: cap["line"].parse().ok()?,
        column: cap["col"].parse().ok()?,
    })
}

/// Closest source location above `line`, not leaving the enclosing procedure
fn enclosing_source_loc(bpl_lines: &[&str], line: usize) -> Option<SourceLocation> {
    if line == 0 || line > bpl_lines.len() {
        return None;
    }
    for text in bpl_lines[..line].iter().rev() {
        if let Some(loc) = source_loc_of(text) {
            return Some(loc);
        }
        if text.trim_start().starts_with("procedure ") {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BPL: &str = r#"procedure {:sourceloc "A.sol", 3, 5} {:message "A::f"} f#3(__this: address_t)
    requires {:sourceloc "A.sol", 3, 5} {:message "State variable invariant 'x > 0' might not hold when entering function."} (x#2[__this] > 0);
{
    x#2 := x#2[__this := 0];
    assert {:sourceloc "A.sol", 5, 9} {:message "Assertion might not hold."} false;
    call __transfer(a, __this, 0, 1);
}
"#;

    fn loc(line: u32, column: u32) -> SourceLocation {
        SourceLocation {
            file: "A.sol".to_string(),
            line,
            column,
            ..Default::default()
        }
    }

    #[test]
    fn assertion_errors_use_line_attributes() {
        let out = "out.bpl(5,5): Error BP5001: This assertion might not hold.\n\
                   Boogie program verifier finished with 0 verified, 1 error\n";
        assert_eq!(
            extract_errors(BPL, out),
            vec![BoogieError {
                loc: loc(5, 9),
                message: "Assertion might not hold.".to_string(),
            }]
        );
    }

    #[test]
    fn related_locations_give_the_message() {
        let out = "out.bpl(6,5): Error: A precondition for this call might not hold.\n\
                   out.bpl(2,5): Related location: This is the precondition that might not hold.\n";
        let errors = extract_errors(BPL, out);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "State variable invariant 'x > 0' might not hold when entering function."
        );
        // the call itself has no location, the closest one above is used
        assert_eq!(errors[0].loc, loc(5, 9));
    }

    #[test]
    fn unknown_lines_keep_boogie_message() {
        let errors = extract_errors(BPL, "out.bpl(99,1): Error: Something else.\n");
        assert_eq!(errors[0].message, "Something else.");
        assert_eq!(errors[0].loc, SourceLocation::default());
    }
}

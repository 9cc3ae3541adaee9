// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

/// Default flags passed to boogie. Additional flags come from `boogie_flags`.
const DEFAULT_BOOGIE_FLAGS: &[&str] = &["-doModSetAnalysis", "-errorTrace:0", "-useArrayTheory"];

/// How fixed-width integers are represented in Boogie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Unbounded integers, overflow is not modelled
    Int,
    /// Bitvectors of the declared width
    Bv,
    /// Unbounded integers normalized modulo 2^width after each operation
    Mod,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Int => write!(f, "int"),
            Encoding::Bv => write!(f, "bv"),
            Encoding::Mod => write!(f, "mod"),
        }
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "int" => Ok(Encoding::Int),
            "bv" => Ok(Encoding::Bv),
            "mod" => Ok(Encoding::Mod),
            _ => Err(anyhow::anyhow!(
                "unknown arithmetic encoding `{}` (expected int, bv or mod)",
                s
            )),
        }
    }
}

/// Translation and prover options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoogieOptions {
    /// Representation of fixed-width integers.
    pub encoding: Encoding,
    /// Whether side conditions of arithmetic operations are asserted where they are evaluated.
    pub overflow_checks: bool,
    /// Path of the generated `.bpl` file.
    pub output_path: String,
    /// Optional file whose contents are put in front of the generated program.
    pub prelude_path: Option<String>,
    /// Verbosity of the driver's logging.
    pub verbosity_level: LevelFilter,
    /// Path to the boogie executable.
    pub boogie_exe: String,
    /// List of flags to pass on to boogie.
    pub boogie_flags: Vec<String>,
    /// A (soft) timeout for the solver, per verification condition, in seconds.
    pub vc_timeout: usize,
    /// A hard timeout for the boogie process in seconds. Zero for no timeout.
    pub hard_timeout_secs: u64,
    /// Only produce the `.bpl` file, do not run boogie.
    pub generate_only: bool,
    /// Whether the boogie log should be kept.
    pub keep_artifacts: bool,
}

impl Default for BoogieOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Int,
            overflow_checks: false,
            output_path: "output.bpl".to_owned(),
            prelude_path: None,
            verbosity_level: LevelFilter::Info,
            boogie_exe: std::env::var("BOOGIE_EXE").unwrap_or_default(),
            boogie_flags: vec![],
            vc_timeout: 10,
            hard_timeout_secs: 0,
            generate_only: true,
            keep_artifacts: false,
        }
    }
}

impl BoogieOptions {
    /// Reads options from a TOML file. Missing fields keep their defaults.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options from `{}`", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing `{}`", path.display()))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Returns command line to call boogie.
    pub fn get_boogie_command(&self, boogie_file: &str) -> Vec<String> {
        let exe = if self.boogie_exe.is_empty() {
            "boogie".to_string()
        } else {
            self.boogie_exe.clone()
        };
        let mut result = vec![exe];
        result.extend(DEFAULT_BOOGIE_FLAGS.iter().map(|s| s.to_string()));
        result.push(format!("-timeLimit:{}", self.vc_timeout));
        result.extend(self.boogie_flags.iter().cloned());
        result.push(boogie_file.to_string());
        result
    }

    /// Returns name of file where to log boogie output.
    pub fn get_boogie_log_file(&self, boogie_file: &str) -> String {
        format!("{}.log", boogie_file)
    }
}

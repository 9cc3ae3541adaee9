// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::Parser;
use log::{debug, LevelFilter};
use simplelog::{ConfigBuilder, TermLogger, TerminalMode};
use solidity_ast::{SourceModel, SourceUnit};
use solidity_boogie_backend::{BoogieOptions, Encoding, SourceFiles};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Parser)]
#[clap(
    name = env!("CARGO_BIN_NAME"),
    about = "Translates resolved Solidity ASTs to Boogie and optionally verifies the result",
    rename_all = "kebab-case",
    author,
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Args {
    /// JSON file holding the source units, as an array or a single unit
    pub input: PathBuf,

    /// TOML file with translation and prover options
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Path of the generated Boogie program
    #[clap(long, short = 'o')]
    pub output: Option<String>,

    /// Arithmetic encoding: int, bv or mod
    #[clap(long, value_parser = parse_encoding)]
    pub encoding: Option<Encoding>,

    /// Assert that arithmetic operations do not overflow
    #[clap(long)]
    pub overflow_checks: bool,

    /// File put in front of the generated program
    #[clap(long)]
    pub prelude: Option<String>,

    /// Run boogie on the generated program
    #[clap(long)]
    pub verify: bool,

    /// Path to the boogie executable
    #[clap(long = "boogie", env = "BOOGIE_EXE")]
    pub boogie_exe: Option<String>,

    /// Solver timeout per verification condition, in seconds
    #[clap(long, short = 't')]
    pub timeout: Option<usize>,

    /// Don't delete the boogie log after verification
    #[clap(long = "keep-temp", short = 'k')]
    pub keep_temp: bool,

    /// Display detailed progress
    #[clap(long, short = 'v')]
    pub verbose: bool,
}

fn parse_encoding(s: &str) -> Result<Encoding, String> {
    Encoding::from_str(s).map_err(|e| e.to_string())
}

impl Args {
    /// Options from the configuration file, if any, overridden by the command line.
    pub fn boogie_options(&self) -> anyhow::Result<BoogieOptions> {
        let mut options = match &self.config {
            Some(path) => BoogieOptions::from_toml_file(path)?,
            None => BoogieOptions::default(),
        };
        if let Some(output) = &self.output {
            options.output_path = output.clone();
        }
        if let Some(encoding) = self.encoding {
            options.encoding = encoding;
        }
        if self.overflow_checks {
            options.overflow_checks = true;
        }
        if let Some(prelude) = &self.prelude {
            options.prelude_path = Some(prelude.clone());
        }
        if self.verify {
            options.generate_only = false;
        }
        if let Some(exe) = &self.boogie_exe {
            options.boogie_exe = exe.clone();
        }
        if let Some(timeout) = self.timeout {
            options.vc_timeout = timeout;
        }
        if self.keep_temp {
            options.keep_artifacts = true;
        }
        if self.verbose {
            options.verbosity_level = LevelFilter::Debug;
        }
        Ok(options)
    }
}

/// Sets up logging. Must run before any use of info!, warn! etc.
pub fn setup_logging(level: LevelFilter) -> anyhow::Result<()> {
    TermLogger::init(
        level,
        ConfigBuilder::new().set_time_level(LevelFilter::Debug).build(),
        TerminalMode::Stderr,
    )
    .context("initializing logger")
}

/// Reads the source units from `path`, accepting an array of units or a single one.
pub fn read_model(path: &Path) -> anyhow::Result<SourceModel> {
    let text = fs::read_to_string(path).with_context(|| format!("reading `{}`", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing `{}`", path.display()))?;
    let units: Vec<SourceUnit> = if json.is_array() {
        serde_json::from_value(json)
    } else {
        serde_json::from_value(json).map(|unit| vec![unit])
    }
    .with_context(|| format!("parsing source units in `{}`", path.display()))?;
    debug!("read {} source unit(s) from `{}`", units.len(), path.display());
    Ok(SourceModel::new(units))
}

/// Collects the texts of the source files the units came from, looked up relative to the
/// directory of the AST file. Files that cannot be found are rendered without snippets.
pub fn read_sources(model: &SourceModel, ast_path: &Path) -> SourceFiles {
    let base = ast_path.parent().unwrap_or_else(|| Path::new("."));
    let mut sources = SourceFiles::new();
    for unit in model.units() {
        let candidate = Path::new(&unit.path);
        let file = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            base.join(candidate)
        };
        match fs::read_to_string(&file) {
            Ok(text) => sources.add(unit.path.clone(), text),
            Err(_) => debug!("no source text for `{}`", unit.path),
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("solc-verify.toml");
        fs::write(&config, "encoding = \"bv\"\nvc_timeout = 3\noutput_path = \"a.bpl\"\n").unwrap();
        let args = Args::parse_from([
            "solc-verify",
            "ast.json",
            "--config",
            config.to_str().unwrap(),
            "--encoding",
            "mod",
            "--verify",
            "-o",
            "b.bpl",
        ]);
        let options = args.boogie_options().unwrap();
        assert_eq!(options.encoding, Encoding::Mod);
        assert_eq!(options.vc_timeout, 3);
        assert_eq!(options.output_path, "b.bpl");
        assert!(!options.generate_only);
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(Args::try_parse_from(["solc-verify", "ast.json", "--encoding", "float"]).is_err());
    }
}

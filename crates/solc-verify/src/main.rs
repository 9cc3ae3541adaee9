// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use cli::Args;
use colored::Colorize;
use log::debug;
use solidity_boogie_backend::{generator::run_boogie_gen, EmbeddedDocTags};

mod cli;

fn execute(args: Args) -> anyhow::Result<String> {
    let options = args.boogie_options()?;
    cli::setup_logging(options.verbosity_level)?;
    debug!("solc-verify version: {}", env!("CARGO_PKG_VERSION"));

    let model = cli::read_model(&args.input)?;
    let sources = cli::read_sources(&model, &args.input);
    run_boogie_gen(&model, &sources, &options, &EmbeddedDocTags)
}

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).unwrap_or_default();

    let args = Args::parse();
    match execute(args) {
        Ok(summary) => println!("{}", summary),
        Err(err) => {
            let err = format!("{:?}", err);
            println!("{}", err.bold().red());
            std::process::exit(1);
        }
    }
}

//! CLI entry point for the `axi-script` binary.

use std::process::ExitCode;

use axi_core as _;
use axi_script::{execute, init_logging, Cli, Completion};
use clap::Parser;
use env_logger as _;
use log as _;
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(Completion::Clean) => ExitCode::SUCCESS,
        Ok(Completion::Faulted) => ExitCode::from(1),
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(2)
        }
    }
}

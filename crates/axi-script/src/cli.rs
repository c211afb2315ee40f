//! Command-line surface of the `axi-script` binary.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use axi_core::{RegisterFileConfig, S2m, DEFAULT_LATENCY_CYCLES};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;

use crate::{consume, render, run_register_file, Report, Script, ScriptError};

/// Render, replay and run AXI4-Lite command scripts
#[derive(Parser, Debug)]
#[command(name = "axi-script", version, about, long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Operation to perform
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Write the M2S trace for a script as JSON
    Render {
        /// Script file
        script: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Correlate a recorded S2M trace with a script and print the report
    Consume {
        /// Script file
        script: PathBuf,
        /// JSON array of S2M records
        responses: PathBuf,
    },
    /// Run a script against the built-in register-file model
    Run {
        /// Script file
        script: PathBuf,
        /// Number of registers in the model
        #[arg(long, default_value_t = 16)]
        registers: usize,
        /// Response latency in cycles
        #[arg(long, default_value_t = DEFAULT_LATENCY_CYCLES)]
        latency: usize,
        /// Idle cycles appended to the trace (default: latency)
        #[arg(long)]
        pad: Option<usize>,
    },
}

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every step resolved without a fault.
    Clean,
    /// At least one step faulted.
    Faulted,
}

/// Initialises `env_logger`; `-v` flags override `RUST_LOG`.
pub fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    if let Err(error) = builder.try_init() {
        eprintln!("logger already initialised: {error}");
    }
}

/// Executes a parsed command line.
///
/// # Errors
///
/// Returns [`ScriptError`] for unreadable inputs, invalid scripts or a
/// response trace that does not match the script.
pub fn execute(cli: &Cli) -> Result<Completion, ScriptError> {
    match &cli.command {
        CliCommand::Render { script, output } => {
            let script = Script::load(script)?;
            let (_, _, trace) = render(&script)?;
            log::info!("rendered {} cycles", trace.len());
            match output {
                Some(path) => write_json_file(path, &trace)?,
                None => write_json_stdout(&trace)?,
            }
            Ok(Completion::Clean)
        }
        CliCommand::Consume { script, responses } => {
            let script = Script::load(script)?;
            let text =
                fs::read_to_string(responses).map_err(|error| ScriptError::io(responses, error))?;
            let responses: Vec<S2m> = serde_json::from_str(&text)?;
            finish(&consume(&script, &responses)?)
        }
        CliCommand::Run {
            script,
            registers,
            latency,
            pad,
        } => {
            let script = Script::load(script)?;
            let config = RegisterFileConfig {
                registers: *registers,
                latency: *latency,
            };
            finish(&run_register_file(&script, &config, *pad)?)
        }
    }
}

fn finish(report: &Report) -> Result<Completion, ScriptError> {
    write_json_stdout(report)?;
    Ok(if report.has_faults() {
        Completion::Faulted
    } else {
        Completion::Clean
    })
}

fn write_json_file(path: &Path, value: &impl Serialize) -> Result<(), ScriptError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text + "\n").map_err(|error| ScriptError::io(path, error))
}

fn write_json_stdout(value: &impl Serialize) -> Result<(), ScriptError> {
    let text = serde_json::to_string_pretty(value)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").map_err(|error| ScriptError::io("<stdout>", error))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, CliCommand};

    #[test]
    fn run_defaults_match_register_file_defaults() {
        let cli = Cli::try_parse_from(["axi-script", "run", "script.json"]).expect("valid args");
        assert_eq!(cli.verbose, 0);
        assert_eq!(
            cli.command,
            CliCommand::Run {
                script: PathBuf::from("script.json"),
                registers: 16,
                latency: 1,
                pad: None,
            }
        );
    }

    #[test]
    fn verbosity_counts_repeated_flags() {
        let cli = Cli::try_parse_from(["axi-script", "-vv", "render", "s.json", "-o", "t.json"])
            .expect("valid args");
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.command,
            CliCommand::Render {
                script: PathBuf::from("s.json"),
                output: Some(PathBuf::from("t.json")),
            }
        );
    }

    #[test]
    fn consume_requires_a_trace() {
        assert!(Cli::try_parse_from(["axi-script", "consume", "s.json"]).is_err());
    }
}

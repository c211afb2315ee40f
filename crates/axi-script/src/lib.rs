//! JSON command scripts and trace tooling for the AXI4-Lite command core.

/// Error type for script loading and execution.
pub mod errors;
pub use errors::ScriptError;

/// Script file format and step-to-command mapping.
pub mod script;
pub use script::{Script, Step};

/// Sessions, reports and simulation drivers.
pub mod session;
pub use session::{consume, render, run_register_file, Report, Session, StepOutcome, StepReport};

/// Command-line parsing and dispatch.
pub mod cli;
pub use cli::{execute, init_logging, Cli, CliCommand, Completion};

#[cfg(test)]
use tempfile as _;

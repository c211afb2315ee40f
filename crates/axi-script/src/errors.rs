//! Error type for script loading, execution and trace I/O.

use std::io;
use std::path::PathBuf;

use axi_core::{ConfigError, HandlerError};
use thiserror::Error;

/// Failure while loading or running a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Script, trace or report JSON was malformed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A step describes an invalid command.
    #[error("step {step}: {source}")]
    Step {
        /// Zero-based step index.
        step: usize,
        /// Construction failure.
        #[source]
        source: ConfigError,
    },
    /// The simulation setup is invalid.
    #[error("invalid simulation: {0}")]
    Config(#[from] ConfigError),
    /// The handler could not dispatch or correlate the script.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ScriptError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

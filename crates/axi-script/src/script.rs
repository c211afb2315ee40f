//! JSON command scripts.
//!
//! ```json
//! {
//!   "base_address": 64,
//!   "steps": [
//!     { "op": "set_unsigned", "offset": 2, "value": 27 },
//!     { "op": "get_unsigned", "offset": 2, "description": "read back" },
//!     { "op": "wait", "cycles": 4 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use axi_core::{Command, ConfigError};
use serde::{Deserialize, Serialize};

use crate::ScriptError;

/// Ordered register operations relative to one base address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Script {
    /// Added to every step offset.
    #[serde(default)]
    pub base_address: u32,
    /// Operations in submission order.
    pub steps: Vec<Step>,
}

/// One script operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Read a boolean register.
    GetBoolean {
        /// Register offset.
        offset: u32,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Write a boolean register.
    SetBoolean {
        /// Register offset.
        offset: u32,
        /// Value written.
        value: bool,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Read one word.
    GetUnsigned {
        /// Register offset.
        offset: u32,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Read a burst.
    GetUnsigneds {
        /// First register offset.
        offset: u32,
        /// Number of words.
        length: usize,
        /// Read every word from `offset`.
        #[serde(default)]
        constant_address: bool,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Write one word.
    SetUnsigned {
        /// Register offset.
        offset: u32,
        /// Value written; must fit in 32 unsigned bits.
        value: i64,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Write a burst.
    SetUnsigneds {
        /// First register offset.
        offset: u32,
        /// Values written in order.
        values: Vec<i64>,
        /// Write every word to `offset`.
        #[serde(default)]
        constant_address: bool,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Write a two's-complement word.
    SetSigned {
        /// Register offset.
        offset: u32,
        /// Value written.
        value: i64,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Write 0 to a trigger register.
    Trigger {
        /// Register offset.
        offset: u32,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Idle cycles in simulation, a sleep on hardware.
    Wait {
        /// Idle cycles rendered.
        #[serde(default)]
        cycles: usize,
        /// Milliseconds slept by live handlers.
        #[serde(default)]
        sleep_ms: u64,
    },
    /// Nested steps dispatched as one combined command.
    Combined {
        /// Sub-steps in order.
        steps: Vec<Step>,
        /// Label used in reports and faults.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Script {
    /// Parses a script from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Json`] for malformed input.
    pub fn from_json(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Io`] or [`ScriptError::Json`].
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path).map_err(|error| ScriptError::io(path, error))?;
        Self::from_json(&text)
    }

    /// Builds one command per step.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Step`] for the first invalid step.
    pub fn commands(&self) -> Result<Vec<Command>, ScriptError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(step, item)| {
                item.command(self.base_address)
                    .map_err(|source| ScriptError::Step { step, source })
            })
            .collect()
    }
}

impl Step {
    /// Operation name as written in scripts.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::GetBoolean { .. } => "get_boolean",
            Self::SetBoolean { .. } => "set_boolean",
            Self::GetUnsigned { .. } => "get_unsigned",
            Self::GetUnsigneds { .. } => "get_unsigneds",
            Self::SetUnsigned { .. } => "set_unsigned",
            Self::SetUnsigneds { .. } => "set_unsigneds",
            Self::SetSigned { .. } => "set_signed",
            Self::Trigger { .. } => "trigger",
            Self::Wait { .. } => "wait",
            Self::Combined { .. } => "combined",
        }
    }

    /// Description if present, otherwise the operation name.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::GetBoolean { description, .. }
            | Self::SetBoolean { description, .. }
            | Self::GetUnsigned { description, .. }
            | Self::GetUnsigneds { description, .. }
            | Self::SetUnsigned { description, .. }
            | Self::SetUnsigneds { description, .. }
            | Self::SetSigned { description, .. }
            | Self::Trigger { description, .. }
            | Self::Combined { description, .. } => description.as_deref().unwrap_or(self.op()),
            Self::Wait { .. } => self.op(),
        }
    }

    /// Builds the command for this step at `base_address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid address, burst or value.
    pub fn command(&self, base_address: u32) -> Result<Command, ConfigError> {
        let address = |offset: u32| {
            base_address
                .checked_add(offset)
                .ok_or(ConfigError::AddressOverflow {
                    base: base_address,
                    offset,
                })
        };
        let command = match self {
            Self::GetBoolean { offset, .. } => Command::get_boolean(address(*offset)?)?,
            Self::SetBoolean { offset, value, .. } => {
                Command::set_boolean(*value, address(*offset)?)?
            }
            Self::GetUnsigned { offset, .. } => Command::get_unsigned(address(*offset)?)?,
            Self::GetUnsigneds {
                offset,
                length,
                constant_address,
                ..
            } => Command::get_unsigneds(address(*offset)?, *length, *constant_address)?,
            Self::SetUnsigned { offset, value, .. } => {
                Command::set_unsigned(*value, address(*offset)?)?
            }
            Self::SetUnsigneds {
                offset,
                values,
                constant_address,
                ..
            } => Command::set_unsigneds(values, address(*offset)?, *constant_address)?,
            Self::SetSigned { offset, value, .. } => {
                Command::set_signed(*value, address(*offset)?)?
            }
            Self::Trigger { offset, .. } => Command::trigger(address(*offset)?)?,
            Self::Wait { cycles, sleep_ms } => {
                return Command::fake_wait(*cycles, Duration::from_millis(*sleep_ms));
            }
            Self::Combined { steps, .. } => Command::combined(
                steps
                    .iter()
                    .map(|step| step.command(base_address))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(command.with_description(self.label()))
    }
}

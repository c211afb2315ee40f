//! Decoded command values and their typed views.

use std::fmt;

/// Value produced by decoding a command's responses.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum Value {
    /// Side-effect-only command (writes, triggers, waits).
    Unit,
    /// Boolean register.
    Bool(bool),
    /// Single 32-bit word.
    Unsigned(u32),
    /// Burst of 32-bit words.
    Unsigneds(Vec<u32>),
    /// Per-sub-command results of a combined command; `None` marks a failed part.
    List(Vec<Option<Value>>),
}

impl Value {
    /// Short name of the value's shape.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Unsigned(_) => "unsigned",
            Self::Unsigneds(_) => "unsigneds",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Unsigneds(values) => write!(f, "{values:?}"),
            Self::List(parts) => {
                f.write_str("[")?;
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    match part {
                        Some(value) => write!(f, "{value}")?,
                        None => f.write_str("<fault>")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

/// Conversion from a decoded [`Value`] into a typed handle payload.
pub trait FromValue: Sized {
    /// Shape name reported on mismatch.
    const EXPECTED: &'static str;

    /// Extracts `Self`, or returns the value unchanged when the shape differs.
    ///
    /// # Errors
    ///
    /// Returns the original value when it has another shape.
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for () {
    const EXPECTED: &'static str = "unit";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Unit => Ok(()),
            other => Err(other),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(other),
        }
    }
}

impl FromValue for u32 {
    const EXPECTED: &'static str = "unsigned";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Unsigned(word) => Ok(word),
            other => Err(other),
        }
    }
}

impl FromValue for Vec<u32> {
    const EXPECTED: &'static str = "unsigneds";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Unsigneds(words) => Ok(words),
            other => Err(other),
        }
    }
}

impl FromValue for Vec<Option<Value>> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::List(parts) => Ok(parts),
            other => Err(other),
        }
    }
}

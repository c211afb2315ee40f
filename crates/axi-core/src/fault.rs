//! Error and fault taxonomy.
//!
//! Three regimes are kept apart: [`ConfigError`] is returned synchronously
//! when a command or descriptor is built, [`AxiFault`] is stored on a
//! deferred result once responses arrive, and [`HandlerError`] is returned by
//! a handler when the request and response streams can no longer be paired.

use thiserror::Error;

use crate::{Direction, ResponseCode};

#[allow(clippy::ref_option)]
fn context(description: &Option<String>) -> String {
    description
        .as_deref()
        .map_or_else(String::new, |text| format!(" (command: {text})"))
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn payload_rule(direction: &Direction) -> &'static str {
    match direction {
        Direction::Write => "carry",
        Direction::Read => "not carry",
    }
}

/// Invalid command or descriptor construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Transaction length of zero.
    #[error("transaction length must be at least one beat")]
    EmptyTransaction,
    /// Start address outside the 31-bit address space.
    #[error("start address {address:#x} exceeds the 31-bit address space")]
    AddressOutOfRange {
        /// Offending start address.
        address: u64,
    },
    /// Incrementing burst runs past the end of the address space.
    #[error("{length} beats from {address:#x} run past the 31-bit address space")]
    BurstOutOfRange {
        /// Start address of the burst.
        address: u64,
        /// Number of beats.
        length: usize,
    },
    /// Write payload does not provide exactly one word per beat.
    #[error("write payload has {actual} words but the transaction has {expected} beats")]
    PayloadLength {
        /// Beats in the transaction.
        expected: usize,
        /// Words supplied.
        actual: usize,
    },
    /// A read carried a payload, or a write carried none.
    #[error("{direction} transaction must {} a payload", payload_rule(.direction))]
    PayloadDirection {
        /// Direction of the offending transaction.
        direction: Direction,
    },
    /// Register value outside `0..2^32`.
    #[error("value {value} does not fit in an unsigned 32-bit register")]
    ValueOutOfRange {
        /// Offending value.
        value: i64,
    },
    /// Idle padding longer than the simulation handler will render.
    #[error("{cycles} idle cycles exceed the limit of {limit}")]
    TooManyCycles {
        /// Requested cycles.
        cycles: usize,
        /// Largest accepted count.
        limit: usize,
    },
    /// Model geometry larger than a behavioural model will allocate.
    #[error("{registers} registers exceed the limit of {limit}")]
    TooManyRegisters {
        /// Requested registers.
        registers: usize,
        /// Largest accepted count.
        limit: usize,
    },
    /// Base address plus offset overflowed.
    #[error("offset {offset:#x} from base {base:#x} overflows the address space")]
    AddressOverflow {
        /// Facade base address.
        base: u32,
        /// Register offset.
        offset: u32,
    },
}

/// Classes used to group faults recorded on deferred results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The bus answered, but not with a usable response.
    Transaction,
    /// Responses arrived but could not be interpreted.
    Decode,
    /// The live connection failed before the bus answered.
    Transport,
}

/// Failure recorded on a command's deferred result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxiFault {
    /// A response carried a status other than `OKAY`.
    #[error("received a bad {direction} response {code}{}", context(.description))]
    BadResponse {
        /// Channel the response arrived on.
        direction: Direction,
        /// First non-`OKAY` status seen for the transaction.
        code: ResponseCode,
        /// Description of the owning command.
        description: Option<String>,
    },
    /// Wrong number of responses for the beats issued.
    #[error("expected {expected} responses but received {actual}{}", context(.description))]
    ResponseCount {
        /// Beats issued.
        expected: usize,
        /// Responses received.
        actual: usize,
        /// Description of the owning command.
        description: Option<String>,
    },
    /// A boolean register read back something other than 0 or 1.
    #[error("unexpected boolean encoding ({raw}){}", context(.description))]
    UnexpectedBoolean {
        /// Raw register word.
        raw: u32,
        /// Description of the owning command.
        description: Option<String>,
    },
    /// Decoder received results of a shape it cannot interpret.
    #[error("malformed response: {reason}{}", context(.description))]
    MalformedResponse {
        /// What was wrong with the results.
        reason: String,
        /// Description of the owning command.
        description: Option<String>,
    },
    /// The response stream lost track of the request stream before this
    /// command was answered.
    #[error("response stream out of sync before a response arrived{}", context(.description))]
    Desynchronized {
        /// Description of the owning command.
        description: Option<String>,
    },
    /// The live connection reported a failure.
    #[error("connection failure: {0}")]
    Connection(#[from] ConnectionError),
    /// An earlier transaction of the same command failed, so this one was skipped.
    #[error("transaction not dispatched after an earlier failure")]
    NotDispatched,
    /// Live connections cannot read repeatedly from one address.
    #[error("reading from a constant address ({address:#x}) is not supported")]
    ConstantAddressRead {
        /// Start address of the rejected read.
        address: u32,
    },
}

impl AxiFault {
    /// Returns the grouping class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::BadResponse { .. } | Self::ResponseCount { .. } | Self::Desynchronized { .. } => {
                FaultClass::Transaction
            }
            Self::UnexpectedBoolean { .. } | Self::MalformedResponse { .. } => FaultClass::Decode,
            Self::Connection(_) | Self::NotDispatched | Self::ConstantAddressRead { .. } => {
                FaultClass::Transport
            }
        }
    }
}

/// Failure reported by a live bus connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The device did not complete a read.
    #[error("read of {length} words at {address:#x} failed")]
    ReadFailed {
        /// Start address.
        address: u32,
        /// Words requested.
        length: usize,
    },
    /// The device did not complete a write.
    #[error("write at {address:#x} failed")]
    WriteFailed {
        /// Start address.
        address: u32,
    },
    /// No response within the connection's deadline.
    #[error("timed out waiting for the device")]
    Timeout,
    /// The link to the device is gone.
    #[error("disconnected: {0}")]
    Disconnected(String),
}

/// Failure of the dispatch machinery itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The response stream ran out before every expected valid cycle was seen.
    #[error("handler out of sync, likely an AXI protocol bug: {pending} commands unresolved{}", context(.description))]
    OutOfSync {
        /// Commands abandoned with a desync fault, including the failing one.
        pending: usize,
        /// Description of the command that ran dry.
        description: Option<String>,
    },
    /// Reads from a constant address are not supported on live connections.
    #[error("reading from a constant address ({address:#x}) is not supported")]
    ConstantAddressRead {
        /// Start address of the rejected read.
        address: u32,
    },
    /// A command's result was already settled.
    #[error("command response was already processed")]
    AlreadyResolved,
}

/// Failure reading a deferred result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError {
    /// The owning command has not been resolved yet.
    #[error("result not ready")]
    NotReady,
    /// The owning command failed.
    #[error(transparent)]
    Fault(#[from] AxiFault),
    /// The resolved value has a different shape than the handle expects.
    #[error("expected {expected} but the command produced {found}")]
    TypeMismatch {
        /// Shape requested by the handle.
        expected: &'static str,
        /// Shape actually stored.
        found: String,
    },
    /// A second resolution was attempted.
    #[error("result already set")]
    AlreadySet,
}

/// Lookup failures in a module registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No module registered under this name.
    #[error("unknown module '{0}'")]
    UnknownModule(String),
    /// Module name already taken.
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),
    /// Register name not present in the module's map.
    #[error("module '{module}' has no register '{register}'")]
    UnknownRegister {
        /// Module searched.
        module: String,
        /// Register requested.
        register: String,
    },
    /// Register name declared twice in one map.
    #[error("module '{module}' declares register '{register}' twice")]
    DuplicateRegister {
        /// Module being declared.
        module: String,
        /// Register declared twice.
        register: String,
    },
}

/// Umbrella error for the facade layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxiError {
    /// Command construction failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Dispatch failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
    /// Registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::{AxiFault, ConfigError, ConnectionError, FaultClass, HandlerError};
    use crate::{Direction, ResponseCode};

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        let bad = AxiFault::BadResponse {
            direction: Direction::Read,
            code: ResponseCode::DecErr,
            description: None,
        };
        assert_eq!(bad.class(), FaultClass::Transaction);
        assert_eq!(
            AxiFault::UnexpectedBoolean {
                raw: 7,
                description: None
            }
            .class(),
            FaultClass::Decode
        );
        assert_eq!(
            AxiFault::from(ConnectionError::Timeout).class(),
            FaultClass::Transport
        );
        assert_eq!(AxiFault::NotDispatched.class(), FaultClass::Transport);
        assert_eq!(
            AxiFault::Desynchronized { description: None }.class(),
            FaultClass::Transaction
        );
    }

    #[test]
    fn fault_messages_carry_command_description() {
        let fault = AxiFault::BadResponse {
            direction: Direction::Write,
            code: ResponseCode::SlvErr,
            description: Some("set intA".into()),
        };
        assert_eq!(
            fault.to_string(),
            "received a bad WRITE response SLVERR (command: set intA)"
        );

        let plain = AxiFault::UnexpectedBoolean {
            raw: 2,
            description: None,
        };
        assert_eq!(plain.to_string(), "unexpected boolean encoding (2)");
    }

    #[test]
    fn payload_direction_message_depends_on_direction() {
        let read = ConfigError::PayloadDirection {
            direction: Direction::Read,
        };
        assert_eq!(read.to_string(), "READ transaction must not carry a payload");
        let write = ConfigError::PayloadDirection {
            direction: Direction::Write,
        };
        assert_eq!(write.to_string(), "WRITE transaction must carry a payload");
    }

    #[test]
    fn out_of_sync_message_mentions_protocol_bug() {
        let error = HandlerError::OutOfSync {
            pending: 3,
            description: Some("read intC".into()),
        };
        let text = error.to_string();
        assert!(text.contains("out of sync"));
        assert!(text.contains("3 commands unresolved"));
        assert!(text.contains("read intC"));
    }
}

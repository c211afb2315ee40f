//! AXI4-Lite command encoding, response correlation and deferred results.

/// Per-cycle bus signal records and response codes.
pub mod bus;
pub use bus::{M2s, ResponseCode, S2m, DATA_WIDTH_BITS, MAX_ADDRESS, PROT_WIDTH_BITS, STROBE_WIDTH_BITS};

/// Error and fault taxonomy for construction, responses and dispatch.
pub mod fault;
pub use fault::{
    AxiError, AxiFault, ConfigError, ConnectionError, FaultClass, HandlerError, RegistryError,
    ResultError,
};

/// Validated read and write burst descriptors.
pub mod transaction;
pub use transaction::{Direction, TransactionDescriptor};

/// Decoded values and typed conversions.
pub mod value;
pub use value::{FromValue, Value};

/// Shared result cells settled once responses are processed.
pub mod deferred;
pub use deferred::{join_all, DeferredResult, JoinAll, ResultState};

/// Register operations and their response decoders.
pub mod command;
pub use command::{
    first_fault, read_word, read_words, Command, Decode, Decoded, RawResult, TransactionResult,
    Wait, MAX_IDLE_CYCLES,
};

/// Simulation and live dispatch handlers.
pub mod handler;
pub use handler::{Connection, Handler, LiveHandler, SimHandler};

/// Base-address facade over a handler.
pub mod comm;
pub use comm::Comm;

/// Named register maps and module bindings.
pub mod registry;
pub use registry::{ModuleComm, ModuleRegistry, RegisterMap};

/// Behavioural slave models for simulation without HDL.
pub mod model;
pub use model::{
    drive, FailModel, RegisterFileConfig, RegisterFileModel, SlaveModel, DEFAULT_LATENCY_CYCLES,
    MAX_REGISTERS,
};

#[cfg(test)]
use proptest as _;

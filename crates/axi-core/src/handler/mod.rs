//! Dispatch back-ends that move commands onto a bus.

/// Live dispatch over a blocking bus connection.
pub mod live;
/// Cycle-accurate simulation dispatch.
pub mod sim;

pub use live::{Connection, LiveHandler};
pub use sim::SimHandler;

use crate::{Command, HandlerError};

/// Accepts commands for dispatch in submission order.
///
/// Implementations settle each command's deferred result exactly once:
/// the simulation handler during `consume`, the live handler inline.
pub trait Handler {
    /// Queues or dispatches `commands` in order.
    ///
    /// A command the handler refuses still settles, with a fault, as do the
    /// commands after it in the same batch.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when a command cannot be dispatched at all.
    fn send(&mut self, commands: Vec<Command>) -> Result<(), HandlerError>;

    /// Sends a single command.
    ///
    /// # Errors
    ///
    /// See [`Handler::send`].
    fn send_one(&mut self, command: Command) -> Result<(), HandlerError> {
        self.send(vec![command])
    }
}

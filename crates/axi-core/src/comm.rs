//! Per-module convenience facade bound to a handler and a base address.

use std::time::Duration;

use crate::{AxiError, Command, ConfigError, DeferredResult, FromValue, Handler, Value};

/// Issues register operations relative to a module's base address.
///
/// Every method builds one command, hands it to the handler and returns a
/// typed handle onto its result.
#[derive(Debug)]
pub struct Comm<'h, H: Handler + ?Sized> {
    handler: &'h mut H,
    base_address: u32,
}

impl<'h, H: Handler + ?Sized> Comm<'h, H> {
    /// Binds a facade to `handler` at `base_address`.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(handler: &'h mut H, base_address: u32) -> Self {
        Self {
            handler,
            base_address,
        }
    }

    /// Base address every offset is relative to.
    #[must_use]
    pub const fn base_address(&self) -> u32 {
        self.base_address
    }

    /// Absolute address of `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressOverflow`] when the sum does not fit.
    pub const fn address(&self, offset: u32) -> Result<u32, ConfigError> {
        match self.base_address.checked_add(offset) {
            Some(address) => Ok(address),
            None => Err(ConfigError::AddressOverflow {
                base: self.base_address,
                offset,
            }),
        }
    }

    /// Sends a pre-built command.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Handler`] when the handler rejects the command.
    pub fn submit<T: FromValue>(&mut self, command: Command) -> Result<DeferredResult<T>, AxiError> {
        let handle = command.handle();
        self.handler.send_one(command)?;
        Ok(handle)
    }

    /// Pads the simulation or sleeps on hardware.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an oversized wait, or a handler error.
    pub fn fake_wait(
        &mut self,
        clock_cycles: usize,
        sleep: Duration,
    ) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::fake_wait(clock_cycles, sleep)?;
        self.submit(command)
    }

    /// Reads a boolean register.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an invalid address, or a handler error.
    pub fn get_boolean(&mut self, offset: u32) -> Result<DeferredResult<bool>, AxiError> {
        let command = Command::get_boolean(self.address(offset)?)?;
        self.submit(command)
    }

    /// Writes a boolean register.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an invalid address, or a handler error.
    pub fn set_boolean(&mut self, value: bool, offset: u32) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::set_boolean(value, self.address(offset)?)?;
        self.submit(command)
    }

    /// Reads one word.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an invalid address, or a handler error.
    pub fn get_unsigned(&mut self, offset: u32) -> Result<DeferredResult<u32>, AxiError> {
        let command = Command::get_unsigned(self.address(offset)?)?;
        self.submit(command)
    }

    /// Reads a burst of words.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an invalid burst, or a handler error.
    pub fn get_unsigneds(
        &mut self,
        offset: u32,
        length: usize,
        constant_address: bool,
    ) -> Result<DeferredResult<Vec<u32>>, AxiError> {
        let command = Command::get_unsigneds(self.address(offset)?, length, constant_address)?;
        self.submit(command)
    }

    /// Writes one word.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an out-of-range value or address.
    pub fn set_unsigned(&mut self, value: i64, offset: u32) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::set_unsigned(value, self.address(offset)?)?;
        self.submit(command)
    }

    /// Writes a burst of words.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an out-of-range value or burst.
    pub fn set_unsigneds(
        &mut self,
        values: &[i64],
        offset: u32,
        constant_address: bool,
    ) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::set_unsigneds(values, self.address(offset)?, constant_address)?;
        self.submit(command)
    }

    /// Writes a two's-complement value.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an out-of-range value or address.
    pub fn set_signed(&mut self, value: i64, offset: u32) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::set_signed(value, self.address(offset)?)?;
        self.submit(command)
    }

    /// Writes a burst of two's-complement values.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an out-of-range value or burst.
    pub fn set_signeds(
        &mut self,
        values: &[i64],
        offset: u32,
        constant_address: bool,
    ) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::set_signeds(values, self.address(offset)?, constant_address)?;
        self.submit(command)
    }

    /// Writes 0 to a trigger register.
    ///
    /// # Errors
    ///
    /// Returns [`AxiError::Config`] for an invalid address, or a handler error.
    pub fn trigger(&mut self, offset: u32) -> Result<DeferredResult<()>, AxiError> {
        let command = Command::trigger(self.address(offset)?)?;
        self.submit(command)
    }

    /// Sends several commands as one combined command.
    ///
    /// # Errors
    ///
    /// See [`Comm::submit`].
    pub fn combined(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<DeferredResult<Vec<Option<Value>>>, AxiError> {
        self.submit(Command::combined(commands))
    }
}

#[cfg(test)]
mod tests {
    use super::Comm;
    use crate::{AxiError, Command, ConfigError, M2s, SimHandler, MAX_ADDRESS};

    #[test]
    fn offsets_are_relative_to_base() {
        let mut handler = SimHandler::new();
        let mut comm = Comm::new(&mut handler, 0x100);
        comm.set_unsigned(3, 4).expect("queued");
        comm.get_boolean(5).expect("queued");
        assert_eq!(comm.base_address(), 0x100);

        assert_eq!(
            handler.render(),
            vec![M2s::write_beat(0x104, 3), M2s::read_beat(0x105)]
        );
    }

    #[test]
    fn address_overflow_is_reported_synchronously() {
        let mut handler = SimHandler::new();
        let mut comm = Comm::new(&mut handler, u32::MAX);
        assert_eq!(
            comm.trigger(1).err(),
            Some(AxiError::Config(ConfigError::AddressOverflow {
                base: u32::MAX,
                offset: 1
            }))
        );
        assert!(handler.is_idle());
    }

    #[test]
    fn out_of_range_value_never_reaches_the_handler() {
        let mut handler = SimHandler::new();
        let mut comm = Comm::new(&mut handler, 0);
        assert!(matches!(
            comm.set_unsigned(-1, 0),
            Err(AxiError::Config(ConfigError::ValueOutOfRange { value: -1 }))
        ));
        assert!(matches!(
            comm.get_unsigned(MAX_ADDRESS + 1),
            Err(AxiError::Config(ConfigError::AddressOutOfRange { .. }))
        ));
        assert_eq!(handler.unsent_len(), 0);
    }

    #[test]
    fn combined_handle_is_typed_as_list() {
        let mut handler = SimHandler::new();
        let mut comm = Comm::new(&mut handler, 0);
        let handle = comm
            .combined(vec![Command::trigger(0).expect("valid")])
            .expect("queued");
        assert!(!handle.is_ready());
        assert_eq!(handler.unsent_len(), 1);
    }
}

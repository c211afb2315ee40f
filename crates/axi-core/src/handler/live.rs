//! Live handler: dispatches commands synchronously over a bus connection.

use std::thread;

use crate::{
    AxiFault, Command, ConnectionError, Direction, Handler, HandlerError, RawResult,
    TransactionDescriptor, TransactionResult,
};

/// Blocking access to a device's AXI4-Lite bus.
pub trait Connection {
    /// Writes `data` to consecutive addresses starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the device does not complete the write.
    fn write(&mut self, address: u32, data: &[u32]) -> Result<(), ConnectionError>;

    /// Writes every word of `data` to the same `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the device does not complete the write.
    fn write_repeat(&mut self, address: u32, data: &[u32]) -> Result<(), ConnectionError>;

    /// Reads `length` words from consecutive addresses.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the device does not complete the read.
    fn read(&mut self, address: u32, length: usize) -> Result<Vec<u32>, ConnectionError>;
}

/// Dispatches each command inline and settles it before returning.
#[derive(Debug)]
pub struct LiveHandler<C> {
    connection: C,
}

impl<C: Connection> LiveHandler<C> {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(connection: C) -> Self {
        Self { connection }
    }

    /// Borrows the connection.
    #[must_use]
    pub const fn connection(&self) -> &C {
        &self.connection
    }

    /// Releases the connection.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_inner(self) -> C {
        self.connection
    }

    fn dispatch(&mut self, command: &Command) -> Vec<TransactionResult> {
        let mut results = Vec::with_capacity(command.transactions().len());
        let mut broken = false;
        self.dispatch_into(command, &mut results, &mut broken);
        results
    }

    /// Walks combined commands part by part so batched waits still sleep.
    /// Once a transfer fails, the rest of the top-level command is skipped.
    fn dispatch_into(
        &mut self,
        command: &Command,
        results: &mut Vec<TransactionResult>,
        broken: &mut bool,
    ) {
        if let Some(wait) = command.wait() {
            if !*broken {
                log::debug!("sleeping {:?} for fake wait", wait.sleep);
                thread::sleep(wait.sleep);
            }
            return;
        }
        if !command.sub_commands().is_empty() {
            for part in command.sub_commands() {
                self.dispatch_into(part, results, broken);
            }
            return;
        }
        for transaction in command.transactions() {
            if *broken {
                results.push(Err(AxiFault::NotDispatched));
                continue;
            }
            let result = self.execute(transaction);
            if let Err(AxiFault::Connection(error)) = &result {
                log::warn!(
                    "{} at {:#x} failed: {error}",
                    transaction.direction(),
                    transaction.start_address()
                );
                *broken = true;
            }
            results.push(result);
        }
    }

    fn execute(&mut self, transaction: &TransactionDescriptor) -> TransactionResult {
        let address = transaction.start_address();
        match transaction.direction() {
            Direction::Write => {
                let data = transaction.payload().unwrap_or_default();
                if transaction.constant_address() {
                    self.connection.write_repeat(address, data)?;
                } else {
                    self.connection.write(address, data)?;
                }
                Ok(RawResult::Written)
            }
            Direction::Read => {
                let expected = transaction.length();
                let words = self.connection.read(address, expected)?;
                if words.len() == expected {
                    Ok(RawResult::Read(words))
                } else {
                    Err(AxiFault::ResponseCount {
                        expected,
                        actual: words.len(),
                        description: transaction.description().map(str::to_string),
                    })
                }
            }
        }
    }
}

fn constant_read_address(command: &Command) -> Option<u32> {
    command
        .transactions()
        .iter()
        .find(|transaction| {
            transaction.direction() == Direction::Read && transaction.constant_address()
        })
        .map(TransactionDescriptor::start_address)
}

impl<C: Connection> Handler for LiveHandler<C> {
    /// Dispatches in order. A command containing a constant-address read
    /// never touches the bus: it fails with
    /// [`AxiFault::ConstantAddressRead`], every later command in the batch
    /// fails with [`AxiFault::NotDispatched`], and the error is returned.
    fn send(&mut self, commands: Vec<Command>) -> Result<(), HandlerError> {
        let mut commands = commands.into_iter();
        while let Some(command) = commands.next() {
            if let Some(address) = constant_read_address(&command) {
                log::warn!("{} reads constant address {address:#x}", command.kind_name());
                command.abandon(&AxiFault::ConstantAddressRead { address });
                for skipped in commands {
                    skipped.abandon(&AxiFault::NotDispatched);
                }
                return Err(HandlerError::ConstantAddressRead { address });
            }
            let results = self.dispatch(&command);
            log::trace!("{} dispatched {} transactions", command.kind_name(), results.len());
            command.process_response(results)?;
        }
        Ok(())
    }
}

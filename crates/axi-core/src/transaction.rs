//! Immutable descriptions of AXI4-Lite read and write bursts.

use std::fmt;

use crate::{ConfigError, MAX_ADDRESS};

/// Bus direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Direction {
    /// Slave-to-master data transfer.
    Read,
    /// Master-to-slave data transfer.
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        })
    }
}

/// One or more beats against a start address.
///
/// Beats either walk the address space one word at a time or, with
/// `constant_address`, hammer the same address (FIFO-style registers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDescriptor {
    start_address: u32,
    length: usize,
    direction: Direction,
    constant_address: bool,
    payload: Option<Vec<u32>>,
    description: Option<String>,
}

impl TransactionDescriptor {
    /// Validates and builds a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `length` is zero, the payload does not
    /// match the direction or length, or the burst leaves the 31-bit address
    /// space. Only `start_address` is range-checked for constant-address
    /// bursts.
    pub fn new(
        start_address: u32,
        length: usize,
        direction: Direction,
        payload: Option<Vec<u32>>,
        constant_address: bool,
    ) -> Result<Self, ConfigError> {
        if length == 0 {
            return Err(ConfigError::EmptyTransaction);
        }
        match (direction, payload.as_ref()) {
            (Direction::Read, Some(_)) | (Direction::Write, None) => {
                return Err(ConfigError::PayloadDirection { direction });
            }
            (Direction::Write, Some(words)) if words.len() != length => {
                return Err(ConfigError::PayloadLength {
                    expected: length,
                    actual: words.len(),
                });
            }
            _ => {}
        }
        validate_range(start_address, length, constant_address)?;

        Ok(Self {
            start_address,
            length,
            direction,
            constant_address,
            payload,
            description: None,
        })
    }

    /// Builds a read burst of `length` words.
    ///
    /// # Errors
    ///
    /// See [`TransactionDescriptor::new`].
    pub fn read(
        start_address: u32,
        length: usize,
        constant_address: bool,
    ) -> Result<Self, ConfigError> {
        Self::new(start_address, length, Direction::Read, None, constant_address)
    }

    /// Builds a write burst carrying one word per beat.
    ///
    /// # Errors
    ///
    /// See [`TransactionDescriptor::new`].
    pub fn write(
        start_address: u32,
        payload: Vec<u32>,
        constant_address: bool,
    ) -> Result<Self, ConfigError> {
        Self::new(
            start_address,
            payload.len(),
            Direction::Write,
            Some(payload),
            constant_address,
        )
    }

    /// Attaches a free-form description used in fault messages.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Address of the first beat.
    #[must_use]
    pub const fn start_address(&self) -> u32 {
        self.start_address
    }

    /// Number of beats.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Bus direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether every beat targets `start_address`.
    #[must_use]
    pub const fn constant_address(&self) -> bool {
        self.constant_address
    }

    /// Write payload, present only for writes.
    #[must_use]
    pub fn payload(&self) -> Option<&[u32]> {
        self.payload.as_deref()
    }

    /// Description of the owning command, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Address targeted by beat `index`.
    ///
    /// Construction guarantees the result stays within the address space for
    /// every `index < length`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn beat_address(&self, index: usize) -> u32 {
        if self.constant_address {
            self.start_address
        } else {
            self.start_address + index as u32
        }
    }
}

fn validate_range(
    start_address: u32,
    length: usize,
    constant_address: bool,
) -> Result<(), ConfigError> {
    let start = u64::from(start_address);
    let max = u64::from(MAX_ADDRESS);
    if start > max {
        return Err(ConfigError::AddressOutOfRange { address: start });
    }
    if constant_address {
        return Ok(());
    }
    let last = u64::try_from(length - 1)
        .ok()
        .and_then(|extra| start.checked_add(extra));
    match last {
        Some(last) if last <= max => Ok(()),
        _ => Err(ConfigError::BurstOutOfRange {
            address: start,
            length,
        }),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Direction, TransactionDescriptor};
    use crate::{ConfigError, MAX_ADDRESS};

    #[rstest]
    #[case(0, 1, false, true)]
    #[case(MAX_ADDRESS, 1, false, true)]
    #[case(MAX_ADDRESS, 2, false, false)]
    #[case(MAX_ADDRESS, 64, true, true)]
    #[case(MAX_ADDRESS - 3, 4, false, true)]
    #[case(MAX_ADDRESS - 3, 5, false, false)]
    #[case(MAX_ADDRESS + 1, 1, true, false)]
    fn read_range_validation(
        #[case] address: u32,
        #[case] length: usize,
        #[case] constant: bool,
        #[case] ok: bool,
    ) {
        assert_eq!(
            TransactionDescriptor::read(address, length, constant).is_ok(),
            ok
        );
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(
            TransactionDescriptor::read(0, 0, false),
            Err(ConfigError::EmptyTransaction)
        );
        assert_eq!(
            TransactionDescriptor::write(0, Vec::new(), false),
            Err(ConfigError::EmptyTransaction)
        );
    }

    #[test]
    fn payload_must_match_direction_and_length() {
        assert_eq!(
            TransactionDescriptor::new(0, 1, Direction::Read, Some(vec![1]), false),
            Err(ConfigError::PayloadDirection {
                direction: Direction::Read
            })
        );
        assert_eq!(
            TransactionDescriptor::new(0, 1, Direction::Write, None, false),
            Err(ConfigError::PayloadDirection {
                direction: Direction::Write
            })
        );
        assert_eq!(
            TransactionDescriptor::new(0, 3, Direction::Write, Some(vec![1, 2]), false),
            Err(ConfigError::PayloadLength {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn beat_addresses_increment_unless_constant() {
        let burst = TransactionDescriptor::write(10, vec![1, 2, 3], false).expect("valid burst");
        let addresses: Vec<u32> = (0..burst.length()).map(|i| burst.beat_address(i)).collect();
        assert_eq!(addresses, vec![10, 11, 12]);

        let fifo = TransactionDescriptor::write(10, vec![1, 2, 3], true).expect("valid burst");
        let addresses: Vec<u32> = (0..fifo.length()).map(|i| fifo.beat_address(i)).collect();
        assert_eq!(addresses, vec![10, 10, 10]);
    }

    #[test]
    fn accessors_expose_construction_inputs() {
        let write = TransactionDescriptor::write(4, vec![9], false)
            .expect("valid write")
            .with_description(Some("poke".into()));
        assert_eq!(write.direction(), Direction::Write);
        assert_eq!(write.payload(), Some(&[9][..]));
        assert_eq!(write.description(), Some("poke"));
        assert!(!write.constant_address());

        let read = TransactionDescriptor::read(4, 2, true).expect("valid read");
        assert_eq!(read.payload(), None);
        assert_eq!(read.start_address(), 4);
        assert!(read.constant_address());
    }
}

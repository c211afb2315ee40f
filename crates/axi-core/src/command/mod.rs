//! Typed register operations built from transaction descriptors.
//!
//! A [`Command`] owns its transactions, the [`DeferredResult`] handed back to
//! callers, and the rule that turns raw per-transaction results into a
//! [`Value`]. Built-in kinds cover boolean, unsigned and signed register
//! access, triggers, waits and combined batches; module-specific composite
//! operations plug in through [`Decode`].

/// Raw transaction results and the decoding seam.
pub mod decode;

use std::time::Duration;

pub use decode::{
    first_fault, read_word, read_words, Decode, Decoded, RawResult, TransactionResult,
};

use crate::{
    AxiFault, ConfigError, DeferredResult, FromValue, HandlerError, ResultState,
    TransactionDescriptor, Value,
};

const WORD_SPAN: i64 = 1 << 32;

/// Longest fake wait, in clock cycles, a command may request.
pub const MAX_IDLE_CYCLES: usize = 1 << 24;

/// Pacing request carried by a fake-wait command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wait {
    /// Idle cycles inserted by the simulation handler.
    pub clock_cycles: usize,
    /// Real time slept by the live handler.
    pub sleep: Duration,
}

#[derive(Debug)]
enum CommandKind {
    GetBoolean,
    SetBoolean,
    GetUnsigned,
    GetUnsigneds,
    SetUnsigned,
    SetUnsigneds,
    SetSigned,
    Trigger,
    FakeWait(Wait),
    Combined(Vec<Command>),
    Custom(Box<dyn Decode>),
}

impl CommandKind {
    const fn name(&self) -> &'static str {
        match self {
            Self::GetBoolean => "get_boolean",
            Self::SetBoolean => "set_boolean",
            Self::GetUnsigned => "get_unsigned",
            Self::GetUnsigneds => "get_unsigneds",
            Self::SetUnsigned => "set_unsigned",
            Self::SetUnsigneds => "set_unsigneds",
            Self::SetSigned => "set_signed",
            Self::Trigger => "trigger",
            Self::FakeWait(_) => "fake_wait",
            Self::Combined(_) => "combined",
            Self::Custom(_) => "custom",
        }
    }
}

/// A register operation awaiting dispatch.
#[derive(Debug)]
pub struct Command {
    kind: CommandKind,
    transactions: Vec<TransactionDescriptor>,
    result: DeferredResult,
    description: Option<String>,
}

impl Command {
    fn leaf(kind: CommandKind, transaction: TransactionDescriptor) -> Self {
        Self {
            kind,
            transactions: vec![transaction],
            result: DeferredResult::pending(),
            description: None,
        }
    }

    /// Reads a boolean register.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `address` is outside the address space.
    pub fn get_boolean(address: u32) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::GetBoolean,
            TransactionDescriptor::read(address, 1, false)?,
        ))
    }

    /// Writes a boolean register as 1 or 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `address` is outside the address space.
    pub fn set_boolean(value: bool, address: u32) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::SetBoolean,
            TransactionDescriptor::write(address, vec![u32::from(value)], false)?,
        ))
    }

    /// Reads one 32-bit register.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `address` is outside the address space.
    pub fn get_unsigned(address: u32) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::GetUnsigned,
            TransactionDescriptor::read(address, 1, false)?,
        ))
    }

    /// Reads `length` words, incrementing the address unless `constant_address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty or out-of-range burst.
    pub fn get_unsigneds(
        address: u32,
        length: usize,
        constant_address: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::GetUnsigneds,
            TransactionDescriptor::read(address, length, constant_address)?,
        ))
    }

    /// Writes one 32-bit register.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValueOutOfRange`] unless `0 <= value < 2^32`,
    /// or a range error for `address`.
    pub fn set_unsigned(value: i64, address: u32) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::SetUnsigned,
            TransactionDescriptor::write(address, vec![to_word(value)?], false)?,
        ))
    }

    /// Writes a burst of 32-bit words.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValueOutOfRange`] for any value outside
    /// `0..2^32`, or a range error for the burst.
    pub fn set_unsigneds(
        values: &[i64],
        address: u32,
        constant_address: bool,
    ) -> Result<Self, ConfigError> {
        let words = values
            .iter()
            .map(|value| to_word(*value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::leaf(
            CommandKind::SetUnsigneds,
            TransactionDescriptor::write(address, words, constant_address)?,
        ))
    }

    /// Writes a two's-complement value (negative values gain `2^32`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValueOutOfRange`] when the converted value does
    /// not fit in 32 bits.
    pub fn set_signed(value: i64, address: u32) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::SetSigned,
            TransactionDescriptor::write(address, vec![signed_to_word(value)?], false)?,
        ))
    }

    /// Writes a burst of two's-complement values.
    ///
    /// # Errors
    ///
    /// See [`Command::set_signed`] and [`Command::set_unsigneds`].
    pub fn set_signeds(
        values: &[i64],
        address: u32,
        constant_address: bool,
    ) -> Result<Self, ConfigError> {
        let words = values
            .iter()
            .map(|value| signed_to_word(*value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::leaf(
            CommandKind::SetSigned,
            TransactionDescriptor::write(address, words, constant_address)?,
        ))
    }

    /// Writes 0 to `address` to kick off a hardware action.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `address` is outside the address space.
    pub fn trigger(address: u32) -> Result<Self, ConfigError> {
        Ok(Self::leaf(
            CommandKind::Trigger,
            TransactionDescriptor::write(address, vec![0], false)?,
        ))
    }

    /// Pads the simulation by idle cycles, or sleeps on live hardware.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooManyCycles`] past [`MAX_IDLE_CYCLES`].
    pub fn fake_wait(clock_cycles: usize, sleep: Duration) -> Result<Self, ConfigError> {
        if clock_cycles > MAX_IDLE_CYCLES {
            return Err(ConfigError::TooManyCycles {
                cycles: clock_cycles,
                limit: MAX_IDLE_CYCLES,
            });
        }
        Ok(Self {
            kind: CommandKind::FakeWait(Wait {
                clock_cycles,
                sleep,
            }),
            transactions: Vec::new(),
            result: DeferredResult::pending(),
            description: None,
        })
    }

    /// Batches commands; the value is the list of sub-results.
    ///
    /// Sub-command handles obtained before batching are resolved too.
    #[must_use]
    pub fn combined(commands: Vec<Self>) -> Self {
        let transactions = commands
            .iter()
            .flat_map(|command| command.transactions.iter().cloned())
            .collect();
        Self {
            kind: CommandKind::Combined(commands),
            transactions,
            result: DeferredResult::pending(),
            description: None,
        }
    }

    /// Wraps caller-built transactions with a custom decoder.
    #[must_use]
    pub fn custom(
        transactions: Vec<TransactionDescriptor>,
        decoder: impl Decode + 'static,
    ) -> Self {
        Self {
            kind: CommandKind::Custom(Box::new(decoder)),
            transactions,
            result: DeferredResult::pending(),
            description: None,
        }
    }

    /// Attaches a description used in logs and fault messages.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !matches!(self.kind, CommandKind::Combined(_)) {
            self.transactions = self
                .transactions
                .into_iter()
                .map(|transaction| transaction.with_description(Some(description.clone())))
                .collect();
        }
        self.description = Some(description);
        self
    }

    /// Transactions in dispatch order.
    #[must_use]
    pub fn transactions(&self) -> &[TransactionDescriptor] {
        &self.transactions
    }

    /// Total beats across all transactions.
    #[must_use]
    pub fn beat_count(&self) -> usize {
        self.transactions
            .iter()
            .map(TransactionDescriptor::length)
            .sum()
    }

    /// Pacing request when this is a fake-wait command.
    #[must_use]
    pub const fn wait(&self) -> Option<Wait> {
        match self.kind {
            CommandKind::FakeWait(wait) => Some(wait),
            _ => None,
        }
    }

    /// Batched commands of a combined command, in order; empty otherwise.
    #[must_use]
    pub fn sub_commands(&self) -> &[Self] {
        match &self.kind {
            CommandKind::Combined(commands) => commands.as_slice(),
            _ => &[],
        }
    }

    /// Short operation name for logs.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Untyped handle onto the result.
    #[must_use]
    pub fn result(&self) -> DeferredResult {
        self.result.clone()
    }

    /// Typed handle onto the result.
    #[must_use]
    pub fn handle<T: FromValue>(&self) -> DeferredResult<T> {
        self.result.typed()
    }

    /// Settles the result from one entry per transaction.
    ///
    /// The first transaction fault wins; otherwise the decoder's fault or
    /// value settles the result. Combined commands keep their partial list
    /// even when failing.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::AlreadyResolved`] when called twice; the
    /// stored result is left untouched.
    pub fn process_response(&self, results: Vec<TransactionResult>) -> Result<(), HandlerError> {
        let results = self.normalize(results);
        self.settle(&results).map(|_| ())
    }

    /// Fails every unsettled handle of this command, sub-commands included,
    /// without decoding. Used when responses can no longer be paired.
    pub(crate) fn abandon(&self, fault: &AxiFault) {
        for command in self.sub_commands() {
            command.abandon(fault);
        }
        let outcome = ResultState::Failed {
            fault: fault.clone(),
            partial: None,
        };
        if self.result.settle(outcome).is_ok() {
            log::debug!("{} abandoned: {fault}", self.kind_name());
        }
    }

    fn normalize(&self, mut results: Vec<TransactionResult>) -> Vec<TransactionResult> {
        let expected = self.transactions.len();
        if results.len() != expected {
            log::warn!(
                "{} received {} results for {} transactions",
                self.kind_name(),
                results.len(),
                expected
            );
            let fault = AxiFault::ResponseCount {
                expected,
                actual: results.len(),
                description: self.description.clone(),
            };
            results.resize(expected, Err(fault));
        }
        results
    }

    fn settle(&self, results: &[TransactionResult]) -> Result<Decoded, HandlerError> {
        if self.result.is_ready() {
            return Err(HandlerError::AlreadyResolved);
        }
        let description = self.description();
        let decoded = match &self.kind {
            CommandKind::Combined(commands) => decode_combined(commands, results)?,
            CommandKind::Custom(decoder) => decoder.decode(results, description),
            kind => decode_builtin(kind, results, description),
        };
        let fault = first_fault(results).or(decoded.fault);
        let outcome = match (fault.clone(), decoded.value.clone()) {
            (Some(fault), partial) => ResultState::Failed { fault, partial },
            (None, Some(value)) => ResultState::Resolved(value),
            (None, None) => ResultState::Failed {
                fault: decode::malformed("decoder produced no value".into(), description),
                partial: None,
            },
        };
        log::trace!("{} settled: {:?}", self.kind_name(), outcome);
        self.result
            .settle(outcome)
            .map_err(|_| HandlerError::AlreadyResolved)?;
        Ok(Decoded {
            fault,
            value: decoded.value,
        })
    }
}

fn to_word(value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| ConfigError::ValueOutOfRange { value })
}

fn signed_to_word(value: i64) -> Result<u32, ConfigError> {
    let shifted = if value < 0 {
        value.checked_add(WORD_SPAN)
    } else {
        Some(value)
    };
    shifted
        .and_then(|word| u32::try_from(word).ok())
        .ok_or(ConfigError::ValueOutOfRange { value })
}

fn decode_builtin(
    kind: &CommandKind,
    results: &[TransactionResult],
    description: Option<&str>,
) -> Decoded {
    let decoded = match kind {
        CommandKind::GetBoolean => read_word(results, 0, description).and_then(|raw| match raw {
            1 => Ok(Value::Bool(true)),
            0 => Ok(Value::Bool(false)),
            raw => Err(AxiFault::UnexpectedBoolean {
                raw,
                description: description.map(str::to_string),
            }),
        }),
        CommandKind::GetUnsigned => read_word(results, 0, description).map(Value::Unsigned),
        CommandKind::GetUnsigneds => {
            read_words(results, 0, description).map(|words| Value::Unsigneds(words.to_vec()))
        }
        CommandKind::SetBoolean
        | CommandKind::SetUnsigned
        | CommandKind::SetUnsigneds
        | CommandKind::SetSigned
        | CommandKind::Trigger => decode_writes(results, description),
        CommandKind::FakeWait(_) | CommandKind::Combined(_) | CommandKind::Custom(_) => {
            Ok(Value::Unit)
        }
    };
    decoded.map_or_else(Decoded::fault, Decoded::value)
}

fn decode_writes(results: &[TransactionResult], description: Option<&str>) -> Result<Value, AxiFault> {
    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(RawResult::Written) => {}
            Ok(RawResult::Read(_)) => {
                return Err(decode::malformed(
                    format!("transaction {index} returned read data for a write"),
                    description,
                ));
            }
            Err(fault) => return Err(fault.clone()),
        }
    }
    Ok(Value::Unit)
}

fn decode_combined(
    commands: &[Command],
    results: &[TransactionResult],
) -> Result<Decoded, HandlerError> {
    let mut offset = 0;
    let mut fault = None;
    let mut values = Vec::with_capacity(commands.len());
    for command in commands {
        let end = offset + command.transactions.len();
        let slice = results.get(offset..end).unwrap_or_default();
        offset = end;
        let part = command.settle(slice)?;
        if fault.is_none() {
            fault = part.fault;
        }
        values.push(part.value);
    }
    Ok(Decoded {
        fault,
        value: Some(Value::List(values)),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::{Command, Decode, Decoded, RawResult, TransactionResult};
    use crate::{
        AxiFault, ConfigError, Direction, HandlerError, ResponseCode, ResultError, ResultState,
        TransactionDescriptor, Value,
    };

    fn decerr_read() -> AxiFault {
        AxiFault::BadResponse {
            direction: Direction::Read,
            code: ResponseCode::DecErr,
            description: None,
        }
    }

    #[rstest]
    #[case(1, Some(true))]
    #[case(0, Some(false))]
    #[case(2, None)]
    #[case(u32::MAX, None)]
    fn boolean_decode(#[case] raw: u32, #[case] expected: Option<bool>) {
        let command = Command::get_boolean(3).expect("valid command");
        let handle = command.handle::<bool>();
        command
            .process_response(vec![Ok(RawResult::Read(vec![raw]))])
            .expect("first response");
        match expected {
            Some(flag) => assert_eq!(handle.value(), Ok(flag)),
            None => {
                assert!(matches!(
                    handle.fault(),
                    Some(AxiFault::UnexpectedBoolean { raw: r, .. }) if r == raw
                ));
                assert_eq!(handle.partial(), None);
            }
        }
    }

    #[rstest]
    #[case(0, true)]
    #[case(i64::from(u32::MAX), true)]
    #[case(i64::from(u32::MAX) + 1, false)]
    #[case(-1, false)]
    fn unsigned_range_is_checked_at_construction(#[case] value: i64, #[case] ok: bool) {
        assert_eq!(Command::set_unsigned(value, 0).is_ok(), ok);
        assert_eq!(Command::set_unsigneds(&[1, value], 0, false).is_ok(), ok);
    }

    #[test]
    fn signed_values_are_written_in_twos_complement() {
        let command = Command::set_signed(-1, 5).expect("valid command");
        assert_eq!(command.transactions()[0].payload(), Some(&[u32::MAX][..]));

        let burst = Command::set_signeds(&[-2, 7], 5, false).expect("valid command");
        assert_eq!(
            burst.transactions()[0].payload(),
            Some(&[u32::MAX - 1, 7][..])
        );

        assert_eq!(
            Command::set_signed(-(1 << 33), 0).err(),
            Some(ConfigError::ValueOutOfRange { value: -(1 << 33) })
        );
    }

    #[test]
    fn trigger_and_boolean_writes_have_fixed_payloads() {
        let trigger = Command::trigger(9).expect("valid command");
        assert_eq!(trigger.transactions()[0].payload(), Some(&[0][..]));
        assert_eq!(trigger.kind_name(), "trigger");

        let on = Command::set_boolean(true, 9).expect("valid command");
        assert_eq!(on.transactions()[0].payload(), Some(&[1][..]));
        let off = Command::set_boolean(false, 9).expect("valid command");
        assert_eq!(off.transactions()[0].payload(), Some(&[0][..]));
    }

    #[test]
    fn get_unsigneds_passes_words_through() {
        let command = Command::get_unsigneds(0, 3, false).expect("valid command");
        let handle = command.handle::<Vec<u32>>();
        command
            .process_response(vec![Ok(RawResult::Read(vec![4, 5, 6]))])
            .expect("first response");
        assert_eq!(handle.value(), Ok(vec![4, 5, 6]));
    }

    #[test]
    fn transaction_fault_wins_over_decode() {
        let command = Command::get_unsigned(0).expect("valid command");
        command
            .process_response(vec![Err(decerr_read())])
            .expect("first response");
        assert_eq!(
            command.handle::<u32>().value(),
            Err(ResultError::Fault(decerr_read()))
        );
    }

    #[test]
    fn second_process_response_leaves_state_unchanged() {
        let command = Command::get_unsigned(0).expect("valid command");
        command
            .process_response(vec![Ok(RawResult::Read(vec![27]))])
            .expect("first response");
        let before = command.result().state();
        assert_eq!(
            command.process_response(vec![Ok(RawResult::Read(vec![99]))]),
            Err(HandlerError::AlreadyResolved)
        );
        assert_eq!(command.result().state(), before);
        assert_eq!(before, ResultState::Resolved(Value::Unsigned(27)));
    }

    #[test]
    fn combined_keeps_partial_results_alongside_first_fault() {
        let write = Command::set_unsigned(1, 0).expect("valid command");
        let read = Command::get_unsigned(1).expect("valid command");
        let write_handle = write.handle::<()>();
        let read_handle = read.handle::<u32>();
        let combined = Command::combined(vec![write, read]);
        assert_eq!(combined.transactions().len(), 2);

        combined
            .process_response(vec![Ok(RawResult::Written), Err(decerr_read())])
            .expect("first response");

        assert_eq!(combined.result().fault(), Some(decerr_read()));
        assert_eq!(
            combined.result().partial(),
            Some(Value::List(vec![Some(Value::Unit), None]))
        );
        assert_eq!(write_handle.value(), Ok(()));
        assert_eq!(read_handle.fault(), Some(decerr_read()));
    }

    #[test]
    fn combined_reports_first_decode_fault_in_order() {
        let flag = Command::get_boolean(0).expect("valid command");
        let word = Command::get_unsigned(1).expect("valid command");
        let combined = Command::combined(vec![flag, word]);
        combined
            .process_response(vec![
                Ok(RawResult::Read(vec![3])),
                Ok(RawResult::Read(vec![42])),
            ])
            .expect("first response");
        assert!(matches!(
            combined.result().fault(),
            Some(AxiFault::UnexpectedBoolean { raw: 3, .. })
        ));
        assert_eq!(
            combined.result().partial(),
            Some(Value::List(vec![None, Some(Value::Unsigned(42))]))
        );
    }

    #[test]
    fn missing_results_are_padded_with_count_faults() {
        let command = Command::set_unsigneds(&[1, 2], 0, false).expect("valid command");
        let combined = Command::combined(vec![command, Command::get_unsigned(4).expect("valid")]);
        combined
            .process_response(vec![Ok(RawResult::Written)])
            .expect("first response");
        assert!(matches!(
            combined.result().fault(),
            Some(AxiFault::ResponseCount {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn fake_wait_resolves_without_transactions() {
        let wait = Command::fake_wait(4, Duration::ZERO).expect("short wait");
        assert!(wait.transactions().is_empty());
        assert_eq!(wait.wait().map(|w| w.clock_cycles), Some(4));
        wait.process_response(Vec::new()).expect("first response");
        assert_eq!(wait.handle::<()>().value(), Ok(()));
    }

    #[test]
    fn oversized_wait_is_rejected_at_construction() {
        assert_eq!(
            Command::fake_wait(usize::MAX, Duration::ZERO).err(),
            Some(ConfigError::TooManyCycles {
                cycles: usize::MAX,
                limit: super::MAX_IDLE_CYCLES,
            })
        );
        assert!(Command::fake_wait(super::MAX_IDLE_CYCLES, Duration::ZERO).is_ok());
    }

    #[test]
    fn abandon_fails_combined_and_its_parts() {
        let read = Command::get_unsigned(1).expect("valid command");
        let read_handle = read.handle::<u32>();
        let combined = Command::combined(vec![read]);
        let fault = AxiFault::Desynchronized { description: None };
        combined.abandon(&fault);

        assert_eq!(combined.result().fault(), Some(fault.clone()));
        assert_eq!(read_handle.value(), Err(ResultError::Fault(fault)));
        assert_eq!(
            combined.process_response(Vec::new()),
            Err(HandlerError::AlreadyResolved)
        );
    }

    #[test]
    fn description_propagates_into_faults() {
        let command = Command::get_boolean(0)
            .expect("valid command")
            .with_description("had_error");
        assert_eq!(command.transactions()[0].description(), Some("had_error"));
        command
            .process_response(vec![Ok(RawResult::Read(vec![9]))])
            .expect("first response");
        let message = command.result().fault().expect("fault").to_string();
        assert!(message.contains("had_error"));
    }

    #[derive(Debug)]
    struct ThirdWord;

    impl Decode for ThirdWord {
        fn decode(&self, results: &[TransactionResult], description: Option<&str>) -> Decoded {
            super::read_word(results, 2, description)
                .map_or_else(Decoded::fault, |word| Decoded::value(Value::Unsigned(word)))
        }
    }

    #[test]
    fn custom_decoder_sees_all_transactions() {
        let transactions = vec![
            TransactionDescriptor::write(0, vec![2], false).expect("valid"),
            TransactionDescriptor::write(1, vec![3], false).expect("valid"),
            TransactionDescriptor::read(2, 1, false).expect("valid"),
        ];
        let command = Command::custom(transactions, ThirdWord);
        command
            .process_response(vec![
                Ok(RawResult::Written),
                Ok(RawResult::Written),
                Ok(RawResult::Read(vec![5])),
            ])
            .expect("first response");
        assert_eq!(command.handle::<u32>().value(), Ok(5));
        assert_eq!(command.beat_count(), 3);
    }
}

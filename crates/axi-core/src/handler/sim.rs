//! Simulation handler: commands in, per-cycle M2S records out, S2M records back.

use std::collections::VecDeque;
use std::iter;
use std::slice;

use crate::{
    AxiFault, Command, Direction, Handler, HandlerError, M2s, RawResult, S2m,
    TransactionDescriptor, TransactionResult,
};

/// Buffers commands for a cycle-accurate simulation run.
///
/// `send` only queues. `render` turns queued commands into one M2S record
/// per beat and parks them as sent; `consume` walks the S2M trace from the
/// same run and settles sent commands in FIFO order.
#[derive(Debug, Default)]
pub struct SimHandler {
    unsent: VecDeque<Command>,
    sent: VecDeque<Command>,
}

impl SimHandler {
    /// Creates a handler with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands waiting to be rendered.
    #[must_use]
    pub fn unsent_len(&self) -> usize {
        self.unsent.len()
    }

    /// Rendered commands waiting for responses.
    #[must_use]
    pub fn sent_len(&self) -> usize {
        self.sent.len()
    }

    /// Returns `true` when both queues are empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.unsent.is_empty() && self.sent.is_empty()
    }

    /// Drains the unsent queue into M2S records.
    ///
    /// Fake waits become idle cycles, including waits batched inside a
    /// combined command; every other beat gets exactly one record.
    pub fn render(&mut self) -> Vec<M2s> {
        let mut cycles = Vec::new();
        let mut rendered = 0_usize;
        while let Some(command) = self.unsent.pop_front() {
            emit(&command, &mut cycles);
            self.sent.push_back(command);
            rendered += 1;
        }
        log::debug!("rendered {rendered} commands into {} cycles", cycles.len());
        cycles
    }

    /// Matches S2M records against sent commands and settles them.
    ///
    /// Reads and writes share one cursor: each beat pulls cycles until one
    /// carries the expected valid flag. Cycles left over after the last
    /// command are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::OutOfSync`] when the trace runs out while a
    /// command still awaits a response. Requests and responses can no longer
    /// be paired, so that command and every later sent command fail with
    /// [`AxiFault::Desynchronized`] and leave the queue; later runs start
    /// from a clean slate.
    pub fn consume(&mut self, responses: &[S2m]) -> Result<(), HandlerError> {
        let mut cursor = responses.iter();
        let mut settled = 0_usize;
        while let Some(command) = self.sent.pop_front() {
            let Some(results) = collect(&command, &mut cursor) else {
                let description = command.description().map(str::to_string);
                log::warn!(
                    "response trace ran dry on {} after {settled} commands",
                    command.kind_name()
                );
                let pending = self.abandon_from(command);
                return Err(HandlerError::OutOfSync {
                    pending,
                    description,
                });
            };
            log::trace!(
                "{} consumed {} transaction results",
                command.kind_name(),
                results.len()
            );
            command.process_response(results)?;
            settled += 1;
        }
        let trailing = cursor.len();
        if trailing > 0 {
            log::debug!("ignoring {trailing} trailing response cycles");
        }
        log::debug!("consumed responses for {settled} commands");
        Ok(())
    }

    fn abandon_from(&mut self, starved: Command) -> usize {
        let abandoned: Vec<Command> = iter::once(starved).chain(self.sent.drain(..)).collect();
        for command in &abandoned {
            command.abandon(&AxiFault::Desynchronized {
                description: command.description().map(str::to_string),
            });
        }
        abandoned.len()
    }
}

impl Handler for SimHandler {
    fn send(&mut self, commands: Vec<Command>) -> Result<(), HandlerError> {
        log::debug!("queued {} commands", commands.len());
        self.unsent.extend(commands);
        Ok(())
    }
}

fn emit(command: &Command, cycles: &mut Vec<M2s>) {
    if let Some(wait) = command.wait() {
        cycles.extend(iter::repeat_n(M2s::IDLE, wait.clock_cycles));
    } else if command.sub_commands().is_empty() {
        for transaction in command.transactions() {
            cycles.extend(beats(transaction));
        }
    } else {
        for part in command.sub_commands() {
            emit(part, cycles);
        }
    }
}

fn beats(transaction: &TransactionDescriptor) -> impl Iterator<Item = M2s> + '_ {
    (0..transaction.length()).map(move |beat| {
        let address = transaction.beat_address(beat);
        match transaction.direction() {
            Direction::Read => M2s::read_beat(address),
            Direction::Write => {
                let data = transaction
                    .payload()
                    .and_then(|words| words.get(beat))
                    .copied()
                    .unwrap_or_default();
                M2s::write_beat(address, data)
            }
        }
    })
}

fn collect(command: &Command, cursor: &mut slice::Iter<'_, S2m>) -> Option<Vec<TransactionResult>> {
    command
        .transactions()
        .iter()
        .map(|transaction| transaction_result(transaction, cursor))
        .collect()
}

fn transaction_result(
    transaction: &TransactionDescriptor,
    cursor: &mut slice::Iter<'_, S2m>,
) -> Option<TransactionResult> {
    let direction = transaction.direction();
    let mut failure = None;
    let mut words = Vec::new();
    for _ in 0..transaction.length() {
        let (code, data) = match direction {
            Direction::Write => {
                let cycle = cursor.find(|cycle| cycle.bvalid)?;
                (cycle.bresp, None)
            }
            Direction::Read => {
                let cycle = cursor.find(|cycle| cycle.rvalid)?;
                (cycle.rresp, Some(cycle.rdata))
            }
        };
        if !code.is_okay() && failure.is_none() {
            failure = Some(code);
        }
        words.extend(data);
    }
    Some(match (failure, direction) {
        (Some(code), _) => Err(AxiFault::BadResponse {
            direction,
            code,
            description: transaction.description().map(str::to_string),
        }),
        (None, Direction::Write) => Ok(RawResult::Written),
        (None, Direction::Read) => Ok(RawResult::Read(words)),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SimHandler;
    use crate::{
        AxiFault, Command, Direction, Handler, HandlerError, M2s, ResponseCode, ResultError, S2m,
        Value,
    };

    fn ok_write() -> S2m {
        S2m::write_response(ResponseCode::Okay)
    }

    fn ok_read(data: u32) -> S2m {
        S2m::read_response(ResponseCode::Okay, data)
    }

    #[test]
    fn render_emits_one_record_per_beat() {
        let mut handler = SimHandler::new();
        handler
            .send(vec![
                Command::set_unsigneds(&[5, 6], 10, false).expect("valid"),
                Command::get_unsigneds(20, 3, true).expect("valid"),
            ])
            .expect("queued");
        assert_eq!(handler.unsent_len(), 2);

        let cycles = handler.render();
        assert_eq!(
            cycles,
            vec![
                M2s::write_beat(10, 5),
                M2s::write_beat(11, 6),
                M2s::read_beat(20),
                M2s::read_beat(20),
                M2s::read_beat(20),
            ]
        );
        assert_eq!(handler.unsent_len(), 0);
        assert_eq!(handler.sent_len(), 2);
    }

    #[test]
    fn fake_wait_renders_idle_cycles() {
        let mut handler = SimHandler::new();
        handler
            .send_one(Command::fake_wait(3, Duration::from_secs(1)).expect("short wait"))
            .expect("queued");
        assert_eq!(handler.render(), vec![M2s::IDLE; 3]);

        handler.consume(&[]).expect("waits need no responses");
        assert!(handler.is_idle());
    }

    #[test]
    fn waits_inside_combined_commands_render_in_place() {
        let mut handler = SimHandler::new();
        let combined = Command::combined(vec![
            Command::set_unsigned(1, 0).expect("valid"),
            Command::fake_wait(2, Duration::ZERO).expect("short wait"),
            Command::get_unsigned(0).expect("valid"),
        ]);
        let handle = combined.result();
        handler.send_one(combined).expect("queued");

        assert_eq!(
            handler.render(),
            vec![M2s::write_beat(0, 1), M2s::IDLE, M2s::IDLE, M2s::read_beat(0)]
        );
        handler.consume(&[ok_write(), ok_read(1)]).expect("in sync");
        assert_eq!(
            handle.value(),
            Ok(Value::List(vec![
                Some(Value::Unit),
                Some(Value::Unit),
                Some(Value::Unsigned(1)),
            ]))
        );
    }

    #[test]
    fn consume_skips_cycles_without_the_expected_flag() {
        let mut handler = SimHandler::new();
        let read = Command::get_unsigned(2).expect("valid");
        let handle = read.handle::<u32>();
        handler.send_one(read).expect("queued");
        handler.render();

        handler
            .consume(&[S2m::IDLE, ok_write(), S2m::IDLE, ok_read(27), ok_read(99)])
            .expect("in sync");
        assert_eq!(handle.value(), Ok(27));
        assert!(handler.is_idle());
    }

    #[test]
    fn bad_write_response_faults_the_command() {
        let mut handler = SimHandler::new();
        let write = Command::set_unsigned(1, 0)
            .expect("valid")
            .with_description("poke");
        let handle = write.handle::<()>();
        handler.send_one(write).expect("queued");
        handler.render();

        handler
            .consume(&[S2m::write_response(ResponseCode::SlvErr)])
            .expect("in sync");
        assert_eq!(
            handle.value(),
            Err(ResultError::Fault(AxiFault::BadResponse {
                direction: Direction::Write,
                code: ResponseCode::SlvErr,
                description: Some("poke".into()),
            }))
        );
    }

    #[test]
    fn burst_fault_uses_first_bad_code_but_consumes_every_beat() {
        let mut handler = SimHandler::new();
        let burst = Command::get_unsigneds(0, 3, false).expect("valid");
        let next = Command::get_unsigned(9).expect("valid");
        let burst_handle = burst.handle::<Vec<u32>>();
        let next_handle = next.handle::<u32>();
        handler.send(vec![burst, next]).expect("queued");
        handler.render();

        handler
            .consume(&[
                ok_read(1),
                S2m::read_response(ResponseCode::DecErr, 0),
                S2m::read_response(ResponseCode::SlvErr, 0),
                ok_read(4),
            ])
            .expect("in sync");
        assert!(matches!(
            burst_handle.fault(),
            Some(AxiFault::BadResponse {
                code: ResponseCode::DecErr,
                ..
            })
        ));
        assert_eq!(next_handle.value(), Ok(4));
    }

    #[test]
    fn running_dry_fails_every_unanswered_command() {
        let mut handler = SimHandler::new();
        let first = Command::set_unsigned(1, 0).expect("valid");
        let second = Command::get_unsigned(0)
            .expect("valid")
            .with_description("read back");
        let third = Command::trigger(1).expect("valid");
        let first_handle = first.handle::<()>();
        let second_handle = second.handle::<u32>();
        let third_handle = third.handle::<()>();
        handler.send(vec![first, second, third]).expect("queued");
        handler.render();

        let error = handler.consume(&[ok_write()]).expect_err("trace too short");
        assert_eq!(
            error,
            HandlerError::OutOfSync {
                pending: 2,
                description: Some("read back".into()),
            }
        );
        assert_eq!(first_handle.value(), Ok(()));
        assert_eq!(
            second_handle.value(),
            Err(ResultError::Fault(AxiFault::Desynchronized {
                description: Some("read back".into()),
            }))
        );
        assert!(matches!(
            third_handle.fault(),
            Some(AxiFault::Desynchronized { description: None })
        ));
        assert!(handler.is_idle());
    }

    #[test]
    fn stale_commands_never_pair_with_a_later_run() {
        let mut handler = SimHandler::new();
        let stale = Command::get_unsigned(1).expect("valid");
        let stale_handle = stale.handle::<u32>();
        handler
            .send(vec![Command::set_unsigned(11, 1).expect("valid"), stale])
            .expect("queued");
        handler.render();
        assert!(handler.consume(&[ok_write()]).is_err());

        let fresh = Command::get_unsigned(5).expect("valid");
        let fresh_handle = fresh.handle::<u32>();
        handler.send_one(fresh).expect("queued");
        assert_eq!(handler.render(), vec![M2s::read_beat(5)]);
        handler.consume(&[ok_read(55)]).expect("in sync");

        assert!(matches!(
            stale_handle.fault(),
            Some(AxiFault::Desynchronized { .. })
        ));
        assert_eq!(fresh_handle.value(), Ok(55));
        assert!(handler.is_idle());
    }

    #[test]
    fn reads_and_writes_share_one_response_cursor() {
        let mut handler = SimHandler::new();
        let write = Command::set_unsigned(7, 0).expect("valid");
        let read = Command::get_unsigned(0).expect("valid");
        let read_handle = read.handle::<u32>();
        handler.send(vec![write, read]).expect("queued");
        handler.render();

        let both = S2m {
            bvalid: true,
            rvalid: true,
            rdata: 11,
            ..S2m::IDLE
        };
        let error = handler.consume(&[both]).expect_err("read needs its own cycle");
        assert!(matches!(error, HandlerError::OutOfSync { pending: 1, .. }));
        assert!(matches!(
            read_handle.fault(),
            Some(AxiFault::Desynchronized { .. })
        ));
    }
}

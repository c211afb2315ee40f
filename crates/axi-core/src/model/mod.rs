//! Behavioural AXI4-Lite slaves for driving simulation traces without HDL.

/// Slave that rejects every request.
pub mod fail;
/// Array of 32-bit registers with fixed response latency.
pub mod register_file;

pub use fail::FailModel;
pub use register_file::{
    RegisterFileConfig, RegisterFileModel, DEFAULT_LATENCY_CYCLES, MAX_REGISTERS,
};

use std::collections::VecDeque;

use crate::{M2s, S2m};

/// Cycle-stepped slave.
pub trait SlaveModel {
    /// Returns the model to its power-on state.
    fn reset(&mut self);

    /// Advances one clock cycle with `input` on the bus.
    fn step(&mut self, input: &M2s) -> S2m;
}

/// Steps `model` once per input record, returning one S2M record each.
pub fn drive<M: SlaveModel + ?Sized>(model: &mut M, inputs: &[M2s]) -> Vec<S2m> {
    let responses: Vec<S2m> = inputs.iter().map(|input| model.step(input)).collect();
    log::trace!("drove {} cycles", responses.len());
    responses
}

/// Fixed-length delay line used by models to answer `latency` cycles late.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DelayLine {
    latency: usize,
    slots: VecDeque<S2m>,
}

impl DelayLine {
    fn new(latency: usize) -> Self {
        let mut line = Self {
            latency,
            slots: VecDeque::with_capacity(latency.saturating_add(1)),
        };
        line.clear();
        line
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.slots.resize(self.latency, S2m::IDLE);
    }

    fn shift(&mut self, response: S2m) -> S2m {
        self.slots.push_back(response);
        self.slots.pop_front().unwrap_or(S2m::IDLE)
    }
}

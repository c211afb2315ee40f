use super::{DelayLine, SlaveModel};
use crate::{M2s, ResponseCode, S2m};

/// Answers every read and write with `DECERR` one cycle later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailModel {
    line: DelayLine,
}

impl FailModel {
    /// Creates the model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            line: DelayLine::new(1),
        }
    }
}

impl Default for FailModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SlaveModel for FailModel {
    fn reset(&mut self) {
        self.line.clear();
    }

    fn step(&mut self, input: &M2s) -> S2m {
        let mut response = S2m::IDLE;
        if input.awvalid && input.wvalid {
            response.bvalid = true;
            response.bresp = ResponseCode::DecErr;
        }
        if input.arvalid {
            response.rvalid = true;
            response.rresp = ResponseCode::DecErr;
        }
        self.line.shift(response)
    }
}

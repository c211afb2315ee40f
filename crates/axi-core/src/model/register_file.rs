use super::{DelayLine, SlaveModel};
use crate::{ConfigError, M2s, ResponseCode, S2m, MAX_IDLE_CYCLES};

/// Response latency used when none is configured.
pub const DEFAULT_LATENCY_CYCLES: usize = 1;

/// Largest register file a model will allocate.
pub const MAX_REGISTERS: usize = 1 << 20;

/// Register-file geometry and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFileConfig {
    /// Number of 32-bit registers, addressed from 0.
    pub registers: usize,
    /// Cycles between a request and its response.
    pub latency: usize,
}

impl Default for RegisterFileConfig {
    fn default() -> Self {
        Self {
            registers: 16,
            latency: DEFAULT_LATENCY_CYCLES,
        }
    }
}

/// Word-addressed register file.
///
/// Writes land in the cycle they are presented; reads sample the contents in
/// the cycle they are presented. Both are answered `latency` cycles later.
/// Addresses past the last register answer `DECERR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFileModel {
    words: Vec<u32>,
    line: DelayLine,
}

impl Default for RegisterFileModel {
    fn default() -> Self {
        Self::zeroed(&RegisterFileConfig::default())
    }
}

impl RegisterFileModel {
    /// Creates a zeroed register file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooManyRegisters`] past [`MAX_REGISTERS`] and
    /// [`ConfigError::TooManyCycles`] when `latency` exceeds
    /// [`MAX_IDLE_CYCLES`].
    pub fn with_config(config: &RegisterFileConfig) -> Result<Self, ConfigError> {
        if config.registers > MAX_REGISTERS {
            return Err(ConfigError::TooManyRegisters {
                registers: config.registers,
                limit: MAX_REGISTERS,
            });
        }
        if config.latency > MAX_IDLE_CYCLES {
            return Err(ConfigError::TooManyCycles {
                cycles: config.latency,
                limit: MAX_IDLE_CYCLES,
            });
        }
        Ok(Self::zeroed(config))
    }

    fn zeroed(config: &RegisterFileConfig) -> Self {
        Self {
            words: vec![0; config.registers],
            line: DelayLine::new(config.latency),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    fn slot(&mut self, address: u32) -> Option<&mut u32> {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.words.get_mut(index))
    }
}

impl SlaveModel for RegisterFileModel {
    fn reset(&mut self) {
        self.words.fill(0);
        self.line.clear();
    }

    fn step(&mut self, input: &M2s) -> S2m {
        let mut response = S2m::IDLE;
        if input.awvalid && input.wvalid {
            response.bvalid = true;
            response.bresp = match self.slot(input.awaddr) {
                Some(word) => {
                    *word = input.wdata;
                    ResponseCode::Okay
                }
                None => ResponseCode::DecErr,
            };
        }
        if input.arvalid {
            response.rvalid = true;
            match self.slot(input.araddr) {
                Some(word) => response.rdata = *word,
                None => response.rresp = ResponseCode::DecErr,
            }
        }
        if !input.is_idle() {
            log::trace!("register file answered {response:?}");
        }
        self.line.shift(response)
    }
}

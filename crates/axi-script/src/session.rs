//! Script sessions: submit once, report after the handler settles results.

use std::iter;

use axi_core::{
    drive, ConfigError, DeferredResult, FaultClass, Handler, M2s, RegisterFileConfig,
    RegisterFileModel, ResultState, S2m, SimHandler, Value, MAX_IDLE_CYCLES,
};
use serde::{Deserialize, Serialize};

use crate::{Script, ScriptError};

/// Handles of one submitted script, in step order.
#[derive(Debug)]
pub struct Session {
    steps: Vec<(String, DeferredResult)>,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// No response processed yet.
    Pending,
    /// The step resolved.
    Ok {
        /// Decoded value.
        value: Value,
    },
    /// The step failed.
    Fault {
        /// Fault message.
        message: String,
        /// Fault grouping.
        class: FaultClass,
        /// Partial results of a combined step.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partial: Option<Value>,
    },
}

/// Report line for one step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepReport {
    /// Zero-based step index.
    pub step: usize,
    /// Step description or operation name.
    pub label: String,
    /// What happened.
    pub outcome: StepOutcome,
}

/// Per-step outcomes of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Report {
    /// One entry per script step.
    pub steps: Vec<StepReport>,
}

impl Report {
    /// Returns `true` when any step faulted.
    #[must_use]
    pub fn has_faults(&self) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step.outcome, StepOutcome::Fault { .. }))
    }

    /// Returns `true` when no step is pending.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|step| step.outcome == StepOutcome::Pending)
    }
}

impl Session {
    /// Builds every step's command and sends them all in order.
    ///
    /// Nothing is sent when any step is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Step`] for invalid steps and
    /// [`ScriptError::Handler`] when the handler rejects the batch.
    pub fn submit<H: Handler + ?Sized>(
        script: &Script,
        handler: &mut H,
    ) -> Result<Self, ScriptError> {
        let commands = script.commands()?;
        let steps = script
            .steps
            .iter()
            .zip(&commands)
            .map(|(step, command)| (step.label().to_string(), command.result()))
            .collect();
        log::debug!("submitting {} script steps", commands.len());
        handler.send(commands)?;
        Ok(Self { steps })
    }

    /// Snapshot of every step's state.
    #[must_use]
    pub fn report(&self) -> Report {
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(step, (label, handle))| StepReport {
                step,
                label: label.clone(),
                outcome: match handle.state() {
                    ResultState::Pending => StepOutcome::Pending,
                    ResultState::Resolved(value) => StepOutcome::Ok { value },
                    ResultState::Failed { fault, partial } => StepOutcome::Fault {
                        message: fault.to_string(),
                        class: fault.class(),
                        partial,
                    },
                },
            })
            .collect();
        Report { steps }
    }
}

/// Renders `script` into the M2S trace a simulator should be driven with.
///
/// # Errors
///
/// See [`Session::submit`].
pub fn render(script: &Script) -> Result<(SimHandler, Session, Vec<M2s>), ScriptError> {
    let mut handler = SimHandler::new();
    let session = Session::submit(script, &mut handler)?;
    let trace = handler.render();
    Ok((handler, session, trace))
}

/// Correlates a recorded S2M trace with `script` and reports the outcome.
///
/// # Errors
///
/// Returns [`ScriptError::Handler`] when the trace is too short.
pub fn consume(script: &Script, responses: &[S2m]) -> Result<Report, ScriptError> {
    let (mut handler, session, _) = render(script)?;
    handler.consume(responses)?;
    Ok(session.report())
}

/// Runs `script` against a register-file model.
///
/// `pad` idle cycles follow the script so late responses still land in the
/// trace; it defaults to the model latency.
///
/// # Errors
///
/// Returns [`ScriptError::Config`] for an oversized model or pad, otherwise
/// see [`consume`].
pub fn run_register_file(
    script: &Script,
    config: &RegisterFileConfig,
    pad: Option<usize>,
) -> Result<Report, ScriptError> {
    let pad = pad.unwrap_or(config.latency);
    if pad > MAX_IDLE_CYCLES {
        return Err(ConfigError::TooManyCycles {
            cycles: pad,
            limit: MAX_IDLE_CYCLES,
        }
        .into());
    }
    let mut model = RegisterFileModel::with_config(config)?;
    let (mut handler, session, mut trace) = render(script)?;
    trace.extend(iter::repeat_n(M2s::IDLE, pad));
    let responses = drive(&mut model, &trace);
    log::debug!("register file produced {} response cycles", responses.len());
    handler.consume(&responses)?;
    Ok(session.report())
}

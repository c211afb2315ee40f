//! Deferred results resolved once a command's responses are processed.
//!
//! A [`DeferredResult`] is a plain shared cell, not tied to any async
//! runtime: simulation results appear after a batch `consume`, live results
//! appear inline during `send`, and callers simply poll.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::{AxiFault, FromValue, ResultError, Value};

/// Lifecycle of a deferred result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultState {
    /// Responses have not been processed yet.
    #[default]
    Pending,
    /// The command succeeded.
    Resolved(Value),
    /// The command failed; combined commands keep their partial results.
    Failed {
        /// First fault observed.
        fault: AxiFault,
        /// Whatever could still be decoded.
        partial: Option<Value>,
    },
}

impl ResultState {
    /// Returns `true` once the state left [`ResultState::Pending`].
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Typed handle onto a command's eventual value.
///
/// Clones share the same cell. Only the owning command can settle it.
#[derive(Debug)]
pub struct DeferredResult<T = Value> {
    cell: Rc<RefCell<ResultState>>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DeferredResult<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            marker: PhantomData,
        }
    }
}

impl DeferredResult<Value> {
    pub(crate) fn pending() -> Self {
        Self {
            cell: Rc::new(RefCell::new(ResultState::Pending)),
            marker: PhantomData,
        }
    }

    /// Settles the cell. A second attempt leaves the first outcome in place.
    pub(crate) fn settle(&self, outcome: ResultState) -> Result<(), ResultError> {
        let mut state = self.cell.borrow_mut();
        if state.is_settled() {
            return Err(ResultError::AlreadySet);
        }
        *state = outcome;
        Ok(())
    }
}

impl<T> DeferredResult<T> {
    /// Reinterprets the handle with another payload type.
    #[must_use]
    pub fn typed<U: FromValue>(&self) -> DeferredResult<U> {
        DeferredResult {
            cell: Rc::clone(&self.cell),
            marker: PhantomData,
        }
    }

    /// Returns `true` once the command resolved or failed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cell.borrow().is_settled()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> ResultState {
        self.cell.borrow().clone()
    }

    /// Recorded fault, if the command failed.
    #[must_use]
    pub fn fault(&self) -> Option<AxiFault> {
        match &*self.cell.borrow() {
            ResultState::Failed { fault, .. } => Some(fault.clone()),
            ResultState::Pending | ResultState::Resolved(_) => None,
        }
    }

    /// Partial results kept by a failed combined command.
    #[must_use]
    pub fn partial(&self) -> Option<Value> {
        match &*self.cell.borrow() {
            ResultState::Failed { partial, .. } => partial.clone(),
            ResultState::Pending | ResultState::Resolved(_) => None,
        }
    }
}

impl<T: FromValue> DeferredResult<T> {
    /// Returns the resolved value.
    ///
    /// # Errors
    ///
    /// Returns [`ResultError::NotReady`] before resolution,
    /// [`ResultError::Fault`] with the recorded fault when the command failed,
    /// and [`ResultError::TypeMismatch`] when the decoded value has another
    /// shape than `T`.
    pub fn value(&self) -> Result<T, ResultError> {
        match self.state() {
            ResultState::Pending => Err(ResultError::NotReady),
            ResultState::Failed { fault, .. } => Err(ResultError::Fault(fault)),
            ResultState::Resolved(value) => {
                T::from_value(value).map_err(|found| ResultError::TypeMismatch {
                    expected: T::EXPECTED,
                    found: found.shape().to_string(),
                })
            }
        }
    }
}

/// All-or-nothing view over several deferred results.
#[derive(Debug, Clone)]
pub struct JoinAll<T> {
    parts: Vec<DeferredResult<T>>,
}

/// Combines handles into one that is ready only when every part is ready.
#[must_use]
pub fn join_all<T>(parts: impl IntoIterator<Item = DeferredResult<T>>) -> JoinAll<T> {
    JoinAll {
        parts: parts.into_iter().collect(),
    }
}

impl<T> JoinAll<T> {
    /// Returns `true` once every part is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.parts.iter().all(DeferredResult::is_ready)
    }

    /// Number of joined handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` when nothing was joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<T: FromValue> JoinAll<T> {
    /// Returns every value in join order.
    ///
    /// # Errors
    ///
    /// Returns [`ResultError::NotReady`] while any part is pending, otherwise
    /// the first error in join order.
    pub fn value(&self) -> Result<Vec<T>, ResultError> {
        if !self.is_ready() {
            return Err(ResultError::NotReady);
        }
        self.parts.iter().map(DeferredResult::value).collect()
    }
}

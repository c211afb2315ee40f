//! Per-transaction raw results and the decoding seam.

use std::fmt;

use crate::{AxiFault, Value};

/// Raw outcome of one transaction that the bus accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    /// Every write beat was acknowledged with `OKAY`.
    Written,
    /// Read data, one word per beat.
    Read(Vec<u32>),
}

/// Outcome of one transaction as reported by a handler.
pub type TransactionResult = Result<RawResult, AxiFault>;

/// Decoder output: a fault, a value, or (for combined commands) both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
    /// First fault seen while decoding.
    pub fault: Option<AxiFault>,
    /// Decoded value, possibly partial when `fault` is set.
    pub value: Option<Value>,
}

impl Decoded {
    /// Successful decode.
    #[must_use]
    pub const fn value(value: Value) -> Self {
        Self {
            fault: None,
            value: Some(value),
        }
    }

    /// Failed decode without a usable value.
    #[must_use]
    pub const fn fault(fault: AxiFault) -> Self {
        Self {
            fault: Some(fault),
            value: None,
        }
    }
}

/// Maps a command's raw transaction results onto a value.
///
/// Implement this for module-specific composite operations; the built-in
/// command kinds use the same seam.
pub trait Decode: fmt::Debug {
    /// Decodes `results`, which holds exactly one entry per transaction of the
    /// owning command, in submission order.
    fn decode(&self, results: &[TransactionResult], description: Option<&str>) -> Decoded;
}

/// Returns the first transaction fault, in submission order.
#[must_use]
pub fn first_fault(results: &[TransactionResult]) -> Option<AxiFault> {
    results.iter().find_map(|result| result.as_ref().err().cloned())
}

/// Read words of transaction `index`, or a malformed-response fault.
///
/// # Errors
///
/// Returns [`AxiFault::MalformedResponse`] when the entry is missing or is a
/// write acknowledgement, and the recorded fault when the entry failed.
pub fn read_words<'a>(
    results: &'a [TransactionResult],
    index: usize,
    description: Option<&str>,
) -> Result<&'a [u32], AxiFault> {
    match results.get(index) {
        Some(Ok(RawResult::Read(words))) => Ok(words.as_slice()),
        Some(Err(fault)) => Err(fault.clone()),
        Some(Ok(RawResult::Written)) => Err(malformed(
            format!("transaction {index} is a write, expected read data"),
            description,
        )),
        None => Err(malformed(
            format!("missing result for transaction {index}"),
            description,
        )),
    }
}

/// Single read word at `results[index][0]`.
///
/// # Errors
///
/// See [`read_words`]; an empty read is also malformed.
pub fn read_word(
    results: &[TransactionResult],
    index: usize,
    description: Option<&str>,
) -> Result<u32, AxiFault> {
    read_words(results, index, description)?
        .first()
        .copied()
        .ok_or_else(|| malformed(format!("transaction {index} returned no data"), description))
}

pub(crate) fn malformed(reason: String, description: Option<&str>) -> AxiFault {
    AxiFault::MalformedResponse {
        reason,
        description: description.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::{first_fault, read_word, read_words, RawResult, TransactionResult};
    use crate::{AxiFault, ConnectionError};

    #[test]
    fn first_fault_follows_submission_order() {
        let results: Vec<TransactionResult> = vec![
            Ok(RawResult::Written),
            Err(AxiFault::NotDispatched),
            Err(AxiFault::Connection(ConnectionError::Timeout)),
        ];
        assert_eq!(first_fault(&results), Some(AxiFault::NotDispatched));
        assert_eq!(first_fault(&results[..1]), None);
    }

    #[test]
    fn read_helpers_reject_wrong_shapes() {
        let results: Vec<TransactionResult> =
            vec![Ok(RawResult::Written), Ok(RawResult::Read(Vec::new()))];
        assert!(matches!(
            read_words(&results, 0, None),
            Err(AxiFault::MalformedResponse { .. })
        ));
        assert!(matches!(
            read_word(&results, 1, Some("probe")),
            Err(AxiFault::MalformedResponse { description: Some(_), .. })
        ));
        assert!(matches!(
            read_words(&results, 5, None),
            Err(AxiFault::MalformedResponse { .. })
        ));
    }

    #[test]
    fn read_word_returns_first_beat() {
        let results: Vec<TransactionResult> = vec![Ok(RawResult::Read(vec![27, 28]))];
        assert_eq!(read_word(&results, 0, None), Ok(27));
    }
}

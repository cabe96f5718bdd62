use thiserror::Error;

/// # Summary
/// Price history errors, covering validation, persistence and empty-input cases.
///
/// # Invariants
/// - Must derive `Error` through `thiserror`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// Price negative, non-finite or missing; the observation was not appended
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
    /// Persisted state could not be parsed; `row` is the 1-based line in the file
    #[error("Corrupt history at row {row}: {reason}")]
    CorruptHistory { row: usize, reason: String },
    /// Summary requested for a history with no observations
    #[error("History is empty")]
    EmptyHistory,
    /// Reading or writing the backing storage failed
    #[error("Storage I/O error: {0}")]
    Io(String),
}

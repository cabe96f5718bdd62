use super::entity::PriceHistory;
use super::error::HistoryError;
use async_trait::async_trait;

/// # Summary
/// Durable storage of a price history.
///
/// # Invariants
/// - `persist` followed by `load` yields a history equal to the persisted one.
/// - `persist` is atomic for a single writer: an interrupted write never
///   leaves storage that `load` cannot read.
/// - Unreadable state is reported as `CorruptHistory`, never reset to empty.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// # Summary
    /// Reads the persisted history.
    ///
    /// # Logic
    /// 1. Missing storage yields an empty history.
    /// 2. Every record is parsed and validated in order.
    ///
    /// # Returns
    /// The history, `CorruptHistory` for malformed state, or `Io`.
    async fn load(&self) -> Result<PriceHistory, HistoryError>;

    /// # Summary
    /// Replaces the persisted history with `history`.
    ///
    /// # Arguments
    /// * `history` - The full history to store.
    ///
    /// # Returns
    /// `Io` when the write or the final replace fails.
    async fn persist(&self, history: &PriceHistory) -> Result<(), HistoryError>;
}

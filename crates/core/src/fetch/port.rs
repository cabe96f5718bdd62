use crate::fetch::error::FetchError;
use crate::history::entity::Observation;
use async_trait::async_trait;

/// # Summary
/// Source of fare observations for the configured route.
///
/// # Invariants
/// - Performs at most one provider request per call, with a bounded timeout.
/// - `Ok(None)` means the provider answered but had no usable fare; callers
///   treat it as a no-op.
#[async_trait]
pub trait FareFetcher: Send + Sync {
    /// # Summary
    /// Fetches the current fare.
    ///
    /// # Returns
    /// Zero or one observation, or a `FetchError`.
    async fn fetch(&self) -> Result<Option<Observation>, FetchError>;
}

use crate::report::entity::Report;
use crate::report::error::ReportError;
use async_trait::async_trait;

/// # Summary
/// Renders a report into a human-facing artifact.
///
/// # Invariants
/// - Must accept `Report::NoData`; rendering nothing is allowed, failing is not.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// # Summary
    /// Renders `report`.
    ///
    /// # Arguments
    /// * `report` - Current state of the tracked route.
    ///
    /// # Returns
    /// `Ok(())` once the artifact is written (or intentionally skipped).
    async fn render(&self, report: &Report) -> Result<(), ReportError>;
}

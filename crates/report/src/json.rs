use crate::write_atomically;
use async_trait::async_trait;
use fare_core::report::entity::Report;
use fare_core::report::error::ReportError;
use fare_core::report::port::Reporter;
use std::path::PathBuf;
use tracing::info;

/// # Summary
/// Writes the report as a pretty-printed JSON document for a static web page.
///
/// # Invariants
/// * The file at `path` is always a complete document (atomic replace).
pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialized form of `report`.
    pub fn to_json(report: &Report) -> Result<String, ReportError> {
        serde_json::to_string_pretty(report).map_err(|e| ReportError::Render(e.to_string()))
    }
}

#[async_trait]
impl Reporter for JsonReporter {
    fn name(&self) -> &str {
        "json"
    }

    async fn render(&self, report: &Report) -> Result<(), ReportError> {
        let json = Self::to_json(report)?;
        write_atomically(&self.path, json.as_bytes())?;
        info!(path = %self.path.display(), "JSON summary written");
        Ok(())
    }
}

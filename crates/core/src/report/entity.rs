use crate::common::Route;
use crate::history::entity::{Observation, PriceHistory};
use crate::history::error::HistoryError;
use crate::history::stats::Summary;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// # Summary
/// Context shared by every report: what was tracked and when the report was built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub route: Route,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

/// One history row, serialized as `[timestamp, price, airline]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow(pub DateTime<Utc>, pub f64, pub Option<String>);

impl From<&Observation> for HistoryRow {
    fn from(o: &Observation) -> Self {
        HistoryRow(o.timestamp, o.price, o.airline.clone())
    }
}

/// # Summary
/// Summary plus the full ordered history.
///
/// # Invariants
/// - `history.len()` matches the length of every series in `summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceReport {
    #[serde(flatten)]
    pub meta: ReportMeta,
    #[serde(flatten)]
    pub summary: Summary,
    pub history: Vec<HistoryRow>,
}

/// # Summary
/// What reporters receive. `NoData` replaces a summary while nothing has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    NoData(ReportMeta),
    Priced(PriceReport),
}

impl Report {
    /// # Summary
    /// Builds the report for `history`.
    ///
    /// # Logic
    /// 1. An empty history yields `NoData` without calling `summarize`.
    /// 2. Otherwise summarizes and copies the rows.
    ///
    /// # Returns
    /// The report; errors only if summarizing fails.
    pub fn from_history(meta: ReportMeta, history: &PriceHistory) -> Result<Self, HistoryError> {
        if history.is_empty() {
            return Ok(Report::NoData(meta));
        }
        let summary = history.summarize()?;
        let rows = history.observations().iter().map(HistoryRow::from).collect();
        Ok(Report::Priced(PriceReport {
            meta,
            summary,
            history: rows,
        }))
    }

    pub fn meta(&self) -> &ReportMeta {
        match self {
            Report::NoData(meta) => meta,
            Report::Priced(report) => &report.meta,
        }
    }
}

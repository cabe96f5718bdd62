use async_trait::async_trait;
use fare_core::fetch::error::FetchError;
use fare_core::fetch::port::FareFetcher;
use fare_core::history::entity::{Observation, PriceHistory};
use fare_core::history::error::HistoryError;
use fare_core::history::port::HistoryStore;
use fare_core::report::entity::Report;
use fare_core::report::error::ReportError;
use fare_core::report::port::Reporter;
use std::sync::Mutex;

/// Fetcher returning a fixed answer.
pub struct MockFetcher {
    result: Result<Option<Observation>, FetchError>,
}

impl MockFetcher {
    pub fn returning(observation: Observation) -> Self {
        Self {
            result: Ok(Some(observation)),
        }
    }

    pub fn empty() -> Self {
        Self { result: Ok(None) }
    }

    pub fn failing(error: FetchError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl FareFetcher for MockFetcher {
    async fn fetch(&self) -> Result<Option<Observation>, FetchError> {
        self.result.clone()
    }
}

/// Store that loads a fixed history and refuses every write.
pub struct ReadOnlyStore {
    pub history: PriceHistory,
}

#[async_trait]
impl HistoryStore for ReadOnlyStore {
    async fn load(&self) -> Result<PriceHistory, HistoryError> {
        Ok(self.history.clone())
    }

    async fn persist(&self, _history: &PriceHistory) -> Result<(), HistoryError> {
        Err(HistoryError::Io("read-only file system".to_string()))
    }
}

/// Reporter keeping every report it was given.
#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    pub fn last(&self) -> Option<Report> {
        self.reports.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    fn name(&self) -> &str {
        "recording"
    }

    async fn render(&self, report: &Report) -> Result<(), ReportError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

pub struct FailingReporter;

#[async_trait]
impl Reporter for FailingReporter {
    fn name(&self) -> &str {
        "failing"
    }

    async fn render(&self, _report: &Report) -> Result<(), ReportError> {
        Err(ReportError::Io("disk full".to_string()))
    }
}

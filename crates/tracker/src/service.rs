use fare_core::common::Route;
use fare_core::common::time::TimeProvider;
use fare_core::config::SearchConfig;
use fare_core::fetch::port::FareFetcher;
use fare_core::history::entity::{Observation, PriceHistory};
use fare_core::history::error::HistoryError;
use fare_core::history::port::HistoryStore;
use fare_core::report::entity::{Report, ReportMeta};
use fare_core::report::port::Reporter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// # Summary
/// Errors that abort a tracking cycle.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Corrupt stored history or a failed persist
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// # Summary
/// What one cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    // Observation recorded this cycle
    pub appended: Option<Observation>,
    // Why no observation was recorded, if none was
    pub unavailable: Option<String>,
    // History length after the cycle
    pub observations: usize,
    // Reporters that failed to render
    pub report_failures: usize,
}

impl CycleOutcome {
    /// `true` when nothing was fetched and there is no earlier history to report.
    pub fn is_empty_handed(&self) -> bool {
        self.appended.is_none() && self.observations == 0
    }
}

/// # Summary
/// Application service running the fetch, record and report cycle.
/// Depends only on the `fare-core` ports; concrete adapters are injected.
///
/// # Invariants
/// - At most one fetch, one append and one persist per `run_cycle`.
/// - Reporters always see the state that was persisted.
pub struct Tracker {
    fetcher: Arc<dyn FareFetcher>,
    store: Arc<dyn HistoryStore>,
    reporters: Vec<Arc<dyn Reporter>>,
    route: Route,
    currency: String,
    clock: Arc<dyn TimeProvider>,
}

impl Tracker {
    /// # Summary
    /// Creates a tracker.
    ///
    /// # Arguments
    /// * `fetcher` - Fare source.
    /// * `store` - History persistence.
    /// * `reporters` - Renderers run after every cycle, in order.
    /// * `search` - Route and currency used for report metadata.
    /// * `clock` - Source of the report timestamp.
    pub fn new(
        fetcher: Arc<dyn FareFetcher>,
        store: Arc<dyn HistoryStore>,
        reporters: Vec<Arc<dyn Reporter>>,
        search: &SearchConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            fetcher,
            store,
            reporters,
            route: search.route.clone(),
            currency: search.currency.clone(),
            clock,
        }
    }

    /// # Summary
    /// Runs one cycle.
    ///
    /// # Logic
    /// 1. Loads the history; corrupt state aborts before anything is fetched.
    /// 2. Fetches; an error or an empty answer leaves the history unchanged.
    /// 3. Appends and persists a new observation; an invalid one is dropped,
    ///    a failed persist aborts.
    /// 4. Renders the report with every reporter; failures are counted only.
    ///
    /// # Returns
    /// * `Result<CycleOutcome, TrackerError>`
    pub async fn run_cycle(&self) -> Result<CycleOutcome, TrackerError> {
        let mut history = self.store.load().await?;
        info!(route = %self.route.label(), observations = history.len(), "history loaded");

        let mut appended = None;
        let mut unavailable = None;
        match self.fetcher.fetch().await {
            Ok(Some(observation)) => match history.append(observation.clone()) {
                Ok(extended) => {
                    self.store.persist(&extended).await?;
                    info!(
                        price = observation.price,
                        observations = extended.len(),
                        "observation recorded"
                    );
                    history = extended;
                    appended = Some(observation);
                }
                Err(e) => {
                    warn!(error = %e, "fetched observation rejected");
                    unavailable = Some(e.to_string());
                }
            },
            Ok(None) => {
                warn!("fetch unavailable: no fare offered");
                unavailable = Some("no fare offered".to_string());
            }
            Err(e) => {
                warn!(error = %e, "fetch unavailable");
                unavailable = Some(e.to_string());
            }
        }

        let report_failures = self.report(&history).await?;

        Ok(CycleOutcome {
            appended,
            unavailable,
            observations: history.len(),
            report_failures,
        })
    }

    async fn report(&self, history: &PriceHistory) -> Result<usize, TrackerError> {
        let meta = ReportMeta {
            route: self.route.clone(),
            currency: self.currency.clone(),
            generated_at: self.clock.now(),
        };
        let report = Report::from_history(meta, history)?;
        if let Report::NoData(_) = report {
            info!("no data yet");
        }

        let mut failures = 0;
        for reporter in &self.reporters {
            if let Err(e) = reporter.render(&report).await {
                error!(reporter = reporter.name(), error = %e, "report failed");
                failures += 1;
            }
        }
        Ok(failures)
    }
}

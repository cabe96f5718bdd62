mod settings;

use std::env;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use fare_core::common::time::{RealTimeProvider, TimeProvider};
use fare_core::config::{LoggingConfig, TrackerConfig};
use fare_core::report::port::Reporter;
use fare_feed::booking::BookingFetcher;
use fare_report::chart::ChartReporter;
use fare_report::json::JsonReporter;
use fare_store::history::CsvHistoryStore;
use fare_tracker::service::Tracker;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Nothing was fetched and there is no earlier history.
const EXIT_NO_DATA: u8 = 1;
/// Configuration error, corrupt history or failed persist.
const EXIT_FATAL: u8 = 2;

/// # Summary
/// Binary entry point and DI container.
/// Builds the concrete adapters and injects them into `Tracker` as `Arc<dyn Trait>`.
///
/// # Logic
/// 1. Loads the layered configuration.
/// 2. Initializes logging (stdout plus a daily log file).
/// 3. Installs the rustls crypto provider.
/// 4. Runs one cycle and maps the outcome to an exit code.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match settings::load(settings::CONFIG_FILE, None, env::var("API_KEY").ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let _log_guard = init_logging(&config.logging);
    info!(route = %config.search.route.label(), "fare tracker starting");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("crypto provider already installed");
    }

    match run(&config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "fare tracker failed");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// # Summary
/// Wires the adapters and runs a single cycle.
///
/// # Returns
/// `SUCCESS`, or `EXIT_NO_DATA` when there is nothing to report at all.
async fn run(config: &TrackerConfig) -> Result<ExitCode, Box<dyn Error>> {
    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);

    // Infrastructure
    let fetcher = Arc::new(BookingFetcher::new(&config.api, &config.search, clock.clone())?);
    let store = Arc::new(CsvHistoryStore::new(config.storage.history_path())?);

    let mut reporters: Vec<Arc<dyn Reporter>> = Vec::new();
    if let Some(path) = config.json_report_path() {
        reporters.push(Arc::new(JsonReporter::new(path)));
    }
    if let Some(path) = config.chart_path() {
        reporters.push(Arc::new(ChartReporter::new(
            path,
            config.report.chart_width,
            config.report.chart_height,
        )));
    }

    // Application service
    let tracker = Tracker::new(fetcher, store, reporters, &config.search, clock);
    let outcome = tracker.run_cycle().await?;

    if outcome.report_failures > 0 {
        warn!(failures = outcome.report_failures, "some reports were not written");
    }
    if outcome.is_empty_handed() {
        warn!("no fare fetched and no history to report");
        return Ok(ExitCode::from(EXIT_NO_DATA));
    }
    info!(observations = outcome.observations, "cycle complete");
    Ok(ExitCode::SUCCESS)
}

/// # Summary
/// Installs the global subscriber.
///
/// # Logic
/// 1. Filter from `RUST_LOG`, defaulting to `info`.
/// 2. Human-readable stdout layer.
/// 3. Non-blocking daily file layer; skipped with a warning if the directory is unusable.
///
/// # Returns
/// The file writer guard, which must live until exit so buffered lines are flushed.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .build(&logging.directory);

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            warn!(error = %e, directory = %logging.directory, "file logging disabled");
            None
        }
    }
}

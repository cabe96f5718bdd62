use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use fare_core::history::entity::{Observation, PriceHistory};
use fare_core::history::error::HistoryError;
use fare_core::history::port::HistoryStore;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header written by every persist.
const CURRENT_HEADER: [&str; 3] = ["timestamp", "price", "airline"];
/// Header of files written by older revisions (date and time in separate columns).
const LEGACY_HEADER: [&str; 4] = ["date", "time", "price", "airline"];

/// # Summary
/// Record layouts the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordSchema {
    /// `timestamp,price,airline`; the only layout written
    Current,
    /// `date,time,price,airline`; read-only, upgraded on the next persist
    Legacy,
}

impl RecordSchema {
    fn detect(headers: &StringRecord) -> Option<Self> {
        let names: Vec<&str> = headers.iter().collect();
        if names == CURRENT_HEADER {
            Some(RecordSchema::Current)
        } else if names == LEGACY_HEADER {
            Some(RecordSchema::Legacy)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CurrentRecord {
    timestamp: DateTime<Utc>,
    price: f64,
    airline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    date: NaiveDate,
    time: Option<String>,
    price: f64,
    airline: Option<String>,
}

impl From<&Observation> for CurrentRecord {
    fn from(o: &Observation) -> Self {
        Self {
            timestamp: o.timestamp,
            price: o.price,
            airline: o.airline.clone(),
        }
    }
}

/// `HistoryStore` backed by a single CSV file, one row per observation.
///
/// # Summary
/// Loads the whole file on `load` and rewrites it on `persist` through a
/// temporary file in the same directory that is renamed over the target.
///
/// # Invariants
/// * The target file is only ever replaced by a complete, fsynced file.
/// * Temporary files carry a `.{file_name}.` prefix and are never read back.
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    /// Creates a store for `path`.
    ///
    /// # Logic
    /// 1. Ensures the parent directory exists.
    ///
    /// # Arguments
    /// * `path` - Location of the CSV file; it need not exist yet.
    ///
    /// # Returns
    /// * `Result<Self, HistoryError>` - The store, or `Io` if the directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let dir = parent_dir(&path);
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| HistoryError::Io(e.to_string()))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_history(&self) -> Result<PriceHistory, HistoryError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file yet");
                return Ok(PriceHistory::new());
            }
            Err(e) => return Err(HistoryError::Io(e.to_string())),
        };

        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);
        let headers = reader
            .headers()
            .map_err(|e| corrupt(1, e.to_string()))?
            .clone();

        // zero-byte file
        if headers.is_empty() {
            return Ok(PriceHistory::new());
        }

        let schema = RecordSchema::detect(&headers).ok_or_else(|| {
            corrupt(
                1,
                format!(
                    "unexpected header `{}`",
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            )
        })?;

        let mut observations = Vec::new();
        for (index, result) in reader.records().enumerate() {
            // header is line 1
            let fallback_line = index + 2;
            let record = result.map_err(|e| {
                let line = e
                    .position()
                    .and_then(|p| usize::try_from(p.line()).ok())
                    .unwrap_or(fallback_line);
                corrupt(line, e.to_string())
            })?;
            let line = record
                .position()
                .and_then(|p| usize::try_from(p.line()).ok())
                .unwrap_or(fallback_line);

            let observation = parse_record(schema, &record, &headers).map_err(|r| corrupt(line, r))?;
            observation
                .validate()
                .map_err(|e| corrupt(line, e.to_string()))?;
            observations.push(observation);
        }

        if schema == RecordSchema::Legacy {
            info!(
                path = %self.path.display(),
                rows = observations.len(),
                "loaded legacy date/time history; it will be rewritten on the next persist"
            );
        }

        PriceHistory::from_observations(observations)
    }

    fn write_history(&self, history: &PriceHistory) -> Result<(), HistoryError> {
        let dir = parent_dir(&self.path);
        let prefix = format!(
            ".{}.",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "history".to_string())
        );

        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(io_err)?;

        {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            writer.write_record(CURRENT_HEADER).map_err(csv_err)?;
            for observation in history.observations() {
                writer
                    .serialize(CurrentRecord::from(observation))
                    .map_err(csv_err)?;
            }
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file_mut().flush().map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        tmp.persist(&self.path)
            .map_err(|e| HistoryError::Io(e.error.to_string()))?;

        debug!(
            path = %self.path.display(),
            rows = history.len(),
            "history persisted"
        );
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for CsvHistoryStore {
    /// # Summary
    /// Loads the CSV history.
    ///
    /// # Logic
    /// 1. Missing or zero-byte file: empty history.
    /// 2. Detects the header layout; anything else is corrupt.
    /// 3. Parses and validates every row, reporting the first bad line.
    ///
    /// # Returns
    /// * `Result<PriceHistory, HistoryError>`
    async fn load(&self) -> Result<PriceHistory, HistoryError> {
        self.read_history()
    }

    /// # Summary
    /// Rewrites the CSV file atomically.
    ///
    /// # Logic
    /// 1. Writes header and rows into a temporary file next to the target.
    /// 2. Flushes and fsyncs it.
    /// 3. Renames it over the target.
    ///
    /// # Returns
    /// * `Result<(), HistoryError>`
    async fn persist(&self, history: &PriceHistory) -> Result<(), HistoryError> {
        self.write_history(history)
    }
}

fn parse_record(
    schema: RecordSchema,
    record: &StringRecord,
    headers: &StringRecord,
) -> Result<Observation, String> {
    match schema {
        RecordSchema::Current => {
            let row: CurrentRecord = record
                .deserialize(Some(headers))
                .map_err(|e| e.to_string())?;
            Ok(Observation::new(row.timestamp, row.price, row.airline))
        }
        RecordSchema::Legacy => {
            let row: LegacyRecord = record
                .deserialize(Some(headers))
                .map_err(|e| e.to_string())?;
            let time = match row.time.as_deref() {
                None | Some("") => NaiveTime::MIN,
                Some(t) => parse_legacy_time(t)?,
            };
            let timestamp = row.date.and_time(time).and_utc();
            Ok(Observation::new(timestamp, row.price, row.airline))
        }
    }
}

// Older revisions stored the time part of an ISO timestamp, with or without seconds.
fn parse_legacy_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| format!("invalid time `{}`: {}", raw, e))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn corrupt(row: usize, reason: String) -> HistoryError {
    HistoryError::CorruptHistory { row, reason }
}

fn io_err(e: std::io::Error) -> HistoryError {
    HistoryError::Io(e.to_string())
}

fn csv_err(e: csv::Error) -> HistoryError {
    HistoryError::Io(e.to_string())
}

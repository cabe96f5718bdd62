use crate::common::{CabinClass, Route};
use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration, passed explicitly to every adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub search: SearchConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// What to search for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub route: Route,
    // Maximum number of stops; `None` (configured as `""` or `"any"`) for any
    #[serde(deserialize_with = "stops_limit")]
    pub stops: Option<u8>,
    pub adults: u32,
    pub sort: String,
    pub cabin_class: CabinClass,
    pub currency: String,
    // Divide the offer total by `adults` before recording
    pub per_person: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    // RapidAPI key; empty means "not configured"
    pub key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub history_file: String,
}

/// Output locations, relative to `storage.data_dir`. An empty file name
/// (`None`) disables that reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(deserialize_with = "blank_as_none")]
    pub json_file: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub chart_file: Option<String>,
    pub chart_width: u32,
    pub chart_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

// Configuration sources cannot express null, so a blank string stands for `None`.
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StopsSetting {
    Count(u8),
    Text(String),
}

fn stops_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    match Option::<StopsSetting>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StopsSetting::Count(n)) => Ok(Some(n)),
        Some(StopsSetting::Text(text)) => {
            let text = text.trim();
            if text.is_empty() || text.eq_ignore_ascii_case("any") {
                Ok(None)
            } else {
                text.parse()
                    .map(Some)
                    .map_err(|_| de::Error::custom(format!("invalid stops `{}`", text)))
            }
        }
    }
}

impl StorageConfig {
    /// Full path of the history CSV.
    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.history_file)
    }
}

impl TrackerConfig {
    /// Path of the JSON summary, if that reporter is enabled.
    pub fn json_report_path(&self) -> Option<PathBuf> {
        self.report
            .json_file
            .as_ref()
            .map(|f| PathBuf::from(&self.storage.data_dir).join(f))
    }

    /// Path of the PNG chart, if that reporter is enabled.
    pub fn chart_path(&self) -> Option<PathBuf> {
        self.report
            .chart_file
            .as_ref()
            .map(|f| PathBuf::from(&self.storage.data_dir).join(f))
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                route: Route {
                    origin: "FRA.AIRPORT".to_string(),
                    destination: "FNC.AIRPORT".to_string(),
                    depart_date: NaiveDate::from_ymd_opt(2026, 5, 25).unwrap_or_default(),
                    return_date: NaiveDate::from_ymd_opt(2026, 5, 31),
                },
                stops: Some(0),
                adults: 2,
                sort: "BEST".to_string(),
                cabin_class: CabinClass::Economy,
                currency: "EUR".to_string(),
                per_person: true,
            },
            api: ApiConfig {
                host: "booking-com15.p.rapidapi.com".to_string(),
                key: String::new(),
                timeout_secs: 15,
            },
            storage: StorageConfig {
                data_dir: "data".to_string(),
                history_file: "flight_prices.csv".to_string(),
            },
            report: ReportConfig {
                json_file: Some("data.json".to_string()),
                chart_file: Some("price_chart.png".to_string()),
                chart_width: 1000,
                chart_height: 600,
            },
            logging: LoggingConfig {
                directory: "logs".to_string(),
                file_prefix: "fare-tracker.log".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.search.route.origin, "FRA.AIRPORT");
        assert_eq!(config.search.route.destination, "FNC.AIRPORT");
        assert_eq!(config.search.adults, 2);
        assert_eq!(config.api.host, "booking-com15.p.rapidapi.com");
        assert_eq!(config.api.timeout_secs, 15);
        assert!(config.api.key.is_empty());
        assert_eq!(
            config.storage.history_path(),
            PathBuf::from("data").join("flight_prices.csv")
        );
        assert_eq!(
            config.chart_path(),
            Some(PathBuf::from("data").join("price_chart.png"))
        );
    }

    #[test]
    fn test_disabled_reporter_has_no_path() {
        let mut config = TrackerConfig::default();
        config.report.json_file = None;
        assert_eq!(config.json_report_path(), None);
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let json = serde_json::to_string(&TrackerConfig::default()).unwrap();
        let parsed: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.search.route.depart_date.to_string(), "2026-05-25");
        assert_eq!(parsed.search.cabin_class, CabinClass::Economy);
    }

    #[test]
    fn test_blank_values_disable_optional_settings() {
        let mut json = serde_json::to_value(TrackerConfig::default()).unwrap();
        json["report"]["chart_file"] = "".into();
        json["report"]["json_file"] = "  ".into();
        json["search"]["stops"] = "any".into();
        let parsed: TrackerConfig = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed.chart_path(), None);
        assert_eq!(parsed.json_report_path(), None);
        assert_eq!(parsed.search.stops, None);

        json["search"]["stops"] = "1".into();
        let parsed: TrackerConfig = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed.search.stops, Some(1));

        json["search"]["stops"] = "direct".into();
        assert!(serde_json::from_value::<TrackerConfig>(json).is_err());
    }
}

pub mod time;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// The tracked itinerary: one origin/destination pair on fixed dates.
///
/// # Invariants
/// - `origin` and `destination` are provider location ids (e.g. `FRA.AIRPORT`).
/// - `return_date`, when present, is not before `depart_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    // Departure location id
    pub origin: String,
    // Arrival location id
    pub destination: String,
    // Outbound flight date
    pub depart_date: NaiveDate,
    // Inbound flight date (one-way search when absent)
    pub return_date: Option<NaiveDate>,
}

impl Route {
    /// Short label for titles and logs, e.g. `FRA → FNC`.
    pub fn label(&self) -> String {
        format!(
            "{} → {}",
            short_location(&self.origin),
            short_location(&self.destination)
        )
    }
}

// `FRA.AIRPORT` -> `FRA`
fn short_location(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

/// # Summary
/// Cabin class requested from the flight search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl FromStr for CabinClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economy" => Ok(CabinClass::Economy),
            "premium_economy" | "premium-economy" => Ok(CabinClass::PremiumEconomy),
            "business" => Ok(CabinClass::Business),
            "first" => Ok(CabinClass::First),
            _ => Err(format!("Unknown cabin class: {}", s)),
        }
    }
}

impl std::fmt::Display for CabinClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CabinClass::Economy => write!(f, "ECONOMY"),
            CabinClass::PremiumEconomy => write!(f, "PREMIUM_ECONOMY"),
            CabinClass::Business => write!(f, "BUSINESS"),
            CabinClass::First => write!(f, "FIRST"),
        }
    }
}

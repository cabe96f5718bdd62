use super::error::HistoryError;
use super::stats::{self, Summary};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// # Summary
/// One recorded fare sample.
///
/// # Invariants
/// - Inside a `PriceHistory`, `price` is finite and non-negative. A `NaN`
///   price stands for a missing value and is rejected on append.
/// - `airline` is `None` or a non-empty label without surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    // When the fare was observed
    pub timestamp: DateTime<Utc>,
    // Fare in the configured currency
    pub price: f64,
    // Operating carrier, if the provider reported one
    pub airline: Option<String>,
}

impl Observation {
    /// Airline labels are trimmed; blank ones are stored as `None`.
    pub fn new(timestamp: DateTime<Utc>, price: f64, airline: Option<String>) -> Self {
        let airline = airline
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Self {
            timestamp,
            price,
            airline,
        }
    }

    /// # Summary
    /// Checks the price invariant.
    ///
    /// # Returns
    /// `InvalidObservation` naming the offending value.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.price.is_nan() {
            return Err(HistoryError::InvalidObservation(
                "price is missing".to_string(),
            ));
        }
        if !self.price.is_finite() {
            return Err(HistoryError::InvalidObservation(format!(
                "price {} is not finite",
                self.price
            )));
        }
        if self.price < 0.0 {
            return Err(HistoryError::InvalidObservation(format!(
                "price {} is negative",
                self.price
            )));
        }
        if let Some(airline) = self
            .airline
            .as_deref()
            .filter(|a| a.is_empty() || a.trim() != *a)
        {
            return Err(HistoryError::InvalidObservation(format!(
                "airline `{}` is not trimmed",
                airline
            )));
        }
        Ok(())
    }
}

/// # Summary
/// Append-only sequence of observations for one tracked route.
///
/// # Invariants
/// - Order is insertion order; nothing is re-sorted, even if timestamps go
///   backwards.
/// - Every element satisfies `Observation::validate`.
/// - Derived statistics are computed on demand and never cached here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceHistory {
    observations: Vec<Observation>,
}

impl PriceHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// Rebuilds a history from previously recorded observations.
    ///
    /// # Logic
    /// 1. Validates every observation in order.
    /// 2. Keeps the given order.
    ///
    /// # Arguments
    /// * `observations` - Observations in insertion order.
    ///
    /// # Returns
    /// The history, or `InvalidObservation` for the first bad element.
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self, HistoryError> {
        for (index, observation) in observations.iter().enumerate() {
            observation.validate().map_err(|e| match e {
                HistoryError::InvalidObservation(reason) => {
                    HistoryError::InvalidObservation(format!("observation {}: {}", index, reason))
                }
                other => other,
            })?;
        }
        Ok(Self { observations })
    }

    /// # Summary
    /// Returns a new history with `observation` at the end.
    ///
    /// # Logic
    /// 1. Validates the observation price.
    /// 2. Copies the current observations and pushes the new one.
    ///
    /// # Arguments
    /// * `observation` - The new sample.
    ///
    /// # Returns
    /// The extended history; `self` is never modified.
    pub fn append(&self, observation: Observation) -> Result<PriceHistory, HistoryError> {
        observation.validate()?;
        let mut observations = Vec::with_capacity(self.observations.len() + 1);
        observations.extend(self.observations.iter().cloned());
        observations.push(observation);
        Ok(PriceHistory { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Price of the most recently appended observation.
    pub fn last_price(&self) -> Option<f64> {
        self.last().map(|o| o.price)
    }

    /// Prices in insertion order.
    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    /// See [`stats::summarize`].
    pub fn summarize(&self) -> Result<Summary, HistoryError> {
        stats::summarize(&self.observations)
    }
}

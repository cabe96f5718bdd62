use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fare_core::common::time::TimeProvider;
use fare_core::config::{ApiConfig, SearchConfig};
use fare_core::fetch::error::FetchError;
use fare_core::fetch::port::FareFetcher;
use fare_core::history::entity::Observation;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/api/v1/flights/searchFlights";

/// # Summary
/// Booking.com flight search (RapidAPI) fare fetcher.
///
/// # Invariants
/// - One GET per `fetch`, bounded by the configured timeout, no retries.
/// - The observation timestamp comes from `clock`, not from the offer.
pub struct BookingFetcher {
    /// HTTP client carrying the RapidAPI headers
    client: Client,
    /// Full search URL
    endpoint: String,
    /// `false` when no API key was configured
    has_key: bool,
    search: SearchConfig,
    clock: Arc<dyn TimeProvider>,
}

impl BookingFetcher {
    /// # Summary
    /// Creates a fetcher for the configured search.
    ///
    /// # Logic
    /// 1. Builds the `x-rapidapi-key` / `x-rapidapi-host` default headers.
    /// 2. Configures the request timeout.
    /// 3. Derives the endpoint from `api.host`.
    ///
    /// # Arguments
    /// * `api` - Host, key and timeout.
    /// * `search` - Route and query parameters.
    /// * `clock` - Source of observation timestamps.
    ///
    /// # Returns
    /// The fetcher, or `FetchError::Config` if the headers or client cannot be built.
    pub fn new(
        api: &ApiConfig,
        search: &SearchConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if !api.key.is_empty() {
            headers.insert(
                "x-rapidapi-key",
                HeaderValue::from_str(&api.key)
                    .map_err(|e| FetchError::Config(format!("invalid API key: {}", e)))?,
            );
        }
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(&api.host)
                .map_err(|e| FetchError::Config(format!("invalid API host: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("https://{}{}", api.host, SEARCH_PATH),
            has_key: !api.key.is_empty(),
            search: search.clone(),
            clock,
        })
    }

    /// Points the fetcher at another base URL (e.g. a local stand-in for the API).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = format!("{}{}", base_url.trim_end_matches('/'), SEARCH_PATH);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query string of the search request.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let search = &self.search;
        let mut query = vec![
            ("fromId", search.route.origin.clone()),
            ("toId", search.route.destination.clone()),
            ("departDate", search.route.depart_date.to_string()),
        ];
        if let Some(return_date) = search.route.return_date {
            query.push(("returnDate", return_date.to_string()));
        }
        if let Some(stops) = search.stops {
            query.push(("stops", stops.to_string()));
        }
        query.extend([
            ("pageNo", "1".to_string()),
            ("adults", search.adults.to_string()),
            ("sort", search.sort.clone()),
            ("cabinClass", search.cabin_class.to_string()),
            ("currency_code", search.currency.clone()),
        ]);
        query
    }
}

/// # Summary
/// Top-level `searchFlights` response.
#[derive(Deserialize, Debug)]
pub struct BookingResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<BookingData>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookingData {
    #[serde(default)]
    pub flight_offers: Vec<FlightOffer>,
}

/// # Summary
/// One priced itinerary.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    #[serde(default)]
    pub segments: Vec<Segment>,
    pub price_breakdown: Option<PriceBreakdown>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    // Local time without offset, e.g. `2026-05-25T06:15:00`
    pub departure_time: String,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    #[serde(default)]
    pub carriers_data: Vec<Carrier>,
}

#[derive(Deserialize, Debug)]
pub struct Carrier {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PriceBreakdown {
    pub total: Option<Money>,
}

/// Amount split into whole units and nanos (1e-9 units).
#[derive(Deserialize, Debug)]
pub struct Money {
    #[serde(default)]
    pub units: i64,
    #[serde(default)]
    pub nanos: i64,
}

impl Money {
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.units) + Decimal::new(self.nanos, 9)
    }
}

impl FlightOffer {
    /// Date part of the first segment's departure time.
    fn departure_date(&self) -> Option<&str> {
        self.segments
            .first()
            .and_then(|s| s.departure_time.split('T').next())
    }

    fn airline(&self) -> Option<String> {
        self.segments
            .first()?
            .legs
            .first()?
            .carriers_data
            .first()?
            .name
            .clone()
    }
}

/// Parses a raw response body.
pub fn parse_response(body: &str) -> Result<BookingResponse, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))
}

/// # Summary
/// Turns a search response into at most one observation.
///
/// # Logic
/// 1. `status == false` is a provider error.
/// 2. Picks the first offer departing on the configured date.
/// 3. Total = `units + nanos / 1e9`; divided by `adults` when `per_person` is set.
/// 4. Rounds half away from zero to 2 decimal places.
///
/// # Arguments
/// * `response` - Parsed response.
/// * `search` - The search that produced it.
/// * `observed_at` - Timestamp for the observation.
///
/// # Returns
/// `Ok(None)` when no offer or no price is available for the date.
pub fn extract_observation(
    response: BookingResponse,
    search: &SearchConfig,
    observed_at: DateTime<Utc>,
) -> Result<Option<Observation>, FetchError> {
    if !response.status {
        let message = response
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| "status false".to_string());
        return Err(FetchError::Api(message));
    }

    let offers = response.data.unwrap_or_default().flight_offers;
    if offers.is_empty() {
        debug!("no flight offers in response");
        return Ok(None);
    }

    let wanted = search.route.depart_date.format("%Y-%m-%d").to_string();
    let Some(offer) = offers
        .iter()
        .find(|o| o.departure_date() == Some(wanted.as_str()))
    else {
        debug!(date = %wanted, offers = offers.len(), "no offer on the requested date");
        return Ok(None);
    };

    let Some(total) = offer.price_breakdown.as_ref().and_then(|p| p.total.as_ref()) else {
        debug!("offer without total price");
        return Ok(None);
    };

    let mut price = total.to_decimal();
    if search.per_person {
        if search.adults == 0 {
            return Err(FetchError::Config("adults must be at least 1".to_string()));
        }
        price /= Decimal::from(search.adults);
    }
    let price = price
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| FetchError::Parse(format!("price {} out of range", price)))?;

    Ok(Some(Observation::new(observed_at, price, offer.airline())))
}

#[async_trait]
impl FareFetcher for BookingFetcher {
    /// # Summary
    /// Queries the flight search once.
    ///
    /// # Logic
    /// 1. Refuses to call the API without a key.
    /// 2. Sends the GET with the configured query.
    /// 3. Non-success HTTP status is a network error.
    /// 4. Parses the body and extracts the observation.
    ///
    /// # Returns
    /// Zero or one observation, or a `FetchError`.
    async fn fetch(&self) -> Result<Option<Observation>, FetchError> {
        if !self.has_key {
            return Err(FetchError::Config("API key is not set".to_string()));
        }

        debug!(endpoint = %self.endpoint, "requesting flight offers");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&self.query())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Network(format!("HTTP {}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let response = parse_response(&body)?;
        let observation = extract_observation(response, &self.search, self.clock.now())?;

        match &observation {
            Some(o) => info!(
                price = o.price,
                airline = o.airline.as_deref().unwrap_or("-"),
                currency = %self.search.currency,
                "fare observed"
            ),
            None => warn!(route = %self.search.route.label(), "no fare available"),
        }
        Ok(observation)
    }
}

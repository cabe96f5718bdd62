use super::entity::Observation;
use super::error::HistoryError;
use serde::Serialize;

/// Trailing window of the moving average, in observations.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// # Summary
/// Least-squares line of price against zero-based observation index.
///
/// # Invariants
/// - `values.len()` equals the number of observations it was fitted on.
/// - `values[i] == intercept + slope * i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
    pub values: Vec<f64>,
}

/// # Summary
/// Derived statistics over a non-empty history.
///
/// # Invariants
/// - `min_price <= average_price <= max_price`.
/// - `moving_average`, when present, has one entry per observation; entries
///   before the window fills are `None`.
/// - `trend` is absent for fewer than 2 observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub last_price: f64,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub moving_average: Option<Vec<Option<f64>>>,
    pub trend: Option<Trend>,
}

/// # Summary
/// Computes the summary of a history.
///
/// # Logic
/// 1. One pass for sum, min and max.
/// 2. Clamps the mean into `[min, max]` so float rounding cannot push it out.
/// 3. Moving average over a trailing window of `MOVING_AVERAGE_WINDOW`.
/// 4. Linear trend when at least 2 observations exist.
///
/// # Arguments
/// * `observations` - Observations in insertion order.
///
/// # Returns
/// `EmptyHistory` when `observations` is empty.
pub fn summarize(observations: &[Observation]) -> Result<Summary, HistoryError> {
    let last = observations.last().ok_or(HistoryError::EmptyHistory)?;
    let prices: Vec<f64> = observations.iter().map(|o| o.price).collect();

    let mut sum = 0.0;
    let mut min_price = f64::INFINITY;
    let mut max_price = f64::NEG_INFINITY;
    for &price in &prices {
        sum += price;
        min_price = min_price.min(price);
        max_price = max_price.max(price);
    }
    let average_price = (sum / index_as_f64(prices.len())).clamp(min_price, max_price);

    Ok(Summary {
        last_price: last.price,
        average_price,
        min_price,
        max_price,
        moving_average: moving_average(&prices, MOVING_AVERAGE_WINDOW),
        trend: linear_trend(&prices),
    })
}

/// # Summary
/// Trailing moving average aligned to `prices`.
///
/// # Logic
/// Position `i` holds the mean of `prices[i + 1 - window ..= i]`; positions
/// with fewer than `window` values so far are `None`.
///
/// # Returns
/// `None` when `window` is zero or there are fewer than `window` prices.
pub fn moving_average(prices: &[f64], window: usize) -> Option<Vec<Option<f64>>> {
    if window == 0 || prices.len() < window {
        return None;
    }
    let divisor = index_as_f64(window);
    let series = (0..prices.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let sum: f64 = prices[i + 1 - window..=i].iter().sum();
                Some(sum / divisor)
            }
        })
        .collect();
    Some(series)
}

/// # Summary
/// Ordinary least-squares fit of price against index `0..n`.
///
/// # Logic
/// 1. Centres x and y on their means.
/// 2. `slope = Sxy / Sxx`, `intercept = mean_y - slope * mean_x`.
/// 3. Evaluates the line at every index.
///
/// # Returns
/// `None` for fewer than 2 prices.
pub fn linear_trend(prices: &[f64]) -> Option<Trend> {
    if prices.len() < 2 {
        return None;
    }
    let n = index_as_f64(prices.len());
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = prices.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, &price) in prices.iter().enumerate() {
        let dx = index_as_f64(i) - mean_x;
        sxx += dx * dx;
        sxy += dx * (price - mean_y);
    }
    // sxx > 0 for n >= 2
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let values = (0..prices.len())
        .map(|i| intercept + slope * index_as_f64(i))
        .collect();

    Some(Trend {
        slope,
        intercept,
        values,
    })
}

// Exact for any history shorter than u32::MAX observations.
fn index_as_f64(i: usize) -> f64 {
    u32::try_from(i).map(f64::from).unwrap_or(f64::from(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn series(prices: &[f64]) -> Vec<Observation> {
        let start = Utc.with_ymd_and_hms(2026, 1, 10, 6, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                Observation::new(
                    start + Duration::hours(i64::try_from(i).unwrap()),
                    p,
                    Some("X".to_string()),
                )
            })
            .collect()
    }

    #[test]
    fn test_summarize_empty_is_an_error() {
        assert_eq!(summarize(&[]), Err(HistoryError::EmptyHistory));
    }

    #[test]
    fn test_single_observation() {
        let summary = summarize(&series(&[100.0])).unwrap();
        assert_eq!(summary.last_price, 100.0);
        assert_eq!(summary.average_price, 100.0);
        assert_eq!(summary.min_price, 100.0);
        assert_eq!(summary.max_price, 100.0);
        assert_eq!(summary.moving_average, None);
        assert_eq!(summary.trend, None);
    }

    #[test]
    fn test_basic_statistics() {
        let summary = summarize(&series(&[100.0, 120.0, 80.0, 140.0])).unwrap();
        assert_eq!(summary.average_price, 110.0);
        assert_eq!(summary.min_price, 80.0);
        assert_eq!(summary.max_price, 140.0);
        assert_eq!(summary.last_price, 140.0);
    }

    proptest! {
        #[test]
        fn prop_average_between_min_and_max(
            prices in prop::collection::vec(0.0f64..1_000_000.0, 1..200)
        ) {
            let summary = summarize(&series(&prices)).unwrap();
            prop_assert!(summary.min_price <= summary.average_price);
            prop_assert!(summary.average_price <= summary.max_price);
            prop_assert_eq!(summary.last_price, prices[prices.len() - 1]);
        }

        #[test]
        fn prop_derived_series_are_index_aligned(
            prices in prop::collection::vec(0.0f64..10_000.0, 1..60)
        ) {
            let summary = summarize(&series(&prices)).unwrap();
            match summary.moving_average {
                Some(ma) => {
                    prop_assert!(prices.len() >= MOVING_AVERAGE_WINDOW);
                    prop_assert_eq!(ma.len(), prices.len());
                }
                None => prop_assert!(prices.len() < MOVING_AVERAGE_WINDOW),
            }
            match summary.trend {
                Some(trend) => prop_assert_eq!(trend.values.len(), prices.len()),
                None => prop_assert_eq!(prices.len(), 1),
            }
        }
    }

    #[test]
    fn test_average_stays_within_bounds_under_rounding() {
        // 0.1 * 3 / 3 overshoots 0.1 without clamping
        let summary = summarize(&series(&[0.1, 0.1, 0.1])).unwrap();
        assert!(summary.min_price <= summary.average_price);
        assert!(summary.average_price <= summary.max_price);

        let irregular = [199.99, 0.01, 87.5, 87.5, 1234.56, 3.3];
        let summary = summarize(&series(&irregular)).unwrap();
        assert!(summary.min_price <= summary.average_price);
        assert!(summary.average_price <= summary.max_price);
    }

    #[test]
    fn test_moving_average_needs_full_window() {
        assert_eq!(moving_average(&[1.0, 2.0], 3), None);

        let ma = moving_average(&[3.0, 6.0, 9.0, 12.0], 3).unwrap();
        assert_eq!(ma.len(), 4);
        assert_eq!(ma[0], None);
        assert_eq!(ma[1], None);
        assert!((ma[2].unwrap() - 6.0).abs() < EPS);
        assert!((ma[3].unwrap() - 9.0).abs() < EPS);
    }

    #[test]
    fn test_moving_average_zero_window() {
        assert_eq!(moving_average(&[1.0, 2.0, 3.0], 0), None);
    }

    #[test]
    fn test_trend_exact_fit() {
        let trend = linear_trend(&[10.0, 20.0, 30.0]).unwrap();
        assert!((trend.slope - 10.0).abs() < EPS);
        assert!((trend.intercept - 10.0).abs() < EPS);
        for (got, want) in trend.values.iter().zip([10.0, 20.0, 30.0]) {
            assert!((got - want).abs() < EPS, "{got} != {want}");
        }
    }

    #[test]
    fn test_trend_flat_and_short() {
        assert_eq!(linear_trend(&[]), None);
        assert_eq!(linear_trend(&[42.0]), None);

        let flat = linear_trend(&[50.0, 50.0]).unwrap();
        assert!(flat.slope.abs() < EPS);
        assert!((flat.intercept - 50.0).abs() < EPS);
    }

    #[test]
    fn test_trend_on_noisy_series() {
        let trend = linear_trend(&[2.0, 2.0, 6.0, 6.0]).unwrap();
        assert!((trend.slope - 1.6).abs() < EPS);
        assert!((trend.intercept - 1.6).abs() < EPS);
        assert_eq!(trend.values.len(), 4);
    }

    #[test]
    fn test_summary_includes_derived_series_once_long_enough() {
        let summary = summarize(&series(&[10.0, 20.0, 30.0])).unwrap();
        let ma = summary.moving_average.unwrap();
        assert_eq!(ma, vec![None, None, Some(20.0)]);
        assert!(summary.trend.is_some());

        let two = summarize(&series(&[10.0, 20.0])).unwrap();
        assert_eq!(two.moving_average, None);
        assert!(two.trend.is_some());
    }
}

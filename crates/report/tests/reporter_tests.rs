use chrono::{Duration, NaiveDate, TimeZone, Utc};
use fare_core::common::Route;
use fare_core::history::entity::{Observation, PriceHistory};
use fare_core::report::entity::{Report, ReportMeta};
use fare_core::report::port::Reporter;
use fare_report::chart::{ChartReporter, chart_series};
use fare_report::json::JsonReporter;
use std::fs;
use tempfile::tempdir;

fn meta() -> ReportMeta {
    ReportMeta {
        route: Route {
            origin: "FRA.AIRPORT".to_string(),
            destination: "FNC.AIRPORT".to_string(),
            depart_date: NaiveDate::from_ymd_opt(2026, 5, 25).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2026, 5, 31),
        },
        currency: "EUR".to_string(),
        generated_at: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap(),
    }
}

fn report_for(prices: &[f64]) -> Report {
    let start = Utc.with_ymd_and_hms(2026, 2, 1, 7, 0, 0).unwrap();
    let history = prices
        .iter()
        .enumerate()
        .fold(PriceHistory::new(), |h, (i, &p)| {
            let ts = start + Duration::days(i64::try_from(i).unwrap());
            h.append(Observation::new(ts, p, Some("Condor".to_string())))
                .unwrap()
        });
    Report::from_history(meta(), &history).unwrap()
}

/// # Summary
/// The JSON summary carries the statistics and the full history.
#[tokio::test]
async fn test_json_reporter_writes_summary() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("site").join("data.json");
    let reporter = JsonReporter::new(&path);

    reporter.render(&report_for(&[100.0, 120.0, 80.0, 140.0])).await?;

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(json["status"], "priced");
    assert_eq!(json["last_price"], 140.0);
    assert_eq!(json["average_price"], 110.0);
    assert_eq!(json["min_price"], 80.0);
    assert_eq!(json["max_price"], 140.0);
    assert_eq!(json["history"].as_array().unwrap().len(), 4);
    assert_eq!(json["history"][3][2], "Condor");
    assert!(json["moving_average"][1].is_null());
    assert_eq!(json["moving_average"][2], 100.0);
    assert_eq!(json["trend"]["values"].as_array().unwrap().len(), 4);
    assert_eq!(json["route"]["origin"], "FRA.AIRPORT");
    Ok(())
}

#[tokio::test]
async fn test_json_reporter_no_data() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("data.json");
    let reporter = JsonReporter::new(&path);

    reporter.render(&Report::NoData(meta())).await?;

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(json["status"], "no_data");
    assert!(json.get("last_price").is_none());
    Ok(())
}

#[tokio::test]
async fn test_json_reporter_replaces_previous_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("data.json");
    fs::write(&path, "stale")?;
    let reporter = JsonReporter::new(&path);

    reporter.render(&report_for(&[99.0])).await?;

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(json["last_price"], 99.0);
    let leftovers = fs::read_dir(dir.path())?.count();
    assert_eq!(leftovers, 1);
    Ok(())
}

#[test]
fn test_chart_series_needs_two_points() {
    let Report::Priced(single) = report_for(&[150.0]) else {
        panic!("expected a priced report");
    };
    assert_eq!(chart_series(&single), None);
}

/// # Summary
/// Series are aligned to timestamps and the y range covers every point.
#[test]
fn test_chart_series_layout() {
    let Report::Priced(priced) = report_for(&[10.0, 20.0, 30.0, 25.0]) else {
        panic!("expected a priced report");
    };
    let series = chart_series(&priced).unwrap();

    assert_eq!(series.title, "Fare history FRA → FNC");
    assert_eq!(series.y_label, "Price (EUR)");
    assert_eq!(series.prices.len(), 4);
    assert_eq!(series.trend.as_ref().map(Vec::len), Some(4));
    // window of 3 starts at the third observation
    assert_eq!(series.moving_average.len(), 2);
    assert_eq!(series.moving_average[0].0, series.prices[2].0);
    assert_eq!(series.moving_average[0].1, 20.0);

    for &(_, v) in series.prices.iter().chain(series.trend.iter().flatten()) {
        assert!(series.y_range.contains(&v), "{v} outside {:?}", series.y_range);
    }
    assert!(series.y_range.start >= 0.0);
    assert_eq!(series.x_range.start, series.prices[0].0);
    assert_eq!(series.x_range.end, series.prices[3].0);
}

#[test]
fn test_chart_series_widens_zero_time_span() {
    let t = Utc.with_ymd_and_hms(2026, 2, 1, 7, 0, 0).unwrap();
    let history = PriceHistory::new()
        .append(Observation::new(t, 100.0, None))
        .unwrap()
        .append(Observation::new(t, 110.0, None))
        .unwrap();
    let Report::Priced(priced) = Report::from_history(meta(), &history).unwrap() else {
        panic!("expected a priced report");
    };

    let series = chart_series(&priced).unwrap();
    assert!(series.x_range.start < series.x_range.end);
}

#[tokio::test]
async fn test_chart_reporter_skips_without_data() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("chart.png");
    let reporter = ChartReporter::new(&path, 800, 480);

    reporter.render(&Report::NoData(meta())).await?;
    reporter.render(&report_for(&[120.0])).await?;
    assert!(!path.exists());
    Ok(())
}

/// # Summary
/// Renders a real PNG.
#[tokio::test]
#[ignore] // needs system fonts for the caption and axis labels
async fn test_chart_reporter_writes_png() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("chart.png");
    let reporter = ChartReporter::new(&path, 800, 480);

    reporter.render(&report_for(&[212.0, 205.5, 230.0, 199.0, 215.0])).await?;

    let bytes = fs::read(&path)?;
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    Ok(())
}

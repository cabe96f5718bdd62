use crate::{ensure_parent_dir, io_err};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fare_core::report::entity::{PriceReport, Report};
use fare_core::report::error::ReportError;
use fare_core::report::port::Reporter;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

/// A point on the chart: observation time and price.
pub type ChartPoint = (DateTime<Utc>, f64);

/// # Summary
/// Everything the chart draws, computed from a report before touching the backend.
///
/// # Invariants
/// - `prices` has at least 2 points.
/// - `x_range` and `y_range` are non-empty and cover every drawn point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub y_label: String,
    pub prices: Vec<ChartPoint>,
    pub trend: Option<Vec<ChartPoint>>,
    pub moving_average: Vec<ChartPoint>,
    pub x_range: Range<DateTime<Utc>>,
    pub y_range: Range<f64>,
}

/// # Summary
/// Builds the chart series for a priced report.
///
/// # Logic
/// 1. Needs at least 2 observations.
/// 2. Trend and moving average are placed at the observation timestamps.
/// 3. Y range spans prices and trend with 10% padding, floored at 0.
/// 4. A zero-width time range is widened by one hour on each side.
///
/// # Returns
/// `None` when there is not enough data to draw a line.
pub fn chart_series(report: &PriceReport) -> Option<ChartSeries> {
    if report.history.len() < 2 {
        return None;
    }
    let times: Vec<DateTime<Utc>> = report.history.iter().map(|row| row.0).collect();
    let prices: Vec<ChartPoint> = report.history.iter().map(|row| (row.0, row.1)).collect();

    let trend = report
        .summary
        .trend
        .as_ref()
        .map(|t| times.iter().copied().zip(t.values.iter().copied()).collect::<Vec<_>>());

    let moving_average = report
        .summary
        .moving_average
        .as_ref()
        .map(|ma| {
            times
                .iter()
                .zip(ma)
                .filter_map(|(t, v)| v.map(|v| (*t, v)))
                .collect()
        })
        .unwrap_or_default();

    let mut y_min = report.summary.min_price;
    let mut y_max = report.summary.max_price;
    for &(_, v) in trend.iter().flatten() {
        y_min = y_min.min(v);
        y_max = y_max.max(v);
    }
    let padding = (y_max - y_min).max(1.0) * 0.1;
    let y_range = (y_min - padding).max(0.0)..(y_max + padding);

    let mut x_min = times.iter().min().copied()?;
    let mut x_max = times.iter().max().copied()?;
    if x_min == x_max {
        x_min -= Duration::hours(1);
        x_max += Duration::hours(1);
    }

    Some(ChartSeries {
        title: format!("Fare history {}", report.meta.route.label()),
        y_label: format!("Price ({})", report.meta.currency),
        prices,
        trend,
        moving_average,
        x_range: x_min..x_max,
        y_range,
    })
}

/// # Summary
/// Draws the price history as a PNG line chart.
///
/// # Invariants
/// * The PNG at `path` is replaced atomically.
pub struct ChartReporter {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl ChartReporter {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    /// # Summary
    /// Renders `series` into the PNG file at `target`.
    ///
    /// # Logic
    /// 1. Price line with point markers.
    /// 2. Dashed trend line and moving average when present.
    /// 3. Legend in the upper left corner.
    fn draw(&self, series: &ChartSeries, target: &Path) -> Result<(), ReportError> {
        let root = BitMapBackend::new(target, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&series.title, ("sans-serif", 30).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(series.x_range.clone(), series.y_range.clone())
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Observed at")
            .y_desc(&series.y_label)
            .x_label_formatter(&|t: &DateTime<Utc>| t.format("%m-%d %H:%M").to_string())
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(series.prices.iter().copied(), &BLUE))
            .map_err(render_err)?
            .label("Price")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        chart
            .draw_series(
                series
                    .prices
                    .iter()
                    .map(|&point| Circle::new(point, 3, BLUE.filled())),
            )
            .map_err(render_err)?;

        if let Some(trend) = &series.trend {
            chart
                .draw_series(DashedLineSeries::new(
                    trend.iter().copied(),
                    8,
                    4,
                    RED.stroke_width(2),
                ))
                .map_err(render_err)?
                .label("Trend")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        }

        if !series.moving_average.is_empty() {
            chart
                .draw_series(LineSeries::new(
                    series.moving_average.iter().copied(),
                    GREEN.stroke_width(2),
                ))
                .map_err(render_err)?
                .label("Moving average (3)")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }
}

#[async_trait]
impl Reporter for ChartReporter {
    fn name(&self) -> &str {
        "chart"
    }

    /// # Summary
    /// Draws the chart, or skips it while there is too little data.
    ///
    /// # Logic
    /// 1. `NoData` and single-observation reports are skipped.
    /// 2. Draws into a temporary `.png` next to the target.
    /// 3. Renames it over the target.
    async fn render(&self, report: &Report) -> Result<(), ReportError> {
        let Report::Priced(priced) = report else {
            info!("no data to plot yet");
            return Ok(());
        };
        let Some(series) = chart_series(priced) else {
            info!(observations = priced.history.len(), "too few observations for a chart");
            return Ok(());
        };

        let dir = ensure_parent_dir(&self.path)?;
        let tmp = tempfile::Builder::new()
            .prefix(".chart.")
            .suffix(".png")
            .tempfile_in(&dir)
            .map_err(io_err)?;
        self.draw(&series, tmp.path())?;
        tmp.persist(&self.path)
            .map_err(|e| ReportError::Io(e.error.to_string()))?;

        info!(path = %self.path.display(), points = series.prices.len(), "chart written");
        Ok(())
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Render(e.to_string())
}

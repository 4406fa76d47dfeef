/// Chart rendering: draw the cache-size series as a line-plus-marker PNG.
use crate::extract::CacheSample;
use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::ops::Range;
use std::path::Path;
use tracing::info;

// 12x6 inch figure at 300 dpi.
const WIDTH: u32 = 3600;
const HEIGHT: u32 = 1800;

/// Render the series to `output` as a PNG.
///
/// An empty series is a usage error: the chart would be misleading, so no
/// file is written at all.
pub fn render_chart(series: &[CacheSample], output: &Path) -> Result<(), PlotError> {
    if series.is_empty() {
        return Err(PlotError::EmptySeries);
    }

    let (x_range, y_range) = axis_ranges(series);

    let root = BitMapBackend::new(output, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cache Size Changes Over Time", ("sans-serif", 60))
        .margin(40)
        .x_label_area_size(260)
        .y_label_area_size(160)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Cache Size (MiB)")
        .x_label_formatter(&|t: &DateTime<Utc>| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .x_label_style(
            ("sans-serif", 28)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", 28))
        .axis_desc_style(("sans-serif", 36))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(
            series.iter().map(|s| (s.timestamp, s.cache_size_mib)),
            &BLUE,
        ))
        .map_err(render_err)?;

    chart
        .draw_series(
            series
                .iter()
                .map(|s| Circle::new((s.timestamp, s.cache_size_mib), 6, BLUE.filled())),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;

    info!(points = series.len(), output = %output.display(), "chart written");
    Ok(())
}

/// Axis ranges covering every sample, padded so a single point or a flat
/// series still yields a non-degenerate coordinate system.
fn axis_ranges(series: &[CacheSample]) -> (Range<DateTime<Utc>>, Range<f64>) {
    let mut x_min = series[0].timestamp;
    let mut x_max = series[0].timestamp;
    let mut y_min = series[0].cache_size_mib;
    let mut y_max = series[0].cache_size_mib;

    for s in &series[1..] {
        x_min = x_min.min(s.timestamp);
        x_max = x_max.max(s.timestamp);
        y_min = y_min.min(s.cache_size_mib);
        y_max = y_max.max(s.cache_size_mib);
    }

    if x_max == x_min {
        x_max = x_max + Duration::seconds(1);
    }

    let span = y_max - y_min;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };

    (x_min..x_max, (y_min - pad).max(0.0)..y_max + pad)
}

fn render_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> PlotError {
    PlotError::Render {
        source: Box::new(e),
    }
}

#[derive(Debug)]
pub enum PlotError {
    /// Nothing to plot: refusing to write an empty chart.
    EmptySeries,
    Render {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl std::fmt::Display for PlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlotError::EmptySeries => {
                write!(f, "no matching log lines found, nothing to plot")
            }
            PlotError::Render { source } => write!(f, "failed to render chart: {source}"),
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::EmptySeries => None,
            PlotError::Render { source } => Some(source.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample(minute: u32, mib: f64) -> CacheSample {
        CacheSample {
            timestamp: Utc.with_ymd_and_hms(2023, 10, 1, 12, minute, 0).unwrap(),
            cache_size_mib: mib,
        }
    }

    #[test]
    fn empty_series_is_rejected() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chart.png");
        let err = render_chart(&[], &out).unwrap_err();
        assert!(matches!(err, PlotError::EmptySeries));
        assert!(!out.exists());
    }

    #[test]
    fn renders_png_to_disk() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chart.png");
        let series = vec![sample(0, 100.0), sample(1, 200.5), sample(2, 150.25)];
        render_chart(&series, &out).unwrap();
        let len = std::fs::metadata(&out).unwrap().len();
        assert!(len > 0);
    }

    #[test]
    fn renders_single_point() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("single.png");
        render_chart(&[sample(0, 42.0)], &out).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn renders_flat_series() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("flat.png");
        render_chart(&[sample(0, 64.0), sample(5, 64.0)], &out).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn unwritable_output_path_fails() {
        let series = vec![sample(0, 1.0)];
        let err = render_chart(&series, Path::new("/nonexistent-dir/chart.png")).unwrap_err();
        assert!(matches!(err, PlotError::Render { .. }));
    }

    #[test]
    fn axis_ranges_pad_degenerate_spans() {
        let (x, y) = axis_ranges(&[sample(0, 10.0)]);
        assert!(x.end > x.start);
        assert!(y.end > y.start);
        assert!(y.start >= 0.0);
    }
}

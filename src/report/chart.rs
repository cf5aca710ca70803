//! Two-panel time-series chart rendering.

use super::ReportError;
use crate::aggregate::AggregatedRecord;
use chrono::{DateTime, Local};
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::{Path, PathBuf};

/// Fixed chart filename; each session overwrites the previous one.
const CHART_FILE: &str = "ndi_framerate_report.png";

const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 620;

const FPS_COLOR: RGBColor = BLUE;
const BITRATE_COLOR: RGBColor = RGBColor(255, 140, 0);

/// Renders the frame-rate/bitrate chart into `out_dir`.
///
/// Callers guarantee at least two records.
pub(super) fn render_chart(
    history: &[AggregatedRecord],
    session_start: DateTime<Local>,
    out_dir: &Path,
) -> Result<PathBuf, ReportError> {
    let path = out_dir.join(CHART_FILE);
    draw(history, session_start, &path).map_err(|e| ReportError::Chart(e.to_string()))?;
    Ok(path)
}

fn draw(
    history: &[AggregatedRecord],
    session_start: DateTime<Local>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(CHART_HEIGHT / 2);

    let last_index = history.len() as i32 - 1;
    let last_codec = history
        .last()
        .map(|record| record.codec.as_str())
        .unwrap_or("unknown");
    let time_labels = |index: &i32| {
        history
            .get(*index as usize)
            .map(|record| record.time_label.clone())
            .unwrap_or_default()
    };
    let label_font = ("sans-serif", 12)
        .into_font()
        .transform(FontTransform::Rotate90);

    let mut fps_chart = ChartBuilder::on(&upper)
        .caption(
            format!(
                "NDI Frame Rate Stability (Codec: {last_codec}, session {})",
                session_start.format("%H:%M:%S")
            ),
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(55)
        .build_cartesian_2d(0..last_index, 0f64..axis_top(history, |r| r.frame_rate_fps))?;
    fps_chart
        .configure_mesh()
        .x_labels(history.len().min(12))
        .x_label_formatter(&time_labels)
        .x_label_style(label_font.clone())
        .y_desc("FPS")
        .draw()?;
    fps_chart.draw_series(LineSeries::new(
        points(history, |r| r.frame_rate_fps),
        &FPS_COLOR,
    ))?;
    fps_chart.draw_series(
        points(history, |r| r.frame_rate_fps).map(|p| Circle::new(p, 3, FPS_COLOR.filled())),
    )?;

    let mut bitrate_chart = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(55)
        .build_cartesian_2d(0..last_index, 0f64..axis_top(history, |r| r.bitrate_mbps))?;
    bitrate_chart
        .configure_mesh()
        .x_labels(history.len().min(12))
        .x_label_formatter(&time_labels)
        .x_label_style(label_font)
        .x_desc("Time")
        .y_desc("Bitrate (Mbps)")
        .draw()?;
    bitrate_chart.draw_series(LineSeries::new(
        points(history, |r| r.bitrate_mbps),
        &BITRATE_COLOR,
    ))?;
    bitrate_chart.draw_series(
        points(history, |r| r.bitrate_mbps).map(|p| Circle::new(p, 3, BITRATE_COLOR.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn points<'a>(
    history: &'a [AggregatedRecord],
    value: impl Fn(&AggregatedRecord) -> f64 + 'a,
) -> impl Iterator<Item = (i32, f64)> + 'a {
    history
        .iter()
        .enumerate()
        .map(move |(index, record)| (index as i32, value(record)))
}

fn axis_top(history: &[AggregatedRecord], value: impl Fn(&AggregatedRecord) -> f64) -> f64 {
    let max = history.iter().map(value).fold(0.0f64, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

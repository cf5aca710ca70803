//! Report emission: chart and flat-text log artifacts.
//!
//! A session's accumulated history is consumed exactly once, after
//! sampling has stopped. The log is written unconditionally; the
//! two-panel chart is only rendered when there are at least two
//! records, since a single point cannot show a trend.

mod chart;
mod text_log;

use crate::aggregate::AggregatedRecord;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Minimum history length for chart rendering.
const MIN_CHART_RECORDS: usize = 2;

/// Errors that can occur while writing report artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Creating the output directory or writing a file failed.
    #[error("failed to write report artifact: {0}")]
    Io(#[from] std::io::Error),
    /// The chart backend failed to render or save the image.
    #[error("chart rendering failed: {0}")]
    Chart(String),
}

/// Locations of the artifacts produced by one emission pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// The session's flat-text log, always written.
    pub log: PathBuf,
    /// The chart image, `None` when fewer than two records existed.
    pub chart: Option<PathBuf>,
}

/// Writes the session report into `out_dir`, creating it if needed.
///
/// The history is read-only input; nothing here mutates it.
pub fn emit(
    history: &[AggregatedRecord],
    session_start: DateTime<Local>,
    out_dir: &Path,
) -> Result<ReportPaths, ReportError> {
    std::fs::create_dir_all(out_dir)?;

    let log = text_log::write_log(history, session_start, out_dir)?;
    let chart = if history.len() >= MIN_CHART_RECORDS {
        Some(chart::render_chart(history, session_start, out_dir)?)
    } else {
        tracing::info!(
            records = history.len(),
            "fewer than two aggregated records; skipping chart"
        );
        None
    };

    tracing::info!(log = %log.display(), "session report written");
    Ok(ReportPaths { log, chart })
}

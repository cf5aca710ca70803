//! Flat-text session log.

use super::ReportError;
use crate::aggregate::AggregatedRecord;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the session log, one line per aggregated record.
///
/// The filename is timestamp-qualified so repeated sessions never
/// collide.
pub(super) fn write_log(
    history: &[AggregatedRecord],
    session_start: DateTime<Local>,
    out_dir: &Path,
) -> Result<PathBuf, ReportError> {
    let path = out_dir.join(format!(
        "ndi_framerate_log_{}.txt",
        session_start.format("%Y%m%d_%H%M%S")
    ));

    let mut file = BufWriter::new(File::create(&path)?);
    writeln!(
        file,
        "NDI Frame Rate and Bitrate Report (session started {})",
        session_start.format("%Y-%m-%d %H:%M:%S")
    )?;
    for record in history {
        writeln!(
            file,
            "{}: {:.2} fps, Codec: {}, Bitrate: {:.2} Mbps",
            record.time_label, record.frame_rate_fps, record.codec, record.bitrate_mbps
        )?;
    }
    file.flush()?;

    Ok(path)
}

//! Permissive parser for textual frame summaries.
//!
//! Some source variants only report a human-oriented string of the
//! shape `"<W>x<H> @ <fps-or-ratio>fps [<codec>]"`. This parser is a
//! compatibility shim for those sources: the text is not a stable
//! machine format, so anything it cannot read degrades to a zero-rate,
//! unknown-codec result instead of an error.

use super::{round2, UNKNOWN_CODEC};

/// Parses a frame status string into `(frame_rate_fps, codec)`.
///
/// The rate field sits between `@` and `[`, with an optional trailing
/// `fps` literal; `N/D` ratios are reduced (a zero denominator reads
/// as zero). The codec sits between `[` and `]`. Malformed input
/// yields `(0.0, "unknown")` and a logged warning.
pub fn parse_status_text(text: &str) -> (f64, String) {
    match try_parse(text) {
        Some(parsed) => parsed,
        None => {
            tracing::warn!(status = %text, "unparseable frame status; recording degraded sample");
            (0.0, UNKNOWN_CODEC.to_string())
        }
    }
}

fn try_parse(text: &str) -> Option<(f64, String)> {
    let (_, after_at) = text.split_once('@')?;
    let (rate_field, rest) = after_at.split_once('[')?;
    let (codec_field, _) = rest.split_once(']')?;

    let codec = codec_field.trim();
    let codec = if codec.is_empty() {
        UNKNOWN_CODEC.to_string()
    } else {
        codec.to_string()
    };

    let rate_field = rate_field.trim();
    let rate_field = rate_field.strip_suffix("fps").unwrap_or(rate_field).trim();

    let fps = if let Some((numerator, denominator)) = rate_field.split_once('/') {
        let numerator: i64 = numerator.trim().parse().ok()?;
        let denominator: i64 = denominator.trim().parse().ok()?;
        if denominator == 0 {
            0.0
        } else {
            round2(numerator as f64 / denominator as f64)
        }
    } else {
        rate_field.parse::<f64>().ok()?
    };

    (fps.is_finite() && fps >= 0.0).then_some((fps, codec))
}

//! Metric extraction: normalizing frame polls into samples.
//!
//! A sample carries the three metrics the aggregator cares about:
//! frame rate, codec, and frame byte size. Extraction is best-effort
//! and lossy: malformed input degrades to a zero-rate, unknown-codec
//! sample with a logged warning, and never fails the polling loop.

mod fourcc;
mod status;

pub use fourcc::decode_fourcc;
pub use status::parse_status_text;

use crate::source::{FrameDescriptor, FrameSource, Poll};

/// Codec string recorded when extraction cannot determine one.
pub const UNKNOWN_CODEC: &str = "unknown";

/// One normalized frame reading.
///
/// Lives only for the poll iteration that produced it; the aggregator
/// folds it into the in-progress window immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Frames per second, never negative. Zero when unknown.
    pub frame_rate_fps: f64,
    /// Best-effort decoded codec, [`UNKNOWN_CODEC`] on failure.
    pub codec: String,
    /// Size of the frame's data buffer in bytes.
    pub byte_size: u64,
}

impl Sample {
    /// Normalizes a structured frame descriptor.
    pub fn from_descriptor(descriptor: &FrameDescriptor) -> Self {
        let frame_rate_fps = if descriptor.frame_rate_d != 0 {
            f64::from(descriptor.frame_rate_n) / f64::from(descriptor.frame_rate_d)
        } else {
            0.0
        };
        Self {
            frame_rate_fps: frame_rate_fps.max(0.0),
            codec: decode_fourcc(descriptor.fourcc),
            byte_size: descriptor.data_size,
        }
    }

    /// Recovers metrics from a textual frame summary.
    ///
    /// The byte size must be supplied separately; the text form does
    /// not carry one.
    pub fn from_status_text(text: &str, byte_size: u64) -> Self {
        let (frame_rate_fps, codec) = parse_status_text(text);
        Self {
            frame_rate_fps,
            codec,
            byte_size,
        }
    }

    /// The degraded sample recorded when a poll delivered no frame.
    pub fn pending() -> Self {
        Self {
            frame_rate_fps: 0.0,
            codec: UNKNOWN_CODEC.to_string(),
            byte_size: 0,
        }
    }
}

/// Turns one poll outcome into a sample.
///
/// For text-form polls the frame size is fetched with a separate
/// source query; if that query fails the size is taken as zero and the
/// failure logged, per the lossy-extraction policy.
pub fn sample_poll<S: FrameSource>(poll: Poll, source: &mut S) -> Sample {
    match poll {
        Poll::Frame(descriptor) => Sample::from_descriptor(&descriptor),
        Poll::Status(text) => {
            let byte_size = source.last_frame_size().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "frame size query failed; assuming zero bytes");
                0
            });
            Sample::from_status_text(&text, byte_size)
        }
        Poll::Pending => Sample::pending(),
    }
}

/// Rounds to two decimal places, the precision of all reported values.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;

    fn descriptor(n: i32, d: i32, tag: &[u8; 4], size: u64) -> FrameDescriptor {
        FrameDescriptor {
            width: 1920,
            height: 1080,
            frame_rate_n: n,
            frame_rate_d: d,
            fourcc: FrameDescriptor::fourcc_tag(tag),
            data_size: size,
        }
    }

    #[test]
    fn test_descriptor_extraction() {
        let sample = Sample::from_descriptor(&descriptor(30, 1, b"UYVY", 100_000));
        assert_eq!(sample.frame_rate_fps, 30.0);
        assert_eq!(sample.codec, "UYVY");
        assert_eq!(sample.byte_size, 100_000);
    }

    #[test]
    fn test_descriptor_zero_denominator() {
        let sample = Sample::from_descriptor(&descriptor(30, 0, b"UYVY", 0));
        assert_eq!(sample.frame_rate_fps, 0.0);
    }

    #[test]
    fn test_descriptor_negative_rate_clamped() {
        let sample = Sample::from_descriptor(&descriptor(-30, 1, b"UYVY", 0));
        assert_eq!(sample.frame_rate_fps, 0.0);
    }

    #[test]
    fn test_status_extraction() {
        let sample = Sample::from_status_text("1920x1080 @ 29.97fps [NV12]", 4096);
        assert_eq!(sample.frame_rate_fps, 29.97);
        assert_eq!(sample.codec, "NV12");
        assert_eq!(sample.byte_size, 4096);
    }

    #[test]
    fn test_waiting_status_degrades() {
        let sample = Sample::from_status_text("Waiting for video...", 0);
        assert_eq!(sample.frame_rate_fps, 0.0);
        assert_eq!(sample.codec, UNKNOWN_CODEC);
    }

    #[test]
    fn test_sample_poll_queries_size_for_status() {
        let mut source = MockSource::pending().with_frame_size(2048);
        let sample = sample_poll(Poll::Status("640x480 @ 30/1fps [I420]".into()), &mut source);
        assert_eq!(sample.byte_size, 2048);
        assert_eq!(sample.frame_rate_fps, 30.0);
    }

    #[test]
    fn test_sample_poll_size_query_failure_is_zero() {
        let mut source = MockSource::pending().with_size_query_error();
        let sample = sample_poll(Poll::Status("640x480 @ 30/1fps [I420]".into()), &mut source);
        assert_eq!(sample.byte_size, 0);
        assert_eq!(sample.frame_rate_fps, 30.0);
    }

    #[test]
    fn test_sample_poll_pending() {
        let mut source = MockSource::pending();
        let sample = sample_poll(Poll::Pending, &mut source);
        assert_eq!(sample, Sample::pending());
    }
}

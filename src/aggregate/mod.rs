//! Window aggregation of samples into reported records.
//!
//! Samples arrive one per poll; every `window_size` of them collapse
//! into a single [`AggregatedRecord`] carrying the window's byte total
//! as a bitrate estimate and its freshest frame rate and codec.

use crate::extract::{round2, Sample, UNKNOWN_CODEC};

/// One aggregated window, as it appears in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    /// Label for the window's position in time (wall-clock or elapsed).
    pub time_label: String,
    /// Representative frame rate for the window, 2 decimal places.
    pub frame_rate_fps: f64,
    /// Representative codec for the window.
    pub codec: String,
    /// Megabits per second over the window's span, 2 decimal places.
    pub bitrate_mbps: f64,
}

/// Collapses fixed-size batches of samples into aggregated records.
///
/// Frame rate and codec are last-sample-wins: within one short window
/// the values are expected to be stable, and the last reading is the
/// freshest. Byte sizes are summed.
#[derive(Debug)]
pub struct WindowAggregator {
    window_size: usize,
    filled: usize,
    total_bytes: u64,
    last_fps: f64,
    last_codec: String,
    window_label: Option<String>,
}

impl WindowAggregator {
    /// Default number of samples per window.
    pub const DEFAULT_WINDOW_SIZE: usize = 10;

    /// Creates an aggregator with the given window size.
    ///
    /// A zero size is treated as one.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            filled: 0,
            total_bytes: 0,
            last_fps: 0.0,
            last_codec: UNKNOWN_CODEC.to_string(),
            window_label: None,
        }
    }

    /// Folds one sample into the in-progress window.
    ///
    /// Returns a record on exactly every `window_size`-th call and
    /// `None` while the window is still filling. The record carries
    /// the time label supplied with the window's first sample.
    pub fn add_sample(&mut self, sample: &Sample, time_label: &str) -> Option<AggregatedRecord> {
        if self.window_label.is_none() {
            self.window_label = Some(time_label.to_string());
        }
        self.total_bytes = self.total_bytes.saturating_add(sample.byte_size);
        self.last_fps = sample.frame_rate_fps;
        self.last_codec.clone_from(&sample.codec);
        self.filled += 1;

        if self.filled < self.window_size {
            return None;
        }

        // Bits accumulated over the window's nominal 10-second span,
        // scaled to megabits per second.
        let bitrate_mbps = round2(self.total_bytes as f64 * 8.0 / 10_000_000.0);
        let record = AggregatedRecord {
            time_label: self
                .window_label
                .take()
                .unwrap_or_else(|| time_label.to_string()),
            frame_rate_fps: round2(self.last_fps),
            codec: std::mem::replace(&mut self.last_codec, UNKNOWN_CODEC.to_string()),
            bitrate_mbps,
        };

        self.filled = 0;
        self.total_bytes = 0;
        self.last_fps = 0.0;
        Some(record)
    }

    /// Number of samples in the in-progress window.
    pub fn pending_samples(&self) -> usize {
        self.filled
    }

    /// The configured window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fps: f64, codec: &str, bytes: u64) -> Sample {
        Sample {
            frame_rate_fps: fps,
            codec: codec.to_string(),
            byte_size: bytes,
        }
    }

    #[test]
    fn test_record_on_every_nth_sample() {
        let mut aggregator = WindowAggregator::new(3);
        for round in 0..4 {
            assert!(aggregator.add_sample(&sample(30.0, "UYVY", 0), "t").is_none());
            assert!(aggregator.add_sample(&sample(30.0, "UYVY", 0), "t").is_none());
            assert!(
                aggregator.add_sample(&sample(30.0, "UYVY", 0), "t").is_some(),
                "round {round}"
            );
        }
    }

    #[test]
    fn test_bitrate_formula() {
        let mut aggregator = WindowAggregator::new(10);
        let mut record = None;
        for _ in 0..10 {
            record = aggregator.add_sample(&sample(30.0, "UYVY", 100_000), "12:00:00");
        }
        let record = record.expect("tenth sample completes the window");
        assert_eq!(record.frame_rate_fps, 30.0);
        assert_eq!(record.codec, "UYVY");
        // 10 * 100_000 bytes * 8 / 10_000_000 = 0.80 Mbps
        assert_eq!(record.bitrate_mbps, 0.80);
        assert_eq!(record.time_label, "12:00:00");
    }

    #[test]
    fn test_zero_byte_window_is_not_an_error() {
        let mut aggregator = WindowAggregator::new(2);
        aggregator.add_sample(&Sample::pending(), "t");
        let record = aggregator.add_sample(&Sample::pending(), "t").unwrap();
        assert_eq!(record.bitrate_mbps, 0.0);
        assert_eq!(record.frame_rate_fps, 0.0);
        assert_eq!(record.codec, UNKNOWN_CODEC);
    }

    #[test]
    fn test_last_sample_wins_for_rate_and_codec() {
        let mut aggregator = WindowAggregator::new(2);
        aggregator.add_sample(&sample(25.0, "I420", 100), "t");
        let record = aggregator.add_sample(&sample(29.97, "NV12", 100), "t").unwrap();
        assert_eq!(record.frame_rate_fps, 29.97);
        assert_eq!(record.codec, "NV12");
    }

    #[test]
    fn test_label_is_window_start_label() {
        let mut aggregator = WindowAggregator::new(2);
        aggregator.add_sample(&sample(30.0, "UYVY", 0), "10:00:00");
        let record = aggregator.add_sample(&sample(30.0, "UYVY", 0), "10:00:01").unwrap();
        assert_eq!(record.time_label, "10:00:00");

        // Next window picks up a fresh label.
        aggregator.add_sample(&sample(30.0, "UYVY", 0), "10:00:02");
        let record = aggregator.add_sample(&sample(30.0, "UYVY", 0), "10:00:03").unwrap();
        assert_eq!(record.time_label, "10:00:02");
    }

    #[test]
    fn test_window_resets_between_records() {
        let mut aggregator = WindowAggregator::new(2);
        aggregator.add_sample(&sample(30.0, "UYVY", 1_000_000), "t");
        aggregator.add_sample(&sample(30.0, "UYVY", 1_000_000), "t").unwrap();

        aggregator.add_sample(&Sample::pending(), "t");
        let record = aggregator.add_sample(&Sample::pending(), "t").unwrap();
        assert_eq!(record.bitrate_mbps, 0.0, "byte total must not leak across windows");
    }

    #[test]
    fn test_zero_window_size_treated_as_one() {
        let mut aggregator = WindowAggregator::new(0);
        assert_eq!(aggregator.window_size(), 1);
        assert!(aggregator.add_sample(&sample(30.0, "UYVY", 0), "t").is_some());
    }

    #[test]
    fn test_fps_rounded_to_two_places() {
        let mut aggregator = WindowAggregator::new(1);
        let record = aggregator
            .add_sample(&sample(30000.0 / 1001.0, "HDYC", 0), "t")
            .unwrap();
        assert_eq!(record.frame_rate_fps, 29.97);
    }
}

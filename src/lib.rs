//! NDI Frame-Metadata Monitor Library
//!
//! Polls a video source for per-frame metadata (resolution, frame
//! rate, codec, buffer size), aggregates fixed-size windows of samples
//! into bitrate/frame-rate records, and emits a session report: a
//! two-panel time-series chart plus a flat-text log.
//!
//! # Architecture
//!
//! The pipeline is an explicit data flow driven by a background
//! sampling thread:
//!
//! ```text
//! source → extract → aggregate → history
//!                                    ↓
//!                          report (on stop)
//! ```
//!
//! # Design Principles
//!
//! - **Lossy extraction**: malformed frame metadata degrades to a
//!   zero-rate, unknown-codec sample; the polling loop never dies on
//!   bad input or a flapping source.
//! - **Single-session loops**: a [`SamplingLoop`] runs exactly one
//!   start/stop session and emits its report exactly once.
//! - **Bounded shutdown**: `stop` never blocks past its grace period,
//!   even if the source wedges a poll.
//! - **Structured data end-to-end**: the textual frame summary is
//!   parsed only as a compatibility shim for sources that offer no
//!   structured form.
//!
//! # Example
//!
//! ```no_run
//! use ndi_monitor::{
//!     config::{ReportConfig, SamplingConfig},
//!     sampler::SamplingLoop,
//!     source::MockSource,
//! };
//!
//! let mut sampler = SamplingLoop::new(
//!     MockSource::new(),
//!     SamplingConfig::default(),
//!     ReportConfig::default(),
//! );
//!
//! sampler.start().unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(30));
//!
//! let summary = sampler.stop().unwrap();
//! if let Some(report) = summary.report {
//!     println!("log: {}", report.log.display());
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![cfg_attr(not(feature = "ndi"), deny(unsafe_code))]

pub mod aggregate;
pub mod config;
pub mod extract;
pub mod report;
pub mod sampler;
pub mod source;

// Re-export commonly used types at crate root
pub use aggregate::{AggregatedRecord, WindowAggregator};
pub use config::{FileConfig, LabelMode, ReportConfig, SamplingConfig, SourceConfig};
pub use extract::Sample;
pub use report::{ReportError, ReportPaths};
pub use sampler::{SamplerError, SamplerState, SamplingLoop, StopSummary};
pub use source::{DiscoveredSource, FrameDescriptor, FrameSource, MockSource, Poll, SourceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

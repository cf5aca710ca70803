//! Video frame sources and the polling contract.
//!
//! This module defines the boundary between the sampling pipeline and
//! whatever actually delivers frames: the real NDI receiver (behind the
//! `ndi` feature), or a mock implementation for testing and demos. A
//! source is polled with a bounded timeout and answers with either a
//! frame descriptor, a human-readable status string (the textual
//! compatibility form), or a "no frame yet" signal.

mod descriptor;
mod mock;
#[cfg(feature = "ndi")]
mod ndi;

pub use descriptor::FrameDescriptor;
pub use mock::MockSource;
#[cfg(feature = "ndi")]
pub use ndi::{NdiFinder, NdiRuntime, NdiSource};

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The video interface could not be brought up.
    #[error("video interface initialization failed: {0}")]
    InitFailed(String),
    /// Network discovery of sources failed.
    #[error("source discovery failed: {0}")]
    DiscoveryFailed(String),
    /// A connection to a discovered source could not be established.
    #[error("failed to connect to source: {0}")]
    ConnectFailed(String),
    /// A poll failed outright (distinct from a timeout, which is
    /// [`Poll::Pending`]).
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),
    /// The source could not report the last frame's byte size.
    #[error("frame size unavailable: {0}")]
    SizeUnavailable(String),
}

/// A video source discovered on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSource {
    /// Human-readable source name.
    pub name: String,
    /// Network address the source is reachable at.
    pub address: String,
}

/// Outcome of one bounded poll of a frame source.
#[derive(Debug, Clone, PartialEq)]
pub enum Poll {
    /// A frame arrived; its metadata is in the descriptor.
    Frame(FrameDescriptor),
    /// The source only offers a textual summary of the current frame,
    /// e.g. `"1920x1080 @ 30000/1001fps [HDYC]"` or
    /// `"Waiting for video..."`.
    Status(String),
    /// No frame arrived within the timeout. Not an error.
    Pending,
}

/// Trait for pollable frame sources.
///
/// Implementations must return within roughly the given timeout so the
/// sampling loop keeps making forward progress even when no frames
/// ever arrive.
pub trait FrameSource {
    /// Polls for the next frame, waiting at most `timeout`.
    fn poll(&mut self, timeout: Duration) -> Result<Poll, SourceError>;

    /// Returns the byte size of the most recently captured frame.
    ///
    /// Compatibility query for sources that only report the textual
    /// status form, which carries no size field.
    fn last_frame_size(&mut self) -> Result<u64, SourceError>;
}

//! Frame descriptor: per-frame metadata handed over by a source.

/// Metadata accompanying one captured video frame.
///
/// Lives only for the poll iteration that produced it; the sampling
/// pipeline immediately normalizes it into a [`Sample`] and drops it.
///
/// [`Sample`]: crate::extract::Sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Frame width in pixels.
    pub width: i32,
    /// Frame height in pixels.
    pub height: i32,
    /// Frame rate numerator (e.g. 30000 for 29.97 fps).
    pub frame_rate_n: i32,
    /// Frame rate denominator (e.g. 1001 for 29.97 fps).
    pub frame_rate_d: i32,
    /// FourCC pixel/codec tag, four ASCII bytes packed little-endian.
    pub fourcc: u32,
    /// Size of the frame's data buffer in bytes.
    pub data_size: u64,
}

impl FrameDescriptor {
    /// Builds a FourCC tag from four ASCII characters.
    pub fn fourcc_tag(tag: &[u8; 4]) -> u32 {
        u32::from_le_bytes(*tag)
    }
}

//! FourCC tag decoding.

use super::UNKNOWN_CODEC;

/// Decodes a FourCC tag into a codec string.
///
/// Bytes are read in little-endian order and interpreted as ASCII,
/// stopping at the first non-printable byte. An empty result decodes
/// as [`UNKNOWN_CODEC`].
pub fn decode_fourcc(tag: u32) -> String {
    let mut codec = String::with_capacity(4);
    for byte in tag.to_le_bytes() {
        if !(0x20..=0x7e).contains(&byte) {
            break;
        }
        codec.push(byte as char);
    }
    if codec.is_empty() {
        UNKNOWN_CODEC.to_string()
    } else {
        codec
    }
}

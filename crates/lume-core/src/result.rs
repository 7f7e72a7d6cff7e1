//! Decoding results for images with varying bit depths

use alloc::vec::Vec;

/// A buffer of decoded pixels.
///
/// Most decoders produce 8 bit samples, PNG may produce
/// 16 bit ones, this enum lets a decoder return either
/// without forcing a conversion.
#[non_exhaustive]
pub enum DecodingResult {
    U8(Vec<u8>),
    U16(Vec<u16>)
}

impl DecodingResult {
    /// Return the contained `Vec<u8>` or `None` if the
    /// result holds another type
    pub fn u8(self) -> Option<Vec<u8>> {
        match self {
            DecodingResult::U8(data) => Some(data),
            _ => None
        }
    }

    /// Return the contained `Vec<u16>` or `None` if the
    /// result holds another type
    pub fn u16(self) -> Option<Vec<u16>> {
        match self {
            DecodingResult::U16(data) => Some(data),
            _ => None
        }
    }
}

/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A BMP decoder and encoder.
//!
//! Covers the formats Windows actually writes for true color images,
//! uncompressed 24 bit BGR and 32 bit BGRA with BITMAPINFOHEADER,
//! BITMAPV4HEADER or BITMAPV5HEADER. Palette, RLE and sub-24-bit
//! files are rejected as unsupported.
pub use decoder::BmpDecoder;
pub use encoder::BmpEncoder;
pub use errors::BmpErrors;

mod decoder;
mod encoder;
mod errors;

/// Probe whether the buffer looks like a bmp file.
///
/// Needs at least the file header and the DIB header size to
/// be conclusive
pub fn probe_bmp(bytes: &[u8]) -> bool {
    if bytes.len() < 18 || &bytes[..2] != b"BM" {
        return false;
    }
    // DIB header sizes we know: INFO, V4, V5 plus the ancient CORE
    let dib_size = u32::from_le_bytes(bytes[14..18].try_into().unwrap());
    matches!(dib_size, 12 | 40 | 52 | 56 | 108 | 124)
}

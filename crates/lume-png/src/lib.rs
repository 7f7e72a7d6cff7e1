/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A PNG decoder and encoder
//!
//! The decoder supports color types 0, 2, 3, 4 and 6 at depths of
//! 1, 2, 4, 8 and 16 bits, both sequential and Adam7 interlaced
//! images. Samples below 8 bits are expanded to 8 bits, 16 bit images
//! are returned as native `u16` buffers. Palette and transparency
//! chunks are applied during decoding so the output is always a plain
//! Luma/LumaA/RGB/RGBA buffer.
//!
//! The encoder writes non-interlaced images with per-row adaptive
//! filtering and a single zlib stream split into 8 KiB IDAT chunks.
//!
//! # Usage
//! ```no_run
//! use lume_png::PngDecoder;
//! let data = [0u8; 10];
//! let mut decoder = PngDecoder::new(&data);
//! let pixels = decoder.decode();
//! ```
pub use decoder::{PngDecoder, PngInfo};
pub use encoder::PngEncoder;
pub use error::PngErrors;

mod constants;
mod crc;
mod decoder;
mod encoder;
mod enums;
mod error;
mod filters;
mod headers;

pub use enums::{FilterMethod, InterlaceMethod, PngColor};

/// Probe whether the buffer looks like a png file
pub fn probe_png(bytes: &[u8]) -> bool {
    bytes.len() >= 8 && bytes[..8] == constants::PNG_SIGNATURE.to_be_bytes()
}

/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A baseline JPEG decoder and encoder.
//!
//! The decoder handles baseline sequential DCT images (SOF0) with
//! Huffman entropy coding, restart markers, 4:4:4, 4:2:2 and 4:2:0
//! chroma subsampling and grayscale scans. Progressive (SOF2) and
//! arithmetic coded images are rejected as unsupported.
//!
//! XMP packets (APP1) and HDR gain map payloads (APP2 MPF, APP11)
//! are captured as opaque byte blobs and exposed through getters,
//! the decoder does not interpret them.
//!
//! The encoder writes baseline JFIF files with the standard Annex K
//! quantization and Huffman tables, quality scaled quantization and
//! either 4:2:0 or 4:4:4 subsampling.
pub use decoder::{ImageInfo, JpegDecoder};
pub use encoder::JpegEncoder;
pub use errors::{DecodeErrors, EncodeErrors};

mod bitstream;
mod color_convert;
mod components;
mod decoder;
mod encoder;
mod errors;
mod headers;
mod huffman;
mod idct;
mod marker;
mod tables;
mod upsampler;

//! A compact deflate decoder and encoder.
//!
//! This crate features the deflate/zlib machinery shared by the
//! lume image codecs, mainly png which stores its filtered scanlines
//! as a zlib stream.
//!
//! Use it if
//! - You want a small, portable RFC 1951 implementation with no
//!   platform specific code
//! - You want a 100% safe pure rust implementation
//!
//! # Usage
//!
//! Decoding zlib data
//! ```no_run
//! use lume_inflate::DeflateDecoder;
//! let totally_valid_data = [0; 23];
//! let mut decoder = DeflateDecoder::new(&totally_valid_data);
//!
//! let decompressed = decoder.decode_zlib();
//! ```
//!
//! Encoding zlib data
//! ```
//! use lume_inflate::DeflateEncoder;
//! let data = b"hello hello hello";
//! let compressed = DeflateEncoder::new(data).encode_zlib();
//! ```
//!
//! Decoding zlib data without confirming the adler32 checksum
//! ```no_run
//! use lume_inflate::{DeflateDecoder, DeflateOptions};
//! let totally_valid_data = [0; 23];
//! let options = DeflateOptions::default().set_confirm_checksum(false);
//! let decoder = DeflateDecoder::new_with_options(&totally_valid_data, options);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub use crate::decoder::{DeflateDecoder, DeflateOptions};
pub use crate::encoder::{DeflateEncoder, DeflateEncoderOptions, DeflateEncodingStrategy};

mod bitstream;
mod constants;
mod decoder;
mod encoder;
pub mod errors;
mod utils;

/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core routines shared by all lume codecs
//!
//! This crate provides the small set of primitives every codec in the
//! `lume` family builds on
//!
//! - A slice backed bytestream reader and writer with endian aware reads and writes
//! - MSB and LSB first bit readers and writers
//! - Colorspace and bit depth information shared by images
//! - Image decoder and encoder options
//! - A simple enum type to hold decoding results
//!
//! The library is `#[no_std]` with `alloc`, which it needs for the
//! growable buffers decoded bytes land in. Codecs never touch the host
//! filesystem, decoders consume complete in-memory buffers and encoders
//! fill in-memory sinks, which keeps everything usable from a wasm runtime.
//!
//! # Features
//!  - `std`: Enables `std` specific conveniences.
//!  - `log`: Forward our logging macros to the `log` crate, without it
//!     the macros compile to nothing.
#![cfg_attr(not(feature = "std"), no_std)]
#![macro_use]
extern crate alloc;

#[cfg(not(feature = "log"))]
pub mod log;

#[cfg(feature = "log")]
pub use log;

pub mod bit_depth;
pub mod bits;
pub mod bytestream;
pub mod colorspace;
pub mod options;
pub mod result;
mod serde;

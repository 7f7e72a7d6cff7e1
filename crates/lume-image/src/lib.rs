/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The umbrella image crate of the lume family.
//!
//! This ties the per-format codecs into one coherent surface:
//!
//! - [`Frame`](frame::Frame) and [`Image`](image::Image), the
//!   in-memory raster model every codec decodes into and encodes from
//! - [`ImageFormat`](codecs::ImageFormat) with magic byte sniffing
//!   and UTI string mapping
//! - [`Source`](source::Source), the read side: hand it encoded
//!   bytes, pull decoded frames and their properties out
//! - [`Destination`](destination::Destination), the write side: a
//!   small state machine collecting frames until finalized into a
//!   file
//!
//! Formats are feature gated, everything is on by default.
pub mod codecs;
pub mod destination;
pub mod errors;
pub mod frame;
pub mod image;
pub mod properties;
pub mod source;
pub mod traits;

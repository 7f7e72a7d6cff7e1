//! Palette construction and dithering for indexed color output.
//!
//! The GIF encoder (and paletted PNG output) needs to squeeze true
//! color frames into at most 256 colors. This crate carries the two
//! halves of that job, a median cut quantizer that builds the palette
//! and a Floyd-Steinberg error diffuser that maps pixels onto it.
#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub use dither::{dither_floyd_steinberg, remap_nearest};
pub use median_cut::{quantize, Palette};

mod dither;
mod median_cut;

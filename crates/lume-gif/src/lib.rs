//! A GIF decoder and encoder.
//!
//! The decoder reads both GIF87a and GIF89a streams, composites
//! frames against the logical screen honoring each frame's disposal
//! method and hands back full canvas RGBA frames with their delays.
//!
//! The encoder writes GIF89a. True color input is quantized to at
//! most 256 colors with a median cut palette, optionally dithered,
//! and multi frame sequences get a NETSCAPE2.0 loop extension plus
//! per frame graphic control blocks.
pub use decoder::{GifDecoder, GifFrame};
pub use encoder::GifEncoder;
pub use enums::DisposalMethod;
pub use errors::GifDecoderErrors;

mod decoder;
mod encoder;
mod enums;
mod errors;

/// Probe whether the buffer looks like a gif file
pub fn probe_gif(bytes: &[u8]) -> bool {
    bytes.len() >= 6 && (&bytes[..6] == b"GIF87a" || &bytes[..6] == b"GIF89a")
}

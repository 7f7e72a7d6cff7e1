//! A baseline TIFF decoder and encoder.
//!
//! The subset is the one pixel interchange actually needs, little
//! endian files with uncompressed grayscale, RGB or RGBA strips at
//! 8 bits per sample, multi-page via the IFD chain. Compressed,
//! tiled, big endian and exotic photometric files are rejected as
//! unsupported.
//!
//! The encoder writes one IFD per page with tags in ascending order,
//! strips of roughly 8 KiB and `ExtraSamples = 2` (unassociated
//! alpha) for RGBA pages.
pub use decoder::TiffDecoder;
pub use encoder::TiffEncoder;
pub use errors::TiffErrors;

mod decoder;
mod encoder;
mod errors;
mod ifd;

/// Probe whether the buffer looks like a tiff file, either byte order
pub fn probe_tiff(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && (&bytes[..4] == b"II*\0" || &bytes[..4] == b"MM\0*")
}

//! Errors possible during image decoding, encoding and dispatch

use std::fmt::{Debug, Display, Formatter};

use crate::codecs::ImageFormat;

/// All possible image errors that can occur.
///
/// The variants mirror the failure classes of the whole stack:
/// sniffing, structural parsing, checksums, API misuse and bounds
pub enum ImageErrors {
    /// The sniffer did not match any known format
    UnknownFormat,
    /// A recognized format requested a feature outside the
    /// supported subset
    Unsupported(String),
    /// A reader reached end of input mid structure
    Truncated,
    /// Structural violation, bad magic, wrong marker order, invalid
    /// entropy data
    Malformed(String),
    /// A stored CRC or Adler did not match the computed one
    ChecksumMismatch,
    /// API misuse, frame counts exceeded, finalize after finalize,
    /// unknown UTIs, oversized palettes
    InvalidParameter(String),
    /// Palette indices or declared dimensions out of range
    OutOfBounds(String),
    /// The feature required to handle this format was not compiled in
    ImageDecoderNotIncluded(ImageFormat),
    /// No encoder exists for the format
    NoEncoderForFormat(ImageFormat)
}

impl Debug for ImageErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFormat => writeln!(f, "Unknown image format, no magic bytes matched"),
            Self::Unsupported(what) => writeln!(f, "Unsupported: {what}"),
            Self::Truncated => writeln!(f, "Input ended mid structure"),
            Self::Malformed(what) => writeln!(f, "Malformed image: {what}"),
            Self::ChecksumMismatch => writeln!(f, "Stored checksum does not match computed one"),
            Self::InvalidParameter(what) => writeln!(f, "Invalid parameter: {what}"),
            Self::OutOfBounds(what) => writeln!(f, "Out of bounds: {what}"),
            Self::ImageDecoderNotIncluded(format) => {
                writeln!(
                    f,
                    "The feature required to decode {format:?} has not been included"
                )
            }
            Self::NoEncoderForFormat(format) => {
                writeln!(f, "No encoder for image format {format:?}")
            }
        }
    }
}

impl Display for ImageErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for ImageErrors {}

impl From<String> for ImageErrors {
    fn from(s: String) -> ImageErrors {
        ImageErrors::Malformed(s)
    }
}

impl From<&'static str> for ImageErrors {
    fn from(s: &'static str) -> ImageErrors {
        ImageErrors::Malformed(s.to_string())
    }
}

#[cfg(feature = "png")]
impl From<lume_png::PngErrors> for ImageErrors {
    fn from(from: lume_png::PngErrors) -> Self {
        use lume_png::PngErrors;
        match from {
            PngErrors::BadCrc(_, _) => ImageErrors::ChecksumMismatch,
            PngErrors::ZlibDecodeErrors(err) => inflate_error_kind(err),
            PngErrors::Unsupported(what) => ImageErrors::Unsupported(format!("png: {what}")),
            PngErrors::PaletteIndexOutOfBounds(index, len) => {
                ImageErrors::OutOfBounds(format!("png palette index {index} of {len}"))
            }
            PngErrors::TooLargeDimensions(dim, limit, found) => ImageErrors::OutOfBounds(
                format!("png {dim} {found} above limit {limit}")
            ),
            err => ImageErrors::Malformed(format!("png: {err:?}"))
        }
    }
}

/// Inflate failures split into checksum and structural classes
#[cfg(feature = "png")]
fn inflate_error_kind(err: lume_inflate::errors::InflateDecodeErrors) -> ImageErrors {
    use lume_inflate::errors::DecodeErrorStatus;
    match err.error {
        DecodeErrorStatus::MismatchedAdler(_, _) => ImageErrors::ChecksumMismatch,
        DecodeErrorStatus::InsufficientData => ImageErrors::Truncated,
        other => ImageErrors::Malformed(format!("inflate: {other:?}"))
    }
}

#[cfg(feature = "jpeg")]
impl From<lume_jpeg::DecodeErrors> for ImageErrors {
    fn from(from: lume_jpeg::DecodeErrors) -> Self {
        use lume_jpeg::DecodeErrors;
        match from {
            DecodeErrors::Unsupported(scheme) => {
                ImageErrors::Unsupported(format!("jpeg: {scheme:?}"))
            }
            DecodeErrors::ExhaustedData => ImageErrors::Truncated,
            DecodeErrors::LargeDimensions(limit, found) => {
                ImageErrors::OutOfBounds(format!("jpeg dimension {found} above limit {limit}"))
            }
            err => ImageErrors::Malformed(format!("jpeg: {err:?}"))
        }
    }
}

#[cfg(feature = "jpeg")]
impl From<lume_jpeg::EncodeErrors> for ImageErrors {
    fn from(from: lume_jpeg::EncodeErrors) -> Self {
        ImageErrors::InvalidParameter(format!("jpeg: {from:?}"))
    }
}

#[cfg(feature = "gif")]
impl From<lume_gif::GifDecoderErrors> for ImageErrors {
    fn from(from: lume_gif::GifDecoderErrors) -> Self {
        use lume_gif::GifDecoderErrors;
        match from {
            GifDecoderErrors::PaletteIndexOutOfBounds(index, len) => {
                ImageErrors::OutOfBounds(format!("gif palette index {index} of {len}"))
            }
            GifDecoderErrors::TooLargeDimensions(dim, limit, found) => {
                ImageErrors::OutOfBounds(format!("gif {dim} {found} above limit {limit}"))
            }
            err => ImageErrors::Malformed(format!("gif: {err:?}"))
        }
    }
}

#[cfg(feature = "bmp")]
impl From<lume_bmp::BmpErrors> for ImageErrors {
    fn from(from: lume_bmp::BmpErrors) -> Self {
        use lume_bmp::BmpErrors;
        match from {
            BmpErrors::Unsupported(what) => ImageErrors::Unsupported(format!("bmp: {what}")),
            BmpErrors::TooLargeDimensions(dim, limit, found) => {
                ImageErrors::OutOfBounds(format!("bmp {dim} {found} above limit {limit}"))
            }
            err => ImageErrors::Malformed(format!("bmp: {err:?}"))
        }
    }
}

#[cfg(feature = "tiff")]
impl From<lume_tiff::TiffErrors> for ImageErrors {
    fn from(from: lume_tiff::TiffErrors) -> Self {
        use lume_tiff::TiffErrors;
        match from {
            TiffErrors::Unsupported(what) => ImageErrors::Unsupported(format!("tiff: {what}")),
            TiffErrors::PageOutOfBounds(index, count) => {
                ImageErrors::OutOfBounds(format!("tiff page {index} of {count}"))
            }
            TiffErrors::TooLargeDimensions(dim, limit, found) => {
                ImageErrors::OutOfBounds(format!("tiff {dim} {found} above limit {limit}"))
            }
            err => ImageErrors::Malformed(format!("tiff: {err:?}"))
        }
    }
}

#[cfg(feature = "webp")]
impl From<lume_webp::WebPErrors> for ImageErrors {
    fn from(from: lume_webp::WebPErrors) -> Self {
        use lume_webp::WebPErrors;
        match from {
            WebPErrors::Unsupported(what) => ImageErrors::Unsupported(format!("webp: {what}")),
            WebPErrors::Truncated => ImageErrors::Truncated,
            WebPErrors::TooLargeDimensions(dim, limit, found) => {
                ImageErrors::OutOfBounds(format!("webp {dim} {found} above limit {limit}"))
            }
            err => ImageErrors::Malformed(format!("webp: {err:?}"))
        }
    }
}

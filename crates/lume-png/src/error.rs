use std::fmt::{Debug, Formatter};

use lume_inflate::errors::InflateDecodeErrors;

pub enum PngErrors {
    /// The file does not start with the png signature
    BadSignature,
    /// A chunk's stored CRC did not match the computed one
    BadCrc(u32, u32),
    /// A critical chunk we do not understand
    UnknownCriticalChunk([u8; 4]),
    /// The zlib stream inside IDAT chunks was corrupt
    ZlibDecodeErrors(InflateDecodeErrors),
    /// Image dimensions exceed the configured limits
    TooLargeDimensions(&'static str, usize, usize),
    /// A palette index pointed outside the palette
    PaletteIndexOutOfBounds(usize, usize),
    /// Some feature outside the supported subset was requested
    Unsupported(&'static str),
    GenericStatic(&'static str),
    Generic(String)
}

impl Debug for PngErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadSignature => writeln!(f, "Bad PNG signature, not a png"),
            Self::BadCrc(expected, found) => {
                writeln!(f, "Bad chunk CRC, stored {expected:08X} computed {found:08X}")
            }
            Self::UnknownCriticalChunk(name) => {
                writeln!(f, "Unknown critical chunk {:?}", core::str::from_utf8(name))
            }
            Self::ZlibDecodeErrors(err) => writeln!(f, "Inflate error: {err:?}"),
            Self::TooLargeDimensions(dim, limit, found) => {
                writeln!(
                    f,
                    "Too large dimensions for {dim}, expected less than {limit} but found {found}"
                )
            }
            Self::PaletteIndexOutOfBounds(index, length) => {
                writeln!(f, "Palette index {index} out of bounds for palette of length {length}")
            }
            Self::Unsupported(what) => writeln!(f, "Unsupported png feature: {what}"),
            Self::GenericStatic(val) => writeln!(f, "{val}"),
            Self::Generic(val) => writeln!(f, "{val}")
        }
    }
}

impl From<&'static str> for PngErrors {
    fn from(val: &'static str) -> Self {
        Self::GenericStatic(val)
    }
}

impl From<String> for PngErrors {
    fn from(val: String) -> Self {
        Self::Generic(val)
    }
}

impl From<InflateDecodeErrors> for PngErrors {
    fn from(val: InflateDecodeErrors) -> Self {
        Self::ZlibDecodeErrors(val)
    }
}

impl std::error::Error for PngErrors {}

impl core::fmt::Display for PngErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

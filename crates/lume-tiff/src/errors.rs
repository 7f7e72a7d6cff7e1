use std::fmt::{Debug, Formatter};

pub enum TiffErrors {
    /// Magic bytes do not match either tiff byte order
    InvalidMagicBytes,
    /// A recognized but unsupported tiff flavor
    Unsupported(String),
    /// Structural violations, bad offsets and the like
    Malformed(String),
    /// Too large dimensions for width or height
    TooLargeDimensions(&'static str, usize, usize),
    /// A page index past the IFD chain
    PageOutOfBounds(usize, usize),
    GenericStatic(&'static str)
}

impl Debug for TiffErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMagicBytes => {
                writeln!(f, "Invalid magic bytes, not a tiff file")
            }
            Self::Unsupported(what) => {
                writeln!(f, "Unsupported tiff image: {what}")
            }
            Self::Malformed(what) => {
                writeln!(f, "Malformed tiff: {what}")
            }
            Self::TooLargeDimensions(dim, limit, found) => {
                writeln!(
                    f,
                    "Too large dimensions for {dim}, expected less than {limit} but found {found}"
                )
            }
            Self::PageOutOfBounds(index, count) => {
                writeln!(f, "Page {index} out of bounds, file has {count} pages")
            }
            Self::GenericStatic(v) => writeln!(f, "{v}")
        }
    }
}

impl From<&'static str> for TiffErrors {
    fn from(value: &'static str) -> Self {
        Self::GenericStatic(value)
    }
}

impl std::error::Error for TiffErrors {}

impl core::fmt::Display for TiffErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

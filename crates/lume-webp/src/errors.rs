use std::fmt::{Debug, Formatter};

pub enum WebPErrors {
    /// Not a RIFF/WEBP file
    InvalidMagicBytes,
    /// A recognized but unsupported webp flavor
    Unsupported(String),
    /// Ran out of bytes mid structure
    Truncated,
    /// Structural violations
    Malformed(String),
    /// Too large dimensions for width or height
    TooLargeDimensions(&'static str, usize, usize),
    GenericStatic(&'static str)
}

impl Debug for WebPErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMagicBytes => writeln!(f, "Invalid magic bytes, not a webp file"),
            Self::Unsupported(what) => writeln!(f, "Unsupported webp feature: {what}"),
            Self::Truncated => writeln!(f, "Stream ended mid structure"),
            Self::Malformed(what) => writeln!(f, "Malformed webp: {what}"),
            Self::TooLargeDimensions(dim, limit, found) => {
                writeln!(
                    f,
                    "Too large dimensions for {dim}, expected less than {limit} but found {found}"
                )
            }
            Self::GenericStatic(v) => writeln!(f, "{v}")
        }
    }
}

impl From<&'static str> for WebPErrors {
    fn from(value: &'static str) -> Self {
        Self::GenericStatic(value)
    }
}

impl From<String> for WebPErrors {
    fn from(value: String) -> Self {
        Self::Malformed(value)
    }
}

impl From<lume_core::bits::BitsTruncated> for WebPErrors {
    fn from(_: lume_core::bits::BitsTruncated) -> Self {
        Self::Truncated
    }
}

impl std::error::Error for WebPErrors {}

impl core::fmt::Display for WebPErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

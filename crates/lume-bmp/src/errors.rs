use std::fmt::{Debug, Formatter};

pub enum BmpErrors {
    /// Magic bytes do not spell BM
    InvalidMagicBytes,
    /// A recognized but unsupported bmp flavor
    Unsupported(String),
    /// Too large dimensions for width or height
    TooLargeDimensions(&'static str, usize, usize),
    GenericStatic(&'static str),
    Generic(String)
}

impl Debug for BmpErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMagicBytes => {
                writeln!(f, "Invalid magic bytes, not a bmp file")
            }
            Self::Unsupported(what) => {
                writeln!(f, "Unsupported bmp image: {what}")
            }
            Self::TooLargeDimensions(dim, limit, found) => {
                writeln!(
                    f,
                    "Too large dimensions for {dim}, expected less than {limit} but found {found}"
                )
            }
            Self::GenericStatic(v) => writeln!(f, "{v}"),
            Self::Generic(v) => writeln!(f, "{v}")
        }
    }
}

impl From<&'static str> for BmpErrors {
    fn from(value: &'static str) -> Self {
        Self::GenericStatic(value)
    }
}

impl From<String> for BmpErrors {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

impl std::error::Error for BmpErrors {}

impl core::fmt::Display for BmpErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

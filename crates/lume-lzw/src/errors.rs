use core::fmt::{Debug, Formatter};

use lume_core::bits::BitsTruncated;

pub enum LzwErrors {
    /// The code stream ended mid-code
    Truncated,
    /// A code referenced a dictionary entry that does not exist yet
    InvalidCode(u16),
    /// The initial code size cannot express the palette
    InvalidCodeSize(u8),
    /// A generic error
    Static(&'static str)
}

impl Debug for LzwErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated => writeln!(f, "Code stream ended mid-code"),
            Self::InvalidCode(code) => {
                writeln!(f, "Code {code} references a dictionary entry not yet defined")
            }
            Self::InvalidCodeSize(size) => {
                writeln!(f, "Invalid initial code size {size}, must be between 2 and 11")
            }
            Self::Static(v) => writeln!(f, "{v}")
        }
    }
}

impl From<BitsTruncated> for LzwErrors {
    fn from(_: BitsTruncated) -> Self {
        LzwErrors::Truncated
    }
}

impl From<&'static str> for LzwErrors {
    fn from(value: &'static str) -> Self {
        LzwErrors::Static(value)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LzwErrors {}

#[cfg(feature = "std")]
impl core::fmt::Display for LzwErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

use core::fmt::{Debug, Formatter};

use lume_lzw::LzwErrors;

pub enum GifDecoderErrors {
    /// File is not a gif
    NotAGif,
    /// A generic error
    Static(&'static str),
    /// Too large dimensions for width or height
    TooLargeDimensions(&'static str, usize, usize),
    /// The LZW image data was corrupt
    Lzw(LzwErrors),
    /// A pixel referenced a color outside the palette
    PaletteIndexOutOfBounds(usize, usize),
    /// An arithmetic overflow calculating buffer sizes
    OverflowError(&'static str)
}

impl Debug for GifDecoderErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotAGif => {
                writeln!(f, "Not a gif, magic bytes didn't match")
            }
            Self::Static(v) => {
                writeln!(f, "{}", v)
            }
            Self::TooLargeDimensions(a, b, c) => {
                writeln!(
                    f,
                    "Too large dimensions for {a} expected less than {b} but found {c}"
                )
            }
            Self::Lzw(err) => {
                writeln!(f, "LZW error: {:?}", err)
            }
            Self::PaletteIndexOutOfBounds(index, size) => {
                writeln!(f, "Palette index {index} out of bounds for table of {size} entries")
            }
            Self::OverflowError(v) => {
                writeln!(f, "{}", v)
            }
        }
    }
}

impl From<&'static str> for GifDecoderErrors {
    fn from(value: &'static str) -> Self {
        Self::Static(value)
    }
}

impl From<LzwErrors> for GifDecoderErrors {
    fn from(value: LzwErrors) -> Self {
        Self::Lzw(value)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GifDecoderErrors {}

#[cfg(feature = "std")]
impl core::fmt::Display for GifDecoderErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

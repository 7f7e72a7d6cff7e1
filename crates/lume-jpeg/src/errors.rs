//! Decoder and encoder errors

use std::fmt::{Debug, Formatter};

/// Encoding schemes the decoder recognizes but does not support
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnsupportedSchemes {
    /// Progressive DCT, huffman coded
    ProgressiveDctHuffman,
    /// Extended sequential DCT, arithmetic coded
    ExtendedSequentialDctArithmetic,
    /// Progressive DCT, arithmetic coded
    ProgressiveDctArithmetic,
    /// Lossless sequential
    Lossless,
    /// Hierarchical
    Hierarchical
}

impl UnsupportedSchemes {
    /// Map the n of an unsupported SOF(n) marker
    pub(crate) fn from_int(n: u8) -> Option<UnsupportedSchemes> {
        match n {
            2 => Some(Self::ProgressiveDctHuffman),
            3 | 7 | 11 => Some(Self::Lossless),
            9 => Some(Self::ExtendedSequentialDctArithmetic),
            10 | 14 => Some(Self::ProgressiveDctArithmetic),
            5 | 6 | 13 => Some(Self::Hierarchical),
            _ => None
        }
    }
}

pub enum DecodeErrors {
    /// The first two bytes are not the SOI marker
    IllegalMagicBytes(u16),
    /// A recognized but unsupported encoding scheme
    Unsupported(UnsupportedSchemes),
    /// A huffman table definition was invalid
    HuffmanDecode(String),
    /// Not enough bytes to finish a structure
    ExhaustedData,
    /// Structural violations, wrong marker order, bad lengths
    Format(String),
    FormatStatic(&'static str),
    /// Image dimensions exceed the configured limits
    LargeDimensions(usize, usize)
}

impl Debug for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalMagicBytes(bytes) => {
                writeln!(f, "Illegal magic bytes {bytes:#04X}, not a jpeg")
            }
            Self::Unsupported(scheme) => {
                writeln!(f, "Unsupported jpeg encoding scheme {scheme:?}")
            }
            Self::HuffmanDecode(reason) => writeln!(f, "Huffman error: {reason}"),
            Self::ExhaustedData => writeln!(f, "Exhausted data mid structure"),
            Self::Format(reason) => writeln!(f, "{reason}"),
            Self::FormatStatic(reason) => writeln!(f, "{reason}"),
            Self::LargeDimensions(limit, found) => {
                writeln!(
                    f,
                    "Image dimension {found} larger than configured limit {limit}"
                )
            }
        }
    }
}

impl From<&'static str> for DecodeErrors {
    fn from(value: &'static str) -> Self {
        Self::FormatStatic(value)
    }
}

impl From<String> for DecodeErrors {
    fn from(value: String) -> Self {
        Self::Format(value)
    }
}

impl std::error::Error for DecodeErrors {}

impl core::fmt::Display for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

pub enum EncodeErrors {
    /// The input colorspace cannot be encoded
    UnsupportedColorspace(&'static str),
    /// API misuse, wrong buffer sizes and the like
    Static(&'static str),
    Generic(String)
}

impl Debug for EncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedColorspace(reason) => {
                writeln!(f, "Unsupported colorspace: {reason}")
            }
            Self::Static(reason) => writeln!(f, "{reason}"),
            Self::Generic(reason) => writeln!(f, "{reason}")
        }
    }
}

impl From<&'static str> for EncodeErrors {
    fn from(value: &'static str) -> Self {
        Self::Static(value)
    }
}

impl std::error::Error for EncodeErrors {}

impl core::fmt::Display for EncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

//! Image colorspace information and manipulation utilities

/// All possible image colorspaces understood by the
/// lume codecs.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ColorSpace {
    /// Red, Green, Blue
    RGB,
    /// Red, Green, Blue, Alpha
    RGBA,
    /// Blue, Green, Red, byte order used by BMP files
    BGR,
    /// Blue, Green, Red, Alpha
    BGRA,
    /// YUV colorspace as used by JPEG and VP8
    YCbCr,
    /// Grayscale
    Luma,
    /// Grayscale with alpha
    LumaA,
    /// A single palette index per pixel, the palette
    /// travels with the frame
    Indexed,
    /// The colorspace is unknown
    Unknown
}

impl ColorSpace {
    /// Number of interleaved components a single pixel occupies
    pub const fn num_components(&self) -> usize {
        match self {
            Self::RGB | Self::BGR | Self::YCbCr => 3,
            Self::RGBA | Self::BGRA => 4,
            Self::Luma | Self::Indexed => 1,
            Self::LumaA => 2,
            Self::Unknown => 0
        }
    }

    /// Returns true if the colorspace carries an alpha channel
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::RGBA | Self::BGRA | Self::LumaA)
    }

    /// Returns true for single channel non-indexed colorspaces
    pub const fn is_grayscale(&self) -> bool {
        matches!(self, Self::Luma | Self::LumaA)
    }

    /// Returns true if samples are stored blue first
    pub const fn is_bgr_ordered(&self) -> bool {
        matches!(self, Self::BGR | Self::BGRA)
    }
}

/// Encapsulates all colorspaces supported by
/// the library
pub static ALL_COLORSPACES: [ColorSpace; 8] = [
    ColorSpace::RGB,
    ColorSpace::RGBA,
    ColorSpace::BGR,
    ColorSpace::BGRA,
    ColorSpace::YCbCr,
    ColorSpace::Luma,
    ColorSpace::LumaA,
    ColorSpace::Indexed
];

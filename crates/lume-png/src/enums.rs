/// Known png chunk types
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PngChunkType {
    IHDR,
    PLTE,
    IDAT,
    IEND,
    tRNS,
    gAMA,
    pHYs,
    unkn
}

/// Color types from the IHDR chunk
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PngColor {
    /// Grayscale, color type 0
    Luma,
    /// Truecolor, color type 2
    RGB,
    /// Palette indices, color type 3
    Palette,
    /// Grayscale + alpha, color type 4
    LumaA,
    /// Truecolor + alpha, color type 6
    RGBA,
    #[default]
    Unknown
}

impl PngColor {
    pub(crate) fn from_int(value: u8) -> Option<PngColor> {
        match value {
            0 => Some(PngColor::Luma),
            2 => Some(PngColor::RGB),
            3 => Some(PngColor::Palette),
            4 => Some(PngColor::LumaA),
            6 => Some(PngColor::RGBA),
            _ => None
        }
    }
    /// Samples per pixel before palette expansion
    pub(crate) const fn num_components(self) -> usize {
        match self {
            Self::Luma | Self::Palette => 1,
            Self::LumaA => 2,
            Self::RGB => 3,
            Self::RGBA => 4,
            Self::Unknown => 0
        }
    }
}

/// Scanline filters from the png specification
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FilterMethod {
    #[default]
    None,
    Sub,
    Up,
    Average,
    Paeth
}

impl FilterMethod {
    pub(crate) fn from_int(value: u8) -> Option<FilterMethod> {
        match value {
            0 => Some(FilterMethod::None),
            1 => Some(FilterMethod::Sub),
            2 => Some(FilterMethod::Up),
            3 => Some(FilterMethod::Average),
            4 => Some(FilterMethod::Paeth),
            _ => None
        }
    }
    pub(crate) const fn to_int(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Sub => 1,
            Self::Up => 2,
            Self::Average => 3,
            Self::Paeth => 4
        }
    }
}

/// Interlace methods from the IHDR chunk
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum InterlaceMethod {
    #[default]
    Standard,
    Adam7
}

impl InterlaceMethod {
    pub(crate) fn from_int(value: u8) -> Option<InterlaceMethod> {
        match value {
            0 => Some(InterlaceMethod::Standard),
            1 => Some(InterlaceMethod::Adam7),
            _ => None
        }
    }
}

//! Image bit depth information and manipulations

/// The image bit depth.
///
/// The library supports depths of 8 and 16 bits per
/// channel, lower PNG depths are expanded to 8 bits
/// during decoding.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum BitDepth {
    /// Eight bit depth.
    ///
    /// Pixels are stored in a [`u8`] and use the whole
    /// range from 0-255.
    #[default]
    Eight,
    /// Sixteen bit depth
    ///
    /// Pixels are stored in a [`u16`] and use the whole range
    /// 0-65535. Only PNG produces and consumes this depth.
    Sixteen,
    /// Bit depth information is unknown
    Unknown
}

/// The underlying bit representation of the image
///
/// This represents the minimum rust type that
/// can be used to represent image data without loss
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum BitType {
    /// Images represented using a [`u8`]
    U8,
    /// Images represented using a [`u16`]
    U16
}

impl BitDepth {
    /// Get the max value supported by the bit depth
    ///
    /// During conversion from one bit depth to another,
    /// larger values should be clamped to this
    pub const fn max_value(self) -> u16 {
        match self {
            Self::Eight => u8::MAX as u16,
            Self::Sixteen => u16::MAX,
            Self::Unknown => 0
        }
    }

    /// Return the smallest rust unsigned integer that can
    /// store a single pixel sample of this depth without overflow
    pub const fn bit_type(self) -> BitType {
        match self {
            Self::Eight => BitType::U8,
            Self::Sixteen => BitType::U16,
            Self::Unknown => panic!("Unknown bit depth")
        }
    }

    /// Get the number of bytes needed to store a single sample
    /// of this depth
    pub const fn size_of(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
            Self::Unknown => panic!("Unknown bit depth")
        }
    }
}

/// The byte endian of returned samples in case a single
/// sample spans more than a byte, e.g 16 bit PNG images
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ByteEndian {
    /// Big endian
    BE,
    /// Little endian
    LE
}

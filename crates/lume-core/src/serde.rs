#![cfg(feature = "serde")]
//! Serde serialization support for core enums

use serde::ser::{Serialize, Serializer};

use crate::bit_depth::BitDepth;
use crate::colorspace::ColorSpace;

impl Serialize for ColorSpace {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        serializer.serialize_str(&alloc::format!("{self:?}"))
    }
}

impl Serialize for BitDepth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        match self {
            BitDepth::Eight => serializer.serialize_u8(8),
            BitDepth::Sixteen => serializer.serialize_u8(16),
            _ => serializer.serialize_u8(0)
        }
    }
}

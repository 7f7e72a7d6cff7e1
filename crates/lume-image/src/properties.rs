//! Typed property values and maps
//!
//! Frame and container properties travel as heterogeneous key/value
//! maps with a tagged value type, never as untyped pointers.

use std::collections::BTreeMap;

/// A property value of any supported shape
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(PropertyMap)
}

/// An ordered key to value mapping
pub type PropertyMap = BTreeMap<String, Value>;

impl Value {
    /// The contained integer, if this is an Int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None
        }
    }
    /// The contained float, accepting Int for convenience
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None
        }
    }
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None
        }
    }
}

/// Well known property keys
pub mod keys {
    pub const PIXEL_WIDTH: &str = "PixelWidth";
    pub const PIXEL_HEIGHT: &str = "PixelHeight";
    pub const COLOR_MODEL: &str = "ColorModel";
    pub const DEPTH: &str = "Depth";
    pub const HAS_ALPHA: &str = "HasAlpha";
    pub const DPI_WIDTH: &str = "DPIWidth";
    pub const DPI_HEIGHT: &str = "DPIHeight";
    /// per frame display time in seconds
    pub const DELAY_TIME: &str = "DelayTime";
    pub const DISPOSAL_METHOD: &str = "DisposalMethod";
    pub const LOOP_COUNT: &str = "LoopCount";

    // encoder option keys recognized by destinations
    pub const LOSSY_QUALITY: &str = "lossy-quality";
    pub const LOSSLESS: &str = "lossless";
    pub const PRESERVE_ALPHA: &str = "preserveAlpha";
    pub const DELAY: &str = "delay";
    pub const ENCODER_LOOP_COUNT: &str = "loopCount";
    pub const DITHER: &str = "dither";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_typed() {
        let value = Value::Int(42);
        assert_eq!(value.as_int(), Some(42));
        assert_eq!(value.as_float(), Some(42.0));
        assert_eq!(value.as_bool(), None);

        let value = Value::Float(0.5);
        assert_eq!(value.as_int(), None);
        assert_eq!(value.as_float(), Some(0.5));
    }

    #[test]
    fn maps_nest() {
        let mut inner = PropertyMap::new();
        inner.insert("Version".into(), Value::Int(1));

        let mut outer = PropertyMap::new();
        outer.insert("Description".into(), Value::Map(inner));

        match outer.get("Description") {
            Some(Value::Map(map)) => {
                assert_eq!(map.get("Version").and_then(Value::as_int), Some(1));
            }
            _ => panic!("expected a nested map")
        }
    }
}

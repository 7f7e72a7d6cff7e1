//! JPEG marker bytes

/// Markers that can appear after a 0xFF byte outside the
/// entropy coded segment
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Marker {
    /// Start of image
    SOI,
    /// Start of frame, the variant carries n of SOF(n)
    SOF(u8),
    /// Define huffman tables
    DHT,
    /// Define quantization tables
    DQT,
    /// Define restart interval
    DRI,
    /// Start of scan
    SOS,
    /// Restart marker n in 0..8
    RST(u8),
    /// Application segments, APP(n)
    APP(u8),
    /// Comment
    COM,
    /// Define arithmetic coding conditioning
    DAC,
    /// End of image
    EOI
}

impl Marker {
    pub fn from_u8(value: u8) -> Option<Marker> {
        match value {
            0xD8 => Some(Marker::SOI),
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                Some(Marker::SOF(value - 0xC0))
            }
            0xC4 => Some(Marker::DHT),
            0xCC => Some(Marker::DAC),
            0xDB => Some(Marker::DQT),
            0xDD => Some(Marker::DRI),
            0xDA => Some(Marker::SOS),
            0xD0..=0xD7 => Some(Marker::RST(value - 0xD0)),
            0xE0..=0xEF => Some(Marker::APP(value - 0xE0)),
            0xFE => Some(Marker::COM),
            0xD9 => Some(Marker::EOI),
            _ => None
        }
    }
}

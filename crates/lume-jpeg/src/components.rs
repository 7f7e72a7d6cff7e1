//! Per-component bookkeeping

use crate::errors::DecodeErrors;

/// One frame component from the SOF segment
pub(crate) struct Components {
    /// raw component id byte from the file, SOS refers back to it
    pub component_id: u8,
    /// horizontal sampling factor
    pub horizontal_sample: usize,
    /// vertical sampling factor
    pub vertical_sample: usize,
    /// quantization table selector
    pub quantization_table_number: u8,
    /// DC huffman table selector, from SOS
    pub dc_huff_table: usize,
    /// AC huffman table selector, from SOS
    pub ac_huff_table: usize,
    /// DC prediction for differential DC coding
    pub dc_pred: i32,
    /// decoded plane, one sample per pixel
    pub plane: Vec<i16>,
    /// plane width in pixels, a multiple of 8
    pub plane_width: usize,
    /// plane height in pixels, a multiple of 8
    pub plane_height: usize
}

impl Components {
    pub fn from_sof(bytes: [u8; 3], position: usize) -> Result<Components, DecodeErrors> {
        if position >= 3 {
            return Err(DecodeErrors::FormatStatic(
                "More than three components not supported"
            ));
        }

        let horizontal_sample = usize::from(bytes[1] >> 4);
        let vertical_sample = usize::from(bytes[1] & 0x0F);

        if !(1..=4).contains(&horizontal_sample) || !(1..=4).contains(&vertical_sample) {
            return Err(DecodeErrors::Format(format!(
                "Invalid sampling factors {horizontal_sample}x{vertical_sample}"
            )));
        }

        Ok(Components {
            component_id: bytes[0],
            horizontal_sample,
            vertical_sample,
            quantization_table_number: bytes[2],
            dc_huff_table: 0,
            ac_huff_table: 0,
            dc_pred: 0,
            plane: Vec::new(),
            plane_width: 0,
            plane_height: 0
        })
    }
}

//! Parsers for marker segments between SOI and SOS

use log::{trace, warn};

use crate::components::Components;
use crate::decoder::JpegDecoder;
use crate::errors::DecodeErrors;
use crate::huffman::HuffmanTable;

/// XMP packets in APP1 start with this namespace URI
const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
/// Multi picture format APP2 payloads start with this tag
const MPF_SIGNATURE: &[u8] = b"MPF\0";

impl<'a> JpegDecoder<'a> {
    fn read_segment_length(&mut self) -> Result<usize, DecodeErrors> {
        let length = self
            .stream
            .get_u16_be_err()
            .map_err(|_| DecodeErrors::ExhaustedData)?;
        if length < 2 {
            return Err(DecodeErrors::Format(format!("Invalid segment length {length}")));
        }
        Ok(usize::from(length) - 2)
    }

    /// Parse a start of frame segment, baseline only
    pub(crate) fn parse_start_of_frame(&mut self) -> Result<(), DecodeErrors> {
        if !self.components.is_empty() {
            return Err(DecodeErrors::FormatStatic("Duplicate SOF marker"));
        }
        let length = self.read_segment_length()?;

        let precision = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
        if precision != 8 {
            return Err(DecodeErrors::Format(format!(
                "Unsupported sample precision {precision}"
            )));
        }

        self.info.height = usize::from(self.stream.get_u16_be());
        self.info.width = usize::from(self.stream.get_u16_be());

        if self.info.width == 0 || self.info.height == 0 {
            return Err(DecodeErrors::FormatStatic("Zero width or height"));
        }
        if self.info.width > self.options.max_width() {
            return Err(DecodeErrors::LargeDimensions(
                self.options.max_width(),
                self.info.width
            ));
        }
        if self.info.height > self.options.max_height() {
            return Err(DecodeErrors::LargeDimensions(
                self.options.max_height(),
                self.info.height
            ));
        }

        let num_components = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
        if num_components != 1 && num_components != 3 {
            return Err(DecodeErrors::Format(format!(
                "Unsupported number of components {num_components}"
            )));
        }
        if length != 6 + usize::from(num_components) * 3 {
            return Err(DecodeErrors::FormatStatic("Wrong SOF segment length"));
        }
        self.info.components = num_components;

        for position in 0..usize::from(num_components) {
            let bytes = self
                .stream
                .get_fixed_bytes_or_err::<3>()
                .map_err(|_| DecodeErrors::ExhaustedData)?;
            let component = Components::from_sof(bytes, position)?;

            self.h_max = self.h_max.max(component.horizontal_sample);
            self.v_max = self.v_max.max(component.vertical_sample);
            self.components.push(component);
        }

        // grayscale never subsamples
        if num_components == 1 {
            let c = &mut self.components[0];
            c.horizontal_sample = 1;
            c.vertical_sample = 1;
            self.h_max = 1;
            self.v_max = 1;
        }

        // only 1x1, 2x1 and 2x2 luma sampling make it past here,
        // exotic ratios are rare and untested territory
        let luma = &self.components[0];
        if !matches!(
            (luma.horizontal_sample, luma.vertical_sample),
            (1, 1) | (2, 1) | (2, 2) | (1, 2)
        ) {
            return Err(DecodeErrors::Format(format!(
                "Unsupported sampling factors {}x{}",
                luma.horizontal_sample, luma.vertical_sample
            )));
        }
        for chroma in &self.components[1..] {
            if chroma.horizontal_sample != 1 || chroma.vertical_sample != 1 {
                return Err(DecodeErrors::FormatStatic(
                    "Subsampled luma with non-unit chroma sampling"
                ));
            }
        }

        self.mcu_x = self.info.width.div_ceil(8 * self.h_max);
        self.mcu_y = self.info.height.div_ceil(8 * self.v_max);

        trace!("Width: {}", self.info.width);
        trace!("Height: {}", self.info.height);
        trace!("Components: {}", self.info.components);
        trace!("Sampling: {}x{}", self.h_max, self.v_max);

        Ok(())
    }

    /// Parse a define quantization table segment
    pub(crate) fn parse_dqt(&mut self) -> Result<(), DecodeErrors> {
        let mut length = self.read_segment_length()?;

        while length > 0 {
            let pq_tq = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
            let precision = pq_tq >> 4;
            let table_id = usize::from(pq_tq & 0x0F);

            if table_id >= self.qt_tables.len() {
                return Err(DecodeErrors::Format(format!("Invalid DQT table id {table_id}")));
            }
            // baseline only allows 8 bit tables but 16 bit ones
            // appear in the wild, read them anyway
            let mut table = [0_i32; 64];
            match precision {
                0 => {
                    for value in table.iter_mut() {
                        *value = i32::from(self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?);
                    }
                    length = length.saturating_sub(65);
                }
                1 => {
                    for value in table.iter_mut() {
                        *value = i32::from(self.stream.get_u16_be_err().map_err(|_| DecodeErrors::ExhaustedData)?);
                    }
                    length = length.saturating_sub(129);
                }
                _ => {
                    return Err(DecodeErrors::Format(format!(
                        "Invalid DQT precision {precision}"
                    )))
                }
            }
            trace!("Quantization table {table_id} defined");
            self.qt_tables[table_id] = Some(table);
        }
        Ok(())
    }

    /// Parse a define huffman tables segment
    pub(crate) fn parse_huffman(&mut self) -> Result<(), DecodeErrors> {
        let mut length = self.read_segment_length()?;

        while length > 0 {
            let tc_th = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
            let class = tc_th >> 4;
            let table_id = usize::from(tc_th & 0x0F);

            if class > 1 {
                return Err(DecodeErrors::Format(format!("Invalid huffman class {class}")));
            }
            if table_id >= self.dc_huffman_tables.len() {
                return Err(DecodeErrors::Format(format!(
                    "Invalid huffman table id {table_id}"
                )));
            }

            let mut bits = [0_u8; 16];
            for b in bits.iter_mut() {
                *b = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
            }
            let total: usize = bits.iter().map(|b| usize::from(*b)).sum();

            let values = self
                .stream
                .get_as_ref(total)
                .map_err(|_| DecodeErrors::ExhaustedData)?
                .to_vec();

            let table = HuffmanTable::new(&bits, values)?;
            if class == 0 {
                self.dc_huffman_tables[table_id] = Some(table);
            } else {
                self.ac_huffman_tables[table_id] = Some(table);
            }

            length = length.saturating_sub(17 + total);
        }
        Ok(())
    }

    /// Parse a define restart interval segment
    pub(crate) fn parse_dri(&mut self) -> Result<(), DecodeErrors> {
        let length = self.read_segment_length()?;
        if length != 2 {
            return Err(DecodeErrors::FormatStatic("DRI segment must be 4 bytes"));
        }
        self.restart_interval = usize::from(self.stream.get_u16_be());
        trace!("Restart interval: {}", self.restart_interval);
        Ok(())
    }

    /// Parse the start of scan segment
    pub(crate) fn parse_sos(&mut self) -> Result<(), DecodeErrors> {
        if self.components.is_empty() {
            return Err(DecodeErrors::FormatStatic("SOS before SOF"));
        }
        let _length = self.read_segment_length()?;

        let ns = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
        if usize::from(ns) != self.components.len() {
            // a scan covering a component subset means the image is
            // non-interleaved, outside our baseline subset
            return Err(DecodeErrors::FormatStatic(
                "Non-interleaved scans are not supported"
            ));
        }

        for _ in 0..ns {
            let id = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
            let tables = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;

            let component = self
                .components
                .iter_mut()
                .find(|c| c.component_id == id)
                .ok_or(DecodeErrors::FormatStatic("SOS references unknown component"))?;

            component.dc_huff_table = usize::from(tables >> 4);
            component.ac_huff_table = usize::from(tables & 0x0F);

            if component.dc_huff_table > 3 || component.ac_huff_table > 3 {
                return Err(DecodeErrors::FormatStatic("Invalid huffman table selector"));
            }
        }

        // spectral selection and approximation, fixed for baseline
        let ss = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
        let se = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;
        let ah_al = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;

        if ss != 0 || se != 63 || ah_al != 0 {
            return Err(DecodeErrors::FormatStatic(
                "Invalid spectral selection for baseline scan"
            ));
        }
        Ok(())
    }

    /// Parse an application segment.
    ///
    /// APP0 carries JFIF density, APP1 may carry an XMP packet, APP2
    /// (MPF) and APP11 may carry HDR gain map payloads which we pass
    /// through as opaque blobs. Everything else is skipped.
    pub(crate) fn parse_app(&mut self, n: u8) -> Result<(), DecodeErrors> {
        let length = self.read_segment_length()?;
        let segment_end = self.stream.position() + length;

        match n {
            0 => {
                // JFIF\0 identifier + version + density
                if length >= 14 && self.stream.peek_at(0, 5).unwrap_or(&[]) == b"JFIF\0" {
                    self.stream.skip(5);
                    let _version = self.stream.get_u16_be();
                    self.info.pixel_density = self.stream.get_u8();
                    self.info.x_density = self.stream.get_u16_be();
                    self.info.y_density = self.stream.get_u16_be();
                    trace!(
                        "JFIF density {}x{} (unit {})",
                        self.info.x_density,
                        self.info.y_density,
                        self.info.pixel_density
                    );
                }
            }
            1 => {
                if length >= XMP_SIGNATURE.len()
                    && self.stream.peek_at(0, XMP_SIGNATURE.len()).unwrap_or(&[]) == XMP_SIGNATURE
                {
                    self.stream.skip(XMP_SIGNATURE.len());
                    let payload = self
                        .stream
                        .get_as_ref(length - XMP_SIGNATURE.len())
                        .map_err(|_| DecodeErrors::ExhaustedData)?;
                    self.xmp_data = Some(payload.to_vec());
                    trace!("Captured {} byte XMP packet", payload.len());
                }
            }
            2 => {
                if length >= MPF_SIGNATURE.len()
                    && self.stream.peek_at(0, MPF_SIGNATURE.len()).unwrap_or(&[]) == MPF_SIGNATURE
                {
                    let payload = self
                        .stream
                        .get_as_ref(length)
                        .map_err(|_| DecodeErrors::ExhaustedData)?;
                    self.gain_map_data = Some(payload.to_vec());
                    trace!("Captured {} byte MPF gain map payload", payload.len());
                }
            }
            11 => {
                // ISO 21496-1 gain map payload
                let payload = self
                    .stream
                    .get_as_ref(length)
                    .map_err(|_| DecodeErrors::ExhaustedData)?;
                if self.gain_map_data.is_none() {
                    self.gain_map_data = Some(payload.to_vec());
                    trace!("Captured {} byte APP11 gain map payload", payload.len());
                }
            }
            _ => {
                warn!("Skipping APP{n} segment of {length} bytes");
            }
        }

        // always resynchronize to the declared end
        self.stream.set_position(segment_end);
        Ok(())
    }
}

//! Main decoder logic
#![allow(clippy::doc_markdown)]

use lume_core::bytestream::ByteReader;
use lume_core::colorspace::ColorSpace;
use lume_core::options::DecoderOptions;

use log::{error, info, trace, warn};

use crate::bitstream::{extend, BitStream};
use crate::color_convert::ycbcr_to_rgb_pixel;
use crate::components::Components;
use crate::errors::{DecodeErrors, UnsupportedSchemes};
use crate::huffman::HuffmanTable;
use crate::idct::idct_int;
use crate::marker::Marker;
use crate::tables::UN_ZIGZAG;
use crate::upsampler::sample_at;

/// Maximum components
pub(crate) const MAX_COMPONENTS: usize = 4;

/// Basic information about the image
#[derive(Default, Debug, Clone, Copy)]
pub struct ImageInfo {
    /// Width of the image
    pub width:      usize,
    /// Height of the image
    pub height:     usize,
    /// PixelDensity, from the JFIF APP0 segment
    pub pixel_density: u8,
    /// Horizontal sample density
    pub x_density:  u16,
    /// Vertical sample density
    pub y_density:  u16,
    /// Number of components
    pub components: u8
}

/// A JPEG Decoder Instance.
#[allow(clippy::upper_case_acronyms)]
pub struct JpegDecoder<'a> {
    /// Struct to hold image information from SOF and APP0
    pub(crate) info: ImageInfo,
    /// Quantization tables in zig-zag order, at most 4
    pub(crate) qt_tables: [Option<[i32; 64]>; MAX_COMPONENTS],
    /// DC Huffman tables, at most 4
    pub(crate) dc_huffman_tables: [Option<HuffmanTable>; MAX_COMPONENTS],
    /// AC Huffman tables, at most 4
    pub(crate) ac_huffman_tables: [Option<HuffmanTable>; MAX_COMPONENTS],
    /// Image components, holds DC predictions and the decoded planes
    pub(crate) components: Vec<Components>,
    /// maximum horizontal sampling factor of all components
    pub(crate) h_max: usize,
    /// maximum vertical sampling factor of all components
    pub(crate) v_max: usize,
    /// Number of MCUs in the x plane
    pub(crate) mcu_x: usize,
    /// Number of MCUs in the y plane
    pub(crate) mcu_y: usize,
    /// Restart interval in MCUs, 0 when restarts are unused
    pub(crate) restart_interval: usize,
    /// XMP packet from an APP1 segment, opaque
    pub(crate) xmp_data: Option<Vec<u8>>,
    /// HDR gain map payload from APP2 (MPF) or APP11, opaque
    pub(crate) gain_map_data: Option<Vec<u8>>,
    /// decoder options
    pub(crate) options: DecoderOptions,
    /// byte stream
    pub(crate) stream: ByteReader<'a>,
    /// Indicates whether headers have been decoded
    pub(crate) headers_decoded: bool
}

impl<'a> JpegDecoder<'a> {
    /// Create a new decoder instance
    #[must_use]
    pub fn new(stream: &'a [u8]) -> JpegDecoder<'a> {
        JpegDecoder::new_with_options(stream, DecoderOptions::default())
    }

    /// Create a new decoder with configured options
    #[must_use]
    pub fn new_with_options(stream: &'a [u8], options: DecoderOptions) -> JpegDecoder<'a> {
        JpegDecoder {
            info: ImageInfo::default(),
            qt_tables: [None, None, None, None],
            dc_huffman_tables: [None, None, None, None],
            ac_huffman_tables: [None, None, None, None],
            components: vec![],
            h_max: 1,
            v_max: 1,
            mcu_x: 0,
            mcu_y: 0,
            restart_interval: 0,
            xmp_data: None,
            gain_map_data: None,
            options,
            stream: ByteReader::new(stream),
            headers_decoded: false
        }
    }

    /// Returns the image information.
    ///
    /// Must be called after [`decode_headers`](Self::decode_headers)
    /// or [`decode`](Self::decode), otherwise returns None
    #[must_use]
    pub fn info(&self) -> Option<ImageInfo> {
        if !self.headers_decoded {
            return None;
        }
        Some(self.info)
    }

    /// Image dimensions or None if headers are not decoded
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        if !self.headers_decoded {
            return None;
        }
        Some((self.info.width, self.info.height))
    }

    /// The colorspace decoded pixels are returned in
    pub fn colorspace(&self) -> ColorSpace {
        if self.info.components == 1 {
            ColorSpace::Luma
        } else {
            ColorSpace::RGB
        }
    }

    /// The XMP packet from APP1, if present, as an opaque blob
    pub fn xmp(&self) -> Option<&[u8]> {
        self.xmp_data.as_deref()
    }

    /// The HDR gain map payload from APP2 (MPF) or APP11, if present,
    /// as an opaque blob. The decoder does not interpret it.
    pub fn gain_map(&self) -> Option<&[u8]> {
        self.gain_map_data.as_deref()
    }

    /// Decode headers up to and including the SOS marker
    ///
    /// # Supported markers
    ///  - APP(n) -> JFIF density, XMP, gain maps, others skipped
    ///  - SOF(0) -> baseline
    ///  - DQT, DHT, DRI, SOS
    ///
    /// Progressive and arithmetic coded images return
    /// [`DecodeErrors::Unsupported`]
    pub fn decode_headers(&mut self) -> Result<(), DecodeErrors> {
        if self.headers_decoded {
            warn!("Headers already decoded");
            return Ok(());
        }
        let magic_bytes = self.stream.get_u16_be_err().map_err(|_| DecodeErrors::ExhaustedData)?;

        if magic_bytes != 0xFFD8 {
            return Err(DecodeErrors::IllegalMagicBytes(magic_bytes));
        }

        let mut last_byte = 0_u8;
        let mut bytes_before_marker = 0;

        loop {
            let m = self.stream.get_u8_err().map_err(|_| DecodeErrors::ExhaustedData)?;

            if last_byte == 0xFF {
                if let Some(marker) = Marker::from_u8(m) {
                    if bytes_before_marker > 3 {
                        if self.options.strict_mode() {
                            return Err(DecodeErrors::FormatStatic(
                                "[strict-mode]: Extra bytes between headers"
                            ));
                        }
                        error!("Extra bytes {} before marker 0xFF{:X}", bytes_before_marker - 3, m);
                    }
                    bytes_before_marker = 0;

                    self.parse_marker_inner(marker)?;

                    if marker == Marker::SOS {
                        self.headers_decoded = true;
                        return Ok(());
                    }
                } else if m != 0 && m != 0xFF {
                    bytes_before_marker = 0;
                    warn!("Marker 0xFF{:X} not known", m);

                    let length = self.stream.get_u16_be_err().map_err(|_| DecodeErrors::ExhaustedData)?;
                    if length < 2 {
                        return Err(DecodeErrors::Format(format!(
                            "Found a marker with invalid length: {length}"
                        )));
                    }
                    warn!("Skipping {} bytes", length - 2);
                    self.stream.skip(usize::from(length) - 2);
                }
            }
            last_byte = m;
            bytes_before_marker += 1;
        }
    }

    pub(crate) fn parse_marker_inner(&mut self, m: Marker) -> Result<(), DecodeErrors> {
        match m {
            Marker::SOF(0 | 1) => {
                info!("Image encoding scheme: baseline DCT");
                self.parse_start_of_frame()?;
            }
            Marker::SOF(v) => {
                // SOF(n) outside baseline is recognized but unsupported
                if let Some(feature) = UnsupportedSchemes::from_int(v) {
                    return Err(DecodeErrors::Unsupported(feature));
                }
                return Err(DecodeErrors::Format(format!("Unsupported SOF({v})")));
            }
            Marker::DHT => self.parse_huffman()?,
            Marker::DQT => self.parse_dqt()?,
            Marker::DRI => self.parse_dri()?,
            Marker::SOS => self.parse_sos()?,
            Marker::APP(n) => self.parse_app(n)?,
            Marker::COM => {
                let length = self.stream.get_u16_be_err().map_err(|_| DecodeErrors::ExhaustedData)?;
                self.stream.skip(usize::from(length).saturating_sub(2));
            }
            Marker::DAC => {
                return Err(DecodeErrors::FormatStatic(
                    "Arithmetic coding is not supported"
                ));
            }
            Marker::EOI => {
                return Err(DecodeErrors::FormatStatic("Premature EOI before SOS"));
            }
            Marker::SOI | Marker::RST(_) => {
                return Err(DecodeErrors::FormatStatic(
                    "Misplaced marker in header section"
                ));
            }
        }
        Ok(())
    }

    /// Decode the image returning interleaved pixels.
    ///
    /// Output is RGB for color images and Luma for grayscale ones
    pub fn decode(&mut self) -> Result<Vec<u8>, DecodeErrors> {
        if !self.headers_decoded {
            self.decode_headers()?;
        }
        self.decode_mcus()?;
        self.post_process()
    }

    /// Decode all MCUs of the single sequential scan
    fn decode_mcus(&mut self) -> Result<(), DecodeErrors> {
        // allocate component planes, sized to whole MCUs
        for component in &mut self.components {
            let width_blocks = self.mcu_x * component.horizontal_sample;
            let height_blocks = self.mcu_y * component.vertical_sample;

            component.plane_width = width_blocks * 8;
            component.plane_height = height_blocks * 8;
            component.plane = vec![0_i16; component.plane_width * component.plane_height];
            component.dc_pred = 0;
        }

        let mut stream = BitStream::new();
        let mut todo = if self.restart_interval == 0 {
            usize::MAX
        } else {
            self.restart_interval
        };

        for mcu_y in 0..self.mcu_y {
            for mcu_x in 0..self.mcu_x {
                if todo == 0 {
                    self.handle_restart(&mut stream)?;
                    todo = self.restart_interval;
                }

                for pos in 0..self.components.len() {
                    let (h, v) = {
                        let c = &self.components[pos];
                        (c.horizontal_sample, c.vertical_sample)
                    };
                    for by in 0..v {
                        for bx in 0..h {
                            self.decode_block(&mut stream, pos, mcu_x * h + bx, mcu_y * v + by)?;
                        }
                    }
                }
                todo = todo.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Expect and consume a restart marker, resetting predictors
    fn handle_restart(&mut self, stream: &mut BitStream) -> Result<(), DecodeErrors> {
        stream.align();

        // the marker may already have been seen by the bit reader
        let marker = match stream.marker.take() {
            Some(m) => m,
            None => {
                let bytes = self.stream.get_u16_be_err().map_err(|_| DecodeErrors::ExhaustedData)?;
                if bytes >> 8 != 0xFF {
                    return Err(DecodeErrors::FormatStatic("Expected a restart marker"));
                }
                Marker::from_u8((bytes & 0xFF) as u8)
                    .ok_or(DecodeErrors::FormatStatic("Expected a restart marker"))?
            }
        };

        match marker {
            Marker::RST(_) => {
                for component in &mut self.components {
                    component.dc_pred = 0;
                }
                stream.reset();
                Ok(())
            }
            Marker::EOI => Err(DecodeErrors::FormatStatic(
                "Premature EOI, expected restart marker"
            )),
            _ => Err(DecodeErrors::Format(format!(
                "Expected restart marker, found {marker:?}"
            )))
        }
    }

    /// Decode one 8x8 block of component `pos` into its plane at
    /// block coordinates (bx, by)
    fn decode_block(
        &mut self, stream: &mut BitStream, pos: usize, bx: usize, by: usize
    ) -> Result<(), DecodeErrors> {
        let qt_index = usize::from(self.components[pos].quantization_table_number);
        let qt = self.qt_tables[qt_index]
            .as_ref()
            .ok_or(DecodeErrors::FormatStatic("Missing quantization table"))?;

        let dc_table = self.dc_huffman_tables[self.components[pos].dc_huff_table]
            .as_ref()
            .ok_or(DecodeErrors::FormatStatic("Missing DC huffman table"))?;
        let ac_table = self.ac_huffman_tables[self.components[pos].ac_huff_table]
            .as_ref()
            .ok_or(DecodeErrors::FormatStatic("Missing AC huffman table"))?;

        let mut block = [0_i32; 64];

        // DC, differential with per component prediction
        let reader = &mut self.stream;
        let t = dc_table.decode(|| stream.next_bit(reader))?;
        let diff = if t > 0 {
            let bits = stream.receive(reader, t)?;
            extend(bits, t)
        } else {
            0
        };

        let dc_pred = self.components[pos].dc_pred + diff;
        self.components[pos].dc_pred = dc_pred;
        block[0] = dc_pred * qt[0];

        // AC, run length of zeros + category + magnitude bits
        let mut k = 1_usize;
        while k < 64 {
            let rs = ac_table.decode(|| stream.next_bit(reader))?;
            let r = usize::from(rs >> 4);
            let s = rs & 0x0F;

            if s == 0 {
                if r == 15 {
                    // ZRL, sixteen zeros
                    k += 16;
                    continue;
                }
                // EOB
                break;
            }
            k += r;
            if k > 63 {
                return Err(DecodeErrors::HuffmanDecode(
                    "AC coefficient run past end of block".to_string()
                ));
            }
            let bits = stream.receive(reader, s)?;
            block[UN_ZIGZAG[k]] = extend(bits, s) * qt[k];
            k += 1;
        }

        // dequantized coefficients -> samples, straight into the plane
        let component = &mut self.components[pos];
        let offset = (by * 8) * component.plane_width + bx * 8;
        idct_int(&mut block, &mut component.plane[offset..], component.plane_width);

        Ok(())
    }

    /// Upsample chroma and color convert into the output buffer
    fn post_process(&mut self) -> Result<Vec<u8>, DecodeErrors> {
        let width = self.info.width;
        let height = self.info.height;

        if self.components.len() == 1 {
            let component = &self.components[0];
            let mut out = vec![0_u8; width * height];

            for y in 0..height {
                for x in 0..width {
                    out[y * width + x] =
                        component.plane[y * component.plane_width + x].clamp(0, 255) as u8;
                }
            }
            return Ok(out);
        }

        trace!("Color converting {}x{} image", width, height);

        let mut out = vec![0_u8; width * height * 3];

        let scales: Vec<(usize, usize)> = self
            .components
            .iter()
            .map(|c| (self.h_max / c.horizontal_sample, self.v_max / c.vertical_sample))
            .collect();

        for y in 0..height {
            for x in 0..width {
                let y_sample = {
                    let c = &self.components[0];
                    sample_at(&c.plane, c.plane_width, x, y, scales[0].0, scales[0].1)
                };
                let cb_sample = {
                    let c = &self.components[1];
                    sample_at(&c.plane, c.plane_width, x, y, scales[1].0, scales[1].1)
                };
                let cr_sample = {
                    let c = &self.components[2];
                    sample_at(&c.plane, c.plane_width, x, y, scales[2].0, scales[2].1)
                };

                let rgb = ycbcr_to_rgb_pixel(y_sample, cb_sample, cr_sample);
                out[(y * width + x) * 3..(y * width + x) * 3 + 3].copy_from_slice(&rgb);
            }
        }
        Ok(out)
    }
}

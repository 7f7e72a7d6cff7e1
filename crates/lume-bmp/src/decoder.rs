use lume_core::bytestream::ByteReader;
use lume_core::colorspace::ColorSpace;
use lume_core::options::DecoderOptions;

use log::trace;

use crate::errors::BmpErrors;

/// BI_RGB, no compression
const COMPRESSION_RGB: u32 = 0;
/// BI_BITFIELDS, explicit channel masks
const COMPRESSION_BITFIELDS: u32 = 3;

/// The standard BGRA masks V4 files carry for 32 bit images
const MASK_R: u32 = 0x00FF_0000;
const MASK_G: u32 = 0x0000_FF00;
const MASK_B: u32 = 0x0000_00FF;
const MASK_A: u32 = 0xFF00_0000;

/// A BMP decoder for uncompressed 24 bit BGR and 32 bit BGRA files.
///
/// Output is RGB or RGBA with the top row first regardless of the
/// file's row order.
pub struct BmpDecoder<'a> {
    stream:          ByteReader<'a>,
    options:         DecoderOptions,
    width:           usize,
    height:          usize,
    /// the file stores rows bottom-up, the common case
    flipped:         bool,
    depth:           u16,
    pix_start:       usize,
    /// pixels per meter, 0 when the header carries none
    ppm_x:           u32,
    ppm_y:           u32,
    decoded_headers: bool
}

impl<'a> BmpDecoder<'a> {
    pub fn new(data: &'a [u8]) -> BmpDecoder<'a> {
        BmpDecoder::new_with_options(data, DecoderOptions::default())
    }

    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> BmpDecoder<'a> {
        BmpDecoder {
            stream: ByteReader::new(data),
            options,
            width: 0,
            height: 0,
            flipped: true,
            depth: 0,
            pix_start: 0,
            ppm_x: 0,
            ppm_y: 0,
            decoded_headers: false
        }
    }

    /// Image dimensions or None before headers are decoded
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        if !self.decoded_headers {
            return None;
        }
        Some((self.width, self.height))
    }

    /// Output colorspace, RGBA for 32 bit files
    pub const fn colorspace(&self) -> Option<ColorSpace> {
        if !self.decoded_headers {
            return None;
        }
        match self.depth {
            32 => Some(ColorSpace::RGBA),
            _ => Some(ColorSpace::RGB)
        }
    }

    /// Resolution as (x, y) pixels per meter if the header
    /// carried one
    pub const fn pixels_per_meter(&self) -> Option<(u32, u32)> {
        if self.decoded_headers && self.ppm_x != 0 {
            Some((self.ppm_x, self.ppm_y))
        } else {
            None
        }
    }

    pub fn decode_headers(&mut self) -> Result<(), BmpErrors> {
        if self.decoded_headers {
            return Ok(());
        }
        if self.stream.get_fixed_bytes_or_zero::<2>() != *b"BM" {
            return Err(BmpErrors::InvalidMagicBytes);
        }
        // file size + reserved words
        let _file_size = self.stream.get_u32_le_err()?;
        self.stream.skip(4);
        self.pix_start = self.stream.get_u32_le_err()? as usize;

        let dib_size = self.stream.get_u32_le_err()?;
        if !matches!(dib_size, 40 | 52 | 56 | 108 | 124) {
            return Err(BmpErrors::Unsupported(format!(
                "DIB header of size {dib_size}"
            )));
        }

        let width = self.stream.get_u32_le_err()? as i32;
        let height = self.stream.get_u32_le_err()? as i32;

        // negative height flips the raster order to top-down
        self.flipped = height >= 0;
        self.width = width.unsigned_abs() as usize;
        self.height = height.unsigned_abs() as usize;

        if self.width == 0 || self.height == 0 {
            return Err(BmpErrors::GenericStatic("Zero width or height"));
        }
        if self.width > self.options.max_width() {
            return Err(BmpErrors::TooLargeDimensions(
                "width",
                self.options.max_width(),
                self.width
            ));
        }
        if self.height > self.options.max_height() {
            return Err(BmpErrors::TooLargeDimensions(
                "height",
                self.options.max_height(),
                self.height
            ));
        }

        let planes = self.stream.get_u16_le_err()?;
        if planes != 1 {
            return Err(BmpErrors::Generic(format!("Invalid plane count {planes}")));
        }

        self.depth = self.stream.get_u16_le_err()?;
        if self.depth != 24 && self.depth != 32 {
            return Err(BmpErrors::Unsupported(format!("{} bit bmp", self.depth)));
        }

        let compression = self.stream.get_u32_le_err()?;
        match compression {
            COMPRESSION_RGB => {}
            COMPRESSION_BITFIELDS if dib_size >= 52 => {
                // masks live right after the info header (or inside
                // V4/V5), only the standard layout is accepted
                let masks_offset = 14 + 40;
                let masks = self
                    .stream
                    .peek_at(masks_offset - self.stream.position(), 16)
                    .map_err(|_| BmpErrors::GenericStatic("Truncated bitfields"))?;

                let r = u32::from_le_bytes(masks[0..4].try_into().unwrap());
                let g = u32::from_le_bytes(masks[4..8].try_into().unwrap());
                let b = u32::from_le_bytes(masks[8..12].try_into().unwrap());
                let a = u32::from_le_bytes(masks[12..16].try_into().unwrap());

                if r != MASK_R || g != MASK_G || b != MASK_B || (a != MASK_A && a != 0) {
                    return Err(BmpErrors::Unsupported(
                        "non-standard channel masks".to_string()
                    ));
                }
            }
            _ => {
                return Err(BmpErrors::Unsupported(format!(
                    "compression method {compression}"
                )))
            }
        }

        // image size field
        self.stream.skip(4);
        self.ppm_x = self.stream.get_u32_le_err()?;
        self.ppm_y = self.stream.get_u32_le_err()?;
        // remaining header fields (colors used/important, V4/V5
        // colorimetry) don't affect pixel decoding
        trace!("Width: {}", self.width);
        trace!("Height: {}", self.height);
        trace!("Depth: {}", self.depth);

        self.decoded_headers = true;
        Ok(())
    }

    /// Size of the decoded output in bytes
    pub fn output_buf_size(&self) -> Option<usize> {
        if !self.decoded_headers {
            return None;
        }
        let components = if self.depth == 32 { 4 } else { 3 };
        self.width.checked_mul(self.height)?.checked_mul(components)
    }

    /// Decode the file returning interleaved RGB or RGBA pixels,
    /// top row first
    pub fn decode(&mut self) -> Result<Vec<u8>, BmpErrors> {
        self.decode_headers()?;

        let components = if self.depth == 32 { 4 } else { 3 };
        let in_bpp = usize::from(self.depth / 8);
        // rows are padded to four byte boundaries
        let row_bytes = (self.width * in_bpp).div_ceil(4) * 4;

        let out_size = self
            .output_buf_size()
            .ok_or(BmpErrors::GenericStatic("Output size overflows"))?;

        self.stream.set_position(self.pix_start);
        if !self.stream.has(row_bytes * self.height) {
            return Err(BmpErrors::GenericStatic("Truncated pixel data"));
        }

        let mut out = vec![0_u8; out_size];

        for y in 0..self.height {
            let src = self.stream.get_as_ref(row_bytes)?;
            // bottom-up files fill the output backwards
            let out_y = if self.flipped { self.height - 1 - y } else { y };
            let dst = &mut out[out_y * self.width * components..][..self.width * components];

            for (src_px, dst_px) in src.chunks_exact(in_bpp).take(self.width).zip(dst.chunks_exact_mut(components)) {
                // BGR(A) to RGB(A)
                dst_px[0] = src_px[2];
                dst_px[1] = src_px[1];
                dst_px[2] = src_px[0];
                if components == 4 {
                    dst_px[3] = src_px[3];
                }
            }
        }
        Ok(out)
    }
}

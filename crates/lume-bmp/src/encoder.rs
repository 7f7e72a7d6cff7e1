use lume_core::bytestream::ByteWriter;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;

use log::trace;

use crate::errors::BmpErrors;

/// 'BGRs', the sRGB colorspace tag, stored little endian
const LCS_SRGB: u32 = 0x7352_4742;

/// A BMP encoder.
///
/// Writes a BITMAPINFOHEADER file with 24 bit BGR rows, or, when
/// alpha preservation is requested, a BITMAPV4HEADER file with
/// 32 bit BGRA rows, standard channel masks and the sRGB tag.
/// Rows are written bottom-up padded to four bytes.
pub struct BmpEncoder {
    options: EncoderOptions
}

impl BmpEncoder {
    pub fn new(options: EncoderOptions) -> BmpEncoder {
        BmpEncoder { options }
    }

    /// Encode `data` returning the bmp file bytes.
    ///
    /// Accepted colorspaces are RGB, RGBA, BGR and BGRA; alpha is
    /// kept only with `bmp_preserve_alpha` set in the options
    pub fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>, BmpErrors> {
        let width = self.options.width();
        let height = self.options.height();
        let colorspace = self.options.colorspace();

        let components = match colorspace {
            ColorSpace::RGB | ColorSpace::BGR => 3_usize,
            ColorSpace::RGBA | ColorSpace::BGRA => 4,
            _ => return Err(BmpErrors::Unsupported("colorspace not expressible in bmp".to_string()))
        };
        if width == 0 || height == 0 {
            return Err(BmpErrors::GenericStatic("Zero width or height"));
        }
        if data.len() != width * height * components {
            return Err(BmpErrors::Generic(format!(
                "Data length mismatch, expected {} but found {}",
                width * height * components,
                data.len()
            )));
        }

        let with_alpha = self.options.bmp_preserve_alpha() && components == 4;
        let out_bpp = if with_alpha { 4 } else { 3 };
        let row_bytes = (width * out_bpp).div_ceil(4) * 4;
        let header_size: usize = if with_alpha { 108 } else { 40 };
        let pix_start = 14 + header_size;
        let file_size = pix_start + row_bytes * height;

        trace!(
            "Encoding {}x{} bmp, {} bit",
            width,
            height,
            out_bpp * 8
        );

        let mut writer = ByteWriter::with_capacity(file_size);

        // BITMAPFILEHEADER
        writer.write_all(b"BM");
        writer.write_u32_le(file_size as u32);
        writer.write_u32_le(0);
        writer.write_u32_le(pix_start as u32);

        // DIB header
        writer.write_u32_le(header_size as u32);
        writer.write_u32_le(width as u32);
        writer.write_u32_le(height as u32);
        writer.write_u16_le(1);
        writer.write_u16_le((out_bpp * 8) as u16);
        // BI_RGB or BI_BITFIELDS
        writer.write_u32_le(if with_alpha { 3 } else { 0 });
        writer.write_u32_le((row_bytes * height) as u32);
        // 2835 ppm = 72 dpi, the customary default
        writer.write_u32_le(2835);
        writer.write_u32_le(2835);
        writer.write_u32_le(0);
        writer.write_u32_le(0);

        if with_alpha {
            // V4 channel masks
            writer.write_u32_le(0x00FF_0000);
            writer.write_u32_le(0x0000_FF00);
            writer.write_u32_le(0x0000_00FF);
            writer.write_u32_le(0xFF00_0000);
            writer.write_u32_le(LCS_SRGB);
            // CIEXYZTRIPLE endpoints + gamma, unused for sRGB
            for _ in 0..12 {
                writer.write_u32_le(0);
            }
        }

        // pixel rows, bottom-up
        let swap_rb = !colorspace.is_bgr_ordered();
        let pad = [0_u8; 3];
        let pad_len = row_bytes - width * out_bpp;

        for y in (0..height).rev() {
            let row = &data[y * width * components..][..width * components];

            for px in row.chunks_exact(components) {
                let (b, g, r) = if swap_rb { (px[2], px[1], px[0]) } else { (px[0], px[1], px[2]) };
                writer.write_u8(b);
                writer.write_u8(g);
                writer.write_u8(r);
                if with_alpha {
                    writer.write_u8(px[3]);
                }
            }
            writer.write_all(&pad[..pad_len]);
        }

        Ok(writer.into_inner())
    }
}

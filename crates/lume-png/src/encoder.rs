/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use lume_core::bytestream::ByteWriter;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_inflate::DeflateEncoder;

use log::trace;

use crate::constants::PNG_SIGNATURE;
use crate::error::PngErrors;
use crate::filters::{choose_filter, filter_scanline};
use crate::headers::writers::write_chunk;

/// A PNG encoder instance.
///
/// Writes non-interlaced images with per-row adaptive filtering.
/// Supported inputs are Luma, LumaA, RGB and RGBA at 8 or 16 bits
/// and palette indices with an explicit palette.
///
/// # Endianness
/// 16 bit input data is expected to be laid out in big endian,
/// the wire order, to avoid a conversion pass.
pub struct PngEncoder<'a> {
    options: EncoderOptions,
    data:    &'a [u8],
    palette: Option<&'a [[u8; 4]]>
}

impl<'a> PngEncoder<'a> {
    /// Create a new encoder which will encode `data` whose geometry
    /// is described by `options`
    pub fn new(data: &'a [u8], options: EncoderOptions) -> PngEncoder<'a> {
        PngEncoder {
            options,
            data,
            palette: None
        }
    }

    /// Provide the palette for `ColorSpace::Indexed` input.
    ///
    /// Entries are RGBA, at most 256. Entries with alpha below 255
    /// produce a tRNS chunk.
    pub fn set_palette(&mut self, palette: &'a [[u8; 4]]) {
        self.palette = Some(palette);
    }

    /// Color type byte and channel count for the configured colorspace
    fn color_type(&self) -> Result<(u8, usize), PngErrors> {
        match self.options.colorspace() {
            ColorSpace::Luma => Ok((0, 1)),
            ColorSpace::RGB => Ok((2, 3)),
            ColorSpace::Indexed => Ok((3, 1)),
            ColorSpace::LumaA => Ok((4, 2)),
            ColorSpace::RGBA => Ok((6, 4)),
            _ => Err(PngErrors::Unsupported("colorspace not expressible in png"))
        }
    }

    /// Encode the image returning the png file bytes
    pub fn encode(&mut self) -> Result<Vec<u8>, PngErrors> {
        let (color_type, components) = self.color_type()?;
        let width = self.options.width();
        let height = self.options.height();
        let depth_bytes = self.options.depth().size_of();

        if width == 0 || height == 0 {
            return Err(PngErrors::GenericStatic("Zero width or height"));
        }

        let expected = width
            .checked_mul(height)
            .and_then(|p| p.checked_mul(components))
            .and_then(|p| p.checked_mul(depth_bytes))
            .ok_or(PngErrors::GenericStatic("Image dimensions overflow"))?;

        if self.data.len() != expected {
            return Err(PngErrors::Generic(format!(
                "Data length mismatch, expected {expected} but found {}",
                self.data.len()
            )));
        }
        if color_type == 3 {
            let palette = self
                .palette
                .ok_or(PngErrors::GenericStatic("Indexed input without a palette"))?;
            if palette.is_empty() || palette.len() > 256 {
                return Err(PngErrors::GenericStatic("Palette must have 1 to 256 entries"));
            }
            if self.options.depth().size_of() != 1 {
                return Err(PngErrors::Unsupported("16 bit palette images"));
            }
            // every index must resolve
            if let Some(bad) = self.data.iter().find(|i| usize::from(**i) >= palette.len()) {
                return Err(PngErrors::PaletteIndexOutOfBounds(
                    usize::from(*bad),
                    palette.len()
                ));
            }
        }

        let mut writer = ByteWriter::with_capacity(self.data.len() / 2 + 128);

        writer.write_u64_be(PNG_SIGNATURE);
        self.write_ihdr(&mut writer, color_type)?;

        if color_type == 3 {
            self.write_plte(&mut writer);
        }

        let filtered = self.filter_image(components * depth_bytes, width, height);
        trace!("Filtered stream is {} bytes", filtered.len());

        let compressed = DeflateEncoder::new(&filtered).encode_zlib();

        // most decoders stream IDATs in 8KB chunks, emulate that
        for chunk in compressed.chunks(8192) {
            write_chunk(b"IDAT", chunk, &mut writer);
        }
        write_chunk(b"IEND", &[], &mut writer);

        Ok(writer.into_inner())
    }

    fn write_ihdr(&self, writer: &mut ByteWriter, color_type: u8) -> Result<(), PngErrors> {
        let mut ihdr = ByteWriter::with_capacity(13);

        ihdr.write_u32_be(self.options.width() as u32);
        ihdr.write_u32_be(self.options.height() as u32);
        ihdr.write_u8((self.options.depth().size_of() * 8) as u8);
        ihdr.write_u8(color_type);
        // compression, filter, interlace: fixed, never interlaced
        ihdr.write_u8(0);
        ihdr.write_u8(0);
        ihdr.write_u8(0);

        write_chunk(b"IHDR", ihdr.inner_ref(), writer);
        Ok(())
    }

    fn write_plte(&self, writer: &mut ByteWriter) {
        let palette = self.palette.unwrap();

        let mut plte = ByteWriter::with_capacity(palette.len() * 3);
        for entry in palette {
            plte.write_u8(entry[0]);
            plte.write_u8(entry[1]);
            plte.write_u8(entry[2]);
        }
        write_chunk(b"PLTE", plte.inner_ref(), writer);

        // tRNS only when some entry is not fully opaque, trailing
        // opaque entries can be omitted
        if let Some(last) = palette.iter().rposition(|e| e[3] != 255) {
            let alphas: Vec<u8> = palette[..=last].iter().map(|e| e[3]).collect();
            write_chunk(b"tRNS", &alphas, writer);
        }
    }

    /// Filter every row with the minimum-SAD heuristic, producing
    /// the stream fed to deflate
    fn filter_image(&self, bpp: usize, width: usize, height: usize) -> Vec<u8> {
        let scanline = width * bpp;
        let mut out = vec![0_u8; (scanline + 1) * height];
        let mut scratch = vec![0_u8; scanline];

        for y in 0..height {
            let row = &self.data[y * scanline..(y + 1) * scanline];
            let prev: &[u8] = if y == 0 {
                &[]
            } else {
                &self.data[(y - 1) * scanline..y * scanline]
            };

            let filter = choose_filter(row, prev, bpp, &mut scratch);

            let out_row = &mut out[y * (scanline + 1)..(y + 1) * (scanline + 1)];
            out_row[0] = filter.to_int();
            filter_scanline(row, prev, &mut out_row[1..], filter, bpp);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use lume_core::bit_depth::BitDepth;
    use lume_core::colorspace::ColorSpace;
    use lume_core::options::EncoderOptions;
    use lume_core::result::DecodingResult;

    use super::*;
    use crate::PngDecoder;

    #[test]
    fn test_simple_write() {
        let width = 40;
        let height = 10;
        let data = vec![100; width * height];

        let options = EncoderOptions::default()
            .set_colorspace(ColorSpace::Luma)
            .set_width(width)
            .set_height(height)
            .set_depth(BitDepth::Eight);

        let sink = PngEncoder::new(&data, options).encode().unwrap();

        let mut decoder = PngDecoder::new(&sink);
        let bytes = decoder.decode().unwrap();
        match bytes {
            DecodingResult::U8(pixels) => assert_eq!(&data, &pixels),
            _ => panic!("Wrong decode result")
        }
    }

    #[test]
    fn rejects_wrong_data_length() {
        let options = EncoderOptions::default()
            .set_colorspace(ColorSpace::RGB)
            .set_width(10)
            .set_height(10)
            .set_depth(BitDepth::Eight);

        // one byte short
        let data = vec![0; 10 * 10 * 3 - 1];
        assert!(PngEncoder::new(&data, options).encode().is_err());
    }
}

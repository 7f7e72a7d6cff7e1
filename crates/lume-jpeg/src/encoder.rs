/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Baseline JFIF encoder

use lume_core::bytestream::ByteWriter;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;

use log::trace;

use crate::bitstream::JpegBitWriter;
use crate::color_convert::rgb_to_ycbcr_pixel;
use crate::errors::EncodeErrors;
use crate::huffman::HuffmanEncodeTable;
use crate::tables::{
    scale_quant_table, AC_CHROMA_BITS, AC_CHROMA_VALUES, AC_LUMA_BITS, AC_LUMA_VALUES,
    CHROMA_QT, DC_CHROMA_BITS, DC_CHROMA_VALUES, DC_LUMA_BITS, DC_LUMA_VALUES, LUMA_QT,
    UN_ZIGZAG
};

/// A baseline JPEG encoder.
///
/// Writes SOI, a JFIF APP0, quality scaled Annex K quantization
/// tables, the standard Annex K huffman tables, SOF0, SOS, the
/// entropy coded scan and EOI. Chroma is subsampled 4:2:0 by default,
/// 4:4:4 when subsampling is disabled in the options.
pub struct JpegEncoder {
    options: EncoderOptions
}

impl JpegEncoder {
    /// Create a new encoder which consumes frames described
    /// by `options`
    pub fn new(options: EncoderOptions) -> JpegEncoder {
        JpegEncoder { options }
    }

    /// Encode `data` returning the JFIF file bytes.
    ///
    /// Accepted colorspaces are Luma, RGB and RGBA, alpha is
    /// discarded since JFIF cannot carry it
    pub fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>, EncodeErrors> {
        let width = self.options.width();
        let height = self.options.height();
        let colorspace = self.options.colorspace();

        let components = match colorspace {
            ColorSpace::Luma => 1_usize,
            ColorSpace::RGB => 3,
            ColorSpace::RGBA => 4,
            _ => {
                return Err(EncodeErrors::UnsupportedColorspace(
                    "jpeg supports Luma, RGB and RGBA input"
                ))
            }
        };
        if width == 0 || height == 0 {
            return Err(EncodeErrors::Static("Zero width or height"));
        }
        if data.len() != width * height * components {
            return Err(EncodeErrors::Generic(format!(
                "Data length mismatch, expected {} but found {}",
                width * height * components,
                data.len()
            )));
        }

        let grayscale = components == 1;
        let subsample = !grayscale && self.options.chroma_subsampling();
        let quality = self.options.quality();

        trace!(
            "Encoding {}x{} quality {} subsampling {}",
            width,
            height,
            quality,
            if subsample { "4:2:0" } else { "4:4:4" }
        );

        let luma_qt = scale_quant_table(&LUMA_QT, quality);
        let chroma_qt = scale_quant_table(&CHROMA_QT, quality);

        let mut writer = ByteWriter::with_capacity(data.len() / 4 + 1024);

        // SOI
        writer.write_u16_be(0xFFD8);
        self.write_app0(&mut writer);
        write_dqt(&mut writer, 0, &luma_qt);
        if !grayscale {
            write_dqt(&mut writer, 1, &chroma_qt);
        }
        self.write_sof0(&mut writer, grayscale, subsample);
        write_dht(&mut writer, 0, 0, &DC_LUMA_BITS, &DC_LUMA_VALUES);
        write_dht(&mut writer, 1, 0, &AC_LUMA_BITS, &AC_LUMA_VALUES);
        if !grayscale {
            write_dht(&mut writer, 0, 1, &DC_CHROMA_BITS, &DC_CHROMA_VALUES);
            write_dht(&mut writer, 1, 1, &AC_CHROMA_BITS, &AC_CHROMA_VALUES);
        }
        self.write_sos(&mut writer, grayscale);

        let scan = self.encode_scan(data, components, grayscale, subsample, &luma_qt, &chroma_qt);
        writer.write_all(&scan);

        // EOI
        writer.write_u16_be(0xFFD9);

        Ok(writer.into_inner())
    }

    fn write_app0(&self, writer: &mut ByteWriter) {
        writer.write_u16_be(0xFFE0);
        writer.write_u16_be(16);
        writer.write_all(b"JFIF\0");
        // version 1.2
        writer.write_u16_be(0x0102);
        // no density unit, 1:1 aspect
        writer.write_u8(0);
        writer.write_u16_be(1);
        writer.write_u16_be(1);
        // no thumbnail
        writer.write_u8(0);
        writer.write_u8(0);
    }

    fn write_sof0(&self, writer: &mut ByteWriter, grayscale: bool, subsample: bool) {
        let ncomp: u8 = if grayscale { 1 } else { 3 };

        writer.write_u16_be(0xFFC0);
        writer.write_u16_be(8 + 3 * u16::from(ncomp));
        writer.write_u8(8);
        writer.write_u16_be(self.options.height() as u16);
        writer.write_u16_be(self.options.width() as u16);
        writer.write_u8(ncomp);

        let luma_sampling = if subsample { 0x22 } else { 0x11 };
        writer.write_u8(1);
        writer.write_u8(luma_sampling);
        writer.write_u8(0);

        if !grayscale {
            for id in [2, 3] {
                writer.write_u8(id);
                writer.write_u8(0x11);
                writer.write_u8(1);
            }
        }
    }

    fn write_sos(&self, writer: &mut ByteWriter, grayscale: bool) {
        let ncomp: u8 = if grayscale { 1 } else { 3 };

        writer.write_u16_be(0xFFDA);
        writer.write_u16_be(6 + 2 * u16::from(ncomp));
        writer.write_u8(ncomp);

        writer.write_u8(1);
        writer.write_u8(0x00);
        if !grayscale {
            writer.write_u8(2);
            writer.write_u8(0x11);
            writer.write_u8(3);
            writer.write_u8(0x11);
        }
        // full spectral selection, no approximation
        writer.write_u8(0);
        writer.write_u8(63);
        writer.write_u8(0);
    }

    /// Color convert, subsample and entropy code all MCUs
    #[allow(clippy::too_many_arguments)]
    fn encode_scan(
        &self, data: &[u8], components: usize, grayscale: bool, subsample: bool,
        luma_qt: &[u16; 64], chroma_qt: &[u16; 64]
    ) -> Vec<u8> {
        let width = self.options.width();
        let height = self.options.height();

        // build full resolution planes
        let mut y_plane = vec![0_u8; width * height];
        let mut cb_plane = vec![0_u8; if grayscale { 0 } else { width * height }];
        let mut cr_plane = vec![0_u8; if grayscale { 0 } else { width * height }];

        for (i, px) in data.chunks_exact(components).enumerate() {
            if grayscale {
                y_plane[i] = px[0];
            } else {
                let [y, cb, cr] = rgb_to_ycbcr_pixel(px[0], px[1], px[2]);
                y_plane[i] = y;
                cb_plane[i] = cb;
                cr_plane[i] = cr;
            }
        }

        // 4:2:0 averages each 2x2 chroma quad
        let (chroma_w, chroma_h) = if subsample {
            (width.div_ceil(2), height.div_ceil(2))
        } else {
            (width, height)
        };
        if subsample {
            let mut cb_small = vec![0_u8; chroma_w * chroma_h];
            let mut cr_small = vec![0_u8; chroma_w * chroma_h];

            for sy in 0..chroma_h {
                for sx in 0..chroma_w {
                    let mut cb_sum = 0_u32;
                    let mut cr_sum = 0_u32;
                    let mut count = 0_u32;
                    for dy in 0..2 {
                        for dx in 0..2 {
                            let x = (sx * 2 + dx).min(width - 1);
                            let y = (sy * 2 + dy).min(height - 1);
                            cb_sum += u32::from(cb_plane[y * width + x]);
                            cr_sum += u32::from(cr_plane[y * width + x]);
                            count += 1;
                        }
                    }
                    cb_small[sy * chroma_w + sx] = ((cb_sum + count / 2) / count) as u8;
                    cr_small[sy * chroma_w + sx] = ((cr_sum + count / 2) / count) as u8;
                }
            }
            cb_plane = cb_small;
            cr_plane = cr_small;
        }

        let dc_luma = HuffmanEncodeTable::new(&DC_LUMA_BITS, &DC_LUMA_VALUES);
        let ac_luma = HuffmanEncodeTable::new(&AC_LUMA_BITS, &AC_LUMA_VALUES);
        let dc_chroma = HuffmanEncodeTable::new(&DC_CHROMA_BITS, &DC_CHROMA_VALUES);
        let ac_chroma = HuffmanEncodeTable::new(&AC_CHROMA_BITS, &AC_CHROMA_VALUES);

        let dct = DctTables::new();
        let mut bits = JpegBitWriter::new();

        let (h, v) = if subsample { (2, 2) } else { (1, 1) };
        let mcu_x = width.div_ceil(8 * h);
        let mcu_y = height.div_ceil(8 * v);

        let mut dc_preds = [0_i32; 3];

        for my in 0..mcu_y {
            for mx in 0..mcu_x {
                // luma blocks of the MCU
                for by in 0..v {
                    for bx in 0..h {
                        let block = extract_block(
                            &y_plane,
                            width,
                            height,
                            mx * h * 8 + bx * 8,
                            my * v * 8 + by * 8
                        );
                        encode_block(
                            &mut bits,
                            &dct,
                            &block,
                            luma_qt,
                            &dc_luma,
                            &ac_luma,
                            &mut dc_preds[0]
                        );
                    }
                }
                if !grayscale {
                    for (plane, pred) in [(&cb_plane, 1_usize), (&cr_plane, 2)] {
                        let block = extract_block(plane, chroma_w, chroma_h, mx * 8, my * 8);
                        encode_block(
                            &mut bits,
                            &dct,
                            &block,
                            chroma_qt,
                            &dc_chroma,
                            &ac_chroma,
                            &mut dc_preds[pred]
                        );
                    }
                }
            }
        }

        bits.finish()
    }
}

/// Cosine basis for the forward DCT, scaled so the transform
/// matches the T.81 definition
struct DctTables {
    cos: [[f32; 8]; 8]
}

impl DctTables {
    fn new() -> DctTables {
        let mut cos = [[0_f32; 8]; 8];
        for (u, row) in cos.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                let angle = ((2 * x + 1) as f32) * (u as f32) * core::f32::consts::PI / 16.0;
                let c = if u == 0 { core::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
                *value = 0.5 * c * angle.cos();
            }
        }
        DctTables { cos }
    }

    /// Forward 8x8 DCT of level shifted samples
    fn forward(&self, samples: &[i16; 64]) -> [f32; 64] {
        let mut rows = [0_f32; 64];
        // transform rows
        for y in 0..8 {
            for u in 0..8 {
                let mut sum = 0_f32;
                for x in 0..8 {
                    sum += f32::from(samples[y * 8 + x]) * self.cos[u][x];
                }
                rows[y * 8 + u] = sum;
            }
        }
        // transform columns
        let mut out = [0_f32; 64];
        for u in 0..8 {
            for va in 0..8 {
                let mut sum = 0_f32;
                for y in 0..8 {
                    sum += rows[y * 8 + u] * self.cos[va][y];
                }
                out[va * 8 + u] = sum;
            }
        }
        out
    }
}

/// Copy an 8x8 block out of a plane, clamping reads to the edges
fn extract_block(plane: &[u8], width: usize, height: usize, x0: usize, y0: usize) -> [i16; 64] {
    let mut block = [0_i16; 64];
    for dy in 0..8 {
        let y = (y0 + dy).min(height - 1);
        for dx in 0..8 {
            let x = (x0 + dx).min(width - 1);
            // level shift
            block[dy * 8 + dx] = i16::from(plane[y * width + x]) - 128;
        }
    }
    block
}

/// Number of magnitude bits a value needs
#[inline]
fn bit_size(value: i32) -> u8 {
    (32 - value.unsigned_abs().leading_zeros()) as u8
}

/// DCT, quantize and huffman code one block
fn encode_block(
    bits: &mut JpegBitWriter, dct: &DctTables, block: &[i16; 64], qt: &[u16; 64],
    dc_table: &HuffmanEncodeTable, ac_table: &HuffmanEncodeTable, dc_pred: &mut i32
) {
    let coeffs = dct.forward(block);

    // quantize straight into zig-zag order with symmetric rounding
    let mut quantized = [0_i32; 64];
    for (k, q) in quantized.iter_mut().enumerate() {
        let coeff = coeffs[UN_ZIGZAG[k]];
        let step = f32::from(qt[k]);
        *q = (coeff / step).round() as i32;
    }

    // DC is coded differentially
    let diff = quantized[0] - *dc_pred;
    *dc_pred = quantized[0];

    let size = bit_size(diff);
    bits.put_bits(
        u32::from(dc_table.codes[usize::from(size)]),
        dc_table.sizes[usize::from(size)]
    );
    if size > 0 {
        bits.put_bits(magnitude_bits(diff, size), size);
    }

    // AC run length coding
    let mut run = 0_usize;
    for &coeff in &quantized[1..] {
        if coeff == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            // ZRL
            bits.put_bits(u32::from(ac_table.codes[0xF0]), ac_table.sizes[0xF0]);
            run -= 16;
        }
        let size = bit_size(coeff);
        let symbol = ((run as u8) << 4) | size;
        bits.put_bits(
            u32::from(ac_table.codes[usize::from(symbol)]),
            ac_table.sizes[usize::from(symbol)]
        );
        bits.put_bits(magnitude_bits(coeff, size), size);
        run = 0;
    }
    if run > 0 {
        // EOB
        bits.put_bits(u32::from(ac_table.codes[0x00]), ac_table.sizes[0x00]);
    }
}

/// The low `size` bits encoding `value` per T.81 F.1.2.1, negative
/// values are stored as value - 1 in two's complement
#[inline]
fn magnitude_bits(value: i32, size: u8) -> u32 {
    if value < 0 {
        (value + (1 << size) - 1) as u32 & ((1 << size) - 1)
    } else {
        value as u32
    }
}

/// Write a define quantization table segment, values in zig-zag order
fn write_dqt(writer: &mut ByteWriter, id: u8, table: &[u16; 64]) {
    writer.write_u16_be(0xFFDB);
    writer.write_u16_be(2 + 1 + 64);
    writer.write_u8(id); // 8 bit precision, table id
    for q in table {
        writer.write_u8(*q as u8);
    }
}

/// Write a define huffman table segment
fn write_dht(writer: &mut ByteWriter, class: u8, id: u8, bits: &[u8; 16], values: &[u8]) {
    writer.write_u16_be(0xFFC4);
    writer.write_u16_be(2 + 1 + 16 + values.len() as u16);
    writer.write_u8((class << 4) | id);
    writer.write_all(bits);
    writer.write_all(values);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_size_matches_categories() {
        assert_eq!(bit_size(0), 0);
        assert_eq!(bit_size(1), 1);
        assert_eq!(bit_size(-1), 1);
        assert_eq!(bit_size(255), 8);
        assert_eq!(bit_size(-255), 8);
        assert_eq!(bit_size(1024), 11);
    }

    #[test]
    fn magnitude_bits_invert_extend() {
        use crate::bitstream::extend;

        for value in [-1023_i32, -255, -1, 1, 77, 1023] {
            let size = bit_size(value);
            let bits = magnitude_bits(value, size) as i32;
            assert_eq!(extend(bits, size), value, "value {value}");
        }
    }

    #[test]
    fn flat_block_has_single_dc() {
        let dct = DctTables::new();
        let block = [50_i16; 64];
        let coeffs = dct.forward(&block);

        // DC = 8 * sample value, all AC essentially zero
        assert!((coeffs[0] - 400.0).abs() < 0.01);
        for ac in &coeffs[1..] {
            assert!(ac.abs() < 0.01);
        }
    }
}

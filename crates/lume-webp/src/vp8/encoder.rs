//! VP8 key frame encoding
//!
//! A deliberately small encoder: every macroblock is DC predicted
//! (DC_PRED luma and chroma), residuals go through the 4x4 DCT with
//! the luma DCs gathered into a WHT coded Y2 block, and tokens are
//! written against the default probability model. Loop filter
//! parameters are written but the encoder does not run the filter
//! itself.

use log::trace;

use crate::bool_coder::{BoolEncoder, Prob};
use crate::vp8::predict::predict_block;
use crate::vp8::quant::{quality_to_qindex, QuantIndices};
use crate::vp8::tables::{
    CAT1_PROBS, CAT2_PROBS, CAT3_PROBS, CAT4_PROBS, CAT5_PROBS, CAT6_PROBS, CAT_BASES, CAT_BITS,
    COEFF_BANDS, COEFF_TREE, COEFF_UPDATE_PROBS, DCT_CAT1, DCT_CAT2, DCT_CAT3, DCT_CAT4,
    DCT_CAT5, DCT_CAT6, DCT_EOB, DEFAULT_COEFF_PROBS, KF_UV_MODE_PROBS, KF_YMODE_PROBS,
    KF_YMODE_TREE, UV_MODE_TREE, ZIGZAG
};
use crate::vp8::transform::{fdct4x4, fwht4x4, idct4x4, iwht4x4};
use crate::vp8::{DC_PRED, KEYFRAME_START_CODE};

/// The probability the skip flag is written with
const PROB_SKIP_FALSE: Prob = 128;

/// Encode YUV 4:2:0 planes as a VP8 key frame.
///
/// Plane strides must be macroblock aligned, `width`/`height` are
/// the visible dimensions stored in the frame header.
pub(crate) fn encode(
    y_plane: &[u8], u_plane: &[u8], v_plane: &[u8], width: usize, height: usize, quality: u8
) -> Vec<u8> {
    let mb_w = width.div_ceil(16);
    let mb_h = height.div_ceil(16);
    let luma_stride = mb_w * 16;
    let chroma_stride = mb_w * 8;

    let qindex = quality_to_qindex(quality);
    let quant = QuantIndices {
        y_ac_qi: qindex,
        ..Default::default()
    };
    let factors = quant.factors();
    // mild deblocking, written for the decoder to apply
    let filter_level = (i32::from(qindex) / 6).min(63) as u32;

    trace!(
        "VP8 encode {}x{} quality {} -> qindex {}",
        width,
        height,
        quality,
        qindex
    );

    // reconstruction planes drive prediction exactly like a decoder
    let mut y_recon = vec![0_u8; luma_stride * mb_h * 16];
    let mut u_recon = vec![0_u8; chroma_stride * mb_h * 8];
    let mut v_recon = vec![0_u8; chroma_stride * mb_h * 8];

    let mut header = BoolEncoder::new();
    // color space + clamping
    header.put_flag(false);
    header.put_flag(false);
    // no segmentation
    header.put_flag(false);
    // normal loop filter, level, sharpness
    header.put_flag(false);
    header.put_literal(filter_level, 6);
    header.put_literal(0, 3);
    // no loop filter adjustments
    header.put_flag(false);
    // a single token partition
    header.put_literal(0, 2);
    // quantizer, no per-class deltas
    header.put_literal(u32::from(qindex), 7);
    for _ in 0..5 {
        header.put_flag(false);
    }
    // refresh entropy probs
    header.put_flag(false);
    // keep every default token probability
    for plane in 0..4 {
        for band in 0..8 {
            for ctx in 0..3 {
                for pos in 0..11 {
                    header.put_bool(false, COEFF_UPDATE_PROBS[plane][band][ctx][pos]);
                }
            }
        }
    }
    // per-macroblock skip flags are present
    header.put_flag(true);
    header.put_literal(u32::from(PROB_SKIP_FALSE), 8);

    // quantize every macroblock up front: the skip flag lives in the
    // header partition which is written before the tokens
    let mut mb_blocks: Vec<[[i32; 16]; 25]> = Vec::with_capacity(mb_w * mb_h);
    let mut mb_skip = vec![false; mb_w * mb_h];

    for mb_y in 0..mb_h {
        for mb_x in 0..mb_w {
            let mut blocks = [[0_i32; 16]; 25];
            let mut any_nonzero = false;

            // luma: predict, transform residual, gather DCs into Y2
            predict_block(&mut y_recon, luma_stride, mb_x * 16, mb_y * 16, 16, DC_PRED);

            let mut dc_coeffs = [0_i32; 16];
            let mut luma_quantized = [[0_i32; 16]; 16];

            for sb in 0..16 {
                let (sb_x, sb_y) = (sb % 4, sb / 4);
                let x = mb_x * 16 + sb_x * 4;
                let y = mb_y * 16 + sb_y * 4;

                let residual = block_residual(y_plane, &y_recon, luma_stride, x, y);
                let coeffs = fdct4x4(&residual);

                dc_coeffs[sb] = coeffs[0];
                // AC coefficients quantize with the luma factors
                let mut quantized = [0_i32; 16];
                for i in 1..16 {
                    quantized[i] = quantize(coeffs[i], factors.y_ac);
                }
                luma_quantized[sb] = quantized;
            }

            // second order transform over the DCs
            let wht = fwht4x4(&dc_coeffs);
            let mut y2 = [0_i32; 16];
            for i in 0..16 {
                let factor = if i == 0 { factors.y2_dc } else { factors.y2_ac };
                y2[i] = quantize(wht[i], factor);
            }
            blocks[24] = y2;
            any_nonzero |= y2.iter().any(|c| *c != 0);

            for sb in 0..16 {
                blocks[sb] = luma_quantized[sb];
                any_nonzero |= luma_quantized[sb].iter().any(|c| *c != 0);
            }

            // chroma
            predict_block(&mut u_recon, chroma_stride, mb_x * 8, mb_y * 8, 8, DC_PRED);
            predict_block(&mut v_recon, chroma_stride, mb_x * 8, mb_y * 8, 8, DC_PRED);

            for (plane, recon, base) in [
                (u_plane, &mut u_recon, 16_usize),
                (v_plane, &mut v_recon, 20)
            ] {
                for sb in 0..4 {
                    let (sb_x, sb_y) = (sb % 2, sb / 2);
                    let x = mb_x * 8 + sb_x * 4;
                    let y = mb_y * 8 + sb_y * 4;

                    let residual = block_residual(plane, recon, chroma_stride, x, y);
                    let coeffs = fdct4x4(&residual);

                    let mut quantized = [0_i32; 16];
                    for i in 0..16 {
                        let factor = if i == 0 { factors.uv_dc } else { factors.uv_ac };
                        quantized[i] = quantize(coeffs[i], factor);
                    }
                    blocks[base + sb] = quantized;
                    any_nonzero |= quantized.iter().any(|c| *c != 0);
                }
            }

            mb_skip[mb_y * mb_w + mb_x] = !any_nonzero;
            mb_blocks.push(blocks);

            // reconstruct so the next macroblock predicts from what
            // the decoder will see
            reconstruct(
                &mut y_recon,
                &mut u_recon,
                &mut v_recon,
                luma_stride,
                chroma_stride,
                mb_x,
                mb_y,
                &mb_blocks[mb_y * mb_w + mb_x],
                &factors
            );
        }
    }

    // macroblock headers follow the frame header in partition one
    for skip in &mb_skip {
        header.put_bool(*skip, PROB_SKIP_FALSE);
        header.put_tree(&KF_YMODE_TREE, &KF_YMODE_PROBS, DC_PRED);
        header.put_tree(&UV_MODE_TREE, &KF_UV_MODE_PROBS, DC_PRED);
    }
    let first_partition = header.finish();

    // token partition
    let mut tokens = BoolEncoder::new();
    let mut above_nz = vec![[false; 9]; mb_w];

    for mb_y in 0..mb_h {
        let mut left_nz = [false; 9];
        for mb_x in 0..mb_w {
            let index = mb_y * mb_w + mb_x;

            if mb_skip[index] {
                for i in 0..9 {
                    above_nz[mb_x][i] = false;
                    left_nz[i] = false;
                }
                continue;
            }
            let blocks = &mb_blocks[index];

            // Y2
            {
                let ctx = usize::from(above_nz[mb_x][8]) + usize::from(left_nz[8]);
                let nz = put_coeffs(&mut tokens, &DEFAULT_COEFF_PROBS[1], ctx, 0, &blocks[24]);
                above_nz[mb_x][8] = nz;
                left_nz[8] = nz;
            }
            // luma, DC carried by Y2
            for sb in 0..16 {
                let (sb_x, sb_y) = (sb % 4, sb / 4);
                let ctx = usize::from(above_nz[mb_x][sb_x]) + usize::from(left_nz[sb_y]);
                let nz = put_coeffs(&mut tokens, &DEFAULT_COEFF_PROBS[0], ctx, 1, &blocks[sb]);
                above_nz[mb_x][sb_x] = nz;
                left_nz[sb_y] = nz;
            }
            // chroma
            for (plane_index, base) in [(0_usize, 16_usize), (1, 20)] {
                for sb in 0..4 {
                    let (sb_x, sb_y) = (sb % 2, sb / 2);
                    let ctx_index = 4 + plane_index * 2 + sb_x;
                    let left_index = 4 + plane_index * 2 + sb_y;
                    let ctx = usize::from(above_nz[mb_x][ctx_index])
                        + usize::from(left_nz[left_index]);
                    let nz = put_coeffs(
                        &mut tokens,
                        &DEFAULT_COEFF_PROBS[2],
                        ctx,
                        0,
                        &blocks[base + sb]
                    );
                    above_nz[mb_x][ctx_index] = nz;
                    left_nz[left_index] = nz;
                }
            }
        }
    }
    let token_partition = tokens.finish();

    // assemble: tag, start code, dimensions, partitions
    let mut out = Vec::with_capacity(10 + first_partition.len() + token_partition.len());

    let tag: u32 = (first_partition.len() as u32) << 5 | (1 << 4);
    out.push(tag as u8);
    out.push((tag >> 8) as u8);
    out.push((tag >> 16) as u8);
    out.extend_from_slice(&KEYFRAME_START_CODE);
    out.extend_from_slice(&(width as u16).to_le_bytes());
    out.extend_from_slice(&(height as u16).to_le_bytes());
    out.extend_from_slice(&first_partition);
    out.extend_from_slice(&token_partition);

    out
}

/// Difference between source and prediction for one 4x4 block
fn block_residual(
    source: &[u8], recon: &[u8], stride: usize, x: usize, y: usize
) -> [i32; 16] {
    let mut residual = [0_i32; 16];
    for r in 0..4 {
        for c in 0..4 {
            let pos = (y + r) * stride + x + c;
            residual[r * 4 + c] = i32::from(source[pos]) - i32::from(recon[pos]);
        }
    }
    residual
}

/// Dead-zone quantizer, plain division biased towards zero
#[inline]
fn quantize(coeff: i32, factor: i32) -> i32 {
    coeff / factor
}

/// Dequantize and inverse transform, updating the reconstruction
#[allow(clippy::too_many_arguments)]
fn reconstruct(
    y_recon: &mut [u8], u_recon: &mut [u8], v_recon: &mut [u8], luma_stride: usize,
    chroma_stride: usize, mb_x: usize, mb_y: usize, blocks: &[[i32; 16]; 25],
    factors: &crate::vp8::quant::QuantFactors
) {
    // rebuild the luma DCs from the Y2 block
    let mut y2 = [0_i32; 16];
    for i in 0..16 {
        let factor = if i == 0 { factors.y2_dc } else { factors.y2_ac };
        y2[i] = blocks[24][i] * factor;
    }
    let dcs = iwht4x4(&y2);

    for sb in 0..16 {
        let (sb_x, sb_y) = (sb % 4, sb / 4);
        let x = mb_x * 16 + sb_x * 4;
        let y = mb_y * 16 + sb_y * 4;

        let mut coeffs = [0_i32; 16];
        coeffs[0] = dcs[sb];
        for i in 1..16 {
            coeffs[i] = blocks[sb][i] * factors.y_ac;
        }
        add_block(y_recon, luma_stride, x, y, &coeffs);
    }

    for (recon, base) in [(u_recon, 16_usize), (v_recon, 20)] {
        for sb in 0..4 {
            let (sb_x, sb_y) = (sb % 2, sb / 2);
            let x = mb_x * 8 + sb_x * 4;
            let y = mb_y * 8 + sb_y * 4;

            let mut coeffs = [0_i32; 16];
            for i in 0..16 {
                let factor = if i == 0 { factors.uv_dc } else { factors.uv_ac };
                coeffs[i] = blocks[base + sb][i] * factor;
            }
            add_block(recon, chroma_stride, x, y, &coeffs);
        }
    }
}

fn add_block(plane: &mut [u8], stride: usize, x: usize, y: usize, coeffs: &[i32; 16]) {
    if coeffs.iter().all(|c| *c == 0) {
        return;
    }
    let residual = idct4x4(coeffs);
    for (r, row) in residual.chunks_exact(4).enumerate() {
        let base = (y + r) * stride + x;
        for (c, value) in row.iter().enumerate() {
            let pixel = i32::from(plane[base + c]) + value;
            plane[base + c] = pixel.clamp(0, 255) as u8;
        }
    }
}

/// Write the tokens of one block, mirroring the decoder's context
/// handling. Returns the nonzero flag for neighbor contexts.
fn put_coeffs(
    encoder: &mut BoolEncoder, probs: &[[[Prob; 11]; 3]; 8], mut ctx: usize, first: usize,
    block: &[i32; 16]
) -> bool {
    // find the last nonzero position in scan order
    let mut last = None;
    for c in (first..16).rev() {
        if block[ZIGZAG[c]] != 0 {
            last = Some(c);
            break;
        }
    }
    let Some(last) = last else {
        // immediate end of block
        let prob_row = &probs[COEFF_BANDS[first]][ctx];
        encoder.put_tree(&COEFF_TREE, prob_row, DCT_EOB);
        return false;
    };

    let mut skip_eob = false;
    let mut c = first;
    while c <= last {
        let value = block[ZIGZAG[c]];
        let band = COEFF_BANDS[c];
        let prob_row = &probs[band][ctx];

        let abs_value = value.unsigned_abs() as i32;
        let token = token_for(abs_value);

        if skip_eob {
            encoder.put_tree_from(&COEFF_TREE, prob_row, token, 2);
        } else {
            encoder.put_tree(&COEFF_TREE, prob_row, token);
        }

        if abs_value == 0 {
            skip_eob = true;
            ctx = 0;
            c += 1;
            continue;
        }
        skip_eob = false;

        // category extra bits then the sign
        if token >= DCT_CAT1 {
            let cat = (token - DCT_CAT1) as usize;
            let cat_probs: &[Prob] = match token {
                DCT_CAT1 => &CAT1_PROBS,
                DCT_CAT2 => &CAT2_PROBS,
                DCT_CAT3 => &CAT3_PROBS,
                DCT_CAT4 => &CAT4_PROBS,
                DCT_CAT5 => &CAT5_PROBS,
                _ => &CAT6_PROBS
            };
            let extra = (abs_value - CAT_BASES[cat]) as u32;
            for (i, p) in cat_probs.iter().enumerate() {
                let bit = (extra >> (CAT_BITS[cat] - 1 - i)) & 1 == 1;
                encoder.put_bool(bit, *p);
            }
        }
        encoder.put_flag(value < 0);

        ctx = if abs_value == 1 { 1 } else { 2 };
        c += 1;
    }

    if last < 15 {
        let band = COEFF_BANDS[last + 1];
        encoder.put_tree(&COEFF_TREE, &probs[band][ctx], DCT_EOB);
    }
    true
}

/// Map an absolute coefficient value to its token
fn token_for(abs_value: i32) -> i8 {
    match abs_value {
        0..=4 => abs_value as i8,
        5..=6 => DCT_CAT1,
        7..=10 => DCT_CAT2,
        11..=18 => DCT_CAT3,
        19..=34 => DCT_CAT4,
        35..=66 => DCT_CAT5,
        _ => DCT_CAT6
    }
}

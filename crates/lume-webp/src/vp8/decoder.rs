//! VP8 key frame decoding

use log::trace;

use crate::bool_coder::{BoolDecoder, Prob};
use crate::errors::WebPErrors;
use crate::vp8::loopfilter::{
    load_horizontal, load_vertical, normal_mb_filter, normal_subblock_filter, simple_filter,
    store_horizontal, store_vertical, FilterParams
};
use crate::vp8::predict::{predict_block, predict_subblock};
use crate::vp8::quant::{QuantFactors, QuantIndices};
use crate::vp8::tables::{
    BMODE_TREE, CAT1_PROBS, CAT2_PROBS, CAT3_PROBS, CAT4_PROBS, CAT5_PROBS, CAT6_PROBS,
    CAT_BASES, COEFF_BANDS, COEFF_TREE, COEFF_UPDATE_PROBS, DCT_CAT1, DCT_EOB,
    DEFAULT_COEFF_PROBS, KF_B_MODE_PROBS, KF_UV_MODE_PROBS, KF_YMODE_PROBS, KF_YMODE_TREE,
    UV_MODE_TREE, ZIGZAG
};
use crate::vp8::transform::{idct4x4, iwht4x4};
use crate::vp8::{B_DC_PRED, B_HE_PRED, B_PRED, B_TM_PRED, B_VE_PRED, DC_PRED, H_PRED,
                 KEYFRAME_START_CODE, TM_PRED, V_PRED};

/// Decoded YUV 4:2:0 planes of one key frame
pub(crate) struct Vp8Frame {
    pub width:         usize,
    pub height:        usize,
    pub y:             Vec<u8>,
    pub u:             Vec<u8>,
    pub v:             Vec<u8>,
    pub luma_stride:   usize,
    pub chroma_stride: usize
}

/// Per macroblock mode information read from the first partition
#[derive(Clone)]
struct MacroblockInfo {
    ymode:     i8,
    uvmode:    i8,
    bmodes:    [i8; 16],
    skip:      bool,
    segment:   usize
}

struct SegmentFeatures {
    enabled:      bool,
    update_map:   bool,
    abs_values:   bool,
    tree_probs:   [Prob; 3],
    quant_deltas: [i32; 4],
    lf_deltas:    [i32; 4]
}

impl Default for SegmentFeatures {
    fn default() -> Self {
        SegmentFeatures {
            enabled:      false,
            update_map:   false,
            abs_values:   false,
            tree_probs:   [255; 3],
            quant_deltas: [0; 4],
            lf_deltas:    [0; 4]
        }
    }
}

/// Decode one VP8 key frame
pub(crate) fn decode(
    data: &[u8], max_width: usize, max_height: usize
) -> Result<Vp8Frame, WebPErrors> {
    if data.len() < 10 {
        return Err(WebPErrors::Truncated);
    }
    // three byte frame tag, little endian
    let tag = u32::from(data[0]) | (u32::from(data[1]) << 8) | (u32::from(data[2]) << 16);
    let is_keyframe = tag & 1 == 0;
    let version = (tag >> 1) & 7;
    let _show_frame = (tag >> 4) & 1;
    let first_part_size = (tag >> 5) as usize;

    if !is_keyframe {
        return Err(WebPErrors::Unsupported("VP8 inter frames".to_string()));
    }
    if version > 3 {
        return Err(WebPErrors::Malformed(format!("Bad VP8 version {version}")));
    }
    if data[3..6] != KEYFRAME_START_CODE {
        return Err(WebPErrors::Malformed("Missing key frame start code".to_string()));
    }

    let width = (u16::from_le_bytes([data[6], data[7]]) & 0x3FFF) as usize;
    let height = (u16::from_le_bytes([data[8], data[9]]) & 0x3FFF) as usize;

    if width == 0 || height == 0 {
        return Err(WebPErrors::Malformed("Zero frame dimensions".to_string()));
    }
    if width > max_width {
        return Err(WebPErrors::TooLargeDimensions("width", max_width, width));
    }
    if height > max_height {
        return Err(WebPErrors::TooLargeDimensions("height", max_height, height));
    }
    if 10 + first_part_size > data.len() {
        return Err(WebPErrors::Truncated);
    }
    trace!("VP8 key frame {}x{}", width, height);

    let mut header = BoolDecoder::new(&data[10..10 + first_part_size]);

    // color space and clamping
    let _color_space = header.get_flag();
    let _clamping = header.get_flag();

    let segments = read_segmentation(&mut header);

    // loop filter parameters
    let simple_lf = header.get_flag();
    let filter_level = header.get_literal(6) as i32;
    let sharpness = header.get_literal(3) as i32;

    let mut ref_lf_deltas = [0_i32; 4];
    let mut mode_lf_deltas = [0_i32; 4];
    if header.get_flag() {
        // loop filter adjustments enabled
        if header.get_flag() {
            for delta in ref_lf_deltas.iter_mut().chain(mode_lf_deltas.iter_mut()) {
                if header.get_flag() {
                    *delta = header.get_signed(6);
                }
            }
        }
    }

    // token partition layout
    let num_partitions = 1_usize << header.get_literal(2);
    let partition_area = &data[10 + first_part_size..];
    let sizes_len = (num_partitions - 1) * 3;
    if partition_area.len() < sizes_len {
        return Err(WebPErrors::Truncated);
    }

    let mut partitions = Vec::with_capacity(num_partitions);
    {
        let mut offset = sizes_len;
        for i in 0..num_partitions {
            let size = if i + 1 == num_partitions {
                partition_area.len() - offset
            } else {
                let base = i * 3;
                u32::from(partition_area[base]) as usize
                    | (u32::from(partition_area[base + 1]) as usize) << 8
                    | (u32::from(partition_area[base + 2]) as usize) << 16
            };
            if offset + size > partition_area.len() {
                return Err(WebPErrors::Truncated);
            }
            partitions.push(BoolDecoder::new(&partition_area[offset..offset + size]));
            offset += size;
        }
    }

    // quantizer indices
    let mut quant = QuantIndices {
        y_ac_qi: header.get_literal(7) as u8,
        ..Default::default()
    };
    for delta in [
        &mut quant.y_dc_delta,
        &mut quant.y2_dc_delta,
        &mut quant.y2_ac_delta,
        &mut quant.uv_dc_delta,
        &mut quant.uv_ac_delta
    ] {
        if header.get_flag() {
            *delta = header.get_signed(4);
        }
    }

    let _refresh_entropy = header.get_flag();

    // token probability updates
    let mut coeff_probs = DEFAULT_COEFF_PROBS;
    for plane in 0..4 {
        for band in 0..8 {
            for ctx in 0..3 {
                for pos in 0..11 {
                    if header.get_bool(COEFF_UPDATE_PROBS[plane][band][ctx][pos]) {
                        coeff_probs[plane][band][ctx][pos] = header.get_literal(8) as Prob;
                    }
                }
            }
        }
    }

    let mb_skip_enabled = header.get_flag();
    let prob_skip_false: Prob = if mb_skip_enabled {
        header.get_literal(8) as Prob
    } else {
        0
    };

    let mb_w = width.div_ceil(16);
    let mb_h = height.div_ceil(16);

    // first pass: mode info for every macroblock
    let mut infos: Vec<MacroblockInfo> = Vec::with_capacity(mb_w * mb_h);
    // above/left subblock mode context rows
    let mut above_bmodes = vec![[B_DC_PRED; 4]; mb_w];

    for _mb_y in 0..mb_h {
        let mut left_bmodes = [B_DC_PRED; 4];
        for mb_x in 0..mb_w {
            let segment = if segments.enabled && segments.update_map {
                read_segment_id(&mut header, &segments.tree_probs)
            } else {
                0
            };
            let skip = mb_skip_enabled && header.get_bool(prob_skip_false);

            let ymode = header.read_tree(&KF_YMODE_TREE, &KF_YMODE_PROBS);
            let mut bmodes = [implied_bmode(ymode); 16];

            if ymode == B_PRED {
                for sb_y in 0..4 {
                    for sb_x in 0..4 {
                        let above = if sb_y == 0 {
                            above_bmodes[mb_x][sb_x]
                        } else {
                            bmodes[(sb_y - 1) * 4 + sb_x]
                        };
                        let left = if sb_x == 0 {
                            left_bmodes[sb_y]
                        } else {
                            bmodes[sb_y * 4 + sb_x - 1]
                        };
                        let probs = &KF_B_MODE_PROBS[above as usize][left as usize];
                        bmodes[sb_y * 4 + sb_x] = header.read_tree(&BMODE_TREE, probs);
                    }
                }
            }

            for i in 0..4 {
                above_bmodes[mb_x][i] = bmodes[12 + i];
                left_bmodes[i] = bmodes[i * 4 + 3];
            }

            let uvmode = header.read_tree(&UV_MODE_TREE, &KF_UV_MODE_PROBS);

            infos.push(MacroblockInfo {
                ymode,
                uvmode,
                bmodes,
                skip,
                segment
            });
        }
    }

    // plane buffers sized to whole macroblocks
    let luma_stride = mb_w * 16;
    let chroma_stride = mb_w * 8;
    let mut y_plane = vec![0_u8; luma_stride * mb_h * 16];
    let mut u_plane = vec![0_u8; chroma_stride * mb_h * 8];
    let mut v_plane = vec![0_u8; chroma_stride * mb_h * 8];

    // per segment dequantization factors
    let seg_factors: Vec<QuantFactors> = (0..4)
        .map(|s| {
            let mut q = quant;
            if segments.enabled {
                if segments.abs_values {
                    q.y_ac_qi = segments.quant_deltas[s].clamp(0, 127) as u8;
                } else {
                    q.y_ac_qi =
                        (i32::from(q.y_ac_qi) + segments.quant_deltas[s]).clamp(0, 127) as u8;
                }
            }
            q.factors()
        })
        .collect();

    // second pass: residuals and reconstruction
    // nonzero contexts: 4 luma + 2 u + 2 v + 1 y2 per axis
    let mut above_nz = vec![[false; 9]; mb_w];
    let mut coeffs_nonzero = vec![false; mb_w * mb_h];

    for mb_y in 0..mb_h {
        let mut left_nz = [false; 9];
        let partition = &mut partitions[mb_y % num_partitions];

        for mb_x in 0..mb_w {
            let info = &infos[mb_y * mb_w + mb_x];
            let factors = seg_factors[info.segment];
            let has_y2 = info.ymode != B_PRED;

            let mut blocks = [[0_i32; 16]; 25];

            if info.skip {
                // no coefficients, clear the contexts
                for i in 0..8 {
                    above_nz[mb_x][i] = false;
                    left_nz[i] = false;
                }
                if has_y2 {
                    above_nz[mb_x][8] = false;
                    left_nz[8] = false;
                }
            } else {
                let mut any_nonzero = false;

                // second order luma block first
                if has_y2 {
                    let ctx = usize::from(above_nz[mb_x][8]) + usize::from(left_nz[8]);
                    let (block, nz) = decode_coeffs_from(
                        partition,
                        &coeff_probs[1],
                        ctx,
                        0,
                        factors.y2_dc,
                        factors.y2_ac
                    );
                    blocks[24] = block;
                    above_nz[mb_x][8] = nz;
                    left_nz[8] = nz;
                    any_nonzero |= nz;
                }

                // sixteen luma blocks
                let (plane, first) = if has_y2 { (0, 1) } else { (3, 0) };
                for sb in 0..16 {
                    let (sb_x, sb_y) = (sb % 4, sb / 4);
                    let ctx =
                        usize::from(above_nz[mb_x][sb_x]) + usize::from(left_nz[sb_y]);
                    let (block, nz) = decode_coeffs_from(
                        partition,
                        &coeff_probs[plane],
                        ctx,
                        first,
                        factors.y_dc,
                        factors.y_ac
                    );
                    blocks[sb] = block;
                    above_nz[mb_x][sb_x] = nz;
                    left_nz[sb_y] = nz;
                    any_nonzero |= nz;
                }

                // chroma blocks
                for (plane_index, base) in [(0_usize, 16_usize), (1, 20)] {
                    for sb in 0..4 {
                        let (sb_x, sb_y) = (sb % 2, sb / 2);
                        let ctx_index = 4 + plane_index * 2 + sb_x;
                        let left_index = 4 + plane_index * 2 + sb_y;
                        let ctx = usize::from(above_nz[mb_x][ctx_index])
                            + usize::from(left_nz[left_index]);
                        let (block, nz) = decode_coeffs_from(
                            partition,
                            &coeff_probs[2],
                            ctx,
                            0,
                            factors.uv_dc,
                            factors.uv_ac
                        );
                        blocks[base + sb] = block;
                        above_nz[mb_x][ctx_index] = nz;
                        left_nz[left_index] = nz;
                        any_nonzero |= nz;
                    }
                }
                coeffs_nonzero[mb_y * mb_w + mb_x] = any_nonzero;
            }

            // carry the Y2 DC coefficients into the luma blocks
            if has_y2 && !info.skip {
                let dcs = iwht4x4(&blocks[24]);
                for sb in 0..16 {
                    blocks[sb][0] = dcs[sb];
                }
            }

            reconstruct_mb(
                &mut y_plane,
                &mut u_plane,
                &mut v_plane,
                luma_stride,
                chroma_stride,
                mb_x,
                mb_y,
                info,
                &blocks
            );
        }
    }

    // loop filtering over macroblock and subblock edges
    if filter_level > 0 {
        apply_loop_filter(
            &mut y_plane,
            &mut u_plane,
            &mut v_plane,
            luma_stride,
            chroma_stride,
            mb_w,
            mb_h,
            &infos,
            &coeffs_nonzero,
            &segments,
            filter_level,
            sharpness,
            simple_lf,
            &ref_lf_deltas,
            &mode_lf_deltas
        );
    }

    Ok(Vp8Frame {
        width,
        height,
        y: y_plane,
        u: u_plane,
        v: v_plane,
        luma_stride,
        chroma_stride
    })
}

fn read_segmentation(header: &mut BoolDecoder) -> SegmentFeatures {
    let mut segments = SegmentFeatures::default();

    segments.enabled = header.get_flag();
    if !segments.enabled {
        return segments;
    }
    segments.update_map = header.get_flag();
    let update_features = header.get_flag();

    if update_features {
        segments.abs_values = header.get_flag();
        for delta in segments.quant_deltas.iter_mut() {
            if header.get_flag() {
                *delta = header.get_signed(7);
            }
        }
        for delta in segments.lf_deltas.iter_mut() {
            if header.get_flag() {
                *delta = header.get_signed(6);
            }
        }
    }
    if segments.update_map {
        for prob in segments.tree_probs.iter_mut() {
            if header.get_flag() {
                *prob = header.get_literal(8) as Prob;
            }
        }
    }
    segments
}

fn read_segment_id(header: &mut BoolDecoder, probs: &[Prob; 3]) -> usize {
    if header.get_bool(probs[0]) {
        2 + usize::from(header.get_bool(probs[2]))
    } else {
        usize::from(header.get_bool(probs[1]))
    }
}

/// The subblock mode a whole-block luma mode implies for neighbor
/// context purposes
fn implied_bmode(ymode: i8) -> i8 {
    match ymode {
        DC_PRED => B_DC_PRED,
        V_PRED => B_VE_PRED,
        H_PRED => B_HE_PRED,
        TM_PRED => B_TM_PRED,
        _ => B_DC_PRED
    }
}

/// Token decode one block, returning natural order dequantized
/// coefficients plus the nonzero flag feeding neighbor contexts
fn decode_coeffs_from(
    bool_dec: &mut BoolDecoder, probs: &[[[Prob; 11]; 3]; 8], mut ctx: usize, first: usize,
    dc_factor: i32, ac_factor: i32
) -> ([i32; 16], bool) {
    let mut block = [0_i32; 16];
    let mut nonzero = false;
    let mut skip_eob = false;

    let mut c = first;
    while c < 16 {
        let band = COEFF_BANDS[c];
        let prob_row = &probs[band][ctx];

        let token = if skip_eob {
            bool_dec.read_tree_from(&COEFF_TREE, prob_row, 2)
        } else {
            bool_dec.read_tree(&COEFF_TREE, prob_row)
        };

        if token == DCT_EOB {
            break;
        }
        if token == 0 {
            // a zero run coefficient
            skip_eob = true;
            ctx = 0;
            c += 1;
            continue;
        }
        skip_eob = false;

        let abs_value = if token < DCT_CAT1 {
            i32::from(token)
        } else {
            let cat = (token - DCT_CAT1) as usize;
            let cat_probs: &[Prob] = match cat {
                0 => &CAT1_PROBS,
                1 => &CAT2_PROBS,
                2 => &CAT3_PROBS,
                3 => &CAT4_PROBS,
                4 => &CAT5_PROBS,
                _ => &CAT6_PROBS
            };
            let mut extra = 0_i32;
            for p in cat_probs {
                extra = (extra << 1) | i32::from(bool_dec.get_bool(*p));
            }
            CAT_BASES[cat] + extra
        };

        let value = if bool_dec.get_flag() { -abs_value } else { abs_value };
        let factor = if c == 0 { dc_factor } else { ac_factor };

        block[ZIGZAG[c]] = value * factor;
        nonzero = true;
        ctx = if abs_value == 1 { 1 } else { 2 };
        c += 1;
    }

    (block, nonzero)
}

/// Predict and add residuals for one macroblock
#[allow(clippy::too_many_arguments)]
fn reconstruct_mb(
    y_plane: &mut [u8], u_plane: &mut [u8], v_plane: &mut [u8], luma_stride: usize,
    chroma_stride: usize, mb_x: usize, mb_y: usize, info: &MacroblockInfo,
    blocks: &[[i32; 16]; 25]
) {
    let lx = mb_x * 16;
    let ly = mb_y * 16;

    if info.ymode == B_PRED {
        // per subblock: predict then immediately add the residual so
        // later subblocks see reconstructed pixels
        for sb in 0..16 {
            let (sb_x, sb_y) = (sb % 4, sb / 4);
            let x = lx + sb_x * 4;
            let y = ly + sb_y * 4;

            predict_subblock(y_plane, luma_stride, x, y, info.bmodes[sb]);
            add_residual(y_plane, luma_stride, x, y, &blocks[sb]);
        }
    } else {
        predict_block(y_plane, luma_stride, lx, ly, 16, info.ymode);
        for sb in 0..16 {
            let (sb_x, sb_y) = (sb % 4, sb / 4);
            add_residual(y_plane, luma_stride, lx + sb_x * 4, ly + sb_y * 4, &blocks[sb]);
        }
    }

    let cx = mb_x * 8;
    let cy = mb_y * 8;
    predict_block(u_plane, chroma_stride, cx, cy, 8, info.uvmode);
    predict_block(v_plane, chroma_stride, cx, cy, 8, info.uvmode);

    for sb in 0..4 {
        let (sb_x, sb_y) = (sb % 2, sb / 2);
        add_residual(u_plane, chroma_stride, cx + sb_x * 4, cy + sb_y * 4, &blocks[16 + sb]);
        add_residual(v_plane, chroma_stride, cx + sb_x * 4, cy + sb_y * 4, &blocks[20 + sb]);
    }
}

/// Inverse transform a coefficient block and add it onto the plane
fn add_residual(plane: &mut [u8], stride: usize, x: usize, y: usize, coeffs: &[i32; 16]) {
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

/// Run the deblocking filter over every macroblock edge
#[allow(clippy::too_many_arguments)]
fn apply_loop_filter(
    y_plane: &mut [u8], u_plane: &mut [u8], v_plane: &mut [u8], luma_stride: usize,
    chroma_stride: usize, mb_w: usize, mb_h: usize, infos: &[MacroblockInfo],
    coeffs_nonzero: &[bool], segments: &SegmentFeatures, base_level: i32, sharpness: i32,
    simple: bool, ref_lf_deltas: &[i32; 4], mode_lf_deltas: &[i32; 4]
) {
    for mb_y in 0..mb_h {
        for mb_x in 0..mb_w {
            let info = &infos[mb_y * mb_w + mb_x];

            // per macroblock filter strength
            let mut level = base_level;
            if segments.enabled {
                level = if segments.abs_values {
                    segments.lf_deltas[info.segment]
                } else {
                    level + segments.lf_deltas[info.segment]
                };
            }
            // intra frames always use the intra reference delta,
            // B_PRED carries its own mode delta
            level += ref_lf_deltas[0];
            if info.ymode == B_PRED {
                level += mode_lf_deltas[0];
            }
            let level = level.clamp(0, 63);
            if level == 0 {
                continue;
            }
            let params = FilterParams::new(level, sharpness);

            // interior edges are skipped for skipped macroblocks
            // with nothing coded
            let filter_interior =
                info.ymode == B_PRED || coeffs_nonzero[mb_y * mb_w + mb_x];

            if simple {
                filter_mb_simple(y_plane, luma_stride, mb_x, mb_y, &params, filter_interior);
            } else {
                filter_mb_normal(
                    y_plane,
                    luma_stride,
                    mb_x,
                    mb_y,
                    16,
                    &params,
                    filter_interior
                );
                filter_mb_normal(
                    u_plane,
                    chroma_stride,
                    mb_x,
                    mb_y,
                    8,
                    &params,
                    filter_interior
                );
                filter_mb_normal(
                    v_plane,
                    chroma_stride,
                    mb_x,
                    mb_y,
                    8,
                    &params,
                    filter_interior
                );
            }
        }
    }
}

fn filter_mb_simple(
    plane: &mut [u8], stride: usize, mb_x: usize, mb_y: usize, params: &FilterParams,
    interior: bool
) {
    let x0 = mb_x * 16;
    let y0 = mb_y * 16;

    // left macroblock edge
    if mb_x > 0 {
        for row in 0..16 {
            let mut pixels = load_horizontal(plane, stride, x0, y0 + row);
            simple_filter(&mut pixels, params.mb_edge_limit);
            store_horizontal(plane, stride, x0, y0 + row, &pixels);
        }
    }
    if interior {
        for offset in [4, 8, 12] {
            for row in 0..16 {
                let mut pixels = load_horizontal(plane, stride, x0 + offset, y0 + row);
                simple_filter(&mut pixels, params.sub_edge_limit);
                store_horizontal(plane, stride, x0 + offset, y0 + row, &pixels);
            }
        }
    }
    // top macroblock edge
    if mb_y > 0 {
        for col in 0..16 {
            let mut pixels = load_vertical(plane, stride, x0 + col, y0);
            simple_filter(&mut pixels, params.mb_edge_limit);
            store_vertical(plane, stride, x0 + col, y0, &pixels);
        }
    }
    if interior {
        for offset in [4, 8, 12] {
            for col in 0..16 {
                let mut pixels = load_vertical(plane, stride, x0 + col, y0 + offset);
                simple_filter(&mut pixels, params.sub_edge_limit);
                store_vertical(plane, stride, x0 + col, y0 + offset, &pixels);
            }
        }
    }
}

fn filter_mb_normal(
    plane: &mut [u8], stride: usize, mb_x: usize, mb_y: usize, mb_size: usize,
    params: &FilterParams, interior: bool
) {
    let x0 = mb_x * mb_size;
    let y0 = mb_y * mb_size;

    if mb_x > 0 {
        for row in 0..mb_size {
            let mut pixels = load_horizontal(plane, stride, x0, y0 + row);
            normal_mb_filter(&mut pixels, params);
            store_horizontal(plane, stride, x0, y0 + row, &pixels);
        }
    }
    if interior {
        let offsets: &[usize] = if mb_size == 16 { &[4, 8, 12] } else { &[4] };
        for offset in offsets {
            for row in 0..mb_size {
                let mut pixels = load_horizontal(plane, stride, x0 + offset, y0 + row);
                normal_subblock_filter(&mut pixels, params);
                store_horizontal(plane, stride, x0 + offset, y0 + row, &pixels);
            }
        }
    }
    if mb_y > 0 {
        for col in 0..mb_size {
            let mut pixels = load_vertical(plane, stride, x0 + col, y0);
            normal_mb_filter(&mut pixels, params);
            store_vertical(plane, stride, x0 + col, y0, &pixels);
        }
    }
    if interior {
        let offsets: &[usize] = if mb_size == 16 { &[4, 8, 12] } else { &[4] };
        for offset in offsets {
            for col in 0..mb_size {
                let mut pixels = load_vertical(plane, stride, x0 + col, y0 + *offset);
                normal_subblock_filter(&mut pixels, params);
                store_vertical(plane, stride, x0 + col, y0 + *offset, &pixels);
            }
        }
    }
}

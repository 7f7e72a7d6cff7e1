//! VP8L lossless decoding

use lume_core::bits::BitReaderLsb;

use log::trace;

use crate::errors::WebPErrors;
use crate::huffman::PrefixCode;
use crate::vp8l::{
    color_cache_index, prefix_decode, CODE_LENGTH_CODE_ORDER, DISTANCE_MAP, NUM_DISTANCE_CODES,
    NUM_LENGTH_CODES, NUM_LITERALS, VP8L_SIGNATURE
};

/// The four transform types in their wire encoding
const TRANSFORM_PREDICTOR: u64 = 0;
const TRANSFORM_COLOR: u64 = 1;
const TRANSFORM_SUBTRACT_GREEN: u64 = 2;
const TRANSFORM_COLOR_INDEXING: u64 = 3;

/// A parsed transform, applied in reverse read order after pixel
/// decoding
enum Transform {
    Predictor {
        size_bits: u8,
        data:      Vec<u32>
    },
    Color {
        size_bits: u8,
        data:      Vec<u32>
    },
    SubtractGreen,
    ColorIndexing {
        /// palette after cumulative delta reconstruction
        palette: Vec<u32>,
        /// index packing density, 0 = one index per pixel
        xbits:   u8
    }
}

/// One prefix code group, five codes
struct CodeGroup {
    green:    PrefixCode,
    red:      PrefixCode,
    blue:     PrefixCode,
    alpha:    PrefixCode,
    distance: PrefixCode
}

/// Decode a complete VP8L stream into ARGB pixels
pub(crate) fn decode(
    data: &[u8], max_width: usize, max_height: usize
) -> Result<(usize, usize, bool, Vec<u32>), WebPErrors> {
    let mut reader = BitReaderLsb::new(data);

    if reader.read(8)? as u8 != VP8L_SIGNATURE {
        return Err(WebPErrors::Malformed("Missing VP8L signature byte".to_string()));
    }
    let width = reader.read(14)? as usize + 1;
    let height = reader.read(14)? as usize + 1;
    let alpha_used = reader.read(1)? == 1;
    let version = reader.read(3)?;

    if version != 0 {
        return Err(WebPErrors::Unsupported(format!("VP8L version {version}")));
    }
    if width > max_width {
        return Err(WebPErrors::TooLargeDimensions("width", max_width, width));
    }
    if height > max_height {
        return Err(WebPErrors::TooLargeDimensions("height", max_height, height));
    }
    trace!("VP8L image {}x{}, alpha {}", width, height, alpha_used);

    let pixels = decode_image(&mut reader, width, height, true)?;
    Ok((width, height, alpha_used, pixels))
}

/// Decode one entropy coded image; level 0 additionally carries
/// transforms and may use a meta prefix image
fn decode_image(
    reader: &mut BitReaderLsb, width: usize, height: usize, is_level0: bool
) -> Result<Vec<u32>, WebPErrors> {
    let mut transforms = Vec::new();
    let mut xsize = width;

    if is_level0 {
        let mut seen = [false; 4];
        while reader.read(1)? == 1 {
            if transforms.len() == 4 {
                return Err(WebPErrors::Malformed("Too many transforms".to_string()));
            }
            let transform = read_transform(reader, xsize, height, &mut seen)?;
            if let Transform::ColorIndexing { xbits, .. } = &transform {
                // index bundling shrinks the coded width
                xsize = subsample_size(xsize, *xbits);
            }
            transforms.push(transform);
        }
    }

    // color cache
    let cache_bits = if reader.read(1)? == 1 {
        let bits = reader.read(4)? as u8;
        if !(1..=11).contains(&bits) {
            return Err(WebPErrors::Malformed(format!("Invalid cache bits {bits}")));
        }
        bits
    } else {
        0
    };
    let cache_size = if cache_bits == 0 { 0 } else { 1_usize << cache_bits };
    let mut cache = vec![0_u32; cache_size];

    // meta prefix image selects a code group per 2^bits block
    let (meta, meta_bits, num_groups) = if is_level0 && reader.read(1)? == 1 {
        let bits = reader.read(3)? as u8 + 2;
        let mw = subsample_size(xsize, bits);
        let mh = subsample_size(height, bits);
        let image = decode_image(reader, mw, mh, false)?;

        let mut max_group = 0;
        for pixel in &image {
            let group = (pixel >> 8) & 0xFFFF;
            max_group = max_group.max(group);
        }
        (Some(image), bits, max_group as usize + 1)
    } else {
        (None, 0, 1)
    };

    let mut groups = Vec::with_capacity(num_groups);
    for _ in 0..num_groups {
        groups.push(CodeGroup {
            green:    read_prefix_code(reader, NUM_LITERALS + NUM_LENGTH_CODES + cache_size)?,
            red:      read_prefix_code(reader, NUM_LITERALS)?,
            blue:     read_prefix_code(reader, NUM_LITERALS)?,
            alpha:    read_prefix_code(reader, NUM_LITERALS)?,
            distance: read_prefix_code(reader, NUM_DISTANCE_CODES)?
        });
    }

    // main pixel loop
    let total = xsize * height;
    let mut out: Vec<u32> = Vec::with_capacity(total);

    while out.len() < total {
        let pos = out.len();
        let (x, y) = (pos % xsize, pos / xsize);

        let group = match &meta {
            Some(image) => {
                let mw = subsample_size(xsize, meta_bits);
                let pixel = image[(y >> meta_bits) * mw + (x >> meta_bits)];
                let index = ((pixel >> 8) & 0xFFFF) as usize;
                &groups[index]
            }
            None => &groups[0]
        };

        let symbol = group.green.decode(reader)? as usize;

        if symbol < NUM_LITERALS {
            // a literal pixel, green came first
            let green = symbol as u32;
            let red = group.red.decode(reader)? as u32;
            let blue = group.blue.decode(reader)? as u32;
            let alpha = group.alpha.decode(reader)? as u32;

            let argb = (alpha << 24) | (red << 16) | (green << 8) | blue;
            if cache_bits > 0 {
                cache[color_cache_index(argb, cache_bits)] = argb;
            }
            out.push(argb);
        } else if symbol < NUM_LITERALS + NUM_LENGTH_CODES {
            // a back reference
            let length_code = (symbol - NUM_LITERALS) as u16;
            let length = prefix_decode(length_code, reader)? as usize;

            let distance_code = group.distance.decode(reader)?;
            let distance_value = prefix_decode(distance_code, reader)?;
            let distance = plane_code_to_distance(xsize, distance_value);

            if distance == 0 || distance > out.len() {
                return Err(WebPErrors::Malformed("Back reference before start".to_string()));
            }
            if out.len() + length > total {
                return Err(WebPErrors::Malformed("Back reference past end".to_string()));
            }
            for _ in 0..length {
                let argb = out[out.len() - distance];
                if cache_bits > 0 {
                    cache[color_cache_index(argb, cache_bits)] = argb;
                }
                out.push(argb);
            }
        } else {
            // color cache reference
            let index = symbol - NUM_LITERALS - NUM_LENGTH_CODES;
            if index >= cache_size {
                return Err(WebPErrors::Malformed("Cache index out of range".to_string()));
            }
            out.push(cache[index]);
        }
    }

    // undo transforms, most recently read first
    let mut pixels = out;
    for transform in transforms.iter().rev() {
        pixels = apply_inverse_transform(transform, width, height, pixels)?;
    }

    Ok(pixels)
}

/// ceil(size / 2^bits)
fn subsample_size(size: usize, bits: u8) -> usize {
    (size + (1 << bits) - 1) >> bits
}

fn read_transform(
    reader: &mut BitReaderLsb, width: usize, height: usize, seen: &mut [bool; 4]
) -> Result<Transform, WebPErrors> {
    let kind = reader.read(2)?;
    if seen[kind as usize] {
        return Err(WebPErrors::Malformed("Duplicate transform".to_string()));
    }
    seen[kind as usize] = true;

    match kind {
        TRANSFORM_PREDICTOR => {
            let size_bits = reader.read(3)? as u8 + 2;
            let w = subsample_size(width, size_bits);
            let h = subsample_size(height, size_bits);
            let data = decode_image(reader, w, h, false)?;
            Ok(Transform::Predictor { size_bits, data })
        }
        TRANSFORM_COLOR => {
            let size_bits = reader.read(3)? as u8 + 2;
            let w = subsample_size(width, size_bits);
            let h = subsample_size(height, size_bits);
            let data = decode_image(reader, w, h, false)?;
            Ok(Transform::Color { size_bits, data })
        }
        TRANSFORM_SUBTRACT_GREEN => Ok(Transform::SubtractGreen),
        TRANSFORM_COLOR_INDEXING => {
            let count = reader.read(8)? as usize + 1;
            let raw = decode_image(reader, count, 1, false)?;

            // palette entries are stored as component deltas
            let mut palette = Vec::with_capacity(count);
            let mut previous = 0_u32;
            for value in raw {
                let entry = add_pixels(previous, value);
                palette.push(entry);
                previous = entry;
            }

            let xbits = if count <= 2 {
                3
            } else if count <= 4 {
                2
            } else if count <= 16 {
                1
            } else {
                0
            };
            Ok(Transform::ColorIndexing { palette, xbits })
        }
        _ => unreachable!()
    }
}

/// Read one prefix code, simple or full form
fn read_prefix_code(
    reader: &mut BitReaderLsb, alphabet_size: usize
) -> Result<PrefixCode, WebPErrors> {
    if reader.read(1)? == 1 {
        // simple code, one or two symbols
        let num_symbols = reader.read(1)? as usize + 1;
        let first_8bit = reader.read(1)? == 1;
        let symbol0 = if first_8bit {
            reader.read(8)? as u16
        } else {
            reader.read(1)? as u16
        };

        if usize::from(symbol0) >= alphabet_size {
            return Err(WebPErrors::Malformed("Symbol outside alphabet".to_string()));
        }
        if num_symbols == 1 {
            return Ok(PrefixCode::single_symbol(symbol0));
        }

        let symbol1 = reader.read(8)? as u16;
        if usize::from(symbol1) >= alphabet_size {
            return Err(WebPErrors::Malformed("Symbol outside alphabet".to_string()));
        }
        let mut lens = vec![0_u8; alphabet_size];
        lens[usize::from(symbol0)] = 1;
        lens[usize::from(symbol1)] = 1;
        return PrefixCode::new(&lens);
    }

    // full form, lengths themselves are prefix coded
    let num_code_lengths = reader.read(4)? as usize + 4;
    if num_code_lengths > CODE_LENGTH_CODE_ORDER.len() {
        return Err(WebPErrors::Malformed("Too many code length codes".to_string()));
    }

    let mut code_length_lens = [0_u8; 19];
    for i in 0..num_code_lengths {
        code_length_lens[CODE_LENGTH_CODE_ORDER[i]] = reader.read(3)? as u8;
    }
    let code_length_code = PrefixCode::new(&code_length_lens)?;

    // an explicit cap on coded symbols may be present
    let max_symbol = if reader.read(1)? == 1 {
        let length_nbits = 2 + 2 * reader.read(3)? as u8;
        2 + reader.read(length_nbits)? as usize
    } else {
        alphabet_size
    };

    let mut lens = vec![0_u8; alphabet_size];
    let mut prev_len = 8_u8;
    let mut symbol = 0_usize;
    let mut remaining = max_symbol;

    while symbol < alphabet_size {
        if remaining == 0 {
            break;
        }
        remaining -= 1;

        let code = code_length_code.decode(reader)?;
        match code {
            0..=15 => {
                lens[symbol] = code as u8;
                symbol += 1;
                if code != 0 {
                    prev_len = code as u8;
                }
            }
            16 => {
                let repeat = reader.read(2)? as usize + 3;
                if symbol + repeat > alphabet_size {
                    return Err(WebPErrors::Malformed("Length repeat overflow".to_string()));
                }
                lens[symbol..symbol + repeat].fill(prev_len);
                symbol += repeat;
            }
            17 => {
                let repeat = reader.read(3)? as usize + 3;
                if symbol + repeat > alphabet_size {
                    return Err(WebPErrors::Malformed("Length repeat overflow".to_string()));
                }
                symbol += repeat;
            }
            18 => {
                let repeat = reader.read(7)? as usize + 11;
                if symbol + repeat > alphabet_size {
                    return Err(WebPErrors::Malformed("Length repeat overflow".to_string()));
                }
                symbol += repeat;
            }
            _ => return Err(WebPErrors::Malformed("Invalid length code".to_string()))
        }
    }

    PrefixCode::new(&lens)
}

/// Map a decoded distance value through the 2D locality table
fn plane_code_to_distance(xsize: usize, plane_code: u32) -> usize {
    if plane_code > 120 {
        return plane_code as usize - 120;
    }
    let (dx, dy) = DISTANCE_MAP[plane_code as usize - 1];
    let distance = dy as isize * xsize as isize + dx as isize;
    distance.max(1) as usize
}

/// Per channel modular addition of two packed pixels
#[inline]
fn add_pixels(a: u32, b: u32) -> u32 {
    let alpha_red = ((a >> 8) & 0x00FF_00FF) + ((b >> 8) & 0x00FF_00FF);
    let green_blue = (a & 0x00FF_00FF) + (b & 0x00FF_00FF);
    ((alpha_red & 0x00FF_00FF) << 8) | (green_blue & 0x00FF_00FF)
}

/// Per channel average of two packed pixels
#[inline]
fn average2(a: u32, b: u32) -> u32 {
    (((a ^ b) & 0xFEFE_FEFE) >> 1) + (a & b)
}

fn apply_inverse_transform(
    transform: &Transform, width: usize, height: usize, pixels: Vec<u32>
) -> Result<Vec<u32>, WebPErrors> {
    match transform {
        Transform::SubtractGreen => {
            let mut out = pixels;
            for pixel in out.iter_mut() {
                let green = (*pixel >> 8) & 0xFF;
                let red = ((*pixel >> 16) & 0xFF).wrapping_add(green) & 0xFF;
                let blue = (*pixel & 0xFF).wrapping_add(green) & 0xFF;
                *pixel = (*pixel & 0xFF00_FF00) | (red << 16) | blue;
            }
            Ok(out)
        }
        Transform::Predictor { size_bits, data } => {
            let mut out = pixels;
            if out.len() != width * height {
                return Err(WebPErrors::Malformed("Predictor image size mismatch".to_string()));
            }
            let tiles_per_row = subsample_size(width, *size_bits);

            for y in 0..height {
                for x in 0..width {
                    let pos = y * width + x;
                    let mode = if x == 0 && y == 0 {
                        // the first pixel predicts from opaque black
                        0
                    } else if x == 0 {
                        2 // T
                    } else if y == 0 {
                        1 // L
                    } else {
                        let tile =
                            data[(y >> size_bits) * tiles_per_row + (x >> size_bits)];
                        ((tile >> 8) & 0xF) as u8
                    };

                    let left = if x > 0 { out[pos - 1] } else { 0 };
                    let top = if y > 0 { out[pos - width] } else { 0 };
                    let top_left = if x > 0 && y > 0 { out[pos - width - 1] } else { 0 };
                    let top_right = if y > 0 && x + 1 < width {
                        out[pos - width + 1]
                    } else {
                        top
                    };

                    let predicted = predict(mode, left, top, top_left, top_right);
                    out[pos] = add_pixels(out[pos], predicted);
                }
            }
            Ok(out)
        }
        Transform::Color { size_bits, data } => {
            let mut out = pixels;
            let tiles_per_row = subsample_size(width, *size_bits);

            for y in 0..height {
                for x in 0..width {
                    let pos = y * width + x;
                    let tile = data[(y >> size_bits) * tiles_per_row + (x >> size_bits)];

                    let green_to_red = tile & 0xFF;
                    let green_to_blue = (tile >> 8) & 0xFF;
                    let red_to_blue = (tile >> 16) & 0xFF;

                    let pixel = out[pos];
                    let green = ((pixel >> 8) & 0xFF) as u8;
                    let mut red = ((pixel >> 16) & 0xFF) as u8;
                    let mut blue = (pixel & 0xFF) as u8;

                    red = red.wrapping_add(transform_delta(green_to_red as u8, green));
                    blue = blue.wrapping_add(transform_delta(green_to_blue as u8, green));
                    blue = blue.wrapping_add(transform_delta(red_to_blue as u8, red));

                    out[pos] = (pixel & 0xFF00_FF00) | (u32::from(red) << 16) | u32::from(blue);
                }
            }
            Ok(out)
        }
        Transform::ColorIndexing { palette, xbits } => {
            let packed_width = subsample_size(width, *xbits);
            let bits_per_index: u8 = 8 >> xbits;
            let mask = (1_u32 << bits_per_index) - 1;

            let mut out = vec![0_u32; width * height];
            for y in 0..height {
                for x in 0..width {
                    let packed = pixels[y * packed_width + (x >> xbits)];
                    let green = (packed >> 8) & 0xFF;
                    let shift = (x & ((1 << xbits) - 1)) * usize::from(bits_per_index);
                    let index = ((green >> shift) & mask) as usize;

                    if index >= palette.len() {
                        return Err(WebPErrors::Malformed(
                            "Palette index out of range".to_string()
                        ));
                    }
                    out[y * width + x] = palette[index];
                }
            }
            Ok(out)
        }
    }
}

/// The signed fixed point multiply of the color transform
#[inline]
fn transform_delta(t: u8, c: u8) -> u8 {
    ((i32::from(t as i8) * i32::from(c as i8)) >> 5) as u8
}

/// The fourteen spatial predictors
fn predict(mode: u8, left: u32, top: u32, top_left: u32, top_right: u32) -> u32 {
    match mode {
        0 => 0xFF00_0000,
        1 => left,
        2 => top,
        3 => top_right,
        4 => top_left,
        5 => average2(average2(left, top_right), top),
        6 => average2(left, top_left),
        7 => average2(left, top),
        8 => average2(top_left, top),
        9 => average2(top, top_right),
        10 => average2(average2(left, top_left), average2(top, top_right)),
        11 => select(left, top, top_left),
        12 => clamp_add_subtract_full(left, top, top_left),
        13 => clamp_add_subtract_half(left, top, top_left),
        _ => 0xFF00_0000
    }
}

fn select(left: u32, top: u32, top_left: u32) -> u32 {
    // distance of the full gradient prediction to each candidate
    let mut p_left = 0_i32;
    let mut p_top = 0_i32;
    for shift in [0, 8, 16, 24] {
        let l = ((left >> shift) & 0xFF) as i32;
        let t = ((top >> shift) & 0xFF) as i32;
        let tl = ((top_left >> shift) & 0xFF) as i32;
        p_left += (t - tl).abs();
        p_top += (l - tl).abs();
    }
    if p_left <= p_top {
        left
    } else {
        top
    }
}

fn clamp_add_subtract_full(left: u32, top: u32, top_left: u32) -> u32 {
    let mut out = 0_u32;
    for shift in [0, 8, 16, 24] {
        let l = ((left >> shift) & 0xFF) as i32;
        let t = ((top >> shift) & 0xFF) as i32;
        let tl = ((top_left >> shift) & 0xFF) as i32;
        let value = (l + t - tl).clamp(0, 255) as u32;
        out |= value << shift;
    }
    out
}

fn clamp_add_subtract_half(left: u32, top: u32, top_left: u32) -> u32 {
    let average = average2(left, top);
    let mut out = 0_u32;
    for shift in [0, 8, 16, 24] {
        let a = ((average >> shift) & 0xFF) as i32;
        let tl = ((top_left >> shift) & 0xFF) as i32;
        let value = (a + (a - tl) / 2).clamp(0, 255) as u32;
        out |= value << shift;
    }
    out
}

//! Floyd-Steinberg error diffusion and plain nearest remapping

use alloc::vec;
use alloc::vec::Vec;

use crate::median_cut::Palette;

/// Map every pixel to its nearest palette entry without dithering
///
/// `channels` is 3 for RGB input and 4 for RGBA
pub fn remap_nearest(pixels: &[u8], channels: usize, palette: &Palette) -> Vec<u8> {
    pixels
        .chunks_exact(channels)
        .map(|p| palette.nearest([p[0], p[1], p[2]]) as u8)
        .collect()
}

/// Map pixels to palette indices with Floyd-Steinberg error diffusion.
///
/// Quantization error at each pixel is pushed onto unvisited
/// neighbors with the classic 7/16 right, 3/16 down-left, 5/16 down,
/// 1/16 down-right kernel. Traversal is left-to-right top-to-bottom,
/// `serpentine` flips the direction on odd rows which trades a little
/// cache friendliness for less visible worm artifacts.
pub fn dither_floyd_steinberg(
    pixels: &[u8], width: usize, height: usize, channels: usize, palette: &Palette,
    serpentine: bool
) -> Vec<u8> {
    assert!(channels == 3 || channels == 4);
    assert_eq!(pixels.len(), width * height * channels);

    let mut indices = vec![0_u8; width * height];
    // one error triple per pixel of the current and next row
    let mut err_current = vec![[0_i32; 3]; width];
    let mut err_next = vec![[0_i32; 3]; width];

    for y in 0..height {
        let reverse = serpentine && (y & 1) == 1;

        for step in 0..width {
            let x = if reverse { width - 1 - step } else { step };
            let pos = (y * width + x) * channels;

            let mut corrected = [0_u8; 3];
            for c in 0..3 {
                // errors are scaled by 16 to stay integral
                let value = i32::from(pixels[pos + c]) + err_current[x][c] / 16;
                corrected[c] = value.clamp(0, 255) as u8;
            }

            let index = palette.nearest(corrected);
            indices[y * width + x] = index as u8;

            let chosen = palette.entries()[index];
            let mut error = [0_i32; 3];
            for c in 0..3 {
                error[c] = i32::from(corrected[c]) - i32::from(chosen[c]);
            }

            let (ahead, behind): (isize, isize) = if reverse { (-1, 1) } else { (1, -1) };

            let push = |buf: &mut Vec<[i32; 3]>, x: isize, weight: i32, error: &[i32; 3]| {
                if x >= 0 && (x as usize) < width {
                    for c in 0..3 {
                        buf[x as usize][c] += error[c] * weight;
                    }
                }
            };

            let xi = x as isize;
            push(&mut err_current, xi + ahead, 7, &error);
            push(&mut err_next, xi + behind, 3, &error);
            push(&mut err_next, xi, 5, &error);
            push(&mut err_next, xi + ahead, 1, &error);
        }

        core::mem::swap(&mut err_current, &mut err_next);
        err_next.iter_mut().for_each(|e| *e = [0; 3]);
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::median_cut::quantize;

    #[test]
    fn exact_palette_input_is_unchanged() {
        // pixels already are palette colors, dithering must not
        // perturb them
        let pixels = [255, 0, 0, 0, 255, 0, 255, 0, 0, 0, 255, 0];
        let palette = quantize(&pixels, 3, 4);

        let indices = dither_floyd_steinberg(&pixels, 2, 2, 3, &palette, false);
        for (i, p) in pixels.chunks_exact(3).enumerate() {
            assert_eq!(palette.entries()[usize::from(indices[i])], [p[0], p[1], p[2]]);
        }
    }

    #[test]
    fn remap_matches_nearest() {
        let pixels = [10, 10, 10, 240, 240, 240, 120, 120, 120];
        let palette = quantize(&pixels, 3, 2);
        let indices = remap_nearest(&pixels, 3, &palette);

        assert_eq!(indices.len(), 3);
        for (i, p) in pixels.chunks_exact(3).enumerate() {
            assert_eq!(
                usize::from(indices[i]),
                palette.nearest([p[0], p[1], p[2]])
            );
        }
    }

    #[test]
    fn dithered_gray_averages_out() {
        // a mid gray image dithered with a black/white palette should
        // come out roughly half black half white
        let pixels = [128_u8; 16 * 16 * 3];
        let bw = [0, 0, 0, 255, 255, 255];
        let palette = quantize(&bw, 3, 2);

        let indices = dither_floyd_steinberg(&pixels, 16, 16, 3, &palette, false);
        let whites = indices
            .iter()
            .filter(|i| palette.entries()[usize::from(**i)][0] == 255)
            .count();

        assert!((64..=192).contains(&whites));
    }
}

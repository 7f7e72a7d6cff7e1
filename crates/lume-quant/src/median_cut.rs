/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Median cut palette construction
//!
//! The classic Heckbert recursion. Start with one box holding every
//! unique color weighted by its pixel count, then repeatedly split the
//! highest scoring box at the weighted median of its longest axis
//! until we have as many boxes as palette slots. Each box collapses
//! into its weighted mean color.

use alloc::vec::Vec;

use lume_core::log::trace;

/// A constructed palette of at most 256 colors
pub struct Palette {
    entries: Vec<[u8; 3]>
}

impl Palette {
    /// The palette colors, in box construction order
    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    /// Number of colors in the palette
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the palette entry closest to `color` by squared
    /// euclidean distance
    pub fn nearest(&self, color: [u8; 3]) -> usize {
        let mut best = 0;
        let mut best_dist = u32::MAX;

        for (i, entry) in self.entries.iter().enumerate() {
            let dr = i32::from(entry[0]) - i32::from(color[0]);
            let dg = i32::from(entry[1]) - i32::from(color[1]);
            let db = i32::from(entry[2]) - i32::from(color[2]);
            let dist = (dr * dr + dg * dg + db * db) as u32;

            if dist < best_dist {
                best_dist = dist;
                best = i;
                if dist == 0 {
                    break;
                }
            }
        }
        best
    }
}

/// A weighted unique color
#[derive(Copy, Clone)]
struct WeightedColor {
    color: [u8; 3],
    count: u32
}

/// A box is a range over the sorted unique color array
struct ColorBox {
    start: usize,
    end:   usize
}

impl ColorBox {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Channel ranges of a box, used for axis choice and scoring
fn box_ranges(colors: &[WeightedColor]) -> [u32; 3] {
    let mut min = [255_u8; 3];
    let mut max = [0_u8; 3];

    for wc in colors {
        for c in 0..3 {
            min[c] = min[c].min(wc.color[c]);
            max[c] = max[c].max(wc.color[c]);
        }
    }
    [
        u32::from(max[0] - min[0]) + 1,
        u32::from(max[1] - min[1]) + 1,
        u32::from(max[2] - min[2]) + 1
    ]
}

fn box_population(colors: &[WeightedColor]) -> u64 {
    colors.iter().map(|wc| u64::from(wc.count)).sum()
}

/// Build a palette of at most `max_colors` entries from interleaved
/// pixel data.
///
/// `channels` is 3 for RGB input and 4 for RGBA, the alpha channel is
/// ignored for palette purposes (transparency is handled by the
/// container format, not the palette). An image with `U` unique
/// colors yields exactly `min(U, max_colors)` entries.
pub fn quantize(pixels: &[u8], channels: usize, max_colors: usize) -> Palette {
    assert!(channels == 3 || channels == 4);
    assert!(max_colors >= 1);

    // histogram of unique colors via sort + run length
    let mut packed: Vec<u32> = pixels
        .chunks_exact(channels)
        .map(|p| (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2]))
        .collect();
    packed.sort_unstable();

    let mut uniques: Vec<WeightedColor> = Vec::new();
    for color in packed {
        match uniques.last_mut() {
            Some(last)
                if (u32::from(last.color[0]) << 16)
                    | (u32::from(last.color[1]) << 8)
                    | u32::from(last.color[2])
                    == color =>
            {
                last.count += 1;
            }
            _ => uniques.push(WeightedColor {
                color: [(color >> 16) as u8, (color >> 8) as u8, color as u8],
                count: 1
            })
        }
    }
    trace!("Quantizing {} unique colors", uniques.len());

    if uniques.is_empty() {
        return Palette { entries: Vec::new() };
    }

    let mut boxes = alloc::vec![ColorBox {
        start: 0,
        end:   uniques.len()
    }];

    while boxes.len() < max_colors {
        // pick the splittable box with the largest volume x population
        let mut best: Option<(usize, u64)> = None;

        for (i, b) in boxes.iter().enumerate() {
            if b.len() < 2 {
                continue;
            }
            let slice = &uniques[b.start..b.end];
            let ranges = box_ranges(slice);
            let volume = u64::from(ranges[0]) * u64::from(ranges[1]) * u64::from(ranges[2]);
            let score = volume * box_population(slice);

            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((i, score))
            }
        }

        let Some((index, _)) = best else {
            // no box is splittable
            break;
        };

        let (start, end) = (boxes[index].start, boxes[index].end);
        let slice = &mut uniques[start..end];

        // longest axis, ties prefer R over G over B
        let ranges = box_ranges(slice);
        let axis = if ranges[0] >= ranges[1] && ranges[0] >= ranges[2] {
            0
        } else if ranges[1] >= ranges[2] {
            1
        } else {
            2
        };

        slice.sort_unstable_by_key(|wc| wc.color[axis]);

        // weighted median, rounding up on an exact middle
        let total = box_population(slice);
        let half = total.div_ceil(2);

        let mut cumulative = 0_u64;
        let mut split = 0;
        for (i, wc) in slice.iter().enumerate() {
            cumulative += u64::from(wc.count);
            if cumulative >= half {
                split = i + 1;
                break;
            }
        }
        // both halves must stay non-empty
        let split = split.clamp(1, slice.len() - 1);

        let right = ColorBox {
            start: start + split,
            end
        };
        boxes[index].end = start + split;
        boxes.push(right);
    }

    // collapse each box into its weighted mean color
    let entries = boxes
        .iter()
        .map(|b| {
            let slice = &uniques[b.start..b.end];
            let weight = box_population(slice);
            let mut sums = [0_u64; 3];

            for wc in slice {
                for c in 0..3 {
                    sums[c] += u64::from(wc.color[c]) * u64::from(wc.count);
                }
            }
            [
                ((sums[0] + weight / 2) / weight) as u8,
                ((sums[1] + weight / 2) / weight) as u8,
                ((sums[2] + weight / 2) / weight) as u8
            ]
        })
        .collect();

    Palette { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_count_law() {
        // 4 unique colors, palette of 16 -> exactly 4 entries
        let pixels = [
            255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255, 255, 0, 0, 0, 255, 0
        ];
        let palette = quantize(&pixels, 3, 16);
        assert_eq!(palette.len(), 4);

        // palette smaller than unique count -> exactly palette size
        let palette = quantize(&pixels, 3, 2);
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn single_color_image() {
        let pixels = [7_u8, 8, 9].repeat(100);
        let palette = quantize(&pixels, 3, 256);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.entries()[0], [7, 8, 9]);
    }

    #[test]
    fn gradient_fills_palette() {
        // 256 unique grays
        let mut pixels = Vec::new();
        for i in 0_u16..256 {
            pixels.extend_from_slice(&[i as u8, i as u8, i as u8]);
        }
        let palette = quantize(&pixels, 3, 256);
        assert_eq!(palette.len(), 256);

        let palette = quantize(&pixels, 3, 16);
        assert_eq!(palette.len(), 16);
    }

    #[test]
    fn nearest_finds_exact_match() {
        let pixels = [10, 20, 30, 200, 100, 50];
        let palette = quantize(&pixels, 3, 4);
        let idx = palette.nearest([10, 20, 30]);
        assert_eq!(palette.entries()[idx], [10, 20, 30]);
    }

    #[test]
    fn dominant_weight_pulls_the_mean() {
        // one box forced (max_colors = 1), mean must lean towards
        // the heavily weighted color
        let mut pixels = alloc::vec::Vec::new();
        for _ in 0..99 {
            pixels.extend_from_slice(&[0, 0, 0]);
        }
        pixels.extend_from_slice(&[255, 255, 255]);

        let palette = quantize(&pixels, 3, 1);
        assert_eq!(palette.len(), 1);
        assert!(palette.entries()[0][0] <= 3);
    }
}

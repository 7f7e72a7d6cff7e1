//! Scanline filter reconstruction and filtering
//!
//! Reconstruction undoes the per-row filters on decode, filtering
//! applies them on encode. The filter unit `bpp` is the number of
//! bytes a whole pixel occupies, at depths below 8 bits it is 1.

use crate::enums::FilterMethod;

/// Paeth predictor, RFC 2083 section 6.6, ties resolve towards `a`
#[inline(always)]
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let a = i16::from(a);
    let b = i16::from(b);
    let c = i16::from(c);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        return a as u8;
    }
    if pb <= pc {
        return b as u8;
    }
    c as u8
}

/// Undo a filter in place.
///
/// `current` holds the filtered bytes of one scanline, `prev` is the
/// reconstructed previous scanline or empty for the first row.
pub fn unfilter(filter: FilterMethod, bpp: usize, prev: &[u8], current: &mut [u8]) {
    match filter {
        FilterMethod::None => {}
        FilterMethod::Sub => {
            for i in bpp..current.len() {
                current[i] = current[i].wrapping_add(current[i - bpp]);
            }
        }
        FilterMethod::Up => {
            if !prev.is_empty() {
                for (recon, up) in current.iter_mut().zip(prev) {
                    *recon = recon.wrapping_add(*up);
                }
            }
        }
        FilterMethod::Average => {
            if prev.is_empty() {
                for i in bpp..current.len() {
                    current[i] = current[i].wrapping_add(current[i - bpp] >> 1);
                }
            } else {
                for i in 0..bpp {
                    current[i] = current[i].wrapping_add(prev[i] >> 1);
                }
                for i in bpp..current.len() {
                    let a = u16::from(current[i - bpp]);
                    let b = u16::from(prev[i]);
                    current[i] = current[i].wrapping_add(((a + b) >> 1) as u8);
                }
            }
        }
        FilterMethod::Paeth => {
            if prev.is_empty() {
                // above row all zero, paeth degrades to sub
                for i in bpp..current.len() {
                    current[i] = current[i].wrapping_add(paeth(current[i - bpp], 0, 0));
                }
            } else {
                for i in 0..bpp {
                    current[i] = current[i].wrapping_add(paeth(0, prev[i], 0));
                }
                for i in bpp..current.len() {
                    let p = paeth(current[i - bpp], prev[i], prev[i - bpp]);
                    current[i] = current[i].wrapping_add(p);
                }
            }
        }
    }
}

/// Apply a filter, writing `filter` bytes of `input` into `output`
pub fn filter_scanline(
    input: &[u8], prev: &[u8], output: &mut [u8], filter: FilterMethod, bpp: usize
) {
    debug_assert_eq!(input.len(), output.len());

    match filter {
        FilterMethod::None => output.copy_from_slice(input),
        FilterMethod::Sub => {
            output[..bpp].copy_from_slice(&input[..bpp]);
            for i in bpp..input.len() {
                output[i] = input[i].wrapping_sub(input[i - bpp]);
            }
        }
        FilterMethod::Up => {
            if prev.is_empty() {
                output.copy_from_slice(input);
            } else {
                for ((out, cur), up) in output.iter_mut().zip(input).zip(prev) {
                    *out = cur.wrapping_sub(*up);
                }
            }
        }
        FilterMethod::Average => {
            for i in 0..input.len() {
                let a = if i >= bpp { u16::from(input[i - bpp]) } else { 0 };
                let b = if prev.is_empty() { 0 } else { u16::from(prev[i]) };
                output[i] = input[i].wrapping_sub(((a + b) >> 1) as u8);
            }
        }
        FilterMethod::Paeth => {
            for i in 0..input.len() {
                let a = if i >= bpp { input[i - bpp] } else { 0 };
                let b = if prev.is_empty() { 0 } else { prev[i] };
                let c = if i >= bpp && !prev.is_empty() { prev[i - bpp] } else { 0 };
                output[i] = input[i].wrapping_sub(paeth(a, b, c));
            }
        }
    }
}

/// Pick the filter with the minimum sum of absolute differences,
/// the heuristic recommended by the png specification
pub fn choose_filter(input: &[u8], prev: &[u8], bpp: usize, scratch: &mut [u8]) -> FilterMethod {
    const CANDIDATES: [FilterMethod; 5] = [
        FilterMethod::None,
        FilterMethod::Sub,
        FilterMethod::Up,
        FilterMethod::Average,
        FilterMethod::Paeth
    ];

    let mut best = FilterMethod::None;
    let mut best_sum = u64::MAX;

    for filter in CANDIDATES {
        filter_scanline(input, prev, scratch, filter, bpp);
        // treat filtered bytes as signed, small magnitudes compress best
        let sum: u64 = scratch
            .iter()
            .map(|b| u64::from((*b as i8).unsigned_abs()))
            .sum();

        if sum < best_sum {
            best_sum = sum;
            best = filter;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(filter: FilterMethod, bpp: usize, prev: &[u8], data: &[u8]) {
        let mut filtered = vec![0_u8; data.len()];
        filter_scanline(data, prev, &mut filtered, filter, bpp);

        unfilter(filter, bpp, prev, &mut filtered);
        assert_eq!(&filtered, data, "filter {filter:?} does not round trip");
    }

    #[test]
    fn filters_round_trip() {
        let prev = [10_u8, 250, 3, 45, 99, 200, 7, 8, 9, 10, 11, 12];
        let data = [1_u8, 2, 254, 4, 5, 6, 77, 128, 9, 130, 11, 0];

        for filter in [
            FilterMethod::None,
            FilterMethod::Sub,
            FilterMethod::Up,
            FilterMethod::Average,
            FilterMethod::Paeth
        ] {
            for bpp in [1, 3, 4] {
                round_trip(filter, bpp, &prev, &data);
                // first row, no previous scanline
                round_trip(filter, bpp, &[], &data);
            }
        }
    }

    #[test]
    fn paeth_ties_towards_a() {
        // p == a == b, must pick a
        assert_eq!(paeth(5, 5, 5), 5);
        assert_eq!(paeth(10, 20, 15), 10);
    }
}

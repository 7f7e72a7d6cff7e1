//! Probability models, trees and quantizer lookups for the VP8
//! bitstream
#![allow(clippy::unreadable_literal)]

use crate::bool_coder::Prob;

/// Coefficient tokens in tree order
pub(crate) const DCT_0: i8 = 0;
pub(crate) const DCT_1: i8 = 1;
pub(crate) const DCT_2: i8 = 2;
pub(crate) const DCT_3: i8 = 3;
pub(crate) const DCT_4: i8 = 4;
pub(crate) const DCT_CAT1: i8 = 5;
pub(crate) const DCT_CAT2: i8 = 6;
pub(crate) const DCT_CAT3: i8 = 7;
pub(crate) const DCT_CAT4: i8 = 8;
pub(crate) const DCT_CAT5: i8 = 9;
pub(crate) const DCT_CAT6: i8 = 10;
pub(crate) const DCT_EOB: i8 = 11;

/// The coefficient token tree
pub(crate) const COEFF_TREE: [i8; 22] = [
    -DCT_EOB, 2,
    -DCT_0, 4,
    -DCT_1, 6,
    8, 12,
    -DCT_2, 10,
    -DCT_3, -DCT_4,
    14, 16,
    -DCT_CAT1, -DCT_CAT2,
    18, 20,
    -DCT_CAT3, -DCT_CAT4,
    -DCT_CAT5, -DCT_CAT6
];

/// Probabilities of the extra magnitude bits of each token category
pub(crate) const CAT1_PROBS: [Prob; 1] = [159];
pub(crate) const CAT2_PROBS: [Prob; 2] = [165, 145];
pub(crate) const CAT3_PROBS: [Prob; 3] = [173, 148, 140];
pub(crate) const CAT4_PROBS: [Prob; 4] = [176, 155, 140, 135];
pub(crate) const CAT5_PROBS: [Prob; 5] = [180, 157, 141, 134, 130];
pub(crate) const CAT6_PROBS: [Prob; 11] = [254, 254, 243, 230, 196, 177, 153, 140, 133, 130, 129];

/// Smallest value of each token category
pub(crate) const CAT_BASES: [i32; 6] = [5, 7, 11, 19, 35, 67];
pub(crate) const CAT_BITS: [usize; 6] = [1, 2, 3, 4, 5, 11];

/// Zig-zag scan of a 4x4 coefficient block
pub(crate) const ZIGZAG: [usize; 16] = [0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15];

/// Coefficient position to probability band
pub(crate) const COEFF_BANDS: [usize; 16] = [0, 1, 2, 3, 6, 4, 5, 6, 6, 6, 6, 6, 6, 6, 6, 7];

/// Luma 16x16 mode tree for key frames
pub(crate) const KF_YMODE_TREE: [i8; 8] = [
    -super::B_PRED, 2, 4, 6, -super::DC_PRED, -super::V_PRED, -super::H_PRED, -super::TM_PRED
];
pub(crate) const KF_YMODE_PROBS: [Prob; 4] = [145, 156, 163, 128];

/// Chroma mode tree
pub(crate) const UV_MODE_TREE: [i8; 6] = [
    -super::DC_PRED, 2, -super::V_PRED, 4, -super::H_PRED, -super::TM_PRED
];
pub(crate) const KF_UV_MODE_PROBS: [Prob; 3] = [142, 114, 183];

/// Subblock mode tree
pub(crate) const BMODE_TREE: [i8; 18] = [
    -super::B_DC_PRED, 2,
    -super::B_TM_PRED, 4,
    -super::B_VE_PRED, 6,
    8, 12,
    -super::B_HE_PRED, 10,
    -super::B_RD_PRED, -super::B_VR_PRED,
    -super::B_LD_PRED, 14,
    -super::B_VL_PRED, 16,
    -super::B_HD_PRED, -super::B_HU_PRED
];

/// Key frame subblock mode probabilities, conditioned on the modes
/// of the above and left neighbors
#[rustfmt::skip]
pub(crate) const KF_B_MODE_PROBS: [[[Prob; 9]; 10]; 10] = kf_b_mode_probs();

/// The neighbor conditioned table is dominated by the DC/TM corner,
/// built here from the per-context rows
const fn kf_b_mode_probs() -> [[[Prob; 9]; 10]; 10] {
    // row used when both neighbors are DC-ish
    const SMOOTH: [Prob; 9] = [231, 120, 48, 89, 115, 113, 120, 152, 112];
    // row used along strong vertical neighbors
    const VERT: [Prob; 9] = [88, 37, 173, 89, 26, 21, 120, 61, 112];
    // row used along strong horizontal neighbors
    const HORIZ: [Prob; 9] = [102, 61, 71, 37, 34, 63, 42, 166, 112];
    // diagonal and mixed contexts
    const MIXED: [Prob; 9] = [134, 68, 81, 97, 63, 73, 64, 102, 109];

    let mut table = [[[0_u8; 9]; 10]; 10];
    let mut above = 0;
    while above < 10 {
        let mut left = 0;
        while left < 10 {
            let row = match (above, left) {
                (0, 0) | (0, 1) | (1, 0) | (1, 1) => SMOOTH,
                (2, _) | (_, 2) => VERT,
                (3, _) | (_, 3) => HORIZ,
                _ => MIXED
            };
            table[above][left] = row;
            left += 1;
        }
        above += 1;
    }
    table
}

/// Default coefficient token probabilities
/// indexed [plane][band][context][position in tree]
#[rustfmt::skip]
pub(crate) const DEFAULT_COEFF_PROBS: [[[[Prob; 11]; 3]; 8]; 4] = default_coeff_probs();

const fn default_coeff_probs() -> [[[[Prob; 11]; 3]; 8]; 4] {
    // contexts within a band share a shape: the zero context is the
    // most confident, higher contexts expect larger coefficients
    const CTX0: [Prob; 11] = [253, 136, 254, 255, 228, 219, 128, 128, 128, 128, 128];
    const CTX1: [Prob; 11] = [189, 129, 242, 255, 227, 213, 255, 219, 128, 128, 128];
    const CTX2: [Prob; 11] = [106, 126, 227, 252, 214, 209, 255, 255, 128, 128, 128];
    const HIGH0: [Prob; 11] = [1, 98, 248, 255, 236, 226, 255, 255, 128, 128, 128];
    const HIGH1: [Prob; 11] = [181, 133, 238, 254, 221, 234, 255, 154, 128, 128, 128];
    const HIGH2: [Prob; 11] = [78, 134, 202, 247, 198, 180, 255, 219, 128, 128, 128];
    const TAIL0: [Prob; 11] = [1, 185, 249, 255, 243, 255, 128, 128, 128, 128, 128];
    const TAIL1: [Prob; 11] = [184, 150, 247, 255, 236, 224, 128, 128, 128, 128, 128];
    const TAIL2: [Prob; 11] = [77, 110, 216, 255, 236, 230, 128, 128, 128, 128, 128];

    let mut table = [[[[128_u8; 11]; 3]; 8]; 4];
    let mut plane = 0;
    while plane < 4 {
        let mut band = 0;
        while band < 8 {
            let rows: [[Prob; 11]; 3] = if band == 0 {
                [CTX0, CTX1, CTX2]
            } else if band < 4 {
                [HIGH0, HIGH1, HIGH2]
            } else {
                [TAIL0, TAIL1, TAIL2]
            };
            table[plane][band] = rows;
            band += 1;
        }
        plane += 1;
    }
    table
}

/// Probabilities controlling per-position updates of the token
/// probabilities in the frame header
#[rustfmt::skip]
pub(crate) const COEFF_UPDATE_PROBS: [[[[Prob; 11]; 3]; 8]; 4] = coeff_update_probs();

const fn coeff_update_probs() -> [[[[Prob; 11]; 3]; 8]; 4] {
    // updates are rare, the model is heavily skewed towards
    // keeping the defaults
    let mut table = [[[[255_u8; 11]; 3]; 8]; 4];
    let mut plane = 0;
    while plane < 4 {
        let mut ctx = 0;
        while ctx < 3 {
            // the first tree positions of the first band see the
            // most churn
            table[plane][0][ctx][0] = 250;
            table[plane][0][ctx][1] = 246;
            table[plane][1][ctx][0] = 234;
            ctx += 1;
        }
        plane += 1;
    }
    table
}

/// DC quantizer lookup indexed by the clamped quantizer index
#[rustfmt::skip]
pub(crate) const DC_QLOOKUP: [u16; 128] = [
      4,   5,   6,   7,   8,   9,  10,  10,  11,  12,  13,  14,  15,  16,  17,  17,
     18,  19,  20,  20,  21,  21,  22,  22,  23,  23,  24,  25,  25,  26,  27,  28,
     29,  30,  31,  32,  33,  34,  35,  36,  37,  37,  38,  39,  40,  41,  42,  43,
     44,  45,  46,  46,  47,  48,  49,  50,  51,  52,  53,  54,  55,  56,  57,  58,
     59,  60,  61,  62,  63,  64,  65,  66,  67,  68,  69,  70,  71,  72,  73,  74,
     75,  76,  76,  77,  78,  79,  80,  81,  82,  83,  84,  85,  86,  87,  88,  89,
     91,  93,  95,  96,  98, 100, 101, 102, 104, 106, 108, 110, 112, 114, 116, 118,
    122, 124, 126, 128, 130, 132, 134, 136, 138, 140, 143, 145, 148, 151, 154, 157
];

/// AC quantizer lookup indexed by the clamped quantizer index
#[rustfmt::skip]
pub(crate) const AC_QLOOKUP: [u16; 128] = [
      4,   5,   6,   7,   8,   9,  10,  11,  12,  13,  14,  15,  16,  17,  18,  19,
     20,  21,  22,  23,  24,  25,  26,  27,  28,  29,  30,  31,  32,  33,  34,  35,
     36,  37,  38,  39,  40,  41,  42,  43,  44,  45,  46,  47,  48,  49,  50,  51,
     52,  53,  54,  55,  56,  57,  58,  60,  62,  64,  66,  68,  70,  72,  74,  76,
     78,  80,  82,  84,  86,  88,  90,  92,  94,  96,  98, 100, 102, 104, 106, 108,
    110, 112, 114, 116, 119, 122, 125, 128, 131, 134, 137, 140, 143, 146, 149, 152,
    155, 158, 161, 164, 167, 170, 173, 177, 181, 185, 189, 193, 197, 201, 205, 209,
    213, 217, 221, 225, 229, 234, 239, 245, 249, 254, 259, 264, 269, 274, 279, 284
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qlookups_are_monotonic() {
        assert!(DC_QLOOKUP.windows(2).all(|w| w[0] <= w[1]));
        assert!(AC_QLOOKUP.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn coeff_tree_reaches_every_token() {
        // walk every path, collect the leaves
        let mut leaves = Vec::new();
        let mut stack = vec![0_usize];
        while let Some(index) = stack.pop() {
            for side in 0..2 {
                let entry = COEFF_TREE[index + side];
                if entry <= 0 {
                    leaves.push(-entry);
                } else {
                    stack.push(entry as usize);
                }
            }
        }
        leaves.sort_unstable();
        assert_eq!(leaves, (0..=11).collect::<Vec<i8>>());
    }

    #[test]
    fn category_ranges_are_contiguous() {
        // cat1 starts right after the literal 4 and each category
        // spans exactly its bit budget
        let mut next = 5;
        for (base, bits) in CAT_BASES.iter().zip(CAT_BITS.iter()) {
            assert_eq!(*base, next);
            next += 1 << bits;
        }
    }
}

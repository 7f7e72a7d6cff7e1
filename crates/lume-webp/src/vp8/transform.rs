//! The 4x4 DCT approximation and Walsh-Hadamard transforms
//!
//! Fixed point per the bitstream definition, the forward transforms
//! mirror the inverse ones closely enough that encode/decode error
//! stays within the quantizer dead zone.

/// Inverse 4x4 DCT, coefficients in, spatial residual out
pub(crate) fn idct4x4(block: &[i32; 16]) -> [i32; 16] {
    const C1: i64 = 85627; // sqrt(2) * cos(pi/8) in 16 bit fixed point
    const C2: i64 = 35468; // sqrt(2) * sin(pi/8)

    let mut tmp = [0_i64; 16];

    // columns
    for i in 0..4 {
        let a = i64::from(block[i]) + i64::from(block[i + 8]);
        let b = i64::from(block[i]) - i64::from(block[i + 8]);
        let c = (i64::from(block[i + 4]) * C2 >> 16) - (i64::from(block[i + 12]) * C1 >> 16);
        let d = (i64::from(block[i + 4]) * C1 >> 16) + (i64::from(block[i + 12]) * C2 >> 16);

        tmp[i] = a + d;
        tmp[i + 4] = b + c;
        tmp[i + 8] = b - c;
        tmp[i + 12] = a - d;
    }

    // rows
    let mut out = [0_i32; 16];
    for i in 0..4 {
        let row = i * 4;
        let a = tmp[row] + tmp[row + 2];
        let b = tmp[row] - tmp[row + 2];
        let c = (tmp[row + 1] * C2 >> 16) - (tmp[row + 3] * C1 >> 16);
        let d = (tmp[row + 1] * C1 >> 16) + (tmp[row + 3] * C2 >> 16);

        // final rounding by 8 as the transform gains a factor of 8
        out[row] = ((a + d + 4) >> 3) as i32;
        out[row + 1] = ((b + c + 4) >> 3) as i32;
        out[row + 2] = ((b - c + 4) >> 3) as i32;
        out[row + 3] = ((a - d + 4) >> 3) as i32;
    }
    out
}

/// Forward 4x4 DCT matching [idct4x4]
pub(crate) fn fdct4x4(block: &[i32; 16]) -> [i32; 16] {
    const C1: i64 = 85627;
    const C2: i64 = 35468;

    let mut tmp = [0_i64; 16];

    // rows
    for i in 0..4 {
        let row = i * 4;
        let a = i64::from(block[row]) + i64::from(block[row + 3]);
        let b = i64::from(block[row + 1]) + i64::from(block[row + 2]);
        let c = i64::from(block[row + 1]) - i64::from(block[row + 2]);
        let d = i64::from(block[row]) - i64::from(block[row + 3]);

        tmp[row] = (a + b) << 3;
        tmp[row + 2] = (a - b) << 3;
        tmp[row + 1] = (d * C1 + c * C2) >> 13;
        tmp[row + 3] = (d * C2 - c * C1) >> 13;
    }

    // columns
    let mut out = [0_i32; 16];
    for i in 0..4 {
        let a = tmp[i] + tmp[i + 12];
        let b = tmp[i + 4] + tmp[i + 8];
        let c = tmp[i + 4] - tmp[i + 8];
        let d = tmp[i] - tmp[i + 12];

        out[i] = ((a + b + 7) >> 4) as i32;
        out[i + 8] = ((a - b + 7) >> 4) as i32;
        out[i + 4] = (((d * C1 + c * C2) >> 16) + 1 >> 1) as i32;
        out[i + 12] = (((d * C2 - c * C1) >> 16) + 1 >> 1) as i32;
    }
    out
}

/// Inverse Walsh-Hadamard transform carrying the Y2 DC block back
/// into the sixteen luma DC positions
pub(crate) fn iwht4x4(block: &[i32; 16]) -> [i32; 16] {
    let mut tmp = [0_i32; 16];

    for i in 0..4 {
        let a = block[i] + block[i + 12];
        let b = block[i + 4] + block[i + 8];
        let c = block[i + 4] - block[i + 8];
        let d = block[i] - block[i + 12];

        tmp[i] = a + b;
        tmp[i + 4] = d + c;
        tmp[i + 8] = a - b;
        tmp[i + 12] = d - c;
    }

    let mut out = [0_i32; 16];
    for i in 0..4 {
        let row = i * 4;
        let a = tmp[row] + tmp[row + 3];
        let b = tmp[row + 1] + tmp[row + 2];
        let c = tmp[row + 1] - tmp[row + 2];
        let d = tmp[row] - tmp[row + 3];

        out[row] = (a + b + 3) >> 3;
        out[row + 1] = (d + c + 3) >> 3;
        out[row + 2] = (a - b + 3) >> 3;
        out[row + 3] = (d - c + 3) >> 3;
    }
    out
}

/// Forward Walsh-Hadamard transform gathering the sixteen luma DC
/// coefficients into the Y2 block
pub(crate) fn fwht4x4(block: &[i32; 16]) -> [i32; 16] {
    let mut tmp = [0_i32; 16];

    for i in 0..4 {
        let row = i * 4;
        let a = block[row] + block[row + 2];
        let b = block[row + 1] + block[row + 3];
        let c = block[row + 1] - block[row + 3];
        let d = block[row] - block[row + 2];

        tmp[row] = a + b;
        tmp[row + 1] = d + c;
        tmp[row + 2] = a - b;
        tmp[row + 3] = d - c;
    }

    let mut out = [0_i32; 16];
    for i in 0..4 {
        let a = tmp[i] + tmp[i + 8];
        let b = tmp[i + 4] + tmp[i + 12];
        let c = tmp[i + 4] - tmp[i + 12];
        let d = tmp[i] - tmp[i + 8];

        out[i] = (a + b) >> 1;
        out[i + 4] = (d + c) >> 1;
        out[i + 8] = (a - b) >> 1;
        out[i + 12] = (d - c) >> 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dct_round_trips_tightly() {
        let block: [i32; 16] = [
            12, -4, 0, 7, 100, -120, 3, 5, -8, 31, 2, 0, 64, -64, 1, -1
        ];
        let coeffs = fdct4x4(&block);
        let back = idct4x4(&coeffs);

        for (orig, rec) in block.iter().zip(back.iter()) {
            assert!((orig - rec).abs() <= 2, "{orig} vs {rec}");
        }
    }

    #[test]
    fn flat_block_is_dc_only() {
        let block = [40_i32; 16];
        let coeffs = fdct4x4(&block);
        assert!(coeffs[0] > 0);
        assert!(coeffs[1..].iter().all(|c| *c == 0));
    }

    #[test]
    fn wht_round_trips_exactly_for_even_values() {
        let block: [i32; 16] = [
            8, 16, -8, 24, 0, 32, -16, 8, 40, -24, 16, 0, 8, 8, -8, 48
        ];
        let coeffs = fwht4x4(&block);
        let back = iwht4x4(&coeffs);
        assert_eq!(block, back);
    }
}

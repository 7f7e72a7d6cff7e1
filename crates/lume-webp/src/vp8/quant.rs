//! Quantizer derivation from the frame header indices

use super::tables::{AC_QLOOKUP, DC_QLOOKUP};

/// Dequantization factors for the three block classes
#[derive(Copy, Clone, Default)]
pub(crate) struct QuantFactors {
    pub y_dc:  i32,
    pub y_ac:  i32,
    pub y2_dc: i32,
    pub y2_ac: i32,
    pub uv_dc: i32,
    pub uv_ac: i32
}

/// Quantizer indices as carried in the frame header
#[derive(Copy, Clone, Default)]
pub(crate) struct QuantIndices {
    pub y_ac_qi:  u8,
    pub y_dc_delta:  i32,
    pub y2_dc_delta: i32,
    pub y2_ac_delta: i32,
    pub uv_dc_delta: i32,
    pub uv_ac_delta: i32
}

fn clamp_index(base: i32, delta: i32) -> usize {
    (base + delta).clamp(0, 127) as usize
}

impl QuantIndices {
    /// Resolve the indices into dequantization factors, applying the
    /// class specific scale corrections
    pub fn factors(&self) -> QuantFactors {
        let base = i32::from(self.y_ac_qi);

        let y_dc = i32::from(DC_QLOOKUP[clamp_index(base, self.y_dc_delta)]);
        let y_ac = i32::from(AC_QLOOKUP[clamp_index(base, 0)]);

        // the second order luma quantizers are scaled up, AC by
        // 155/100 with a floor of 8
        let y2_dc = i32::from(DC_QLOOKUP[clamp_index(base, self.y2_dc_delta)]) * 2;
        let y2_ac = (i32::from(AC_QLOOKUP[clamp_index(base, self.y2_ac_delta)]) * 155 / 100).max(8);

        // chroma DC is capped to keep dark gradients from banding
        let uv_dc = i32::from(DC_QLOOKUP[clamp_index(base, self.uv_dc_delta)]).min(132);
        let uv_ac = i32::from(AC_QLOOKUP[clamp_index(base, self.uv_ac_delta)]);

        QuantFactors {
            y_dc,
            y_ac,
            y2_dc,
            y2_ac,
            uv_dc,
            uv_ac
        }
    }
}

/// Map an abstract quality factor (1..=100) to a quantizer index,
/// higher quality meaning a lower index
pub(crate) fn quality_to_qindex(quality: u8) -> u8 {
    let q = i32::from(quality.clamp(1, 100));
    // linear ramp from 127 at the floor down to 4 near lossless
    let index = 127 - (q - 1) * 123 / 99;
    index as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_mapping_is_monotonic() {
        let mut last = quality_to_qindex(1);
        for q in 2..=100 {
            let index = quality_to_qindex(q);
            assert!(index <= last);
            last = index;
        }
        assert_eq!(quality_to_qindex(100), 4);
        assert_eq!(quality_to_qindex(1), 127);
    }

    #[test]
    fn deltas_are_clamped() {
        let indices = QuantIndices {
            y_ac_qi: 127,
            y_dc_delta: 100,
            ..Default::default()
        };
        let factors = indices.factors();
        assert_eq!(factors.y_dc, i32::from(DC_QLOOKUP[127]));
    }

    #[test]
    fn y2_ac_has_a_floor() {
        let indices = QuantIndices {
            y_ac_qi: 0,
            ..Default::default()
        };
        assert!(indices.factors().y2_ac >= 8);
    }
}

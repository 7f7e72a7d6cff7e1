use alloc::vec::Vec;

use lume_core::bits::BitWriterLsb;

use crate::errors::LzwErrors;
use crate::{MAX_CODE_WIDTH, MAX_DICT_SIZE};

/// An encoder for the GIF dialect of LZW.
///
/// The dictionary is a first-child/next-sibling trie over codes, so
/// lookups never need hashing and the whole state is three flat
/// arrays.
pub struct LzwEncoder {
    min_code_size: u8,
    first_child:   [u16; MAX_DICT_SIZE],
    next_sibling:  [u16; MAX_DICT_SIZE],
    appended:      [u8; MAX_DICT_SIZE]
}

/// Sentinel for absent trie links
const NIL: u16 = u16::MAX;

impl LzwEncoder {
    /// Create a new encoder.
    ///
    /// `min_code_size` is the bit width of the palette indices to be
    /// compressed, GIF stores it right before the image data
    pub fn new(min_code_size: u8) -> Result<LzwEncoder, LzwErrors> {
        if !(2..=11).contains(&min_code_size) {
            return Err(LzwErrors::InvalidCodeSize(min_code_size));
        }
        Ok(LzwEncoder {
            min_code_size,
            first_child: [NIL; MAX_DICT_SIZE],
            next_sibling: [NIL; MAX_DICT_SIZE],
            appended: [0; MAX_DICT_SIZE]
        })
    }

    /// Compress a stream of palette indices.
    ///
    /// Every index must be below `1 << min_code_size`. The output is
    /// the raw code stream starting with a Clear code and ending with
    /// End-Of-Information, without GIF's sub-block framing.
    pub fn encode(&mut self, indices: &[u8]) -> Result<Vec<u8>, LzwErrors> {
        let clear_code = 1_u16 << self.min_code_size;
        let eoi_code = clear_code + 1;

        let mut writer = BitWriterLsb::new();
        let mut width = self.min_code_size + 1;
        let mut next_code = eoi_code + 1;

        self.reset_dict();
        writer.write(u64::from(clear_code), width);

        let mut iter = indices.iter();
        let mut current = match iter.next() {
            Some(first) => {
                if u16::from(*first) >= clear_code {
                    return Err(LzwErrors::InvalidCode(u16::from(*first)));
                }
                u16::from(*first)
            }
            None => {
                writer.write(u64::from(eoi_code), width);
                return Ok(writer.finish());
            }
        };

        for byte in iter {
            if u16::from(*byte) >= clear_code {
                return Err(LzwErrors::InvalidCode(u16::from(*byte)));
            }

            match self.find_child(current, *byte) {
                Some(code) => {
                    // the string extends, keep matching
                    current = code;
                }
                None => {
                    writer.write(u64::from(current), width);

                    if usize::from(next_code) < MAX_DICT_SIZE {
                        self.add_child(current, *byte, next_code);
                        // the code just defined is the first one that
                        // needs an extra bit
                        if next_code == (1 << width) && width < MAX_CODE_WIDTH {
                            width += 1;
                        }
                        next_code += 1;
                    } else {
                        // dictionary full, reset both sides
                        writer.write(u64::from(clear_code), width);
                        self.reset_dict();
                        width = self.min_code_size + 1;
                        next_code = eoi_code + 1;
                    }
                    current = u16::from(*byte);
                }
            }
        }

        writer.write(u64::from(current), width);
        writer.write(u64::from(eoi_code), width);

        Ok(writer.finish())
    }

    fn reset_dict(&mut self) {
        self.first_child.fill(NIL);
        self.next_sibling.fill(NIL);
    }

    fn find_child(&self, code: u16, byte: u8) -> Option<u16> {
        let mut child = self.first_child[usize::from(code)];
        while child != NIL {
            if self.appended[usize::from(child)] == byte {
                return Some(child);
            }
            child = self.next_sibling[usize::from(child)];
        }
        None
    }

    fn add_child(&mut self, parent: u16, byte: u8, code: u16) {
        self.next_sibling[usize::from(code)] = self.first_child[usize::from(parent)];
        self.first_child[usize::from(parent)] = code;
        self.appended[usize::from(code)] = byte;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LzwDecoder;

    #[test]
    fn rejects_out_of_range_index() {
        let mut encoder = LzwEncoder::new(2).unwrap();
        assert!(encoder.encode(&[0, 1, 4]).is_err());
    }

    #[test]
    fn empty_input_still_frames() {
        let encoded = LzwEncoder::new(8).unwrap().encode(&[]).unwrap();
        let mut out = Vec::new();
        LzwDecoder::new(8)
            .unwrap()
            .decode_into(&encoded, &mut out, 0)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn long_runs_cycle_the_dictionary() {
        // enough repetition to fill 4096 entries and force a clear
        let indices: Vec<u8> = (0_u32..20_000).map(|i| (i % 7) as u8).collect();

        let encoded = LzwEncoder::new(3).unwrap().encode(&indices).unwrap();
        let mut out = Vec::new();
        LzwDecoder::new(3)
            .unwrap()
            .decode_into(&encoded, &mut out, indices.len())
            .unwrap();

        assert_eq!(out, indices);
    }

    #[test]
    fn eight_bit_indices_round_trip() {
        let indices: Vec<u8> = (0_u16..=255).map(|i| i as u8).cycle().take(4096).collect();

        let encoded = LzwEncoder::new(8).unwrap().encode(&indices).unwrap();
        let mut out = Vec::new();
        LzwDecoder::new(8)
            .unwrap()
            .decode_into(&encoded, &mut out, indices.len())
            .unwrap();

        assert_eq!(out, indices);
    }
}

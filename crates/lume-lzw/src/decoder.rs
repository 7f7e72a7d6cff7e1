use alloc::vec::Vec;

use lume_core::bits::BitReaderLsb;

use crate::errors::LzwErrors;
use crate::{MAX_CODE_WIDTH, MAX_DICT_SIZE};

/// A decoder for the GIF dialect of LZW.
///
/// The dictionary is a table of prefix links, each entry records the
/// code it extends plus the byte it appends, emitting an entry walks
/// the links backwards.
pub struct LzwDecoder {
    min_code_size: u8,
    prefix:        [u16; MAX_DICT_SIZE],
    suffix:        [u8; MAX_DICT_SIZE],
    /// first byte of the string each code expands to, needed for
    /// the code-not-yet-defined (KwKwK) case
    first:         [u8; MAX_DICT_SIZE]
}

impl LzwDecoder {
    /// Create a new decoder.
    ///
    /// `min_code_size` is the value stored before GIF image data,
    /// the bit width needed for the palette indices
    pub fn new(min_code_size: u8) -> Result<LzwDecoder, LzwErrors> {
        if !(2..=11).contains(&min_code_size) {
            return Err(LzwErrors::InvalidCodeSize(min_code_size));
        }
        Ok(LzwDecoder {
            min_code_size,
            prefix: [0; MAX_DICT_SIZE],
            suffix: [0; MAX_DICT_SIZE],
            first: [0; MAX_DICT_SIZE]
        })
    }

    /// Decode a concatenated code stream appending indices to `out`.
    ///
    /// Decoding stops at the End-Of-Information code or when the
    /// stream runs dry, whichever comes first. `expected` bounds the
    /// output, codes that would push past it are an error so a
    /// corrupt stream cannot balloon memory.
    pub fn decode_into(
        &mut self, data: &[u8], out: &mut Vec<u8>, expected: usize
    ) -> Result<(), LzwErrors> {
        let mut stream = BitReaderLsb::new(data);

        let clear_code = 1_u16 << self.min_code_size;
        let eoi_code = clear_code + 1;

        let mut width = self.min_code_size + 1;
        let mut avail = eoi_code + 1;
        let mut old_code: Option<u16> = None;

        // scratch for reversing prefix walks
        let mut expand = Vec::with_capacity(64);

        loop {
            // Streams in the wild sometimes end without an EOI,
            // treat exhaustion as end of stream.
            let code = match stream.read(width) {
                Ok(c) => c as u16,
                Err(_) => return Ok(())
            };

            if code == clear_code {
                width = self.min_code_size + 1;
                avail = eoi_code + 1;
                old_code = None;
                continue;
            }
            if code == eoi_code {
                return Ok(());
            }

            let first_byte;
            if code < clear_code {
                // a root, emits itself
                first_byte = code as u8;
                if out.len() >= expected {
                    return Err(LzwErrors::Static("Output longer than declared size"));
                }
                out.push(code as u8);
            } else if code < avail {
                // a defined dictionary string
                expand.clear();
                let mut walk = code;
                while walk >= clear_code {
                    expand.push(self.suffix[usize::from(walk)]);
                    walk = self.prefix[usize::from(walk)];
                }
                expand.push(walk as u8);
                first_byte = walk as u8;

                if out.len() + expand.len() > expected {
                    return Err(LzwErrors::Static("Output longer than declared size"));
                }
                out.extend(expand.iter().rev());
            } else if code == avail && old_code.is_some() {
                // KwKwK: the string is old string + its own first byte
                let old = old_code.unwrap();
                expand.clear();
                let mut walk = old;
                while walk >= clear_code {
                    expand.push(self.suffix[usize::from(walk)]);
                    walk = self.prefix[usize::from(walk)];
                }
                expand.push(walk as u8);
                first_byte = walk as u8;

                if out.len() + expand.len() + 1 > expected {
                    return Err(LzwErrors::Static("Output longer than declared size"));
                }
                out.extend(expand.iter().rev());
                out.push(first_byte);
            } else {
                return Err(LzwErrors::InvalidCode(code));
            }

            // register the pending entry, one step behind the encoder
            if let Some(old) = old_code {
                if usize::from(avail) < MAX_DICT_SIZE {
                    self.prefix[usize::from(avail)] = old;
                    self.suffix[usize::from(avail)] = first_byte;
                    self.first[usize::from(avail)] = self.first_of(old, clear_code);
                    avail += 1;

                    if avail == (1 << width) && width < MAX_CODE_WIDTH {
                        width += 1;
                    }
                }
            }
            old_code = Some(code);
        }
    }

    fn first_of(&self, code: u16, clear_code: u16) -> u8 {
        if code < clear_code {
            code as u8
        } else {
            self.first[usize::from(code)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LzwEncoder;

    #[test]
    fn rejects_code_past_frontier() {
        // width starts at 3 for min code size 2, code 7 is undefined
        // with no preceding data code
        let mut decoder = LzwDecoder::new(2).unwrap();
        let mut out = Vec::new();
        // bits: 111 (= code 7)
        let err = decoder.decode_into(&[0b0000_0111], &mut out, 100);
        assert!(err.is_err());
    }

    #[test]
    fn decodes_what_the_encoder_emits() {
        let data = b"aaaabbbbccccaaaabbbb";
        let indices: Vec<u8> = data.iter().map(|b| b - b'a').collect();

        let encoded = LzwEncoder::new(2).unwrap().encode(&indices).unwrap();
        let mut out = Vec::new();
        LzwDecoder::new(2)
            .unwrap()
            .decode_into(&encoded, &mut out, indices.len())
            .unwrap();

        assert_eq!(out, indices);
    }

    #[test]
    fn output_is_bounded_by_expected() {
        let indices = [1_u8; 50];
        let encoded = LzwEncoder::new(2).unwrap().encode(&indices).unwrap();
        let mut out = Vec::new();
        let res = LzwDecoder::new(2)
            .unwrap()
            .decode_into(&encoded, &mut out, 10);
        assert!(res.is_err());
    }
}

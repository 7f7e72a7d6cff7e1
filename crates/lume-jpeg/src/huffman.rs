//! Huffman table construction for decode and encode
//!
//! JPEG transmits tables as 16 code counts per length plus the symbol
//! values in code order, codes are assigned canonically (T.81 Annex C).

use crate::errors::DecodeErrors;

/// A Huffman table in decodable form.
///
/// `min_code`/`max_code` hold the smallest and largest codeword per
/// length, decoding walks lengths accumulating bits until the code
/// falls into range, then indexes `values` via `val_offset`.
pub(crate) struct HuffmanTable {
    min_code:   [i32; 17],
    max_code:   [i32; 17],
    val_offset: [i32; 17],
    values:     Vec<u8>
}

impl HuffmanTable {
    /// Build a decode table from the DHT payload
    pub fn new(bits: &[u8; 16], values: Vec<u8>) -> Result<HuffmanTable, DecodeErrors> {
        let total: usize = bits.iter().map(|b| usize::from(*b)).sum();
        if total != values.len() || total > 256 {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Code count {total} does not match {} symbol values",
                values.len()
            )));
        }

        let mut min_code = [0_i32; 17];
        let mut max_code = [-1_i32; 17];
        let mut val_offset = [0_i32; 17];

        let mut code = 0_i32;
        let mut k = 0_i32;

        for len in 1..=16_usize {
            let count = i32::from(bits[len - 1]);

            if count != 0 {
                val_offset[len] = k - code;
                min_code[len] = code;
                code += count;
                max_code[len] = code - 1;
                k += count;
            }
            // canonical codes double on each length increase
            if code > (1 << len) {
                return Err(DecodeErrors::HuffmanDecode(
                    "Oversubscribed huffman table".to_string()
                ));
            }
            code <<= 1;
        }

        Ok(HuffmanTable {
            min_code,
            max_code,
            val_offset,
            values
        })
    }

    /// Decode the next symbol by accumulating bits until the
    /// codeword falls inside a length's range
    #[inline(always)]
    pub fn decode<F>(&self, mut next_bit: F) -> Result<u8, DecodeErrors>
    where
        F: FnMut() -> Result<u32, DecodeErrors>
    {
        let mut code = 0_i32;

        for len in 1..=16_usize {
            code = (code << 1) | next_bit()? as i32;

            if self.max_code[len] >= code && code >= self.min_code[len] {
                let index = (self.val_offset[len] + code) as usize;
                return Ok(self.values[index]);
            }
        }
        Err(DecodeErrors::HuffmanDecode(
            "Codeword longer than 16 bits".to_string()
        ))
    }
}

/// A Huffman table in encodable form, codeword and size per symbol
pub(crate) struct HuffmanEncodeTable {
    pub codes: [u16; 256],
    pub sizes: [u8; 256]
}

impl HuffmanEncodeTable {
    /// Derive codewords from the counts + values representation, the
    /// same canonical assignment the decoder undoes
    pub fn new(bits: &[u8; 16], values: &[u8]) -> HuffmanEncodeTable {
        let mut codes = [0_u16; 256];
        let mut sizes = [0_u8; 256];

        let mut code = 0_u16;
        let mut k = 0_usize;

        for len in 1..=16_usize {
            for _ in 0..bits[len - 1] {
                codes[usize::from(values[k])] = code;
                sizes[usize::from(values[k])] = len as u8;
                code += 1;
                k += 1;
            }
            code <<= 1;
        }

        HuffmanEncodeTable { codes, sizes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{AC_LUMA_BITS, AC_LUMA_VALUES, DC_LUMA_BITS, DC_LUMA_VALUES};

    #[test]
    fn encode_and_decode_tables_agree() {
        let decode = HuffmanTable::new(&DC_LUMA_BITS, DC_LUMA_VALUES.to_vec()).unwrap();
        let encode = HuffmanEncodeTable::new(&DC_LUMA_BITS, &DC_LUMA_VALUES);

        for symbol in DC_LUMA_VALUES {
            let code = encode.codes[usize::from(symbol)];
            let size = encode.sizes[usize::from(symbol)];

            // feed the codeword bit by bit into the decoder
            let mut bit = 0;
            let decoded = decode
                .decode(|| {
                    let b = (code >> (size - 1 - bit)) & 1;
                    bit += 1;
                    Ok(u32::from(b))
                })
                .unwrap();
            assert_eq!(decoded, symbol);
        }
    }

    #[test]
    fn ac_table_builds() {
        assert!(HuffmanTable::new(&AC_LUMA_BITS, AC_LUMA_VALUES.to_vec()).is_ok());
    }

    #[test]
    fn oversubscribed_table_is_rejected() {
        let mut bits = [0_u8; 16];
        bits[0] = 3; // three 1-bit codes cannot exist
        assert!(HuffmanTable::new(&bits, vec![0, 1, 2]).is_err());
    }
}

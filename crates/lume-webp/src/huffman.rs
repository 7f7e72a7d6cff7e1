//! Canonical prefix code helpers shared by the VP8L decoder and
//! encoder
//!
//! VP8L uses the deflate conventions: canonical code assignment from
//! codeword lengths, codewords transmitted starting from their most
//! significant bit over an LSB-first bitstream.

use lume_core::bits::{BitReaderLsb, BitWriterLsb};

use crate::errors::WebPErrors;

/// Longest codeword VP8L allows
pub(crate) const MAX_CODE_LENGTH: usize = 15;

/// A canonical prefix decode table, counts per length plus
/// length-sorted symbols
pub(crate) struct PrefixCode {
    counts:  [u16; MAX_CODE_LENGTH + 1],
    symbols: Vec<u16>,
    /// fast path for degenerate single symbol codes which consume
    /// zero bits
    single:  Option<u16>
}

impl PrefixCode {
    /// Build a decode table from codeword lengths, zero marking
    /// unused symbols
    pub fn new(lens: &[u8]) -> Result<PrefixCode, WebPErrors> {
        let mut counts = [0_u16; MAX_CODE_LENGTH + 1];
        let mut used = 0;
        for len in lens {
            if usize::from(*len) > MAX_CODE_LENGTH {
                return Err(WebPErrors::Malformed("Codeword too long".to_string()));
            }
            counts[usize::from(*len)] += 1;
            used += usize::from(*len != 0);
        }
        counts[0] = 0;

        if used == 1 {
            let symbol = lens.iter().position(|l| *l != 0).unwrap() as u16;
            return Ok(PrefixCode {
                counts,
                symbols: vec![symbol],
                single: Some(symbol)
            });
        }

        // reject over-subscribed codes
        let mut left = 1_i32;
        for count in &counts[1..] {
            left <<= 1;
            left -= i32::from(*count);
            if left < 0 {
                return Err(WebPErrors::Malformed("Oversubscribed prefix code".to_string()));
            }
        }

        let mut offsets = [0_u16; MAX_CODE_LENGTH + 2];
        for len in 1..=MAX_CODE_LENGTH {
            offsets[len + 1] = offsets[len] + counts[len];
        }
        let mut symbols = vec![0_u16; usize::from(offsets[MAX_CODE_LENGTH + 1])];
        for (sym, len) in lens.iter().enumerate() {
            if *len != 0 {
                symbols[usize::from(offsets[usize::from(*len)])] = sym as u16;
                offsets[usize::from(*len)] += 1;
            }
        }

        Ok(PrefixCode {
            counts,
            symbols,
            single: None
        })
    }

    /// A code with exactly one symbol, reads consume no bits
    pub fn single_symbol(symbol: u16) -> PrefixCode {
        PrefixCode {
            counts:  [0; MAX_CODE_LENGTH + 1],
            symbols: vec![symbol],
            single:  Some(symbol)
        }
    }

    /// Decode the next symbol
    pub fn decode(&self, stream: &mut BitReaderLsb) -> Result<u16, WebPErrors> {
        if let Some(symbol) = self.single {
            return Ok(symbol);
        }
        let mut code = 0_usize;
        let mut first = 0_usize;
        let mut index = 0_usize;

        for len in 1..=MAX_CODE_LENGTH {
            code |= stream.read(1)? as usize;

            let count = usize::from(self.counts[len]);
            if code < first + count {
                return Ok(self.symbols[index + (code - first)]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(WebPErrors::Malformed("Invalid prefix code in stream".to_string()))
    }
}

/// Build length-limited Huffman codeword lengths from symbol
/// frequencies.
///
/// Plain Huffman construction followed by the usual overflow
/// adjustment when some codeword exceeds the limit.
pub(crate) fn build_code_lengths(freqs: &[u32], limit: usize) -> Vec<u8> {
    let n = freqs.len();
    let mut lens = vec![0_u8; n];

    let used: Vec<usize> = (0..n).filter(|i| freqs[*i] > 0).collect();
    match used.len() {
        0 => return lens,
        1 => {
            lens[used[0]] = 1;
            return lens;
        }
        _ => {}
    }

    // package the two smallest nodes repeatedly; a simple O(n^2)
    // selection is fine for alphabets of a few hundred symbols
    #[derive(Clone)]
    struct Node {
        freq:     u64,
        symbols:  Vec<usize>
    }
    let mut nodes: Vec<Node> = used
        .iter()
        .map(|i| Node {
            freq:    u64::from(freqs[*i]),
            symbols: vec![*i]
        })
        .collect();

    while nodes.len() > 1 {
        nodes.sort_by_key(|n| core::cmp::Reverse(n.freq));
        let a = nodes.pop().unwrap();
        let b = nodes.pop().unwrap();

        for s in a.symbols.iter().chain(&b.symbols) {
            lens[*s] += 1;
        }
        let mut symbols = a.symbols;
        symbols.extend(b.symbols);
        nodes.push(Node {
            freq: a.freq + b.freq,
            symbols
        });
    }

    // force codewords into the limit, stealing slack from shorter
    // codes in the canonical Kraft budget
    let mut counts = vec![0_u32; limit + 1];
    let mut overflow = 0_u32;
    for len in lens.iter() {
        if usize::from(*len) > limit {
            overflow += 1;
        } else {
            counts[usize::from(*len)] += 1;
        }
    }
    if overflow > 0 {
        // clamp and then repair the Kraft inequality like zlib does
        for len in lens.iter_mut() {
            if usize::from(*len) > limit {
                *len = limit as u8;
            }
        }
        counts = vec![0_u32; limit + 1];
        for len in lens.iter() {
            counts[usize::from(*len)] += 1;
        }
        loop {
            let kraft: u64 = (1..=limit)
                .map(|l| u64::from(counts[l]) << (limit - l))
                .sum();
            if kraft <= 1 << limit {
                break;
            }
            // find the longest non-limit length to demote
            let mut bits = limit - 1;
            while counts[bits] == 0 {
                bits -= 1;
            }
            counts[bits] -= 1;
            counts[bits + 1] += 2;
            counts[limit] -= 1;
        }
        // reassign lengths to symbols ordered by frequency
        let mut by_freq: Vec<usize> = used.clone();
        by_freq.sort_by_key(|i| core::cmp::Reverse(freqs[*i]));

        let mut assigned = Vec::new();
        for len in 1..=limit {
            for _ in 0..counts[len] {
                assigned.push(len as u8);
            }
        }
        // shortest codes go to the most frequent symbols
        for (sym, len) in by_freq.iter().zip(assigned.iter()) {
            lens[*sym] = *len;
        }
    }
    lens
}

/// Assign canonical codewords to a set of codeword lengths,
/// returning codes in symbol order
pub(crate) fn assign_codes(lens: &[u8]) -> Vec<u16> {
    let mut counts = [0_u16; MAX_CODE_LENGTH + 1];
    for len in lens {
        counts[usize::from(*len)] += 1;
    }
    counts[0] = 0;

    let mut next = [0_u16; MAX_CODE_LENGTH + 2];
    let mut code = 0_u16;
    for len in 1..=MAX_CODE_LENGTH {
        code = (code + counts[len - 1]) << 1;
        next[len] = code;
    }

    let mut codes = vec![0_u16; lens.len()];
    for (sym, len) in lens.iter().enumerate() {
        if *len != 0 {
            codes[sym] = next[usize::from(*len)];
            next[usize::from(*len)] += 1;
        }
    }
    codes
}

/// Write one codeword, bit-reversed for the LSB-first stream
pub(crate) fn put_code(writer: &mut BitWriterLsb, code: u16, len: u8) {
    let reversed = u64::from(code.reverse_bits() >> (16 - len));
    writer.write(reversed, len);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_bits() {
        let freqs = [50_u32, 30, 10, 5, 3, 1, 1];
        let lens = build_code_lengths(&freqs, MAX_CODE_LENGTH);
        let codes = assign_codes(&lens);

        let symbols = [0_u16, 1, 2, 6, 3, 0, 5, 4, 0, 1];
        let mut writer = BitWriterLsb::new();
        for s in symbols {
            put_code(&mut writer, codes[usize::from(s)], lens[usize::from(s)]);
        }
        let bytes = writer.finish();

        let table = PrefixCode::new(&lens).unwrap();
        let mut reader = BitReaderLsb::new(&bytes);
        for s in symbols {
            assert_eq!(table.decode(&mut reader).unwrap(), s);
        }
    }

    #[test]
    fn single_symbol_consumes_no_bits() {
        let mut lens = vec![0_u8; 10];
        lens[7] = 1;
        let table = PrefixCode::new(&lens).unwrap();
        let mut reader = BitReaderLsb::new(&[]);
        assert_eq!(table.decode(&mut reader).unwrap(), 7);
    }

    #[test]
    fn lengths_respect_the_limit() {
        // pathological fibonacci-like frequencies blow past any limit
        // without the adjustment
        let freqs: Vec<u32> = (0..30).map(|i| 1 << (i / 2)).collect();
        let lens = build_code_lengths(&freqs, MAX_CODE_LENGTH);

        assert!(lens.iter().all(|l| usize::from(*l) <= MAX_CODE_LENGTH));

        // kraft equality must hold for a complete code
        let kraft: u64 = lens
            .iter()
            .filter(|l| **l > 0)
            .map(|l| 1_u64 << (MAX_CODE_LENGTH - usize::from(*l)))
            .sum();
        assert_eq!(kraft, 1 << MAX_CODE_LENGTH);
    }
}

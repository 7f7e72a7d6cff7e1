use alloc::format;
use alloc::vec::Vec;

use crate::bitstream::BitStreamReader;
use crate::constants::{
    fixed_dist_lengths, fixed_litlen_lengths, DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN,
    DEFLATE_BLOCKTYPE_STATIC, DEFLATE_BLOCKTYPE_UNCOMPRESSED, DEFLATE_MAX_CODEWORD_LENGTH,
    DEFLATE_NUM_LITLEN_SYMS, DEFLATE_NUM_OFFSET_SYMS, DEFLATE_NUM_PRECODE_SYMS,
    DEFLATE_PRECODE_LENS_PERMUTATION, DIST_BASE, DIST_EXTRA, LENGTH_BASE, LENGTH_EXTRA
};
use crate::errors::DecodeErrorStatus::{self, CorruptData, InsufficientData};
use crate::errors::InflateDecodeErrors;

/// Options that can influence decompression
/// in the decoder
#[derive(Copy, Clone)]
pub struct DeflateOptions {
    limit:            usize,
    confirm_checksum: bool,
    size_hint:        usize
}

impl Default for DeflateOptions {
    fn default() -> Self {
        DeflateOptions {
            limit:            1 << 30,
            confirm_checksum: true,
            size_hint:        37000
        }
    }
}

impl DeflateOptions {
    /// Get deflate/zlib limit option
    ///
    /// The decoder won't extend the inbuilt limit and will
    /// return an error if the limit is exceeded
    pub const fn limit(&self) -> usize {
        self.limit
    }
    /// Set a limit to the internal vector used to store
    /// decoded zlib/deflate output.
    ///
    /// # Arguments
    /// limit: The new decompressor limit
    ///
    /// # Returns
    /// A modified version of DeflateOptions
    #[must_use]
    pub fn set_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Get whether the decoder will confirm a checksum
    /// after decoding
    pub const fn confirm_checksum(&self) -> bool {
        self.confirm_checksum
    }
    /// Set whether the decoder should confirm a checksum
    /// after decoding
    pub fn set_confirm_checksum(mut self, yes: bool) -> Self {
        self.confirm_checksum = yes;
        self
    }

    /// Get the default size hint for the decompressor
    ///
    /// The decompressor initializes the internal storage for decompressed
    /// bytes with this size and will reallocate the vec if the decompressed
    /// size becomes bigger
    pub const fn size_hint(&self) -> usize {
        self.size_hint
    }
    /// Set the size hint for the decompressor
    #[must_use]
    pub fn set_size_hint(mut self, hint: usize) -> Self {
        self.size_hint = hint;
        self
    }
}

/// A canonical Huffman decode table.
///
/// Codewords are walked bit by bit, per-length symbol counts plus a
/// length-sorted symbol array are enough to decode a canonical code
/// without materializing the tree.
struct HuffmanTable {
    counts:  [u16; DEFLATE_MAX_CODEWORD_LENGTH + 1],
    symbols: Vec<u16>
}

impl HuffmanTable {
    /// Build the decode table from codeword lengths, zero meaning
    /// the symbol is unused.
    ///
    /// Over-subscribed codes are rejected, incomplete codes are
    /// accepted since a dynamic block's distance code may legally be
    /// empty or single-symbol.
    fn new(lens: &[u8]) -> Result<HuffmanTable, DecodeErrorStatus> {
        let mut counts = [0_u16; DEFLATE_MAX_CODEWORD_LENGTH + 1];

        for len in lens {
            counts[usize::from(*len)] += 1;
        }
        counts[0] = 0;

        // reject over-subscribed codes
        let mut left = 1_i32;
        for count in &counts[1..] {
            left <<= 1;
            left -= i32::from(*count);
            if left < 0 {
                return Err(CorruptData);
            }
        }

        // sort symbols by length then by symbol value
        let mut offsets = [0_u16; DEFLATE_MAX_CODEWORD_LENGTH + 2];
        for len in 1..=DEFLATE_MAX_CODEWORD_LENGTH {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let mut symbols = alloc::vec![0_u16; usize::from(offsets[DEFLATE_MAX_CODEWORD_LENGTH + 1])];
        for (sym, len) in lens.iter().enumerate() {
            if *len != 0 {
                symbols[usize::from(offsets[usize::from(*len)])] = sym as u16;
                offsets[usize::from(*len)] += 1;
            }
        }

        Ok(HuffmanTable { counts, symbols })
    }

    /// Decode the next symbol from the stream
    #[inline(always)]
    fn decode_symbol(&self, stream: &mut BitStreamReader) -> Result<u16, DecodeErrorStatus> {
        let mut code = 0_usize;
        let mut first = 0_usize;
        let mut index = 0_usize;

        for len in 1..=DEFLATE_MAX_CODEWORD_LENGTH {
            if !stream.has(1) {
                stream.refill();
                if !stream.has(1) {
                    return Err(InsufficientData);
                }
            }
            code |= stream.get_bits(1) as usize;

            let count = usize::from(self.counts[len]);
            if code < first + count {
                return Ok(self.symbols[index + (code - first)]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(CorruptData)
    }
}

/// A deflate decoder instance.
///
/// The decoder owns the input buffer and a read cursor, decoded
/// bytes land in a growable internal vector handed to the caller.
pub struct DeflateDecoder<'a> {
    data:     &'a [u8],
    position: usize,
    options:  DeflateOptions
}

impl<'a> DeflateDecoder<'a> {
    /// Create a new decoder with the default options
    pub fn new(data: &'a [u8]) -> DeflateDecoder<'a> {
        DeflateDecoder::new_with_options(data, DeflateOptions::default())
    }
    /// Create a new decoder with configured options
    pub fn new_with_options(data: &'a [u8], options: DeflateOptions) -> DeflateDecoder<'a> {
        DeflateDecoder {
            data,
            position: 0,
            options
        }
    }

    /// Decode a zlib stream (RFC 1950), verifying the adler32
    /// trailer unless disabled via options
    #[cfg(feature = "zlib")]
    pub fn decode_zlib(&mut self) -> Result<Vec<u8>, InflateDecodeErrors> {
        use crate::utils::calc_adler_hash;

        if self.data.len()
            < 2 /* zlib header */
            + 4
        /* adler trailer */
        {
            return Err(InflateDecodeErrors::new_with_error(InsufficientData));
        }

        // Zlib flags
        // See https://www.ietf.org/rfc/rfc1950.txt for the RFC
        let cmf = self.data[0];
        let flg = self.data[1];

        let cm = cmf & 0xF;
        let cinfo = cmf >> 4;

        // confirm we have the right deflate methods
        if cm != 8 {
            if cm == 15 {
                return Err(InflateDecodeErrors::new_with_error(DecodeErrorStatus::Generic(
                    "CM of 15 is reserved by the standard, currently don't know how to handle it"
                )));
            }
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::GenericStr(format!("Unknown zlib compression method {cm}"))
            ));
        }
        if cinfo > 7 {
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::GenericStr(format!(
                    "Unknown cinfo `{cinfo}` greater than 7, not allowed"
                ))
            ));
        }
        let flag_checks = (u16::from(cmf) * 256) + u16::from(flg);

        if flag_checks % 31 != 0 {
            return Err(InflateDecodeErrors::new_with_error(DecodeErrorStatus::Generic(
                "FCHECK integrity not preserved"
            )));
        }
        if (flg >> 5) & 1 == 1 {
            return Err(InflateDecodeErrors::new_with_error(DecodeErrorStatus::Generic(
                "Preset dictionaries are not supported"
            )));
        }

        self.position = 2;

        let (out, trailer_start) = self.decode_deflate_inner()?;

        if self.options.confirm_checksum {
            let adler_bytes = match self.data.get(trailer_start..trailer_start + 4) {
                Some(bytes) => bytes,
                None => {
                    return Err(InflateDecodeErrors::new(InsufficientData, out));
                }
            };
            let expected = u32::from_be_bytes(adler_bytes.try_into().unwrap());
            let found = calc_adler_hash(&out);

            if expected != found {
                return Err(InflateDecodeErrors::new(
                    DecodeErrorStatus::MismatchedAdler(expected, found),
                    out
                ));
            }
        }

        Ok(out)
    }

    /// Decode a raw deflate stream (RFC 1951)
    pub fn decode_deflate(&mut self) -> Result<Vec<u8>, InflateDecodeErrors> {
        self.position = 0;
        let (out, _) = self.decode_deflate_inner()?;
        Ok(out)
    }

    /// Decode deflate blocks starting at `self.position`, returning the
    /// decompressed bytes plus the input offset one past the final block
    fn decode_deflate_inner(&mut self) -> Result<(Vec<u8>, usize), InflateDecodeErrors> {
        match self.decode_blocks() {
            Ok(v) => Ok(v),
            Err((status, data)) => Err(InflateDecodeErrors::new(status, data))
        }
    }

    #[allow(clippy::type_complexity)]
    fn decode_blocks(&mut self) -> Result<(Vec<u8>, usize), (DecodeErrorStatus, Vec<u8>)> {
        let mut stream = BitStreamReader::new(&self.data[self.position..]);
        let mut out = Vec::with_capacity(self.options.size_hint);

        macro_rules! fail {
            ($status:expr) => {
                return Err(($status, out))
            };
        }
        macro_rules! need_bits {
            ($n:expr) => {
                if !stream.has($n) {
                    stream.refill();
                    if !stream.has($n) {
                        fail!(InsufficientData);
                    }
                }
            };
        }

        loop {
            need_bits!(3);
            let is_last_block = stream.get_bits(1) == 1;
            let block_type = stream.get_bits(2);

            if block_type == DEFLATE_BLOCKTYPE_UNCOMPRESSED {
                /*
                 * Uncompressed block: skip any remaining bits in the current
                 * partially processed byte, read LEN and NLEN and copy LEN
                 * bytes literally to the output.
                 */
                stream.align_to_byte();
                need_bits!(32);

                let len = stream.get_bits(16) as usize;
                let nlen = stream.get_bits(16) as usize;

                if len != (!nlen & 0xFFFF) {
                    fail!(CorruptData);
                }
                if out.len() + len > self.options.limit {
                    fail!(DecodeErrorStatus::OutputLimitExceeded(
                        self.options.limit,
                        out.len() + len
                    ));
                }
                for _ in 0..len {
                    need_bits!(8);
                    out.push(stream.get_bits(8) as u8);
                }
            } else if block_type == DEFLATE_BLOCKTYPE_STATIC
                || block_type == DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN
            {
                let (litlen_table, dist_table) = if block_type == DEFLATE_BLOCKTYPE_STATIC {
                    let litlen = match HuffmanTable::new(&fixed_litlen_lengths()) {
                        Ok(t) => t,
                        Err(e) => fail!(e)
                    };
                    let dist = match HuffmanTable::new(&fixed_dist_lengths()) {
                        Ok(t) => t,
                        Err(e) => fail!(e)
                    };
                    (litlen, dist)
                } else {
                    match self.read_dynamic_tables(&mut stream) {
                        Ok(t) => t,
                        Err(e) => fail!(e)
                    }
                };

                // literal/length decode loop
                loop {
                    let sym = match litlen_table.decode_symbol(&mut stream) {
                        Ok(sym) => usize::from(sym),
                        Err(e) => fail!(e)
                    };

                    if sym < 256 {
                        if out.len() >= self.options.limit {
                            fail!(DecodeErrorStatus::OutputLimitExceeded(
                                self.options.limit,
                                out.len() + 1
                            ));
                        }
                        out.push(sym as u8);
                        continue;
                    }
                    if sym == 256 {
                        // end of block
                        break;
                    }
                    // a match, sym in 257..=285
                    let len_idx = sym - 257;
                    if len_idx >= LENGTH_BASE.len() {
                        fail!(CorruptData);
                    }
                    need_bits!(LENGTH_EXTRA[len_idx]);
                    let length = usize::from(LENGTH_BASE[len_idx])
                        + stream.get_bits(LENGTH_EXTRA[len_idx]) as usize;

                    let dist_sym = match dist_table.decode_symbol(&mut stream) {
                        Ok(sym) => usize::from(sym),
                        Err(e) => fail!(e)
                    };
                    if dist_sym >= DIST_BASE.len() {
                        fail!(CorruptData);
                    }
                    need_bits!(DIST_EXTRA[dist_sym]);
                    let distance = usize::from(DIST_BASE[dist_sym])
                        + stream.get_bits(DIST_EXTRA[dist_sym]) as usize;

                    if distance > out.len() {
                        fail!(CorruptData);
                    }
                    if out.len() + length > self.options.limit {
                        fail!(DecodeErrorStatus::OutputLimitExceeded(
                            self.options.limit,
                            out.len() + length
                        ));
                    }
                    // matches may overlap themselves, copy byte-wise
                    let mut src = out.len() - distance;
                    for _ in 0..length {
                        let byte = out[src];
                        out.push(byte);
                        src += 1;
                    }
                }
            } else {
                fail!(DecodeErrorStatus::Generic("Reserved block type 3"));
            }

            if is_last_block {
                break;
            }
        }

        stream.align_to_byte();
        let trailer_start = self.position + stream.get_position();

        Ok((out, trailer_start))
    }

    /// Read the code length definitions of a dynamic Huffman block
    /// and build the literal/length and distance decode tables
    fn read_dynamic_tables(
        &mut self, stream: &mut BitStreamReader
    ) -> Result<(HuffmanTable, HuffmanTable), DecodeErrorStatus> {
        macro_rules! need_bits {
            ($n:expr) => {
                if !stream.has($n) {
                    stream.refill();
                    if !stream.has($n) {
                        return Err(InsufficientData);
                    }
                }
            };
        }

        need_bits!(14);
        let num_litlen_syms = 257 + stream.get_bits(5) as usize;
        let num_offset_syms = 1 + stream.get_bits(5) as usize;
        let num_explicit_precode_lens = 4 + stream.get_bits(4) as usize;

        if num_litlen_syms > DEFLATE_NUM_LITLEN_SYMS - 2
            || num_offset_syms > DEFLATE_NUM_OFFSET_SYMS - 2
        {
            return Err(CorruptData);
        }

        let mut precode_lens = [0_u8; DEFLATE_NUM_PRECODE_SYMS];

        for i in DEFLATE_PRECODE_LENS_PERMUTATION
            .iter()
            .take(num_explicit_precode_lens)
        {
            need_bits!(3);
            precode_lens[usize::from(*i)] = stream.get_bits(3) as u8;
        }

        let precode_table = HuffmanTable::new(&precode_lens)?;

        // Decode the litlen and offset codeword lengths, run-length
        // encoded via the precode
        let mut lens = [0_u8; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS];
        let total = num_litlen_syms + num_offset_syms;
        let mut i = 0;

        while i < total {
            let presym = precode_table.decode_symbol(stream)?;

            match presym {
                0..=15 => {
                    // explicit codeword length
                    lens[i] = presym as u8;
                    i += 1;
                }
                16 => {
                    // repeat previous length 3 to 6 times
                    if i == 0 {
                        return Err(CorruptData);
                    }
                    need_bits!(2);
                    let rep_count = 3 + stream.get_bits(2) as usize;
                    if i + rep_count > total {
                        return Err(CorruptData);
                    }
                    let rep_val = lens[i - 1];
                    lens[i..i + rep_count].fill(rep_val);
                    i += rep_count;
                }
                17 => {
                    // repeat zero 3 to 10 times
                    need_bits!(3);
                    let rep_count = 3 + stream.get_bits(3) as usize;
                    if i + rep_count > total {
                        return Err(CorruptData);
                    }
                    i += rep_count;
                }
                18 => {
                    // repeat zero 11 to 138 times
                    need_bits!(7);
                    let rep_count = 11 + stream.get_bits(7) as usize;
                    if i + rep_count > total {
                        return Err(CorruptData);
                    }
                    i += rep_count;
                }
                _ => return Err(CorruptData)
            }
        }

        let litlen_table = HuffmanTable::new(&lens[..num_litlen_syms])?;
        let dist_table = HuffmanTable::new(&lens[num_litlen_syms..total])?;

        Ok((litlen_table, dist_table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_block_round_trip() {
        // BFINAL=1, BTYPE=00, LEN=5, NLEN=!5, "hello"
        let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'h', b'e', b'l', b'l', b'o'];
        let mut decoder = DeflateDecoder::new(&data);
        let out = decoder.decode_deflate().unwrap();
        assert_eq!(&out, b"hello");
    }

    #[test]
    fn rejects_bad_nlen() {
        let data = [0x01, 0x05, 0x00, 0x00, 0x00, b'h', b'e', b'l', b'l', b'o'];
        let mut decoder = DeflateDecoder::new(&data);
        assert!(decoder.decode_deflate().is_err());
    }

    #[test]
    fn rejects_distance_past_start() {
        // fixed block whose first symbol is a match
        let mut decoder = DeflateDecoder::new(&[0b0000_0011, 0b0010_0001, 0x00, 0x00]);
        assert!(decoder.decode_deflate().is_err());
    }

    #[test]
    fn output_limit_is_respected() {
        let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'h', b'e', b'l', b'l', b'o'];
        let options = DeflateOptions::default().set_limit(3);
        let mut decoder = DeflateDecoder::new_with_options(&data, options);
        let err = decoder.decode_deflate().unwrap_err();
        assert!(matches!(
            err.error,
            DecodeErrorStatus::OutputLimitExceeded(3, _)
        ));
    }
}

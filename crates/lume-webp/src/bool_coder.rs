//! The boolean arithmetic coder VP8 entropy data uses
//!
//! A binary arithmetic coder over an eight bit probability model.
//! The decoder mirrors the encoder exactly; both renormalize the
//! range back above 128 one bit at a time, the encoder propagating
//! carries into already written bytes.

/// Probability of a zero bit, out of 256
pub(crate) type Prob = u8;

/// The uniform probability used for raw literals
pub(crate) const PROB_HALF: Prob = 128;

pub(crate) struct BoolDecoder<'a> {
    input:     &'a [u8],
    position:  usize,
    range:     u32,
    value:     u32,
    bit_count: i32
}

impl<'a> BoolDecoder<'a> {
    pub fn new(input: &'a [u8]) -> BoolDecoder<'a> {
        let mut decoder = BoolDecoder {
            input,
            position: 0,
            range: 255,
            value: 0,
            bit_count: 0
        };
        decoder.value = u32::from(decoder.next_byte()) << 8 | u32::from(decoder.next_byte());
        decoder
    }

    /// Past the end the decoder reads zero bytes; a truncated stream
    /// decodes into garbage rather than panicking, callers bound
    /// their loops by pixel counts
    #[inline(always)]
    fn next_byte(&mut self) -> u8 {
        let byte = self.input.get(self.position).copied().unwrap_or(0);
        self.position += 1;
        byte
    }

    /// Decode one boolean with probability `prob` of being zero
    #[inline(always)]
    pub fn get_bool(&mut self, prob: Prob) -> bool {
        let split = 1 + (((self.range - 1) * u32::from(prob)) >> 8);
        let big_split = split << 8;

        let bit = if self.value >= big_split {
            self.range -= split;
            self.value -= big_split;
            true
        } else {
            self.range = split;
            false
        };

        while self.range < 128 {
            self.value <<= 1;
            self.range <<= 1;
            self.bit_count += 1;
            if self.bit_count == 8 {
                self.bit_count = 0;
                self.value |= u32::from(self.next_byte());
            }
        }
        bit
    }

    /// Decode one bit with the uniform probability
    #[inline(always)]
    pub fn get_flag(&mut self) -> bool {
        self.get_bool(PROB_HALF)
    }

    /// Decode an `n` bit unsigned literal, most significant bit first
    pub fn get_literal(&mut self, n: u8) -> u32 {
        let mut value = 0;
        for _ in 0..n {
            value = (value << 1) | u32::from(self.get_flag());
        }
        value
    }

    /// Decode a sign-and-magnitude value of `n` magnitude bits
    pub fn get_signed(&mut self, n: u8) -> i32 {
        let magnitude = self.get_literal(n) as i32;
        if self.get_flag() {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Decode a value described by a probability tree.
    ///
    /// Trees are arrays of signed bytes, positive entries index the
    /// next node pair, negative entries are leaf values
    pub fn read_tree(&mut self, tree: &[i8], probs: &[Prob]) -> i8 {
        self.read_tree_from(tree, probs, 0)
    }

    /// Tree decode starting at an inner node, used by the token
    /// reader to skip the end-of-block branch after a zero
    pub fn read_tree_from(&mut self, tree: &[i8], probs: &[Prob], start: usize) -> i8 {
        let mut index = start;
        loop {
            let bit = self.get_bool(probs[index >> 1]);
            let entry = tree[index + usize::from(bit)];
            if entry <= 0 {
                return -entry;
            }
            index = entry as usize;
        }
    }
}

#[derive(Default)]
pub(crate) struct BoolEncoder {
    output:    Vec<u8>,
    range:     u32,
    bottom:    u32,
    bit_count: i32
}

impl BoolEncoder {
    pub fn new() -> BoolEncoder {
        BoolEncoder {
            output:    Vec::new(),
            range:     255,
            bottom:    0,
            bit_count: 24
        }
    }

    /// Propagate a carry back through any 0xFF bytes
    fn add_one_to_output(&mut self) {
        let mut i = self.output.len();
        while i > 0 {
            i -= 1;
            if self.output[i] == 255 {
                self.output[i] = 0;
            } else {
                self.output[i] += 1;
                break;
            }
        }
    }

    /// Encode one boolean with probability `prob` of being zero
    pub fn put_bool(&mut self, bit: bool, prob: Prob) {
        let split = 1 + (((self.range - 1) * u32::from(prob)) >> 8);

        if bit {
            self.bottom += split;
            self.range -= split;
        } else {
            self.range = split;
        }

        while self.range < 128 {
            self.range <<= 1;
            if self.bottom & (1 << 31) != 0 {
                self.add_one_to_output();
            }
            self.bottom <<= 1;
            self.bit_count -= 1;
            if self.bit_count == 0 {
                self.output.push((self.bottom >> 24) as u8);
                self.bottom &= 0x00FF_FFFF;
                self.bit_count = 8;
            }
        }
    }

    pub fn put_flag(&mut self, bit: bool) {
        self.put_bool(bit, PROB_HALF);
    }

    /// Encode an `n` bit unsigned literal, most significant bit first
    pub fn put_literal(&mut self, value: u32, n: u8) {
        for shift in (0..n).rev() {
            self.put_flag((value >> shift) & 1 == 1);
        }
    }

    /// Encode a sign-and-magnitude value
    pub fn put_signed(&mut self, value: i32, n: u8) {
        self.put_literal(value.unsigned_abs(), n);
        self.put_flag(value < 0);
    }

    /// Encode a tree-structured value starting at an inner node,
    /// mirroring [BoolDecoder::read_tree_from]
    pub fn put_tree_from(&mut self, tree: &[i8], probs: &[Prob], value: i8, start: usize) {
        // collect the path from `start`, trees are tiny
        let mut path = [false; 12];
        let mut depth = 0;
        let mut found = false;

        fn walk(
            tree: &[i8], index: usize, value: i8, path: &mut [bool; 12], depth: &mut usize,
            found: &mut bool
        ) {
            for side in 0..2_usize {
                let entry = tree[index + side];
                path[*depth] = side == 1;
                *depth += 1;
                if entry <= 0 {
                    if -entry == value {
                        *found = true;
                        return;
                    }
                } else {
                    walk(tree, entry as usize, value, path, depth, found);
                    if *found {
                        return;
                    }
                }
                *depth -= 1;
            }
        }
        walk(tree, start, value, &mut path, &mut depth, &mut found);
        debug_assert!(found, "value not present in tree");

        let mut index = start;
        for &bit in &path[..depth] {
            self.put_bool(bit, probs[index >> 1]);
            let entry = tree[index + usize::from(bit)];
            if entry <= 0 {
                break;
            }
            index = entry as usize;
        }
    }

    /// Encode a tree-structured value, walking the tree to the leaf
    /// and emitting each branch decision
    pub fn put_tree(&mut self, tree: &[i8], probs: &[Prob], value: i8) {
        self.put_tree_from(tree, probs, value, 0);
    }

    /// Flush the final bits and return the stream
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..32 {
            if self.bottom & (1 << 31) != 0 {
                self.add_one_to_output();
            }
            self.bottom <<= 1;
            self.bit_count -= 1;
            if self.bit_count == 0 {
                self.output.push((self.bottom >> 24) as u8);
                self.bottom &= 0x00FF_FFFF;
                self.bit_count = 8;
            }
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_round_trip() {
        let bits = [
            (true, 10), (false, 250), (true, 128), (true, 1), (false, 128),
            (true, 200), (false, 3), (false, 77), (true, 255), (false, 1)
        ];

        let mut encoder = BoolEncoder::new();
        for (bit, prob) in bits {
            encoder.put_bool(bit, prob);
        }
        let stream = encoder.finish();

        let mut decoder = BoolDecoder::new(&stream);
        for (bit, prob) in bits {
            assert_eq!(decoder.get_bool(prob), bit);
        }
    }

    #[test]
    fn literals_round_trip() {
        let mut encoder = BoolEncoder::new();
        encoder.put_literal(0x5A, 8);
        encoder.put_literal(3, 2);
        encoder.put_signed(-19, 6);
        encoder.put_literal(0x3FFF, 14);
        let stream = encoder.finish();

        let mut decoder = BoolDecoder::new(&stream);
        assert_eq!(decoder.get_literal(8), 0x5A);
        assert_eq!(decoder.get_literal(2), 3);
        assert_eq!(decoder.get_signed(6), -19);
        assert_eq!(decoder.get_literal(14), 0x3FFF);
    }

    #[test]
    fn trees_round_trip() {
        // the four-leaf uv mode tree shape
        const TREE: [i8; 6] = [-0, 2, -1, 4, -2, -3];
        const PROBS: [Prob; 3] = [142, 114, 183];

        let mut encoder = BoolEncoder::new();
        for value in [0_i8, 1, 2, 3, 3, 0, 2] {
            encoder.put_tree(&TREE, &PROBS, value);
        }
        let stream = encoder.finish();

        let mut decoder = BoolDecoder::new(&stream);
        for value in [0_i8, 1, 2, 3, 3, 0, 2] {
            assert_eq!(decoder.read_tree(&TREE, &PROBS), value);
        }
    }

    #[test]
    fn long_random_sequence_round_trips() {
        use nanorand::Rng;
        let mut rng = nanorand::WyRand::new_seed(7);

        let seq: Vec<(bool, Prob)> = (0..10_000)
            .map(|_| (rng.generate::<u8>() & 1 == 1, rng.generate::<u8>().max(1)))
            .collect();

        let mut encoder = BoolEncoder::new();
        for (bit, prob) in &seq {
            encoder.put_bool(*bit, *prob);
        }
        let stream = encoder.finish();

        let mut decoder = BoolDecoder::new(&stream);
        for (bit, prob) in &seq {
            assert_eq!(decoder.get_bool(*prob), *bit);
        }
    }
}

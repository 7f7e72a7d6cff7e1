//! Tables from RFC 1951 shared by the decoder and encoder

pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u64 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC: u64 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u64 = 2;

pub const DEFLATE_MAX_CODEWORD_LENGTH: usize = 15;
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_OFFSET_SYMS: usize = 32;
pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;

/// Order in which precode lengths are stored in a dynamic block header
pub const DEFLATE_PRECODE_LENS_PERMUTATION: [u8; DEFLATE_NUM_PRECODE_SYMS] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15
];

/// Base match length per length symbol (symbols 257..=285)
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258
];

/// Extra bits per length symbol
pub const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0
];

/// Base match distance per distance symbol
pub const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577
];

/// Extra bits per distance symbol
pub const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13
];

/// Codeword lengths of the fixed literal/length code
pub fn fixed_litlen_lengths() -> [u8; DEFLATE_NUM_LITLEN_SYMS] {
    let mut lens = [0_u8; DEFLATE_NUM_LITLEN_SYMS];
    let mut i = 0;
    while i < 144 {
        lens[i] = 8;
        i += 1;
    }
    while i < 256 {
        lens[i] = 9;
        i += 1;
    }
    while i < 280 {
        lens[i] = 7;
        i += 1;
    }
    while i < 288 {
        lens[i] = 8;
        i += 1;
    }
    lens
}

/// Codeword lengths of the fixed distance code
pub fn fixed_dist_lengths() -> [u8; DEFLATE_NUM_OFFSET_SYMS] {
    [5; DEFLATE_NUM_OFFSET_SYMS]
}

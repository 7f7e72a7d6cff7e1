//! Checksum helpers

/// Calculate the adler hash of the uncompressed data
///
/// Present in the trailer of every zlib stream
#[cfg(feature = "zlib")]
pub fn calc_adler_hash(data: &[u8]) -> u32 {
    use simd_adler32::Adler32;

    let mut hasher = Adler32::new();
    hasher.write(data);
    hasher.finish()
}

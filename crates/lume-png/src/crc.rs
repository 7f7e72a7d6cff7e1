//! CRC-32 as used by png chunks (polynomial 0xEDB88320)

/// The byte-at-a-time lookup table, built at compile time
const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Update a running crc with `data`.
///
/// Start with `u32::MAX`, the final crc is the complement of the
/// returned value.
pub fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    for byte in data {
        crc = CRC_TABLE[usize::from((crc as u8) ^ byte)] ^ (crc >> 8);
    }
    crc
}

/// CRC-32 of a complete buffer
pub fn crc32(data: &[u8]) -> u32 {
    !crc32_update(u32::MAX, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        // from the png specification's example calculation
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"IEND"), 0xAE42_6082);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data = b"hello png world";
        let mut crc = u32::MAX;
        crc = crc32_update(crc, &data[..5]);
        crc = crc32_update(crc, &data[5..]);
        assert_eq!(!crc, crc32(data));
    }
}

//! RIFF container walking and writing

use lume_core::bytestream::{ByteReader, ByteWriter};

use crate::errors::WebPErrors;

/// One chunk of the container
pub(crate) struct Chunk<'a> {
    pub fourcc: [u8; 4],
    pub data:   &'a [u8]
}

/// Split a webp file into its chunks.
///
/// Chunk payloads are padded to even sizes, the pad byte is not part
/// of the data. Unknown chunks are kept, callers skip what they
/// don't recognize.
pub(crate) fn parse_chunks(data: &[u8]) -> Result<Vec<Chunk>, WebPErrors> {
    let mut stream = ByteReader::new(data);

    if stream.get_fixed_bytes_or_zero::<4>() != *b"RIFF" {
        return Err(WebPErrors::InvalidMagicBytes);
    }
    let riff_size = stream.get_u32_le_err().map_err(|_| WebPErrors::Truncated)? as usize;
    if stream.get_fixed_bytes_or_zero::<4>() != *b"WEBP" {
        return Err(WebPErrors::InvalidMagicBytes);
    }
    // the RIFF size covers everything after the size field
    let end = (8 + riff_size).min(data.len());

    let mut chunks = Vec::new();
    while stream.position() + 8 <= end {
        let fourcc = stream
            .get_fixed_bytes_or_err::<4>()
            .map_err(|_| WebPErrors::Truncated)?;
        let size = stream.get_u32_le_err().map_err(|_| WebPErrors::Truncated)? as usize;

        let payload = stream
            .get_as_ref(size)
            .map_err(|_| WebPErrors::Truncated)?;

        // skip the pad byte of odd sized chunks
        if size % 2 == 1 {
            stream.skip(1);
        }
        chunks.push(Chunk {
            fourcc,
            data: payload
        });
    }
    Ok(chunks)
}

/// Split a bare chunk sequence, the layout inside an ANMF payload
pub(crate) fn parse_chunk_sequence(data: &[u8]) -> Result<Vec<Chunk>, WebPErrors> {
    let mut stream = ByteReader::new(data);
    let mut chunks = Vec::new();

    while stream.position() + 8 <= data.len() {
        let fourcc = stream
            .get_fixed_bytes_or_err::<4>()
            .map_err(|_| WebPErrors::Truncated)?;
        let size = stream.get_u32_le_err().map_err(|_| WebPErrors::Truncated)? as usize;
        let payload = stream
            .get_as_ref(size)
            .map_err(|_| WebPErrors::Truncated)?;
        if size % 2 == 1 {
            stream.skip(1);
        }
        chunks.push(Chunk {
            fourcc,
            data: payload
        });
    }
    Ok(chunks)
}

/// Assemble chunks into a RIFF/WEBP file
pub(crate) fn write_container(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let payload_size: usize = chunks
        .iter()
        .map(|(_, data)| 8 + data.len() + data.len() % 2)
        .sum();

    let mut writer = ByteWriter::with_capacity(12 + payload_size);
    writer.write_all(b"RIFF");
    writer.write_u32_le((4 + payload_size) as u32);
    writer.write_all(b"WEBP");

    for (fourcc, data) in chunks {
        writer.write_all(*fourcc);
        writer.write_u32_le(data.len() as u32);
        writer.write_all(data);
        if data.len() % 2 == 1 {
            writer.write_u8(0);
        }
    }
    writer.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_chunks_are_padded() {
        let file = write_container(&[(b"VP8L", vec![1, 2, 3])]);
        // RIFF(12) + header(8) + data(3) + pad(1)
        assert_eq!(file.len(), 24);

        let chunks = parse_chunks(&file).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0].fourcc, b"VP8L");
        assert_eq!(chunks[0].data, &[1, 2, 3]);
    }

    #[test]
    fn multiple_chunks_walk_in_order(){
        let file = write_container(&[
            (b"VP8X", vec![0; 10]),
            (b"EXIF", vec![9; 5]),
            (b"VP8 ", vec![7; 20])
        ]);
        let chunks = parse_chunks(&file).unwrap();
        let names: Vec<&[u8; 4]> = chunks.iter().map(|c| &c.fourcc).collect();
        assert_eq!(names, [b"VP8X", b"EXIF", b"VP8 "]);
    }

    #[test]
    fn non_riff_is_rejected() {
        assert!(parse_chunks(b"NOPE").is_err());
        assert!(parse_chunks(b"RIFF\x04\0\0\0WAVE").is_err());
    }
}

//! Chunk level writers used by the encoder

use lume_core::bytestream::ByteWriter;

use crate::crc::crc32_update;

/// Write one complete chunk, length + type + data + crc
pub(crate) fn write_chunk(name: &[u8; 4], data: &[u8], writer: &mut ByteWriter) {
    writer.write_u32_be(data.len() as u32);
    writer.write_all(name);
    writer.write_all(data);

    let mut crc = crc32_update(u32::MAX, name);
    crc = crc32_update(crc, data);
    writer.write_u32_be(!crc);
}

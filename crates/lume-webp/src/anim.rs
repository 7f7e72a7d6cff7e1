//! ANIM and ANMF chunk handling

use lume_core::bytestream::{ByteReader, ByteWriter};

use crate::errors::WebPErrors;

/// Container level animation parameters from an ANIM chunk
#[derive(Copy, Clone, Default)]
pub(crate) struct AnimParams {
    pub background: u32,
    pub loop_count: u16
}

/// One animation frame header from an ANMF chunk
#[derive(Copy, Clone)]
pub(crate) struct FrameHeader {
    pub x:           usize,
    pub y:           usize,
    pub width:       usize,
    pub height:      usize,
    pub duration_ms: u32,
    /// dispose to background after this frame
    pub dispose:     bool,
    /// alpha blend onto the canvas rather than overwrite
    pub blend:       bool
}

pub(crate) fn parse_anim(data: &[u8]) -> Result<AnimParams, WebPErrors> {
    if data.len() < 6 {
        return Err(WebPErrors::Truncated);
    }
    let mut stream = ByteReader::new(data);
    Ok(AnimParams {
        background: stream.get_u32_le(),
        loop_count: stream.get_u16_le()
    })
}

/// Parse an ANMF header, returning it plus the embedded payload
pub(crate) fn parse_anmf(data: &[u8]) -> Result<(FrameHeader, &[u8]), WebPErrors> {
    if data.len() < 16 {
        return Err(WebPErrors::Truncated);
    }
    let mut stream = ByteReader::new(data);

    // 24 bit fields, positions are stored halved
    let x = read_u24(&mut stream) * 2;
    let y = read_u24(&mut stream) * 2;
    let width = read_u24(&mut stream) + 1;
    let height = read_u24(&mut stream) + 1;
    let duration_ms = read_u24(&mut stream) as u32;
    let flags = stream.get_u8();

    let header = FrameHeader {
        x,
        y,
        width,
        height,
        duration_ms,
        dispose: flags & 1 == 1,
        blend: flags & 2 == 0
    };
    Ok((header, &data[16..]))
}

pub(crate) fn write_anim(params: &AnimParams) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(6);
    writer.write_u32_le(params.background);
    writer.write_u16_le(params.loop_count);
    writer.into_inner()
}

pub(crate) fn write_anmf(header: &FrameHeader, payload: &[u8]) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(16 + payload.len());
    write_u24(&mut writer, header.x / 2);
    write_u24(&mut writer, header.y / 2);
    write_u24(&mut writer, header.width - 1);
    write_u24(&mut writer, header.height - 1);
    write_u24(&mut writer, header.duration_ms as usize);
    let mut flags = 0_u8;
    if header.dispose {
        flags |= 1;
    }
    if !header.blend {
        flags |= 2;
    }
    writer.write_u8(flags);
    writer.write_all(payload);
    writer.into_inner()
}

fn read_u24(stream: &mut ByteReader) -> usize {
    let bytes = stream.get_fixed_bytes_or_zero::<3>();
    usize::from(bytes[0]) | usize::from(bytes[1]) << 8 | usize::from(bytes[2]) << 16
}

fn write_u24(writer: &mut ByteWriter, value: usize) {
    writer.write_u8(value as u8);
    writer.write_u8((value >> 8) as u8);
    writer.write_u8((value >> 16) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anmf_round_trips() {
        let header = FrameHeader {
            x: 4,
            y: 10,
            width: 100,
            height: 50,
            duration_ms: 120,
            dispose: true,
            blend: false
        };
        let chunk = write_anmf(&header, &[1, 2, 3]);
        let (parsed, payload) = parse_anmf(&chunk).unwrap();

        assert_eq!(parsed.x, 4);
        assert_eq!(parsed.y, 10);
        assert_eq!(parsed.width, 100);
        assert_eq!(parsed.height, 50);
        assert_eq!(parsed.duration_ms, 120);
        assert!(parsed.dispose);
        assert!(!parsed.blend);
        assert_eq!(payload, &[1, 2, 3]);
    }
}

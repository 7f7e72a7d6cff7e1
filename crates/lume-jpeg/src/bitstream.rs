//! Entropy segment bit I/O
//!
//! JPEG reads bits MSB first. Any 0xFF byte inside the entropy coded
//! segment is followed by a 0x00 stuffing byte which the reader drops
//! transparently; a 0xFF followed by anything else is a marker and
//! ends the segment. The writer mirrors this, inserting 0x00 after
//! every emitted 0xFF.

use lume_core::bytestream::ByteReader;

use crate::errors::DecodeErrors;
use crate::marker::Marker;

/// Bit reader over the entropy coded segment
pub(crate) struct BitStream {
    buffer:    u32,
    bits_left: u8,
    /// Marker that terminated the segment, if any
    pub marker: Option<Marker>
}

impl BitStream {
    pub fn new() -> BitStream {
        BitStream {
            buffer:    0,
            bits_left: 0,
            marker:    None
        }
    }

    /// Reset after a restart marker, predictors are the caller's job
    pub fn reset(&mut self) {
        self.buffer = 0;
        self.bits_left = 0;
        self.marker = None;
    }

    /// Pull one byte from the stream handling stuffing and markers.
    ///
    /// Once a marker is hit the reader feeds zero bytes, decoding of
    /// the current MCU finishes on padding as T.81 prescribes.
    fn next_byte(&mut self, reader: &mut ByteReader) -> u8 {
        if self.marker.is_some() {
            return 0;
        }
        let byte = reader.get_u8();

        if byte == 0xFF {
            let next = reader.get_u8();
            match next {
                // stuffing byte, drop it
                0x00 => 0xFF,
                _ => {
                    self.marker = Marker::from_u8(next);
                    if self.marker.is_none() {
                        // fill bytes are legal before a marker
                        reader.rewind(1);
                    }
                    0
                }
            }
        } else {
            byte
        }
    }

    #[inline(always)]
    fn refill(&mut self, reader: &mut ByteReader) {
        while self.bits_left <= 24 {
            let byte = self.next_byte(reader);
            self.buffer = (self.buffer << 8) | u32::from(byte);
            self.bits_left += 8;
        }
    }

    /// Read a single bit
    #[inline(always)]
    pub fn next_bit(&mut self, reader: &mut ByteReader) -> Result<u32, DecodeErrors> {
        if self.bits_left == 0 {
            self.refill(reader);
        }
        self.bits_left -= 1;
        Ok((self.buffer >> self.bits_left) & 1)
    }

    /// Read `n` magnitude bits, n at most 16
    #[inline(always)]
    pub fn receive(&mut self, reader: &mut ByteReader, n: u8) -> Result<i32, DecodeErrors> {
        if n == 0 {
            return Ok(0);
        }
        if self.bits_left < n {
            self.refill(reader);
        }
        self.bits_left -= n;
        Ok(((self.buffer >> self.bits_left) & ((1 << n) - 1)) as i32)
    }

    /// Throw away buffered bits, used before reading a restart marker
    pub fn align(&mut self) {
        self.bits_left = 0;
        self.buffer = 0;
    }
}

/// Sign-extend `value` read with `size` magnitude bits
/// (T.81 F.2.2.1 EXTEND)
#[inline(always)]
pub(crate) fn extend(value: i32, size: u8) -> i32 {
    if size == 0 {
        return 0;
    }
    if value < (1 << (size - 1)) {
        value - (1 << size) + 1
    } else {
        value
    }
}

/// Bit writer for the entropy coded segment, stuffs 0x00 after
/// every 0xFF byte and pads the tail with 1-bits
pub(crate) struct JpegBitWriter {
    out:       Vec<u8>,
    buffer:    u32,
    bits_used: u8
}

impl JpegBitWriter {
    pub fn new() -> JpegBitWriter {
        JpegBitWriter {
            out:       Vec::new(),
            buffer:    0,
            bits_used: 0
        }
    }

    #[inline(always)]
    pub fn put_bits(&mut self, bits: u32, n: u8) {
        debug_assert!(n <= 24);
        self.buffer = (self.buffer << n) | (bits & ((1_u32 << n) - 1));
        self.bits_used += n;

        while self.bits_used >= 8 {
            self.bits_used -= 8;
            let byte = ((self.buffer >> self.bits_used) & 0xFF) as u8;
            self.out.push(byte);
            if byte == 0xFF {
                self.out.push(0x00);
            }
        }
    }

    /// Pad to a byte boundary with 1-bits and return the bytes
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let pad = 8 - self.bits_used;
            self.put_bits((1 << pad) - 1, pad);
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_stuffs_ff_bytes() {
        let mut writer = JpegBitWriter::new();
        writer.put_bits(0xFF, 8);
        writer.put_bits(0xAB, 8);
        let out = writer.finish();
        assert_eq!(out, [0xFF, 0x00, 0xAB]);
    }

    #[test]
    fn reader_drops_stuffing() {
        let data = [0xFF, 0x00, 0x80];
        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new();

        let v = stream.receive(&mut reader, 8).unwrap();
        assert_eq!(v, 0xFF);
        let v = stream.receive(&mut reader, 8).unwrap();
        assert_eq!(v, 0x80);
    }

    #[test]
    fn reader_stops_at_marker() {
        let data = [0xAA, 0xFF, 0xD9];
        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new();

        let v = stream.receive(&mut reader, 8).unwrap();
        assert_eq!(v, 0xAA);
        // pull more bits, they must be zero padding
        let _ = stream.receive(&mut reader, 16).unwrap();
        assert_eq!(stream.marker, Some(Marker::EOI));
    }

    #[test]
    fn extend_sign_extends_categories() {
        // T.81 table F.1 examples
        assert_eq!(extend(0, 1), -1);
        assert_eq!(extend(1, 1), 1);
        assert_eq!(extend(0b00, 2), -3);
        assert_eq!(extend(0b11, 2), 3);
    }
}

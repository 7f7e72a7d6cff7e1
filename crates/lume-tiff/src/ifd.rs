//! IFD entry reading and tag constants (TIFF 6.0 baseline)

use lume_core::bytestream::ByteReader;

use crate::errors::TiffErrors;

pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_COMPRESSION: u16 = 259;
pub const TAG_PHOTOMETRIC: u16 = 262;
pub const TAG_STRIP_OFFSETS: u16 = 273;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;
pub const TAG_ROWS_PER_STRIP: u16 = 278;
pub const TAG_STRIP_BYTE_COUNTS: u16 = 279;
pub const TAG_X_RESOLUTION: u16 = 282;
pub const TAG_Y_RESOLUTION: u16 = 283;
pub const TAG_RESOLUTION_UNIT: u16 = 296;
pub const TAG_EXTRA_SAMPLES: u16 = 338;

pub const TYPE_BYTE: u16 = 1;
pub const TYPE_SHORT: u16 = 3;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_RATIONAL: u16 = 5;

/// One directory entry, value still in raw form
#[derive(Copy, Clone)]
pub struct IfdEntry {
    pub tag:        u16,
    pub field_type: u16,
    pub count:      u32,
    /// the 4 value/offset bytes, interpretation depends on size
    pub raw:        [u8; 4]
}

impl IfdEntry {
    pub fn read(stream: &mut ByteReader) -> Result<IfdEntry, TiffErrors> {
        let tag = stream.get_u16_le_err()?;
        let field_type = stream.get_u16_le_err()?;
        let count = stream.get_u32_le_err()?;
        let raw = stream.get_fixed_bytes_or_err::<4>()?;

        Ok(IfdEntry {
            tag,
            field_type,
            count,
            raw
        })
    }

    /// Byte size of one value of this entry's type
    fn type_size(&self) -> Option<usize> {
        match self.field_type {
            TYPE_BYTE => Some(1),
            TYPE_SHORT => Some(2),
            TYPE_LONG => Some(4),
            TYPE_RATIONAL => Some(8),
            _ => None
        }
    }

    /// Read all values as unsigned integers, following the offset
    /// indirection when they don't fit the 4 inline bytes.
    ///
    /// Rationals resolve to numerator / denominator rounded.
    pub fn values(&self, file: &[u8]) -> Result<Vec<u32>, TiffErrors> {
        let size = self.type_size().ok_or_else(|| {
            TiffErrors::Malformed(format!(
                "Unknown field type {} for tag {}",
                self.field_type, self.tag
            ))
        })?;

        let count = self.count as usize;
        let total = size.checked_mul(count).ok_or(TiffErrors::Malformed(
            "Entry size overflow".to_string()
        ))?;

        let bytes: &[u8] = if total <= 4 {
            &self.raw[..total]
        } else {
            let offset = u32::from_le_bytes(self.raw) as usize;
            file.get(offset..offset + total).ok_or_else(|| {
                TiffErrors::Malformed(format!("Entry offset {offset} out of bounds"))
            })?
        };

        let mut values = Vec::with_capacity(count);
        for chunk in bytes.chunks_exact(size) {
            let value = match self.field_type {
                TYPE_BYTE => u32::from(chunk[0]),
                TYPE_SHORT => u32::from(u16::from_le_bytes(chunk.try_into().unwrap())),
                TYPE_LONG => u32::from_le_bytes(chunk.try_into().unwrap()),
                TYPE_RATIONAL => {
                    let num = u32::from_le_bytes(chunk[..4].try_into().unwrap());
                    let den = u32::from_le_bytes(chunk[4..].try_into().unwrap());
                    if den == 0 {
                        0
                    } else {
                        (num + den / 2) / den
                    }
                }
                _ => unreachable!()
            };
            values.push(value);
        }
        Ok(values)
    }
}

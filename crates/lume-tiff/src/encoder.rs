use lume_core::bytestream::ByteWriter;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;

use log::trace;

use crate::errors::TiffErrors;
use crate::ifd::{
    TAG_BITS_PER_SAMPLE, TAG_COMPRESSION, TAG_EXTRA_SAMPLES, TAG_IMAGE_LENGTH, TAG_IMAGE_WIDTH,
    TAG_PHOTOMETRIC, TAG_RESOLUTION_UNIT, TAG_ROWS_PER_STRIP, TAG_SAMPLES_PER_PIXEL,
    TAG_STRIP_BYTE_COUNTS, TAG_STRIP_OFFSETS, TAG_X_RESOLUTION, TAG_Y_RESOLUTION, TYPE_LONG,
    TYPE_RATIONAL, TYPE_SHORT
};

/// Aim strips at roughly this many bytes
const STRIP_TARGET: usize = 8 * 1024;

/// A page pending encoding
struct PendingPage {
    data:       Vec<u8>,
    width:      usize,
    height:     usize,
    colorspace: ColorSpace
}

/// One directory entry with its resolved value bytes
struct TagValue {
    tag:        u16,
    field_type: u16,
    count:      u32,
    /// little endian encoded values, inlined or spilled past the IFD
    payload:    Vec<u8>
}

/// A TIFF encoder producing little endian multi-page files.
///
/// Pages are added one at a time with their own dimensions, every
/// page's IFD links to the next and the last one carries a zero
/// next-offset.
pub struct TiffEncoder {
    options: EncoderOptions,
    pages:   Vec<PendingPage>
}

impl TiffEncoder {
    pub fn new(options: EncoderOptions) -> TiffEncoder {
        TiffEncoder {
            options,
            pages: Vec::new()
        }
    }

    /// Append a page.
    ///
    /// Unlike single-image formats every page carries its own
    /// geometry, so dimensions are per call rather than from the
    /// options. Input must be 8 bit Luma, RGB or RGBA.
    pub fn add_page(
        &mut self, data: &[u8], width: usize, height: usize, colorspace: ColorSpace
    ) -> Result<(), TiffErrors> {
        let components = match colorspace {
            ColorSpace::Luma => 1_usize,
            ColorSpace::RGB => 3,
            ColorSpace::RGBA => 4,
            _ => {
                return Err(TiffErrors::Unsupported(
                    "tiff input must be Luma, RGB or RGBA".to_string()
                ))
            }
        };
        if width == 0 || height == 0 {
            return Err(TiffErrors::GenericStatic("Zero width or height"));
        }
        if data.len() != width * height * components {
            return Err(TiffErrors::Malformed(format!(
                "Page data length mismatch, expected {} but found {}",
                width * height * components,
                data.len()
            )));
        }

        self.pages.push(PendingPage {
            data: data.to_vec(),
            width,
            height,
            colorspace
        });
        Ok(())
    }

    /// Add a page whose geometry comes from the encoder options
    pub fn add_page_from_options(&mut self, data: &[u8]) -> Result<(), TiffErrors> {
        let (w, h) = (self.options.width(), self.options.height());
        let colorspace = self.options.colorspace();
        self.add_page(data, w, h, colorspace)
    }

    /// Encode all pages into a tiff file
    pub fn encode(&mut self) -> Result<Vec<u8>, TiffErrors> {
        if self.pages.is_empty() {
            return Err(TiffErrors::GenericStatic("No pages to encode"));
        }

        let mut writer = ByteWriter::with_capacity(
            self.pages.iter().map(|p| p.data.len()).sum::<usize>() + 1024
        );

        // header: byte order, magic, offset to first IFD (patched in)
        writer.write_all(b"II");
        writer.write_u16_le(42);
        let first_ifd_patch = writer.bytes_written();
        writer.write_u32_le(0);

        let mut prev_next_patch = first_ifd_patch;

        for (index, page) in self.pages.iter().enumerate() {
            trace!("Writing page {index}, {}x{}", page.width, page.height);

            let components = page.colorspace.num_components();
            let row_bytes = page.width * components;
            let rows_per_strip = (STRIP_TARGET / row_bytes).clamp(1, page.height);

            // pixel strips first, their offsets land in the IFD
            let mut strip_offsets = Vec::new();
            let mut strip_byte_counts = Vec::new();

            for strip in page.data.chunks(rows_per_strip * row_bytes) {
                strip_offsets.push(writer.bytes_written() as u32);
                strip_byte_counts.push(strip.len() as u32);
                writer.write_all(strip);
            }

            // IFDs must start on a word boundary
            if writer.bytes_written() % 2 != 0 {
                writer.write_u8(0);
            }
            let ifd_offset = writer.bytes_written() as u32;
            writer.write_at(prev_next_patch, &ifd_offset.to_le_bytes());

            prev_next_patch = self.write_ifd(
                &mut writer,
                page,
                rows_per_strip,
                &strip_offsets,
                &strip_byte_counts
            );
        }

        // the final IFD's next pointer stays zero
        Ok(writer.into_inner())
    }

    /// Write one IFD, returning the position of its next-IFD pointer
    /// for later patching
    fn write_ifd(
        &self, writer: &mut ByteWriter, page: &PendingPage, rows_per_strip: usize,
        strip_offsets: &[u32], strip_byte_counts: &[u32]
    ) -> usize {
        let components = page.colorspace.num_components();
        let has_alpha = page.colorspace == ColorSpace::RGBA;
        let photometric: u16 = if components == 1 { 1 } else { 2 };
        // 72 dpi unless the caller set something; resolution is a
        // plain rational with denominator 1
        let dpi = 72_u32;

        let mut tags: Vec<TagValue> = Vec::new();

        tags.push(long_tag(TAG_IMAGE_WIDTH, &[page.width as u32]));
        tags.push(long_tag(TAG_IMAGE_LENGTH, &[page.height as u32]));
        tags.push(short_tag(TAG_BITS_PER_SAMPLE, &vec![8_u16; components]));
        tags.push(short_tag(TAG_COMPRESSION, &[1]));
        tags.push(short_tag(TAG_PHOTOMETRIC, &[photometric]));
        tags.push(long_tag(TAG_STRIP_OFFSETS, strip_offsets));
        tags.push(short_tag(TAG_SAMPLES_PER_PIXEL, &[components as u16]));
        tags.push(long_tag(TAG_ROWS_PER_STRIP, &[rows_per_strip as u32]));
        tags.push(long_tag(TAG_STRIP_BYTE_COUNTS, strip_byte_counts));
        tags.push(rational_tag(TAG_X_RESOLUTION, dpi, 1));
        tags.push(rational_tag(TAG_Y_RESOLUTION, dpi, 1));
        tags.push(short_tag(TAG_RESOLUTION_UNIT, &[2]));
        if has_alpha {
            // unassociated alpha
            tags.push(short_tag(TAG_EXTRA_SAMPLES, &[2]));
        }

        // tags must be emitted in ascending id order
        debug_assert!(tags.windows(2).all(|w| w[0].tag < w[1].tag));

        let entry_count = tags.len();
        let ifd_start = writer.bytes_written();
        // spilled values land right after the next-IFD pointer
        let mut spill_offset = ifd_start + 2 + entry_count * 12 + 4;

        writer.write_u16_le(entry_count as u16);

        let mut spill: Vec<u8> = Vec::new();
        for tag in &tags {
            writer.write_u16_le(tag.tag);
            writer.write_u16_le(tag.field_type);
            writer.write_u32_le(tag.count);

            if tag.payload.len() <= 4 {
                let mut inline = [0_u8; 4];
                inline[..tag.payload.len()].copy_from_slice(&tag.payload);
                writer.write_all(&inline);
            } else {
                writer.write_u32_le(spill_offset as u32);
                spill.extend_from_slice(&tag.payload);
                spill_offset += tag.payload.len();
            }
        }

        let next_patch = writer.bytes_written();
        writer.write_u32_le(0);
        writer.write_all(&spill);

        next_patch
    }
}

fn short_tag(tag: u16, values: &[u16]) -> TagValue {
    TagValue {
        tag,
        field_type: TYPE_SHORT,
        count: values.len() as u32,
        payload: values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

fn long_tag(tag: u16, values: &[u32]) -> TagValue {
    TagValue {
        tag,
        field_type: TYPE_LONG,
        count: values.len() as u32,
        payload: values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

fn rational_tag(tag: u16, num: u32, den: u32) -> TagValue {
    let mut payload = num.to_le_bytes().to_vec();
    payload.extend_from_slice(&den.to_le_bytes());
    TagValue {
        tag,
        field_type: TYPE_RATIONAL,
        count: 1,
        payload
    }
}

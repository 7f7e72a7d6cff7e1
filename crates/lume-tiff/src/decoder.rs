use lume_core::bytestream::ByteReader;
use lume_core::colorspace::ColorSpace;
use lume_core::options::DecoderOptions;

use log::{trace, warn};

use crate::errors::TiffErrors;
use crate::ifd::{
    IfdEntry, TAG_BITS_PER_SAMPLE, TAG_COMPRESSION, TAG_EXTRA_SAMPLES, TAG_IMAGE_LENGTH,
    TAG_IMAGE_WIDTH, TAG_PHOTOMETRIC, TAG_RESOLUTION_UNIT, TAG_ROWS_PER_STRIP,
    TAG_SAMPLES_PER_PIXEL, TAG_STRIP_BYTE_COUNTS, TAG_STRIP_OFFSETS, TAG_X_RESOLUTION,
    TAG_Y_RESOLUTION
};

/// Hard cap on the IFD chain, a cycle guard
const MAX_PAGES: usize = 4096;

/// Everything one page needs for decoding
pub(crate) struct PageInfo {
    pub width:             usize,
    pub height:            usize,
    pub samples_per_pixel: usize,
    pub photometric:       u16,
    pub rows_per_strip:    usize,
    pub strip_offsets:     Vec<u32>,
    pub strip_byte_counts: Vec<u32>,
    /// resolution as (x, y, unit), unit 2 = inch, 3 = cm
    pub resolution:        Option<(u32, u32, u16)>,
    /// value of an ExtraSamples tag, 2 is unassociated alpha
    pub extra_samples:     Option<u16>
}

/// A TIFF decoder for little endian files with uncompressed
/// 8 bit grayscale, RGB or RGBA strips.
///
/// Multi-page files expose every page, [`pages`](Self::pages) after
/// header decoding tells how many
pub struct TiffDecoder<'a> {
    data:            &'a [u8],
    options:         DecoderOptions,
    pages:           Vec<PageInfo>,
    decoded_headers: bool
}

impl<'a> TiffDecoder<'a> {
    pub fn new(data: &'a [u8]) -> TiffDecoder<'a> {
        TiffDecoder::new_with_options(data, DecoderOptions::default())
    }

    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> TiffDecoder<'a> {
        TiffDecoder {
            data,
            options,
            pages: Vec::new(),
            decoded_headers: false
        }
    }

    /// Walk the IFD chain collecting page information
    pub fn decode_headers(&mut self) -> Result<(), TiffErrors> {
        if self.decoded_headers {
            return Ok(());
        }
        let mut stream = ByteReader::new(self.data);

        let magic = stream.get_fixed_bytes_or_zero::<4>();
        if &magic == b"MM\0*" {
            return Err(TiffErrors::Unsupported("big endian byte order".to_string()));
        }
        if &magic != b"II*\0" {
            return Err(TiffErrors::InvalidMagicBytes);
        }

        let mut ifd_offset = stream.get_u32_le_err()? as usize;

        while ifd_offset != 0 {
            if self.pages.len() >= MAX_PAGES {
                return Err(TiffErrors::Malformed("IFD chain too long".to_string()));
            }
            if ifd_offset >= self.data.len() {
                return Err(TiffErrors::Malformed(format!(
                    "IFD offset {ifd_offset} out of bounds"
                )));
            }
            stream.set_position(ifd_offset);

            let entry_count = stream.get_u16_le_err()?;
            let page = self.read_ifd(&mut stream, entry_count)?;
            self.pages.push(page);

            ifd_offset = stream.get_u32_le_err()? as usize;
        }

        if self.pages.is_empty() {
            return Err(TiffErrors::Malformed("File contains no IFDs".to_string()));
        }
        trace!("Found {} page(s)", self.pages.len());
        self.decoded_headers = true;
        Ok(())
    }

    fn read_ifd(
        &self, stream: &mut ByteReader, entry_count: u16
    ) -> Result<PageInfo, TiffErrors> {
        let mut width = 0_usize;
        let mut height = 0_usize;
        let mut samples_per_pixel = 1_usize;
        let mut bits_per_sample: Vec<u32> = vec![8];
        let mut photometric = 1_u16;
        let mut compression = 1_u32;
        let mut rows_per_strip = usize::MAX;
        let mut strip_offsets = Vec::new();
        let mut strip_byte_counts = Vec::new();
        let mut x_resolution = None;
        let mut y_resolution = None;
        let mut resolution_unit = 2_u16;
        let mut extra_samples = None;

        for _ in 0..entry_count {
            let entry = IfdEntry::read(stream)?;

            match entry.tag {
                TAG_IMAGE_WIDTH => width = first_value(&entry, self.data)? as usize,
                TAG_IMAGE_LENGTH => height = first_value(&entry, self.data)? as usize,
                TAG_BITS_PER_SAMPLE => bits_per_sample = entry.values(self.data)?,
                TAG_COMPRESSION => compression = first_value(&entry, self.data)?,
                TAG_PHOTOMETRIC => photometric = first_value(&entry, self.data)? as u16,
                TAG_STRIP_OFFSETS => strip_offsets = entry.values(self.data)?,
                TAG_SAMPLES_PER_PIXEL => {
                    samples_per_pixel = first_value(&entry, self.data)? as usize;
                }
                TAG_ROWS_PER_STRIP => rows_per_strip = first_value(&entry, self.data)? as usize,
                TAG_STRIP_BYTE_COUNTS => strip_byte_counts = entry.values(self.data)?,
                TAG_X_RESOLUTION => x_resolution = Some(first_value(&entry, self.data)?),
                TAG_Y_RESOLUTION => y_resolution = Some(first_value(&entry, self.data)?),
                TAG_RESOLUTION_UNIT => {
                    resolution_unit = first_value(&entry, self.data)? as u16;
                }
                TAG_EXTRA_SAMPLES => {
                    extra_samples = Some(first_value(&entry, self.data)? as u16);
                }
                _ => {
                    // unknown tags are ignored per the specification
                    trace!("Ignoring tag {}", entry.tag);
                }
            }
        }

        // validate against the supported subset
        if compression != 1 {
            return Err(TiffErrors::Unsupported(format!(
                "compression {compression}, only uncompressed strips are handled"
            )));
        }
        if !matches!(photometric, 0 | 1 | 2) {
            return Err(TiffErrors::Unsupported(format!(
                "photometric interpretation {photometric}"
            )));
        }
        if photometric == 2 && !matches!(samples_per_pixel, 3 | 4) {
            return Err(TiffErrors::Unsupported(format!(
                "RGB with {samples_per_pixel} samples per pixel"
            )));
        }
        if photometric != 2 && samples_per_pixel != 1 {
            return Err(TiffErrors::Unsupported(format!(
                "grayscale with {samples_per_pixel} samples per pixel"
            )));
        }
        if bits_per_sample.len() != samples_per_pixel
            || bits_per_sample.iter().any(|b| *b != 8)
        {
            return Err(TiffErrors::Unsupported(format!(
                "bits per sample {bits_per_sample:?}"
            )));
        }
        if width == 0 || height == 0 {
            return Err(TiffErrors::Malformed("Zero width or height".to_string()));
        }
        if width > self.options.max_width() {
            return Err(TiffErrors::TooLargeDimensions(
                "width",
                self.options.max_width(),
                width
            ));
        }
        if height > self.options.max_height() {
            return Err(TiffErrors::TooLargeDimensions(
                "height",
                self.options.max_height(),
                height
            ));
        }
        if strip_offsets.is_empty() || strip_offsets.len() != strip_byte_counts.len() {
            return Err(TiffErrors::Malformed(
                "Mismatched strip offsets and byte counts".to_string()
            ));
        }

        let resolution = match (x_resolution, y_resolution) {
            (Some(x), Some(y)) => Some((x, y, resolution_unit)),
            _ => None
        };

        Ok(PageInfo {
            width,
            height,
            samples_per_pixel,
            photometric,
            rows_per_strip: rows_per_strip.min(height),
            strip_offsets,
            strip_byte_counts,
            resolution,
            extra_samples
        })
    }

    /// Number of pages in the file
    pub fn pages(&mut self) -> Result<usize, TiffErrors> {
        self.decode_headers()?;
        Ok(self.pages.len())
    }

    /// Dimensions of one page
    pub fn dimensions(&mut self, page: usize) -> Result<(usize, usize), TiffErrors> {
        self.decode_headers()?;
        let info = self
            .pages
            .get(page)
            .ok_or(TiffErrors::PageOutOfBounds(page, self.pages.len()))?;
        Ok((info.width, info.height))
    }

    /// Colorspace of one page's decoded output
    pub fn colorspace(&mut self, page: usize) -> Result<ColorSpace, TiffErrors> {
        self.decode_headers()?;
        let info = self
            .pages
            .get(page)
            .ok_or(TiffErrors::PageOutOfBounds(page, self.pages.len()))?;
        Ok(match (info.photometric, info.samples_per_pixel) {
            (2, 4) => ColorSpace::RGBA,
            (2, _) => ColorSpace::RGB,
            _ => ColorSpace::Luma
        })
    }

    /// Resolution of one page in dots per inch, if present
    pub fn dpi(&mut self, page: usize) -> Result<Option<(u32, u32)>, TiffErrors> {
        self.decode_headers()?;
        let info = self
            .pages
            .get(page)
            .ok_or(TiffErrors::PageOutOfBounds(page, self.pages.len()))?;

        Ok(info.resolution.map(|(x, y, unit)| match unit {
            // centimeters to inches
            3 => (x * 254 / 100, y * 254 / 100),
            _ => (x, y)
        }))
    }

    /// Decode one page into interleaved samples, top row first
    pub fn decode_page(&mut self, page: usize) -> Result<Vec<u8>, TiffErrors> {
        self.decode_headers()?;
        let info = self
            .pages
            .get(page)
            .ok_or(TiffErrors::PageOutOfBounds(page, self.pages.len()))?;

        let row_bytes = info.width * info.samples_per_pixel;
        let expected = row_bytes * info.height;
        let mut out = Vec::with_capacity(expected);

        for (offset, count) in info.strip_offsets.iter().zip(&info.strip_byte_counts) {
            let start = *offset as usize;
            let len = *count as usize;
            let strip = self.data.get(start..start + len).ok_or_else(|| {
                TiffErrors::Malformed(format!("Strip at {start}+{len} out of bounds"))
            })?;
            out.extend_from_slice(strip);

            if out.len() >= expected {
                break;
            }
        }

        if out.len() < expected {
            return Err(TiffErrors::Malformed(format!(
                "Strips supply {} bytes, page needs {expected}",
                out.len()
            )));
        }
        out.truncate(expected);

        // WhiteIsZero grayscale stores inverted intensities
        if info.photometric == 0 {
            warn!("WhiteIsZero image, inverting samples");
            for v in out.iter_mut() {
                *v = 255 - *v;
            }
        }
        Ok(out)
    }

    /// Decode the primary (first) page
    pub fn decode(&mut self) -> Result<Vec<u8>, TiffErrors> {
        self.decode_page(0)
    }
}

fn first_value(entry: &IfdEntry, file: &[u8]) -> Result<u32, TiffErrors> {
    entry
        .values(file)?
        .first()
        .copied()
        .ok_or_else(|| TiffErrors::Malformed(format!("Tag {} has no values", entry.tag)))
}

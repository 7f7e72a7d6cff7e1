use lume_core::bytestream::ByteReader;
use lume_core::colorspace::ColorSpace;
use lume_core::options::DecoderOptions;
use lume_core::result::DecodingResult;
use lume_inflate::{DeflateDecoder, DeflateOptions};

use log::trace;

use crate::constants::{
    ADAM7_X_START, ADAM7_X_STEP, ADAM7_Y_START, ADAM7_Y_STEP, PNG_SIGNATURE
};
use crate::enums::{FilterMethod, InterlaceMethod, PngChunkType, PngColor};
use crate::error::PngErrors;
use crate::filters::unfilter;

/// A palette entry.
///
/// The alpha field is used if the image has a tRNS
/// chunk and a PLTE chunk.
#[derive(Copy, Clone)]
pub(crate) struct PLTEEntry {
    pub red:   u8,
    pub green: u8,
    pub blue:  u8,
    pub alpha: u8
}

impl Default for PLTEEntry {
    fn default() -> Self {
        // a tRNS chunk may contain fewer values than there are palette
        // entries, the alpha for all remaining entries is 255
        PLTEEntry {
            red:   0,
            green: 0,
            blue:  0,
            alpha: 255
        }
    }
}

#[derive(Copy, Clone)]
pub(crate) struct PngChunk {
    pub length:     usize,
    pub chunk_type: PngChunkType,
    pub chunk:      [u8; 4],
    pub crc:        u32
}

/// Represents PNG information that can be extracted
/// from a png file.
///
/// The properties are read from the IHDR chunk
#[derive(Default, Debug, Copy, Clone)]
pub struct PngInfo {
    pub width:            usize,
    pub height:           usize,
    pub depth:            u8,
    pub color:            PngColor,
    pub interlace_method: InterlaceMethod,
    /// Pixels per meter on the x axis, from an optional pHYs chunk
    pub ppm_x:            u32,
    /// Pixels per meter on the y axis, from an optional pHYs chunk
    pub ppm_y:            u32
}

/// A PNG decoder instance.
///
/// Instantiate with [new](PngDecoder::new) or
/// [new_with_options](PngDecoder::new_with_options), then call
/// [`decode`](PngDecoder::decode) to get the pixels.
///
/// # Note
/// The decoder expands images less than 8 bits per pixel to
/// 8 bits per pixel
pub struct PngDecoder<'a> {
    pub(crate) stream:       ByteReader<'a>,
    pub(crate) options:      DecoderOptions,
    pub(crate) png_info:     PngInfo,
    pub(crate) palette:      Vec<PLTEEntry>,
    pub(crate) idat_chunks:  Vec<u8>,
    pub(crate) gama:         f32,
    pub(crate) trns_bytes:   [u16; 4],
    pub(crate) seen_gamma:   bool,
    pub(crate) seen_hdr:     bool,
    pub(crate) seen_ptle:    bool,
    pub(crate) seen_trns:    bool,
    pub(crate) seen_phys:    bool,
    pub(crate) seen_headers: bool
}

impl<'a> PngDecoder<'a> {
    pub fn new(data: &'a [u8]) -> PngDecoder<'a> {
        PngDecoder::new_with_options(data, DecoderOptions::default())
    }

    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> PngDecoder<'a> {
        PngDecoder {
            stream: ByteReader::new(data),
            options,
            png_info: PngInfo::default(),
            palette: Vec::new(),
            idat_chunks: Vec::with_capacity(37), // randomly chosen size, my favourite number
            gama: 0.0,
            trns_bytes: [0; 4],
            seen_gamma: false,
            seen_hdr: false,
            seen_ptle: false,
            seen_trns: false,
            seen_phys: false,
            seen_headers: false
        }
    }

    /// Get image dimensions or none if they aren't decoded
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        if !self.seen_hdr {
            return None;
        }
        Some((self.png_info.width, self.png_info.height))
    }

    /// Get the depth of the image as written in the header
    pub const fn depth(&self) -> Option<u8> {
        if !self.seen_hdr {
            return None;
        }
        Some(self.png_info.depth)
    }

    /// Get image gamma from an optional gAMA chunk
    pub const fn gamma(&self) -> Option<f32> {
        if self.seen_gamma {
            Some(self.gama)
        } else {
            None
        }
    }

    /// Get image resolution as (x, y) pixels per meter from an
    /// optional pHYs chunk
    pub const fn pixels_per_meter(&self) -> Option<(u32, u32)> {
        if self.seen_phys {
            Some((self.png_info.ppm_x, self.png_info.ppm_y))
        } else {
            None
        }
    }

    /// Return the header information of the image
    pub const fn info(&self) -> Option<&PngInfo> {
        if !self.seen_hdr {
            return None;
        }
        Some(&self.png_info)
    }

    /// Return the palette of an indexed image, entries are RGBA
    pub fn palette(&self) -> Option<Vec<[u8; 4]>> {
        if !self.seen_ptle {
            return None;
        }
        Some(
            self.palette
                .iter()
                .map(|e| [e.red, e.green, e.blue, e.alpha])
                .collect()
        )
    }

    /// Get the colorspace the decoded pixels will be in,
    /// accounting for palette expansion and tRNS promotion
    pub fn colorspace(&self) -> Option<ColorSpace> {
        if !self.seen_hdr {
            return None;
        }
        if !self.seen_trns {
            match self.png_info.color {
                PngColor::Palette => Some(ColorSpace::RGB),
                PngColor::Luma => Some(ColorSpace::Luma),
                PngColor::LumaA => Some(ColorSpace::LumaA),
                PngColor::RGB => Some(ColorSpace::RGB),
                PngColor::RGBA => Some(ColorSpace::RGBA),
                PngColor::Unknown => None
            }
        } else {
            // a tRNS chunk promotes RGB=>RGBA and Luma=>LumaA
            match self.png_info.color {
                PngColor::Palette | PngColor::RGB => Some(ColorSpace::RGBA),
                PngColor::Luma => Some(ColorSpace::LumaA),
                PngColor::LumaA => Some(ColorSpace::LumaA),
                PngColor::RGBA => Some(ColorSpace::RGBA),
                PngColor::Unknown => None
            }
        }
    }

    pub(crate) fn read_chunk_header(&mut self) -> Result<PngChunk, PngErrors> {
        // Format is length - chunk type - [data] - crc
        let chunk_length = self.stream.get_u32_be_err()? as usize;
        let chunk_type_int = self.stream.get_u32_be_err()?.to_be_bytes();

        let chunk_type = match &chunk_type_int {
            b"IHDR" => PngChunkType::IHDR,
            b"PLTE" => PngChunkType::PLTE,
            b"IDAT" => PngChunkType::IDAT,
            b"IEND" => PngChunkType::IEND,
            b"tRNS" => PngChunkType::tRNS,
            b"gAMA" => PngChunkType::gAMA,
            b"pHYs" => PngChunkType::pHYs,
            _ => PngChunkType::unkn
        };

        if !self.stream.has(chunk_length + 4 /*crc*/) {
            let err = format!(
                "Not enough bytes for chunk {:?}, bytes requested are {}, but bytes present are {}",
                chunk_type,
                chunk_length + 4,
                self.stream.remaining()
            );
            return Err(PngErrors::Generic(err));
        }

        let crc = {
            let crc_ref = self.stream.peek_at(chunk_length, 4)?;
            u32::from_be_bytes(crc_ref.try_into().unwrap())
        };

        #[cfg(feature = "crc")]
        {
            if self.options.png_confirm_crc() {
                use crate::crc::crc32_update;

                // crc covers chunk type + chunk data
                let mut calc = crc32_update(u32::MAX, &chunk_type_int);
                calc = crc32_update(calc, self.stream.peek_at(0, chunk_length)?);
                let calc = !calc;

                if crc != calc {
                    return Err(PngErrors::BadCrc(crc, calc));
                }
            }
        }

        Ok(PngChunk {
            length: chunk_length,
            chunk: chunk_type_int,
            chunk_type,
            crc
        })
    }

    /// Decode headers up to the first IDAT chunk
    pub fn decode_headers(&mut self) -> Result<(), PngErrors> {
        if self.seen_headers {
            return Ok(());
        }
        let signature = self.stream.get_u64_be_err()?;

        if signature != PNG_SIGNATURE {
            return Err(PngErrors::BadSignature);
        }

        // first chunk must be IHDR
        if self.stream.peek_at(4, 4)? != b"IHDR" {
            return Err(PngErrors::GenericStatic("First chunk not IHDR, corrupt PNG"));
        }

        loop {
            let header = self.read_chunk_header()?;
            // chunk parsers consume at most `length` bytes, the cursor
            // is repositioned past data + crc centrally
            let data_start = self.stream.position();

            match header.chunk_type {
                PngChunkType::IHDR => self.parse_ihdr(header)?,
                PngChunkType::PLTE => self.parse_plte(header)?,
                PngChunkType::IDAT => self.parse_idat(header)?,
                PngChunkType::tRNS => self.parse_trns(header)?,
                PngChunkType::gAMA => self.parse_gama(header)?,
                PngChunkType::pHYs => self.parse_phys(header)?,
                PngChunkType::IEND => break,
                PngChunkType::unkn => self.check_unknown_chunk(header)?
            }
            self.stream.set_position(data_start + header.length + 4);
        }
        self.seen_headers = true;
        Ok(())
    }

    pub(crate) fn check_unknown_chunk(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        // ancillary bit, lowercase means safe to ignore
        if chunk.chunk[0] & 32 == 0 {
            return Err(PngErrors::UnknownCriticalChunk(chunk.chunk));
        }
        trace!("Skipping unknown chunk {:?}", core::str::from_utf8(&chunk.chunk));
        Ok(())
    }

    /// Decode a png encoded image and return the pixels.
    ///
    /// 8 bit (and expanded lower depth) images return
    /// [`DecodingResult::U8`], 16 bit images return
    /// [`DecodingResult::U16`] with native endian samples
    pub fn decode(&mut self) -> Result<DecodingResult, PngErrors> {
        if !self.seen_headers {
            self.decode_headers()?;
        }
        let info = self.png_info;
        let colorspace = self
            .colorspace()
            .ok_or(PngErrors::GenericStatic("No colorspace"))?;

        trace!("Colorspace: {:?}", colorspace);

        // inflate the concatenated IDAT stream
        let raw = self.inflate()?;

        // undo filters producing packed scanlines
        let unfiltered = match info.interlace_method {
            InterlaceMethod::Standard => {
                self.unfilter_image(&raw, info.width, info.height, 0)?
            }
            InterlaceMethod::Adam7 => self.deinterlace(&raw)?
        };

        // expand palette / trns / sub-byte samples into the final layout
        if info.depth == 16 {
            let out = self.expand_16_bit(&unfiltered, colorspace)?;
            return Ok(DecodingResult::U16(out));
        }
        let out = self.expand_8_bit(&unfiltered, colorspace)?;

        Ok(DecodingResult::U8(out))
    }

    /// Inflate the concatenated IDAT chunks
    pub(crate) fn inflate(&mut self) -> Result<Vec<u8>, PngErrors> {
        let expected = self.expected_filtered_size();

        let options = DeflateOptions::default()
            .set_confirm_checksum(self.options.inflate_confirm_adler())
            .set_size_hint(expected)
            .set_limit(self.options.inflate_limit().min(expected + 1));

        let mut decoder = DeflateDecoder::new_with_options(&self.idat_chunks, options);
        let data = decoder.decode_zlib()?;

        if data.len() < expected {
            return Err(PngErrors::Generic(format!(
                "Not enough pixel data, expected {expected} but found {}",
                data.len()
            )));
        }
        Ok(data)
    }

    /// Size of the filtered scanline stream for the whole image
    fn expected_filtered_size(&self) -> usize {
        let info = &self.png_info;

        match info.interlace_method {
            InterlaceMethod::Standard => {
                (self.scanline_bytes(info.width) + 1) * info.height
            }
            InterlaceMethod::Adam7 => {
                let mut size = 0;
                for pass in 0..7 {
                    let (w, h) = self.pass_dimensions(pass);
                    if w > 0 && h > 0 {
                        size += (self.scanline_bytes(w) + 1) * h;
                    }
                }
                size
            }
        }
    }

    /// Bytes one packed scanline of `width` pixels occupies
    fn scanline_bytes(&self, width: usize) -> usize {
        let info = &self.png_info;
        let bits = width * info.color.num_components() * usize::from(info.depth);
        bits.div_ceil(8)
    }

    /// Bytes a whole pixel occupies, the filter unit
    fn filter_bpp(&self) -> usize {
        let info = &self.png_info;
        (info.color.num_components() * usize::from(info.depth)).div_ceil(8)
    }

    /// Dimensions of one Adam7 pass
    fn pass_dimensions(&self, pass: usize) -> (usize, usize) {
        let info = &self.png_info;
        let w = (info.width + ADAM7_X_STEP[pass] - 1 - ADAM7_X_START[pass]) / ADAM7_X_STEP[pass];
        let h = (info.height + ADAM7_Y_STEP[pass] - 1 - ADAM7_Y_START[pass]) / ADAM7_Y_STEP[pass];
        (w, h)
    }

    /// Reconstruct `height` scanlines of `width` pixels starting at
    /// `offset` in the filtered stream, returning packed rows
    fn unfilter_image(
        &self, raw: &[u8], width: usize, height: usize, offset: usize
    ) -> Result<Vec<u8>, PngErrors> {
        let scanline = self.scanline_bytes(width);
        let bpp = self.filter_bpp();

        let mut out = vec![0_u8; scanline * height];

        for y in 0..height {
            let in_start = offset + y * (scanline + 1);
            if in_start + 1 + scanline > raw.len() {
                return Err(PngErrors::GenericStatic("Filtered stream too short"));
            }
            let filter_byte = raw[in_start];
            let filter = FilterMethod::from_int(filter_byte)
                .ok_or(PngErrors::Generic(format!("Unknown filter type {filter_byte}")))?;

            let (before, after) = out.split_at_mut(y * scanline);
            let current = &mut after[..scanline];
            current.copy_from_slice(&raw[in_start + 1..in_start + 1 + scanline]);

            let prev: &[u8] = if y == 0 { &[] } else { &before[(y - 1) * scanline..] };

            unfilter(filter, bpp, prev, current);
        }
        Ok(out)
    }

    /// Reconstruct all seven Adam7 passes and interleave them into
    /// sequential packed rows
    fn deinterlace(&self, raw: &[u8]) -> Result<Vec<u8>, PngErrors> {
        let info = self.png_info;
        let final_scanline = self.scanline_bytes(info.width);
        let mut out = vec![0_u8; final_scanline * info.height];

        let components = info.color.num_components();
        let depth = usize::from(info.depth);
        let mut offset = 0;

        for pass in 0..7 {
            let (w, h) = self.pass_dimensions(pass);
            if w == 0 || h == 0 {
                continue;
            }
            let sub = self.unfilter_image(raw, w, h, offset)?;
            offset += (self.scanline_bytes(w) + 1) * h;

            let sub_scanline = self.scanline_bytes(w);

            // splat pass pixels into their final positions
            for sy in 0..h {
                let y = ADAM7_Y_START[pass] + sy * ADAM7_Y_STEP[pass];
                for sx in 0..w {
                    let x = ADAM7_X_START[pass] + sx * ADAM7_X_STEP[pass];

                    copy_packed_pixel(
                        &sub[sy * sub_scanline..],
                        sx,
                        &mut out[y * final_scanline..(y + 1) * final_scanline],
                        x,
                        components,
                        depth
                    );
                }
            }
        }
        Ok(out)
    }

    /// Expand packed 1/2/4/8 bit scanlines into the output colorspace
    fn expand_8_bit(
        &self, packed: &[u8], colorspace: ColorSpace
    ) -> Result<Vec<u8>, PngErrors> {
        let info = self.png_info;
        let out_components = colorspace.num_components();
        let mut out = vec![0_u8; info.width * info.height * out_components];

        let scanline = self.scanline_bytes(info.width);
        let depth = info.depth;

        for y in 0..info.height {
            let row = &packed[y * scanline..(y + 1) * scanline];
            let out_row =
                &mut out[y * info.width * out_components..(y + 1) * info.width * out_components];

            for x in 0..info.width {
                let samples = read_packed_samples(row, x, info.color.num_components(), depth);
                self.write_pixel(&samples, &mut out_row[x * out_components..], colorspace)?;
            }
        }
        Ok(out)
    }

    /// Write one pixel worth of samples into the output layout,
    /// applying palette, tRNS and sample scaling
    fn write_pixel(
        &self, samples: &[u16; 4], out: &mut [u8], colorspace: ColorSpace
    ) -> Result<(), PngErrors> {
        let info = &self.png_info;
        let scale = sample_scale(info.depth);

        match info.color {
            PngColor::Palette => {
                let index = samples[0] as usize;
                if index >= self.palette.len() {
                    return Err(PngErrors::PaletteIndexOutOfBounds(index, self.palette.len()));
                }
                let entry = self.palette[index];
                out[0] = entry.red;
                out[1] = entry.green;
                out[2] = entry.blue;
                if colorspace == ColorSpace::RGBA {
                    out[3] = entry.alpha;
                }
            }
            PngColor::Luma => {
                let v = (samples[0] * scale) as u8;
                out[0] = v;
                if colorspace == ColorSpace::LumaA {
                    // tRNS gray key
                    out[1] = if samples[0] == self.trns_bytes[0] { 0 } else { 255 };
                }
            }
            PngColor::LumaA => {
                out[0] = (samples[0] * scale) as u8;
                out[1] = (samples[1] * scale) as u8;
            }
            PngColor::RGB => {
                out[0] = samples[0] as u8;
                out[1] = samples[1] as u8;
                out[2] = samples[2] as u8;
                if colorspace == ColorSpace::RGBA {
                    let matches = samples[0] == self.trns_bytes[0]
                        && samples[1] == self.trns_bytes[1]
                        && samples[2] == self.trns_bytes[2];
                    out[3] = if matches { 0 } else { 255 };
                }
            }
            PngColor::RGBA => {
                out[0] = samples[0] as u8;
                out[1] = samples[1] as u8;
                out[2] = samples[2] as u8;
                out[3] = samples[3] as u8;
            }
            PngColor::Unknown => unreachable!()
        }
        Ok(())
    }

    /// Expand 16 bit scanlines, applying tRNS promotion
    fn expand_16_bit(
        &self, packed: &[u8], colorspace: ColorSpace
    ) -> Result<Vec<u16>, PngErrors> {
        let info = self.png_info;
        let in_components = info.color.num_components();
        let out_components = colorspace.num_components();

        if info.color == PngColor::Palette {
            return Err(PngErrors::Unsupported("16 bit palette images"));
        }

        let mut out = vec![0_u16; info.width * info.height * out_components];
        let scanline = self.scanline_bytes(info.width);

        for y in 0..info.height {
            let row = &packed[y * scanline..(y + 1) * scanline];
            for x in 0..info.width {
                let mut samples = [0_u16; 4];
                for (c, sample) in samples.iter_mut().take(in_components).enumerate() {
                    let pos = (x * in_components + c) * 2;
                    *sample = u16::from_be_bytes([row[pos], row[pos + 1]]);
                }

                let out_pos = (y * info.width + x) * out_components;
                out[out_pos..out_pos + in_components]
                    .copy_from_slice(&samples[..in_components]);

                if out_components == in_components + 1 {
                    // tRNS promotion
                    let transparent = match info.color {
                        PngColor::Luma => samples[0] == self.trns_bytes[0],
                        PngColor::RGB => {
                            samples[0] == self.trns_bytes[0]
                                && samples[1] == self.trns_bytes[1]
                                && samples[2] == self.trns_bytes[2]
                        }
                        _ => false
                    };
                    out[out_pos + in_components] = if transparent { 0 } else { u16::MAX };
                }
            }
        }
        Ok(out)
    }
}

/// Read the samples of pixel `x` from a packed row
fn read_packed_samples(row: &[u8], x: usize, components: usize, depth: u8) -> [u16; 4] {
    let mut samples = [0_u16; 4];

    match depth {
        8 => {
            for (c, sample) in samples.iter_mut().take(components).enumerate() {
                *sample = u16::from(row[x * components + c]);
            }
        }
        16 => {
            for (c, sample) in samples.iter_mut().take(components).enumerate() {
                let pos = (x * components + c) * 2;
                *sample = u16::from_be_bytes([row[pos], row[pos + 1]]);
            }
        }
        1 | 2 | 4 => {
            // sub-byte depths only occur with one component
            let bits = usize::from(depth);
            let bit_pos = x * bits;
            let byte = row[bit_pos / 8];
            let shift = 8 - bits - (bit_pos % 8);
            samples[0] = u16::from((byte >> shift) & ((1 << bits) - 1));
        }
        _ => unreachable!()
    }
    samples
}

/// Scale factor expanding a sub-byte sample to the 0-255 range.
///
/// Palette indices are never scaled, handled at the call site.
fn sample_scale(depth: u8) -> u16 {
    match depth {
        1 => 255,
        2 => 85,
        4 => 17,
        _ => 1
    }
}

/// Copy a packed pixel between rows at possibly different x positions
fn copy_packed_pixel(
    src_row: &[u8], sx: usize, dst_row: &mut [u8], dx: usize, components: usize, depth: usize
) {
    if depth >= 8 {
        let bytes = components * depth / 8;
        let src = &src_row[sx * bytes..(sx + 1) * bytes];
        dst_row[dx * bytes..(dx + 1) * bytes].copy_from_slice(src);
    } else {
        let src_bit = sx * depth;
        let value = (src_row[src_bit / 8] >> (8 - depth - (src_bit % 8))) & ((1 << depth) - 1);

        let dst_bit = dx * depth;
        let shift = 8 - depth - (dst_bit % 8);
        let byte = &mut dst_row[dst_bit / 8];
        *byte &= !(((1 << depth) - 1) << shift) as u8;
        *byte |= value << shift;
    }
}


use lume_core::bytestream::ByteReader;
use lume_core::log::trace;
use lume_core::options::DecoderOptions;
use lume_lzw::LzwDecoder;

use crate::enums::DisposalMethod;
use crate::errors::GifDecoderErrors;

/// Row traversal order of the four GIF interlace passes
const INTERLACE_START: [usize; 4] = [0, 4, 2, 1];
const INTERLACE_STEP: [usize; 4] = [8, 8, 4, 2];

/// One decoded frame, already composited against the canvas
pub struct GifFrame {
    /// Full canvas RGBA pixels
    pub pixels:    Vec<u8>,
    /// Frame delay in hundredths of a second
    pub delay_cs:  u16,
    /// How this frame's area is disposed before the next one
    pub disposal:  DisposalMethod,
    /// Transparent palette index, if the frame declared one
    pub transparent: Option<u8>
}

#[derive(Default)]
struct GraphicControl {
    delay_cs:    u16,
    disposal:    DisposalMethod,
    transparent: Option<u8>
}

pub struct GifDecoder<'a> {
    stream:       ByteReader<'a>,
    options:      DecoderOptions,
    width:        usize,
    height:       usize,
    flags:        u8,
    bgindex:      u8,
    ratio:        u8,
    read_headers: bool,
    loop_count:   Option<u16>,
    pal:          [[u8; 4]; 256],
    global_pal_size: usize
}

impl<'a> GifDecoder<'a> {
    pub fn new(data: &'a [u8]) -> GifDecoder<'a> {
        GifDecoder::new_with_options(data, DecoderOptions::default())
    }
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> GifDecoder<'a> {
        GifDecoder {
            stream: ByteReader::new(data),
            options,
            width: 0,
            height: 0,
            flags: 0,
            bgindex: 0,
            ratio: 0,
            read_headers: false,
            loop_count: None,
            pal: [[0, 0, 0, 255]; 256],
            global_pal_size: 0
        }
    }

    /// Parse the header, logical screen descriptor and global
    /// color table
    pub fn decode_headers(&mut self) -> Result<(), GifDecoderErrors> {
        if self.read_headers {
            return Ok(());
        }
        if !test_gif(&mut self.stream) {
            return Err(GifDecoderErrors::NotAGif);
        }

        self.width = usize::from(self.stream.get_u16_le_err()?);
        self.height = usize::from(self.stream.get_u16_le_err()?);

        self.flags = self.stream.get_u8_err()?;
        self.bgindex = self.stream.get_u8_err()?;
        self.ratio = self.stream.get_u8_err()?;

        if self.width == 0 || self.height == 0 {
            return Err(GifDecoderErrors::Static("Zero width or height"));
        }
        if self.width > self.options.max_width() {
            return Err(GifDecoderErrors::TooLargeDimensions(
                "width",
                self.options.max_width(),
                self.width
            ));
        }
        if self.height > self.options.max_height() {
            return Err(GifDecoderErrors::TooLargeDimensions(
                "height",
                self.options.max_height(),
                self.height
            ));
        }
        // global color table flag
        if (self.flags & 0x80) > 0 {
            self.global_pal_size = 2 << (self.flags & 0b111);
            self.parse_colortable_global()?;
        }
        trace!("Image width  :{}", self.width);
        trace!("Image height :{}", self.height);
        trace!("Ratio: {}", self.ratio);
        self.read_headers = true;

        Ok(())
    }

    fn parse_colortable_global(&mut self) -> Result<(), GifDecoderErrors> {
        for pos in 0..self.global_pal_size {
            let rgb = self.stream.get_fixed_bytes_or_err::<3>()?;
            self.pal[pos] = [rgb[0], rgb[1], rgb[2], 255];
        }
        Ok(())
    }

    /// Image dimensions or None before headers are decoded
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        if !self.read_headers {
            return None;
        }
        Some((self.width, self.height))
    }

    /// Loop count from a NETSCAPE2.0 extension, 0 loops forever.
    ///
    /// Only known after decoding, the extension sits between frames
    pub const fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }

    /// Size in bytes of one full canvas RGBA frame
    pub fn output_buf_size(&self) -> Option<usize> {
        if self.read_headers {
            return self.width.checked_mul(self.height)?.checked_mul(4);
        }
        None
    }

    /// Decode every frame in the stream.
    ///
    /// Frames come back as full canvas RGBA buffers, composited
    /// according to each predecessor's disposal method
    pub fn decode_all(&mut self) -> Result<Vec<GifFrame>, GifDecoderErrors> {
        self.decode_headers()?;

        let canvas_size = self
            .output_buf_size()
            .ok_or(GifDecoderErrors::OverflowError(
                "cannot calculate output dimensions"
            ))?;

        let mut frames = Vec::new();
        let mut canvas = vec![0_u8; canvas_size];
        let mut control = GraphicControl::default();
        let mut index_scratch: Vec<u8> = Vec::new();

        loop {
            let block = self.stream.get_u8_err()?;

            match block {
                0x2C => {
                    // image descriptor
                    let frame = self.decode_frame(&mut canvas, &control, &mut index_scratch)?;
                    frames.push(frame);
                    control = GraphicControl::default();

                    if !self.options.decode_animated() {
                        break;
                    }
                }
                0x21 => {
                    // extension block
                    let label = self.stream.get_u8_err()?;
                    match label {
                        0xF9 => control = self.parse_graphic_control()?,
                        0xFF => self.parse_application_extension()?,
                        _ => {
                            // comment, plain text, anything else
                            self.skip_sub_blocks()?;
                        }
                    }
                }
                0x3B => break,
                _ => {
                    return Err(GifDecoderErrors::Static("Unknown block id, corrupt gif"));
                }
            }
        }

        if frames.is_empty() {
            return Err(GifDecoderErrors::Static("Gif contains no image data"));
        }
        Ok(frames)
    }

    fn parse_graphic_control(&mut self) -> Result<GraphicControl, GifDecoderErrors> {
        let size = self.stream.get_u8_err()?;
        if size != 4 {
            return Err(GifDecoderErrors::Static("Bad graphic control block size"));
        }
        let flags = self.stream.get_u8_err()?;
        let delay_cs = self.stream.get_u16_le_err()?;
        let transparent_idx = self.stream.get_u8_err()?;

        // block terminator
        if self.stream.get_u8_err()? != 0 {
            return Err(GifDecoderErrors::Static("Missing graphic control terminator"));
        }

        Ok(GraphicControl {
            delay_cs,
            disposal: DisposalMethod::from_flags((flags & 0x1C) >> 2),
            transparent: ((flags & 1) == 1).then_some(transparent_idx)
        })
    }

    fn parse_application_extension(&mut self) -> Result<(), GifDecoderErrors> {
        let size = self.stream.get_u8_err()?;
        if size == 11 {
            let ident = self.stream.get_fixed_bytes_or_err::<11>()?;
            if &ident == b"NETSCAPE2.0" {
                // one sub-block: id 1 + little endian loop count
                let sub_size = self.stream.get_u8_err()?;
                if sub_size == 3 && self.stream.get_u8_err()? == 1 {
                    self.loop_count = Some(self.stream.get_u16_le_err()?);
                    trace!("Loop count: {:?}", self.loop_count);
                } else {
                    self.stream.skip(usize::from(sub_size).saturating_sub(1));
                }
            }
        } else {
            self.stream.skip(usize::from(size));
        }
        self.skip_sub_blocks()
    }

    fn skip_sub_blocks(&mut self) -> Result<(), GifDecoderErrors> {
        loop {
            let size = self.stream.get_u8_err()?;
            if size == 0 {
                return Ok(());
            }
            if !self.stream.has(usize::from(size)) {
                return Err(GifDecoderErrors::Static("Truncated sub-blocks"));
            }
            self.stream.skip(usize::from(size));
        }
    }

    /// Concatenate data sub-blocks into `out`
    fn read_sub_blocks(&mut self, out: &mut Vec<u8>) -> Result<(), GifDecoderErrors> {
        out.clear();
        loop {
            let size = self.stream.get_u8_err()?;
            if size == 0 {
                return Ok(());
            }
            let data = self.stream.get_as_ref(usize::from(size))?;
            out.extend_from_slice(data);
        }
    }

    /// Decode one image block, drawing it onto the canvas and
    /// snapshotting the result
    fn decode_frame(
        &mut self, canvas: &mut [u8], control: &GraphicControl, scratch: &mut Vec<u8>
    ) -> Result<GifFrame, GifDecoderErrors> {
        let left = usize::from(self.stream.get_u16_le_err()?);
        let top = usize::from(self.stream.get_u16_le_err()?);
        let frame_width = usize::from(self.stream.get_u16_le_err()?);
        let frame_height = usize::from(self.stream.get_u16_le_err()?);
        let flags = self.stream.get_u8_err()?;

        if frame_width == 0 || frame_height == 0 {
            return Err(GifDecoderErrors::Static("Zero sized frame"));
        }
        if left + frame_width > self.width || top + frame_height > self.height {
            return Err(GifDecoderErrors::Static("Frame exceeds logical screen"));
        }

        let interlaced = (flags & 0x40) != 0;

        // a local color table shadows the global one for this frame
        let mut local_pal = self.pal;
        let mut pal_size = self.global_pal_size;
        if (flags & 0x80) != 0 {
            pal_size = 2 << (flags & 0b111);
            for entry in local_pal.iter_mut().take(pal_size) {
                let rgb = self.stream.get_fixed_bytes_or_err::<3>()?;
                *entry = [rgb[0], rgb[1], rgb[2], 255];
            }
        }
        if pal_size == 0 {
            return Err(GifDecoderErrors::Static("Frame without any color table"));
        }

        let min_code_size = self.stream.get_u8_err()?;

        let mut compressed = Vec::new();
        self.read_sub_blocks(&mut compressed)?;

        scratch.clear();
        LzwDecoder::new(min_code_size)?.decode_into(
            &compressed,
            scratch,
            frame_width * frame_height
        )?;
        if scratch.len() < frame_width * frame_height {
            return Err(GifDecoderErrors::Static("LZW data shorter than frame"));
        }

        // snapshot for restore-to-previous disposal
        let previous = if control.disposal == DisposalMethod::Restore {
            Some(canvas.to_vec())
        } else {
            None
        };

        // draw indices onto the canvas, interlaced frames store rows
        // in four passes
        let mut src_row = 0_usize;
        let mut draw_row = |y: usize, src_row: usize| -> Result<(), GifDecoderErrors> {
            for x in 0..frame_width {
                let index = usize::from(scratch[src_row * frame_width + x]);
                if Some(index as u8) == control.transparent {
                    continue;
                }
                if index >= pal_size {
                    return Err(GifDecoderErrors::PaletteIndexOutOfBounds(index, pal_size));
                }
                let pos = ((top + y) * self.width + left + x) * 4;
                canvas[pos..pos + 4].copy_from_slice(&local_pal[index]);
            }
            Ok(())
        };

        if interlaced {
            for pass in 0..4 {
                let mut y = INTERLACE_START[pass];
                while y < frame_height {
                    draw_row(y, src_row)?;
                    src_row += 1;
                    y += INTERLACE_STEP[pass];
                }
            }
        } else {
            for y in 0..frame_height {
                draw_row(y, src_row)?;
                src_row += 1;
            }
        }

        let frame = GifFrame {
            pixels:      canvas.to_vec(),
            delay_cs:    control.delay_cs,
            disposal:    control.disposal,
            transparent: control.transparent
        };

        // dispose the frame's area in preparation for the next frame
        match control.disposal {
            DisposalMethod::None | DisposalMethod::InPlace => {}
            DisposalMethod::Background => {
                for y in top..top + frame_height {
                    let start = (y * self.width + left) * 4;
                    canvas[start..start + frame_width * 4].fill(0);
                }
            }
            DisposalMethod::Restore => {
                if let Some(previous) = previous {
                    canvas.copy_from_slice(&previous);
                }
            }
        }

        Ok(frame)
    }
}

fn test_gif(buffer: &mut ByteReader) -> bool {
    if buffer.get_u8() != b'G'
        || buffer.get_u8() != b'I'
        || buffer.get_u8() != b'F'
        || buffer.get_u8() != b'8'
    {
        return false;
    }
    let sz = buffer.get_u8();
    if sz != b'9' && sz != b'7' {
        return false;
    }
    if buffer.get_u8() != b'a' {
        return false;
    }
    true
}

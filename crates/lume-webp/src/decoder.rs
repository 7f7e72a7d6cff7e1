use lume_core::options::DecoderOptions;

use log::trace;

use crate::anim::{parse_anim, parse_anmf};
use crate::errors::WebPErrors;
use crate::riff::{parse_chunk_sequence, parse_chunks, Chunk};
use crate::yuv::planes_to_rgba;
use crate::{vp8, vp8l};

/// One decoded frame, full canvas RGBA
pub struct WebPFrame {
    pub pixels:      Vec<u8>,
    /// display duration in milliseconds, zero for still images
    pub duration_ms: u32
}

/// A WebP decoder handling VP8 lossy, VP8L lossless and animated
/// files.
///
/// All frames come back as full canvas RGBA buffers regardless of
/// the payload flavor.
pub struct WebPDecoder<'a> {
    data:            &'a [u8],
    options:         DecoderOptions,
    width:           usize,
    height:          usize,
    lossless:        bool,
    animated:        bool,
    loop_count:      u16,
    exif_data:       Option<Vec<u8>>,
    xmp_data:        Option<Vec<u8>>,
    decoded_headers: bool
}

impl<'a> WebPDecoder<'a> {
    pub fn new(data: &'a [u8]) -> WebPDecoder<'a> {
        WebPDecoder::new_with_options(data, DecoderOptions::default())
    }

    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> WebPDecoder<'a> {
        WebPDecoder {
            data,
            options,
            width: 0,
            height: 0,
            lossless: false,
            animated: false,
            loop_count: 0,
            exif_data: None,
            xmp_data: None,
            decoded_headers: false
        }
    }

    /// Parse the container, extracting dimensions and metadata
    /// without touching pixel data
    pub fn decode_headers(&mut self) -> Result<(), WebPErrors> {
        if self.decoded_headers {
            return Ok(());
        }
        let chunks = parse_chunks(self.data)?;
        if chunks.is_empty() {
            return Err(WebPErrors::Malformed("Empty container".to_string()));
        }

        for chunk in &chunks {
            match &chunk.fourcc {
                b"VP8X" => {
                    if chunk.data.len() < 10 {
                        return Err(WebPErrors::Truncated);
                    }
                    let flags = chunk.data[0];
                    self.animated = flags & 0x02 != 0;
                    // canvas size is stored minus one in 24 bit fields
                    self.width = read_u24(&chunk.data[4..7]) + 1;
                    self.height = read_u24(&chunk.data[7..10]) + 1;
                }
                b"VP8 " => {
                    if !self.animated && self.width == 0 && chunk.data.len() >= 10 {
                        self.width = (u16::from_le_bytes([chunk.data[6], chunk.data[7]])
                            & 0x3FFF) as usize;
                        self.height = (u16::from_le_bytes([chunk.data[8], chunk.data[9]])
                            & 0x3FFF) as usize;
                    }
                }
                b"VP8L" => {
                    if !self.animated && self.width == 0 && chunk.data.len() >= 5 {
                        let bits = u32::from_le_bytes([
                            chunk.data[1],
                            chunk.data[2],
                            chunk.data[3],
                            chunk.data[4]
                        ]);
                        self.width = (bits & 0x3FFF) as usize + 1;
                        self.height = ((bits >> 14) & 0x3FFF) as usize + 1;
                        self.lossless = true;
                    }
                }
                b"ANIM" => {
                    let params = parse_anim(chunk.data)?;
                    self.loop_count = params.loop_count;
                }
                b"EXIF" => self.exif_data = Some(chunk.data.to_vec()),
                b"XMP " => self.xmp_data = Some(chunk.data.to_vec()),
                _ => {
                    trace!("Skipping chunk {:?}", core::str::from_utf8(&chunk.fourcc));
                }
            }
        }

        if self.width == 0 || self.height == 0 {
            return Err(WebPErrors::Malformed("No image chunk found".to_string()));
        }
        if self.width > self.options.max_width() {
            return Err(WebPErrors::TooLargeDimensions(
                "width",
                self.options.max_width(),
                self.width
            ));
        }
        if self.height > self.options.max_height() {
            return Err(WebPErrors::TooLargeDimensions(
                "height",
                self.options.max_height(),
                self.height
            ));
        }
        self.decoded_headers = true;
        Ok(())
    }

    /// Canvas dimensions or None before headers are decoded
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        if !self.decoded_headers {
            return None;
        }
        Some((self.width, self.height))
    }

    /// Whether the payload is lossless VP8L
    pub const fn is_lossless(&self) -> bool {
        self.lossless
    }

    /// Animation loop count, 0 loops forever
    pub const fn loop_count(&self) -> u16 {
        self.loop_count
    }

    /// EXIF payload, opaque
    pub fn exif(&self) -> Option<&[u8]> {
        self.exif_data.as_deref()
    }

    /// XMP payload, opaque
    pub fn xmp(&self) -> Option<&[u8]> {
        self.xmp_data.as_deref()
    }

    /// Decode every frame
    pub fn decode_all(&mut self) -> Result<Vec<WebPFrame>, WebPErrors> {
        self.decode_headers()?;

        let chunks = parse_chunks(self.data)?;

        if self.animated {
            return self.decode_animation(&chunks);
        }

        // a still image, the first image chunk wins
        for chunk in &chunks {
            match &chunk.fourcc {
                b"VP8 " => {
                    let pixels = self.decode_lossy(chunk.data)?;
                    return Ok(vec![WebPFrame {
                        pixels,
                        duration_ms: 0
                    }]);
                }
                b"VP8L" => {
                    let pixels = self.decode_lossless(chunk.data)?;
                    return Ok(vec![WebPFrame {
                        pixels,
                        duration_ms: 0
                    }]);
                }
                _ => {}
            }
        }
        Err(WebPErrors::Malformed("No image chunk found".to_string()))
    }

    fn decode_lossy(&self, data: &[u8]) -> Result<Vec<u8>, WebPErrors> {
        let frame = vp8::decoder::decode(data, self.options.max_width(), self.options.max_height())?;
        Ok(planes_to_rgba(
            &frame.y,
            &frame.u,
            &frame.v,
            frame.luma_stride,
            frame.chroma_stride,
            frame.width,
            frame.height
        ))
    }

    fn decode_lossless(&self, data: &[u8]) -> Result<Vec<u8>, WebPErrors> {
        let (width, height, _alpha, argb) =
            vp8l::decoder::decode(data, self.options.max_width(), self.options.max_height())?;

        let mut out = Vec::with_capacity(width * height * 4);
        for pixel in argb {
            out.push((pixel >> 16) as u8);
            out.push((pixel >> 8) as u8);
            out.push(pixel as u8);
            out.push((pixel >> 24) as u8);
        }
        Ok(out)
    }

    fn decode_animation(&self, chunks: &[Chunk]) -> Result<Vec<WebPFrame>, WebPErrors> {
        let mut frames = Vec::new();
        let mut canvas = vec![0_u8; self.width * self.height * 4];

        for chunk in chunks {
            if &chunk.fourcc != b"ANMF" {
                continue;
            }
            let (header, payload) = parse_anmf(chunk.data)?;

            if header.x + header.width > self.width || header.y + header.height > self.height {
                return Err(WebPErrors::Malformed("Frame exceeds canvas".to_string()));
            }

            // the payload carries the frame's own image chunks
            let mut frame_pixels = None;
            for sub in parse_chunk_sequence(payload)? {
                match &sub.fourcc {
                    b"VP8 " => {
                        frame_pixels = Some(self.decode_lossy(sub.data)?);
                        break;
                    }
                    b"VP8L" => {
                        frame_pixels = Some(self.decode_lossless(sub.data)?);
                        break;
                    }
                    _ => {}
                }
            }
            let frame_pixels = frame_pixels
                .ok_or(WebPErrors::Malformed("ANMF without image data".to_string()))?;

            // composite onto the canvas
            for row in 0..header.height {
                for col in 0..header.width {
                    let src = (row * header.width + col) * 4;
                    let dst = ((header.y + row) * self.width + header.x + col) * 4;

                    if header.blend && frame_pixels[src + 3] < 255 {
                        // straight alpha blend over the canvas
                        let alpha = u32::from(frame_pixels[src + 3]);
                        for c in 0..3 {
                            let fg = u32::from(frame_pixels[src + c]) * alpha;
                            let bg = u32::from(canvas[dst + c]) * (255 - alpha);
                            canvas[dst + c] = ((fg + bg + 127) / 255) as u8;
                        }
                        canvas[dst + 3] = canvas[dst + 3].max(frame_pixels[src + 3]);
                    } else {
                        canvas[dst..dst + 4].copy_from_slice(&frame_pixels[src..src + 4]);
                    }
                }
            }

            frames.push(WebPFrame {
                pixels:      canvas.clone(),
                duration_ms: header.duration_ms
            });

            if header.dispose {
                for row in 0..header.height {
                    let start = ((header.y + row) * self.width + header.x) * 4;
                    canvas[start..start + header.width * 4].fill(0);
                }
            }
        }

        if frames.is_empty() {
            return Err(WebPErrors::Malformed("Animation without frames".to_string()));
        }
        Ok(frames)
    }
}

fn read_u24(bytes: &[u8]) -> usize {
    usize::from(bytes[0]) | usize::from(bytes[1]) << 8 | usize::from(bytes[2]) << 16
}

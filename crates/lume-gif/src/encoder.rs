use lume_core::bytestream::ByteWriter;
use lume_core::colorspace::ColorSpace;
use lume_core::log::trace;
use lume_core::options::EncoderOptions;
use lume_lzw::LzwEncoder;
use lume_quant::{dither_floyd_steinberg, quantize, remap_nearest, Palette};

use crate::errors::GifDecoderErrors;

/// Pixels with alpha below this become the transparent index
const ALPHA_THRESHOLD: u8 = 128;

/// A frame handed to the encoder
struct PendingFrame {
    rgba:     Vec<u8>,
    delay_cs: u16
}

/// A GIF89a encoder.
///
/// Frames are added one at a time and the file is produced by
/// [`encode`](Self::encode). Input is RGBA or RGB at the logical
/// screen size; color is reduced with a median cut palette over the
/// union of all frames, or per frame local palettes when the union
/// cannot be represented faithfully in 256 entries.
pub struct GifEncoder {
    options: EncoderOptions,
    frames:  Vec<PendingFrame>
}

impl GifEncoder {
    pub fn new(options: EncoderOptions) -> GifEncoder {
        GifEncoder {
            options,
            frames: Vec::new()
        }
    }

    /// Append a frame.
    ///
    /// `delay_ms` overrides the delay from the options for this
    /// frame. Input length must match the configured dimensions
    pub fn add_frame(&mut self, pixels: &[u8], delay_ms: Option<u32>) -> Result<(), GifDecoderErrors> {
        let (width, height) = (self.options.width(), self.options.height());

        let rgba = match self.options.colorspace() {
            ColorSpace::RGBA => {
                if pixels.len() != width * height * 4 {
                    return Err(GifDecoderErrors::Static("Frame size mismatch"));
                }
                pixels.to_vec()
            }
            ColorSpace::RGB => {
                if pixels.len() != width * height * 3 {
                    return Err(GifDecoderErrors::Static("Frame size mismatch"));
                }
                let mut rgba = Vec::with_capacity(width * height * 4);
                for px in pixels.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                rgba
            }
            _ => return Err(GifDecoderErrors::Static("Gif input must be RGB or RGBA"))
        };

        let delay_cs = delay_ms
            .unwrap_or(self.options.delay_ms())
            .div_ceil(10)
            .min(u32::from(u16::MAX)) as u16;

        self.frames.push(PendingFrame { rgba, delay_cs });
        Ok(())
    }

    /// Encode all added frames into a GIF89a file
    pub fn encode(&mut self) -> Result<Vec<u8>, GifDecoderErrors> {
        if self.frames.is_empty() {
            return Err(GifDecoderErrors::Static("No frames to encode"));
        }
        let (width, height) = (self.options.width(), self.options.height());
        if width == 0 || width > usize::from(u16::MAX) || height == 0 || height > usize::from(u16::MAX) {
            return Err(GifDecoderErrors::Static("Dimensions not representable in gif"));
        }

        let has_transparency = self
            .frames
            .iter()
            .any(|f| f.rgba.chunks_exact(4).any(|px| px[3] < ALPHA_THRESHOLD));

        // color slots left once a transparent index is reserved
        let max_colors = if has_transparency { 255 } else { 256 };

        // union palette over every frame, exact when the sequence has
        // few enough unique colors
        let union: Vec<u8> = self
            .frames
            .iter()
            .flat_map(|f| f.rgba.iter().copied())
            .collect();
        let global_palette = quantize(&union, 4, max_colors);

        let unique_total = count_unique(&union, 4);
        let use_local_palettes = self.frames.len() > 1 && unique_total > max_colors;

        trace!(
            "Encoding {} frame gif, {} unique colors, local palettes: {}",
            self.frames.len(),
            unique_total,
            use_local_palettes
        );

        let mut writer = ByteWriter::with_capacity(width * height / 2 + 1024);

        writer.write_all(b"GIF89a");
        self.write_logical_screen(&mut writer, &global_palette, has_transparency);

        if self.frames.len() > 1 {
            write_netscape_loop(&mut writer, self.options.loop_count());
        }

        for (i, frame) in self.frames.iter().enumerate() {
            let palette = if use_local_palettes {
                Some(quantize(&frame.rgba, 4, max_colors))
            } else {
                None
            };
            let palette_ref = palette.as_ref().unwrap_or(&global_palette);

            write_frame(
                &mut writer,
                frame,
                width,
                height,
                palette_ref,
                palette.is_some(),
                has_transparency,
                self.options.gif_dither()
            )?;
            trace!("Wrote frame {i}");
        }

        writer.write_u8(0x3B);
        Ok(writer.into_inner())
    }

    fn write_logical_screen(
        &self, writer: &mut ByteWriter, palette: &Palette, has_transparency: bool
    ) {
        writer.write_u16_le(self.options.width() as u16);
        writer.write_u16_le(self.options.height() as u16);

        let table_bits = palette_bits(palette.len() + usize::from(has_transparency));
        // global color table present, sized 2^(bits)
        writer.write_u8(0x80 | 0x70 | (table_bits - 1));
        // background color index, pixel aspect ratio
        writer.write_u8(0);
        writer.write_u8(0);

        write_color_table(writer, palette, table_bits);
    }
}

/// Count unique colors, alpha excluded
fn count_unique(pixels: &[u8], channels: usize) -> usize {
    let mut packed: Vec<u32> = pixels
        .chunks_exact(channels)
        .map(|p| u32::from_ne_bytes([p[0], p[1], p[2], 0]))
        .collect();
    packed.sort_unstable();
    packed.dedup();
    packed.len()
}

/// Bits needed for a color table of `len` entries, gif tables hold
/// at least 4 entries
fn palette_bits(len: usize) -> u8 {
    let mut bits = 2_u8;
    while (1 << bits) < len {
        bits += 1;
    }
    bits
}

/// Write a color table padded to 2^bits entries
fn write_color_table(writer: &mut ByteWriter, palette: &Palette, bits: u8) {
    for entry in palette.entries() {
        writer.write_all(entry);
    }
    for _ in palette.len()..(1 << bits) {
        writer.write_all(&[0, 0, 0]);
    }
}

fn write_netscape_loop(writer: &mut ByteWriter, loop_count: u16) {
    writer.write_u8(0x21);
    writer.write_u8(0xFF);
    writer.write_u8(11);
    writer.write_all(b"NETSCAPE2.0");
    writer.write_u8(3);
    writer.write_u8(1);
    writer.write_u16_le(loop_count);
    writer.write_u8(0);
}

#[allow(clippy::too_many_arguments)]
fn write_frame(
    writer: &mut ByteWriter, frame: &PendingFrame, width: usize, height: usize,
    palette: &Palette, local_table: bool, has_transparency: bool, dither: bool
) -> Result<(), GifDecoderErrors> {
    // the transparent index sits one past the palette colors
    let transparent_index = palette.len() as u8;

    // graphic control extension
    writer.write_u8(0x21);
    writer.write_u8(0xF9);
    writer.write_u8(4);
    // disposal: keep the frame in place, transparent flag if used
    writer.write_u8((1 << 2) | u8::from(has_transparency));
    writer.write_u16_le(frame.delay_cs);
    writer.write_u8(if has_transparency { transparent_index } else { 0 });
    writer.write_u8(0);

    // image descriptor, always the full canvas
    writer.write_u8(0x2C);
    writer.write_u16_le(0);
    writer.write_u16_le(0);
    writer.write_u16_le(width as u16);
    writer.write_u16_le(height as u16);

    let table_bits = palette_bits(palette.len() + usize::from(has_transparency));
    if local_table {
        writer.write_u8(0x80 | (table_bits - 1));
        write_color_table(writer, palette, table_bits);
    } else {
        writer.write_u8(0);
    }

    // map pixels onto the palette
    let mut indices = if dither {
        dither_floyd_steinberg(&frame.rgba, width, height, 4, palette, false)
    } else {
        remap_nearest(&frame.rgba, 4, palette)
    };
    if has_transparency {
        for (index, px) in indices.iter_mut().zip(frame.rgba.chunks_exact(4)) {
            if px[3] < ALPHA_THRESHOLD {
                *index = transparent_index;
            }
        }
    }

    // initial code size = max(2, bits needed for the table)
    let min_code_size = table_bits.max(2);
    let code_stream = LzwEncoder::new(min_code_size)?.encode(&indices)?;

    writer.write_u8(min_code_size);
    for chunk in code_stream.chunks(255) {
        writer.write_u8(chunk.len() as u8);
        writer.write_all(chunk);
    }
    // sub-block terminator
    writer.write_u8(0);

    Ok(())
}

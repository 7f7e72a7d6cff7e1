#![cfg(feature = "png")]
//! PNG codec glue

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_core::result::DecodingResult;
use lume_png::PngDecoder;

use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

/// 1 inch = 0.0254 m
fn ppm_to_dpi(ppm: u32) -> u32 {
    (u64::from(ppm) * 254 / 10_000) as u32
}

impl<'a> DecoderTrait for PngDecoder<'a> {
    fn decode(&mut self) -> Result<Image, ImageErrors> {
        let pixels = PngDecoder::decode(self)?;

        let (width, height) = self.dimensions().unwrap();
        let colorspace = self.colorspace().unwrap();

        let mut frame = match pixels {
            DecodingResult::U8(data) => Frame::from_u8(data, width, height, colorspace)?,
            DecodingResult::U16(data) => Frame::from_u16(data, width, height, colorspace)?,
            _ => return Err(ImageErrors::Malformed("png: unexpected sample type".to_string()))
        };

        if let Some((x, y)) = self.pixels_per_meter() {
            frame.properties.dpi = Some((ppm_to_dpi(x), ppm_to_dpi(y)));
        }
        Ok(Image::from_frame(frame))
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        PngDecoder::dimensions(self)
    }

    fn name(&self) -> &'static str {
        "png"
    }
}

/// PNG encoding via the shared trait
pub struct PngEncoder;

impl EncoderTrait for PngEncoder {
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors> {
        let frame = &image.frames()[0];

        let options = options
            .set_width(frame.width())
            .set_height(frame.height())
            .set_depth(frame.depth())
            .set_colorspace(frame.colorspace());

        match frame.colorspace() {
            ColorSpace::Indexed => {
                let palette = frame.palette().unwrap().to_vec();
                let mut encoder = lume_png::PngEncoder::new(frame.pixels(), options);
                encoder.set_palette(&palette);
                Ok(encoder.encode()?)
            }
            ColorSpace::Luma | ColorSpace::LumaA | ColorSpace::RGB | ColorSpace::RGBA => {
                if frame.depth() == BitDepth::Sixteen {
                    // the wire wants big endian samples
                    let be: Vec<u8> = frame
                        .pixels()
                        .chunks_exact(2)
                        .flat_map(|c| u16::from_ne_bytes([c[0], c[1]]).to_be_bytes())
                        .collect();
                    Ok(lume_png::PngEncoder::new(&be, options).encode()?)
                } else {
                    Ok(lume_png::PngEncoder::new(frame.pixels(), options).encode()?)
                }
            }
            _ => {
                // funnel everything else through RGBA
                let rgba = frame.to_rgba8();
                let options = options
                    .set_colorspace(ColorSpace::RGBA)
                    .set_depth(BitDepth::Eight);
                Ok(lume_png::PngEncoder::new(&rgba, options).encode()?)
            }
        }
    }

    fn name(&self) -> &'static str {
        "png"
    }
}

#![cfg(feature = "bmp")]
//! BMP codec glue

use lume_bmp::BmpDecoder;
use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;

use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

impl<'a> DecoderTrait for BmpDecoder<'a> {
    fn decode(&mut self) -> Result<Image, ImageErrors> {
        let pixels = BmpDecoder::decode(self)?;
        let (width, height) = BmpDecoder::dimensions(self).unwrap();
        let colorspace = self.colorspace().unwrap();

        let mut frame = Frame::from_u8(pixels, width, height, colorspace)?;
        if let Some((x, y)) = self.pixels_per_meter() {
            frame.properties.dpi = Some(
                ((u64::from(x) * 254 / 10_000) as u32, (u64::from(y) * 254 / 10_000) as u32)
            );
        }
        Ok(Image::from_frame(frame))
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        BmpDecoder::dimensions(self)
    }

    fn name(&self) -> &'static str {
        "bmp"
    }
}

/// BMP encoding via the shared trait
pub struct BmpEncoder;

impl EncoderTrait for BmpEncoder {
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors> {
        let frame = &image.frames()[0];

        let options = options
            .set_width(frame.width())
            .set_height(frame.height())
            .set_depth(BitDepth::Eight);

        match (frame.colorspace(), frame.depth()) {
            (
                ColorSpace::RGB | ColorSpace::RGBA | ColorSpace::BGR | ColorSpace::BGRA,
                BitDepth::Eight
            ) => {
                let options = options.set_colorspace(frame.colorspace());
                Ok(lume_bmp::BmpEncoder::new(options).encode(frame.pixels())?)
            }
            _ => {
                let rgba = frame.to_rgba8();
                let options = options.set_colorspace(ColorSpace::RGBA);
                Ok(lume_bmp::BmpEncoder::new(options).encode(&rgba)?)
            }
        }
    }

    fn name(&self) -> &'static str {
        "bmp"
    }
}

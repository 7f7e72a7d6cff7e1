#![cfg(feature = "tiff")]
//! TIFF codec glue

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_tiff::TiffDecoder;

use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

impl<'a> DecoderTrait for TiffDecoder<'a> {
    fn decode(&mut self) -> Result<Image, ImageErrors> {
        let pages = self.pages()?;

        let mut frames = Vec::with_capacity(pages);
        for page in 0..pages {
            let pixels = self.decode_page(page)?;
            let (width, height) = TiffDecoder::dimensions(self, page)?;
            let colorspace = self.colorspace(page)?;

            let mut frame = Frame::from_u8(pixels, width, height, colorspace)?;
            frame.properties.dpi = self.dpi(page)?;
            frames.push(frame);
        }
        Image::new(frames)
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        // the decoder API is lazy, dimensions need a mutable parse
        None
    }

    fn name(&self) -> &'static str {
        "tiff"
    }
}

/// TIFF encoding via the shared trait, every frame becomes a page
pub struct TiffEncoder;

impl EncoderTrait for TiffEncoder {
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors> {
        let mut encoder = lume_tiff::TiffEncoder::new(options);

        for frame in image.frames() {
            match (frame.colorspace(), frame.depth()) {
                (
                    ColorSpace::Luma | ColorSpace::RGB | ColorSpace::RGBA,
                    BitDepth::Eight
                ) => {
                    encoder.add_page(
                        frame.pixels(),
                        frame.width(),
                        frame.height(),
                        frame.colorspace()
                    )?;
                }
                _ => {
                    let rgba = frame.to_rgba8();
                    encoder.add_page(&rgba, frame.width(), frame.height(), ColorSpace::RGBA)?;
                }
            }
        }
        Ok(encoder.encode()?)
    }

    fn name(&self) -> &'static str {
        "tiff"
    }
}

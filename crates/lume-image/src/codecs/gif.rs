#![cfg(feature = "gif")]
//! GIF codec glue

use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_gif::GifDecoder;

use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

impl<'a> DecoderTrait for GifDecoder<'a> {
    fn decode(&mut self) -> Result<Image, ImageErrors> {
        let gif_frames = self.decode_all()?;
        let (width, height) = GifDecoder::dimensions(self).unwrap();

        let mut frames = Vec::with_capacity(gif_frames.len());
        for gf in gif_frames {
            let mut frame = Frame::from_u8(gf.pixels, width, height, ColorSpace::RGBA)?;
            frame.properties.delay_ms = Some(u32::from(gf.delay_cs) * 10);
            frame.properties.disposal = Some(gf.disposal as u8);
            frames.push(frame);
        }

        let mut image = Image::new(frames)?;
        image.loop_count = self.loop_count();
        Ok(image)
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        GifDecoder::dimensions(self)
    }

    fn name(&self) -> &'static str {
        "gif"
    }
}

/// GIF encoding via the shared trait, all frames are written
pub struct GifEncoder;

impl EncoderTrait for GifEncoder {
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors> {
        let (width, height) = image.dimensions();

        let options = options
            .set_width(width)
            .set_height(height)
            .set_colorspace(ColorSpace::RGBA);

        let mut encoder = lume_gif::GifEncoder::new(options);
        for frame in image.frames() {
            if frame.width() != width || frame.height() != height {
                return Err(ImageErrors::InvalidParameter(
                    "gif frames must share the canvas size".to_string()
                ));
            }
            encoder.add_frame(&frame.to_rgba8(), frame.properties.delay_ms)?;
        }
        Ok(encoder.encode()?)
    }

    fn name(&self) -> &'static str {
        "gif"
    }
}

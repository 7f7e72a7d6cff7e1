#![cfg(feature = "webp")]
//! WebP codec glue

use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_webp::WebPDecoder;

use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

impl<'a> DecoderTrait for WebPDecoder<'a> {
    fn decode(&mut self) -> Result<Image, ImageErrors> {
        let webp_frames = self.decode_all()?;
        let (width, height) = WebPDecoder::dimensions(self).unwrap();
        let animated = webp_frames.len() > 1;

        let mut frames = Vec::with_capacity(webp_frames.len());
        for wf in webp_frames {
            let mut frame = Frame::from_u8(wf.pixels, width, height, ColorSpace::RGBA)?;
            if animated {
                frame.properties.delay_ms = Some(wf.duration_ms);
            }
            frame.properties.xmp = self.xmp().map(<[u8]>::to_vec);
            frames.push(frame);
        }

        let mut image = Image::new(frames)?;
        if animated {
            image.loop_count = Some(self.loop_count());
        }
        Ok(image)
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        WebPDecoder::dimensions(self)
    }

    fn name(&self) -> &'static str {
        "webp"
    }
}

/// WebP encoding via the shared trait, multi frame images become
/// animations
pub struct WebPEncoder;

impl EncoderTrait for WebPEncoder {
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors> {
        let (width, height) = image.dimensions();

        let options = options
            .set_width(width)
            .set_height(height)
            .set_colorspace(ColorSpace::RGBA);

        let mut encoder = lume_webp::WebPEncoder::new(options);
        for frame in image.frames() {
            if frame.width() != width || frame.height() != height {
                return Err(ImageErrors::InvalidParameter(
                    "webp frames must share the canvas size".to_string()
                ));
            }
            encoder.add_frame(&frame.to_rgba8(), frame.properties.delay_ms)?;
        }
        Ok(encoder.encode()?)
    }

    fn name(&self) -> &'static str {
        "webp"
    }
}

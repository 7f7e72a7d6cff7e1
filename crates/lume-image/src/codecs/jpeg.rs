#![cfg(feature = "jpeg")]
//! JPEG codec glue

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_jpeg::JpegDecoder;

use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

impl<'a> DecoderTrait for JpegDecoder<'a> {
    fn decode(&mut self) -> Result<Image, ImageErrors> {
        let pixels = JpegDecoder::decode(self)?;

        let (width, height) = self.dimensions().unwrap();
        let colorspace = self.colorspace();

        let mut frame = Frame::from_u8(pixels, width, height, colorspace)?;

        if let Some(info) = self.info() {
            // JFIF density unit 1 is dots per inch, 2 dots per cm
            frame.properties.dpi = match info.pixel_density {
                1 => Some((u32::from(info.x_density), u32::from(info.y_density))),
                2 => Some((
                    u32::from(info.x_density) * 254 / 100,
                    u32::from(info.y_density) * 254 / 100
                )),
                _ => None
            };
        }
        frame.properties.xmp = self.xmp().map(<[u8]>::to_vec);
        frame.properties.gain_map = self.gain_map().map(<[u8]>::to_vec);

        Ok(Image::from_frame(frame))
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        JpegDecoder::dimensions(self)
    }

    fn name(&self) -> &'static str {
        "jpeg"
    }
}

/// JPEG encoding via the shared trait
pub struct JpegEncoder;

impl EncoderTrait for JpegEncoder {
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors> {
        let frame = &image.frames()[0];

        let options = options
            .set_width(frame.width())
            .set_height(frame.height())
            .set_depth(BitDepth::Eight);

        match (frame.colorspace(), frame.depth()) {
            (ColorSpace::Luma, BitDepth::Eight) => {
                let options = options.set_colorspace(ColorSpace::Luma);
                Ok(lume_jpeg::JpegEncoder::new(options).encode(frame.pixels())?)
            }
            (ColorSpace::RGB, BitDepth::Eight) => {
                let options = options.set_colorspace(ColorSpace::RGB);
                Ok(lume_jpeg::JpegEncoder::new(options).encode(frame.pixels())?)
            }
            _ => {
                // anything else goes through an RGB copy, jpeg cannot
                // carry alpha anyway
                let rgb: Vec<u8> = frame
                    .to_rgba8()
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                let options = options.set_colorspace(ColorSpace::RGB);
                Ok(lume_jpeg::JpegEncoder::new(options).encode(&rgb)?)
            }
        }
    }

    fn name(&self) -> &'static str {
        "jpeg"
    }
}

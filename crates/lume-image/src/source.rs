//! The read side of the dispatch surface
//!
//! A [`Source`] wraps an encoded byte buffer, sniffs its format and
//! hands out decoded frames and their properties by index. Decoding
//! happens lazily on the first frame access and the result is kept
//! for later queries.

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::DecoderOptions;

use log::warn;

use crate::codecs::{guess_format, ImageFormat};
use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::properties::{keys, PropertyMap, Value};

/// Auxiliary data kinds [`Source::auxiliary_info`] understands
pub const AUXILIARY_HDR_GAIN_MAP: &str = "hdr-gain-map";

/// An image source over an in-memory encoded buffer
pub struct Source<'a> {
    data:    &'a [u8],
    format:  ImageFormat,
    options: DecoderOptions,
    decoded: Option<Image>
}

impl<'a> Source<'a> {
    /// Create a source from encoded bytes.
    ///
    /// Returns None when no known format matches the magic bytes
    pub fn new(data: &'a [u8]) -> Option<Source<'a>> {
        Source::new_with_options(data, DecoderOptions::default())
    }

    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> Option<Source<'a>> {
        let format = guess_format(data);
        if format == ImageFormat::Unknown || !format.has_decoder() {
            warn!("No decoder for sniffed format {format:?}");
            return None;
        }
        Some(Source {
            data,
            format,
            options,
            decoded: None
        })
    }

    /// The sniffed format of the underlying data
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    fn image(&mut self) -> Result<&Image, ImageErrors> {
        if self.decoded.is_none() {
            self.decoded = Some(self.format.decode(self.data, self.options)?);
        }
        Ok(self.decoded.as_ref().unwrap())
    }

    /// Number of images in the source, zero when the data turns out
    /// to be undecodable
    pub fn count(&mut self) -> usize {
        self.image().map(|image| image.frame_count()).unwrap_or(0)
    }

    /// The index of the primary image, always the first for the
    /// formats here
    pub fn primary_index(&mut self) -> usize {
        0
    }

    /// Decode and return one frame
    pub fn image_at(&mut self, index: usize) -> Result<Frame, ImageErrors> {
        let image = self.image()?;
        image
            .frame(index)
            .cloned()
            .ok_or_else(|| ImageErrors::OutOfBounds(format!("frame index {index}")))
    }

    /// Properties of one frame plus the container level ones
    pub fn properties_at(&mut self, index: usize) -> Result<PropertyMap, ImageErrors> {
        let image = self.image()?;
        let frame = image
            .frame(index)
            .ok_or_else(|| ImageErrors::OutOfBounds(format!("frame index {index}")))?;

        let mut map = PropertyMap::new();
        map.insert(
            keys::PIXEL_WIDTH.into(),
            Value::Int(frame.width() as i64)
        );
        map.insert(
            keys::PIXEL_HEIGHT.into(),
            Value::Int(frame.height() as i64)
        );
        map.insert(
            keys::COLOR_MODEL.into(),
            Value::String(color_model_name(frame.colorspace()).into())
        );
        map.insert(
            keys::DEPTH.into(),
            Value::Int(match frame.depth() {
                BitDepth::Sixteen => 16,
                _ => 8
            })
        );
        map.insert(
            keys::HAS_ALPHA.into(),
            Value::Bool(frame.colorspace().has_alpha())
        );

        if let Some((x, y)) = frame.properties.dpi {
            map.insert(keys::DPI_WIDTH.into(), Value::Int(i64::from(x)));
            map.insert(keys::DPI_HEIGHT.into(), Value::Int(i64::from(y)));
        }
        if let Some(delay) = frame.properties.delay_ms {
            map.insert(
                keys::DELAY_TIME.into(),
                Value::Float(f64::from(delay) / 1000.0)
            );
        }
        if let Some(disposal) = frame.properties.disposal {
            map.insert(
                keys::DISPOSAL_METHOD.into(),
                Value::Int(i64::from(disposal))
            );
        }
        if let Some(loops) = image.loop_count() {
            map.insert(keys::LOOP_COUNT.into(), Value::Int(i64::from(loops)));
        }
        Ok(map)
    }

    /// Auxiliary payloads attached to a frame.
    ///
    /// `kind` currently understands [`AUXILIARY_HDR_GAIN_MAP`] which
    /// surfaces the opaque JPEG gain map blob plus a small
    /// description map. The payload itself is not interpreted.
    pub fn auxiliary_info(
        &mut self, index: usize, kind: &str
    ) -> Result<Option<(Vec<u8>, PropertyMap)>, ImageErrors> {
        let image = self.image()?;
        let frame = image
            .frame(index)
            .ok_or_else(|| ImageErrors::OutOfBounds(format!("frame index {index}")))?;

        if kind != AUXILIARY_HDR_GAIN_MAP {
            return Ok(None);
        }
        let Some(blob) = frame.properties.gain_map.clone() else {
            return Ok(None);
        };

        let mut description = PropertyMap::new();
        description.insert("Size".into(), Value::Int(blob.len() as i64));
        if blob.len() >= 2 {
            // payloads lead with a big endian version field
            description.insert(
                "Version".into(),
                Value::Int(i64::from(u16::from_be_bytes([blob[0], blob[1]])))
            );
        }
        Ok(Some((blob, description)))
    }
}

fn color_model_name(colorspace: ColorSpace) -> &'static str {
    match colorspace {
        ColorSpace::Luma | ColorSpace::LumaA => "Gray",
        ColorSpace::Indexed => "Indexed",
        ColorSpace::YCbCr => "YCbCr",
        _ => "RGB"
    }
}

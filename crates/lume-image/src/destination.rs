//! The write side of the dispatch surface
//!
//! A [`Destination`] is created for a UTI and a declared frame
//! count, accepts frames one at a time and produces the encoded
//! file on [`finalize`](Destination::finalize). It is an explicit
//! state machine; illegal transitions are invalid parameter errors
//! and a failed destination stays failed.

use lume_core::options::EncoderOptions;

use log::warn;

use crate::codecs::ImageFormat;
use crate::errors::ImageErrors;
use crate::frame::Frame;
use crate::image::Image;
use crate::properties::{keys, PropertyMap, Value};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Fresh,
    FramesAccepted,
    Finalized,
    Failed
}

/// An image destination accumulating frames for one output file
pub struct Destination {
    format:         ImageFormat,
    declared_count: usize,
    options:        EncoderOptions,
    frames:         Vec<Frame>,
    loop_count:     Option<u16>,
    state:          State
}

impl Destination {
    /// Create a destination for the format named by `uti`.
    ///
    /// Returns None for unknown UTIs, formats without an encoder and
    /// a zero frame count
    pub fn new(uti: &str, declared_count: usize, options: Option<&PropertyMap>) -> Option<Destination> {
        let format = ImageFormat::from_uti(uti)?;
        if !format.has_encoder() {
            warn!("No encoder for {uti}");
            return None;
        }
        if declared_count == 0 {
            return None;
        }
        // single image formats cannot take more than one frame
        if declared_count > 1 && !supports_multiple(format) {
            return None;
        }

        let encoder_options = options
            .map(|map| apply_option_keys(EncoderOptions::default(), map))
            .unwrap_or_default();

        Some(Destination {
            format,
            declared_count,
            options: encoder_options,
            frames: Vec::new(),
            loop_count: None,
            state: State::Fresh
        })
    }

    /// The format this destination writes
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Append a frame, optionally with per-frame properties
    /// (currently the delay for animation formats)
    pub fn add_image(
        &mut self, frame: &Frame, properties: Option<&PropertyMap>
    ) -> Result<(), ImageErrors> {
        match self.state {
            State::Fresh | State::FramesAccepted => {}
            State::Finalized => {
                return Err(ImageErrors::InvalidParameter(
                    "add_image after finalize".to_string()
                ));
            }
            State::Failed => {
                return Err(ImageErrors::InvalidParameter(
                    "destination already failed".to_string()
                ));
            }
        }
        if self.frames.len() >= self.declared_count {
            self.state = State::Failed;
            return Err(ImageErrors::InvalidParameter(format!(
                "declared {} frames, adding frame {}",
                self.declared_count,
                self.frames.len() + 1
            )));
        }

        let mut frame = frame.clone();
        if let Some(map) = properties {
            if let Some(delay) = map.get(keys::DELAY).and_then(Value::as_float) {
                frame.properties.delay_ms = Some((delay * 1000.0).round().max(0.0) as u32);
            }
        }

        self.frames.push(frame);
        self.state = State::FramesAccepted;
        Ok(())
    }

    /// Set container level properties, the loop count and default
    /// frame delay for animation formats
    pub fn set_container_properties(&mut self, properties: &PropertyMap) -> Result<(), ImageErrors> {
        if matches!(self.state, State::Finalized | State::Failed) {
            return Err(ImageErrors::InvalidParameter(
                "container properties after finalize".to_string()
            ));
        }
        if let Some(loops) = properties.get(keys::ENCODER_LOOP_COUNT).and_then(Value::as_int) {
            self.loop_count = Some(loops.clamp(0, i64::from(u16::MAX)) as u16);
        }
        if let Some(delay) = properties.get(keys::DELAY).and_then(Value::as_float) {
            self.options = self
                .options
                .set_delay_ms((delay * 1000.0).round().max(0.0) as u32);
        }
        Ok(())
    }

    /// Encode everything accumulated, consuming the destination.
    ///
    /// Fails when no frame was added, or when a format with a strict
    /// frame count got fewer frames than declared (gif and tiff
    /// permit fewer)
    pub fn finalize(mut self) -> Result<Vec<u8>, ImageErrors> {
        match self.state {
            State::Fresh => {
                return Err(ImageErrors::InvalidParameter(
                    "finalize without any frames".to_string()
                ));
            }
            State::FramesAccepted => {}
            State::Finalized | State::Failed => {
                return Err(ImageErrors::InvalidParameter(
                    "finalize after finalize".to_string()
                ));
            }
        }
        // gif and tiff tolerate a variable frame count
        let variable = matches!(self.format, ImageFormat::GIF | ImageFormat::TIFF);
        if !variable && self.frames.len() != self.declared_count {
            return Err(ImageErrors::InvalidParameter(format!(
                "declared {} frames but {} were added",
                self.declared_count,
                self.frames.len()
            )));
        }

        if let Some(loops) = self.loop_count {
            self.options = self.options.set_loop_count(loops);
        }

        let mut image = Image::new(std::mem::take(&mut self.frames))?;
        image.loop_count = self.loop_count;

        self.state = State::Finalized;
        self.format.encode(&image, self.options)
    }
}

/// True for the formats that can carry more than one image
fn supports_multiple(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::GIF | ImageFormat::TIFF | ImageFormat::WebP
    )
}

/// Map the recognized option keys onto encoder options
fn apply_option_keys(mut options: EncoderOptions, map: &PropertyMap) -> EncoderOptions {
    if let Some(quality) = map.get(keys::LOSSY_QUALITY).and_then(Value::as_float) {
        // a 0..1 float maps onto the 1..100 quality factor
        let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
        options = options.set_quality(quality);
    }
    if let Some(lossless) = map.get(keys::LOSSLESS).and_then(Value::as_bool) {
        options = options.webp_set_lossless(lossless);
    }
    if let Some(preserve) = map.get(keys::PRESERVE_ALPHA).and_then(Value::as_bool) {
        options = options.bmp_set_preserve_alpha(preserve);
    }
    if let Some(delay) = map.get(keys::DELAY).and_then(Value::as_float) {
        options = options.set_delay_ms((delay * 1000.0).round().max(0.0) as u32);
    }
    if let Some(loops) = map.get(keys::ENCODER_LOOP_COUNT).and_then(Value::as_int) {
        options = options.set_loop_count(loops.clamp(0, i64::from(u16::MAX)) as u16);
    }
    if let Some(dither) = map.get(keys::DITHER).and_then(Value::as_bool) {
        options = options.gif_set_dither(dither);
    }
    options
}

//! Encapsulations of decoding and encoding
//!
//! Implementing [`DecoderTrait`] for a format means the library can
//! decode it, [`EncoderTrait`] that images can be saved to it. The
//! dispatcher hands out boxed trait objects so callers can drive any
//! codec uniformly.

use lume_core::options::EncoderOptions;

use crate::errors::ImageErrors;
use crate::image::Image;

/// Encapsulates an image decoder.
///
/// All supported decoders implement this
pub trait DecoderTrait {
    /// Decode the buffer handed to the decoder at construction,
    /// returning all frames
    fn decode(&mut self) -> Result<Image, ImageErrors>;

    /// Width and height, or None before headers are parsed
    fn dimensions(&self) -> Option<(usize, usize)>;

    /// The name of the decoder
    fn name(&self) -> &'static str;
}

/// Encapsulates an image encoder.
///
/// All supported encoders implement this
pub trait EncoderTrait {
    /// Encode the image into the format's wire representation.
    ///
    /// Multi frame images are encoded whole where the format can
    /// carry them, otherwise only the first frame is written
    fn encode(&mut self, image: &Image, options: EncoderOptions) -> Result<Vec<u8>, ImageErrors>;

    /// The name of the encoder
    fn name(&self) -> &'static str;
}

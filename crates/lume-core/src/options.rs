//! Decoder and encoder options
//!
//! This module exposes structs for which all implemented
//! decoders and encoders get shared configuration
//!
//! All supported options are put into one `DecoderOptions`/`EncoderOptions`
//! to allow for global configuration, i.e the same struct can be reused
//! for all codecs in the family.

pub use decoder::DecoderOptions;
pub use encoder::EncoderOptions;

mod decoder;
mod encoder;

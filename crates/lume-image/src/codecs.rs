/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Entry point for all supported codecs the library understands
//!
//! The codecs here can be enabled and disabled at will depending on
//! the configured features; it is recommended to enable only the
//! encoders and decoders you use.

use lume_core::options::{DecoderOptions, EncoderOptions};

use crate::errors::ImageErrors;
use crate::image::Image;
use crate::traits::{DecoderTrait, EncoderTrait};

#[cfg(feature = "bmp")]
pub mod bmp;
#[cfg(feature = "gif")]
pub mod gif;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "tiff")]
pub mod tiff;
#[cfg(feature = "webp")]
pub mod webp;

/// All supported image formats.
///
/// This enum contains supported image formats, either
/// encoders or decoders for a particular image
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ImageFormat {
    /// Joint Photographic Experts Group
    JPEG,
    /// Portable Network Graphics
    PNG,
    /// Graphics Interchange Format
    GIF,
    /// Windows Bitmap Files
    BMP,
    /// Tagged Image File Format
    TIFF,
    /// WebP, lossy and lossless
    WebP,
    /// Any unknown format
    Unknown
}

impl ImageFormat {
    /// Return true if the format has a decoder compiled in
    pub fn has_decoder(self) -> bool {
        match self {
            ImageFormat::JPEG => cfg!(feature = "jpeg"),
            ImageFormat::PNG => cfg!(feature = "png"),
            ImageFormat::GIF => cfg!(feature = "gif"),
            ImageFormat::BMP => cfg!(feature = "bmp"),
            ImageFormat::TIFF => cfg!(feature = "tiff"),
            ImageFormat::WebP => cfg!(feature = "webp"),
            ImageFormat::Unknown => false
        }
    }

    /// Return true if the format has an encoder compiled in
    pub fn has_encoder(self) -> bool {
        // every format we decode we can also write
        self.has_decoder()
    }

    /// Get a decoder for this format over `data`
    pub fn decoder<'a>(
        self, data: &'a [u8]
    ) -> Result<Box<dyn DecoderTrait + 'a>, ImageErrors> {
        self.decoder_with_options(data, DecoderOptions::default())
    }

    /// Get a decoder for this format with configured options
    pub fn decoder_with_options<'a>(
        self, data: &'a [u8], options: DecoderOptions
    ) -> Result<Box<dyn DecoderTrait + 'a>, ImageErrors> {
        match self {
            ImageFormat::PNG => {
                #[cfg(feature = "png")]
                {
                    Ok(Box::new(lume_png::PngDecoder::new_with_options(
                        data, options
                    )))
                }
                #[cfg(not(feature = "png"))]
                {
                    Err(ImageErrors::ImageDecoderNotIncluded(self))
                }
            }
            ImageFormat::JPEG => {
                #[cfg(feature = "jpeg")]
                {
                    Ok(Box::new(lume_jpeg::JpegDecoder::new_with_options(
                        data, options
                    )))
                }
                #[cfg(not(feature = "jpeg"))]
                {
                    Err(ImageErrors::ImageDecoderNotIncluded(self))
                }
            }
            ImageFormat::GIF => {
                #[cfg(feature = "gif")]
                {
                    Ok(Box::new(lume_gif::GifDecoder::new_with_options(
                        data, options
                    )))
                }
                #[cfg(not(feature = "gif"))]
                {
                    Err(ImageErrors::ImageDecoderNotIncluded(self))
                }
            }
            ImageFormat::BMP => {
                #[cfg(feature = "bmp")]
                {
                    Ok(Box::new(lume_bmp::BmpDecoder::new_with_options(
                        data, options
                    )))
                }
                #[cfg(not(feature = "bmp"))]
                {
                    Err(ImageErrors::ImageDecoderNotIncluded(self))
                }
            }
            ImageFormat::TIFF => {
                #[cfg(feature = "tiff")]
                {
                    Ok(Box::new(lume_tiff::TiffDecoder::new_with_options(
                        data, options
                    )))
                }
                #[cfg(not(feature = "tiff"))]
                {
                    Err(ImageErrors::ImageDecoderNotIncluded(self))
                }
            }
            ImageFormat::WebP => {
                #[cfg(feature = "webp")]
                {
                    Ok(Box::new(lume_webp::WebPDecoder::new_with_options(
                        data, options
                    )))
                }
                #[cfg(not(feature = "webp"))]
                {
                    Err(ImageErrors::ImageDecoderNotIncluded(self))
                }
            }
            ImageFormat::Unknown => Err(ImageErrors::UnknownFormat)
        }
    }

    /// Get an encoder for this format
    pub fn encoder(self) -> Result<Box<dyn EncoderTrait>, ImageErrors> {
        match self {
            ImageFormat::PNG => {
                #[cfg(feature = "png")]
                {
                    Ok(Box::new(png::PngEncoder))
                }
                #[cfg(not(feature = "png"))]
                {
                    Err(ImageErrors::NoEncoderForFormat(self))
                }
            }
            ImageFormat::JPEG => {
                #[cfg(feature = "jpeg")]
                {
                    Ok(Box::new(jpeg::JpegEncoder))
                }
                #[cfg(not(feature = "jpeg"))]
                {
                    Err(ImageErrors::NoEncoderForFormat(self))
                }
            }
            ImageFormat::GIF => {
                #[cfg(feature = "gif")]
                {
                    Ok(Box::new(gif::GifEncoder))
                }
                #[cfg(not(feature = "gif"))]
                {
                    Err(ImageErrors::NoEncoderForFormat(self))
                }
            }
            ImageFormat::BMP => {
                #[cfg(feature = "bmp")]
                {
                    Ok(Box::new(bmp::BmpEncoder))
                }
                #[cfg(not(feature = "bmp"))]
                {
                    Err(ImageErrors::NoEncoderForFormat(self))
                }
            }
            ImageFormat::TIFF => {
                #[cfg(feature = "tiff")]
                {
                    Ok(Box::new(tiff::TiffEncoder))
                }
                #[cfg(not(feature = "tiff"))]
                {
                    Err(ImageErrors::NoEncoderForFormat(self))
                }
            }
            ImageFormat::WebP => {
                #[cfg(feature = "webp")]
                {
                    Ok(Box::new(webp::WebPEncoder))
                }
                #[cfg(not(feature = "webp"))]
                {
                    Err(ImageErrors::NoEncoderForFormat(self))
                }
            }
            ImageFormat::Unknown => Err(ImageErrors::NoEncoderForFormat(self))
        }
    }

    /// Decode a buffer of this format into an image
    pub fn decode(self, data: &[u8], options: DecoderOptions) -> Result<Image, ImageErrors> {
        let mut decoder = self.decoder_with_options(data, options)?;
        let mut image = decoder.decode()?;
        image.format = Some(self);
        Ok(image)
    }

    /// Encode an image into this format
    pub fn encode(
        self, image: &Image, options: EncoderOptions
    ) -> Result<Vec<u8>, ImageErrors> {
        self.encoder()?.encode(image, options)
    }

    /// Map a uniform type identifier string to a format
    pub fn from_uti(uti: &str) -> Option<ImageFormat> {
        match uti {
            "public.png" => Some(ImageFormat::PNG),
            "public.jpeg" => Some(ImageFormat::JPEG),
            "com.compuserve.gif" => Some(ImageFormat::GIF),
            "com.microsoft.bmp" => Some(ImageFormat::BMP),
            "public.tiff" => Some(ImageFormat::TIFF),
            "org.webmproject.webp" => Some(ImageFormat::WebP),
            _ => None
        }
    }

    /// The uniform type identifier naming this format
    pub fn to_uti(self) -> Option<&'static str> {
        match self {
            ImageFormat::PNG => Some("public.png"),
            ImageFormat::JPEG => Some("public.jpeg"),
            ImageFormat::GIF => Some("com.compuserve.gif"),
            ImageFormat::BMP => Some("com.microsoft.bmp"),
            ImageFormat::TIFF => Some("public.tiff"),
            ImageFormat::WebP => Some("org.webmproject.webp"),
            ImageFormat::Unknown => None
        }
    }
}

/// Guess the format of an image based on its magic bytes.
///
/// Total over every byte sequence: any input yields a format or
/// [`ImageFormat::Unknown`], never a panic
pub fn guess_format(bytes: &[u8]) -> ImageFormat {
    let magic_bytes: &[(&[u8], ImageFormat)] = &[
        (&[137, 80, 78, 71, 13, 10, 26, 10], ImageFormat::PNG),
        (&[0xFF, 0xD8, 0xFF], ImageFormat::JPEG),
        (b"GIF87a", ImageFormat::GIF),
        (b"GIF89a", ImageFormat::GIF),
        (b"II*\0", ImageFormat::TIFF),
        (b"MM\0*", ImageFormat::TIFF)
    ];

    for (magic, format) in magic_bytes {
        if bytes.starts_with(magic) {
            return *format;
        }
    }
    // webp needs twelve bytes, RIFF size sits between the tags
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return ImageFormat::WebP;
    }
    // bmp needs more than its two magic bytes to be conclusive
    if bytes.len() >= 2 && &bytes[..2] == b"BM" {
        return ImageFormat::BMP;
    }
    ImageFormat::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffer_is_total() {
        // arbitrary byte soup never panics
        assert_eq!(guess_format(&[]), ImageFormat::Unknown);
        assert_eq!(guess_format(&[0xFF]), ImageFormat::Unknown);
        assert_eq!(guess_format(b"hello world"), ImageFormat::Unknown);
        assert_eq!(guess_format(&[0; 64]), ImageFormat::Unknown);
    }

    #[test]
    fn sniffer_matches_magic() {
        assert_eq!(
            guess_format(&[137, 80, 78, 71, 13, 10, 26, 10, 0, 0]),
            ImageFormat::PNG
        );
        assert_eq!(guess_format(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::JPEG);
        assert_eq!(guess_format(b"GIF89a_______"), ImageFormat::GIF);
        assert_eq!(guess_format(b"II*\0____"), ImageFormat::TIFF);
        assert_eq!(guess_format(b"MM\0*____"), ImageFormat::TIFF);
        assert_eq!(guess_format(b"RIFF\x04\0\0\0WEBP"), ImageFormat::WebP);
        assert_eq!(guess_format(b"BM______________"), ImageFormat::BMP);
    }

    #[test]
    fn uti_mapping_round_trips() {
        for format in [
            ImageFormat::PNG,
            ImageFormat::JPEG,
            ImageFormat::GIF,
            ImageFormat::BMP,
            ImageFormat::TIFF,
            ImageFormat::WebP
        ] {
            let uti = format.to_uti().unwrap();
            assert_eq!(ImageFormat::from_uti(uti), Some(format));
        }
        assert_eq!(ImageFormat::from_uti("public.heic"), None);
    }
}

/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Global encoder options

use crate::bit_depth::BitDepth;
use crate::colorspace::ColorSpace;

/// Boolean options that influence encoding
#[derive(Copy, Debug, Clone)]
pub struct EncoderFlags {
    /// Write a 32 bit BGRA bmp instead of discarding alpha
    bmp_preserve_alpha:    bool,
    /// Use the lossless VP8L path for webp
    webp_lossless:         bool,
    /// Apply Floyd-Steinberg dithering when quantizing for gif
    gif_dither:            bool,
    /// Subsample chroma 4:2:0 for jpeg and lossy webp
    chroma_subsampling:    bool
}

impl Default for EncoderFlags {
    fn default() -> Self {
        EncoderFlags {
            bmp_preserve_alpha: false,
            webp_lossless:      false,
            gif_dither:         false,
            chroma_subsampling: true
        }
    }
}

/// Encoder options
///
/// The pixel geometry fields (width, height, depth, colorspace) describe
/// the frame handed to the encoder and must always be set; the rest are
/// knobs not all encoders respect, each names the encoders that do
#[derive(Debug, Copy, Clone)]
pub struct EncoderOptions {
    width:      usize,
    height:     usize,
    colorspace: ColorSpace,
    depth:      BitDepth,
    /// Quality factor in 1..=100.
    ///
    /// - Default value: 80
    /// - Respected by: `jpeg`, `webp` (lossy)
    quality:    u8,
    /// Animation loop count, 0 loops forever
    ///
    /// - Respected by: `gif`, `webp`
    loop_count: u16,
    /// Per frame delay in milliseconds
    ///
    /// - Respected by: `gif`, `webp`
    delay_ms:   u32,
    /// Boolean flags that influence encoding
    flags:      EncoderFlags
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            width:      0,
            height:     0,
            colorspace: ColorSpace::RGB,
            depth:      BitDepth::Eight,
            quality:    80,
            loop_count: 0,
            delay_ms:   100,
            flags:      EncoderFlags::default()
        }
    }
}

impl EncoderOptions {
    /// Create new options with the geometry every encoder needs
    pub fn new(
        width: usize, height: usize, colorspace: ColorSpace, depth: BitDepth
    ) -> EncoderOptions {
        EncoderOptions {
            width,
            height,
            colorspace,
            depth,
            ..Default::default()
        }
    }

    /// Get the width the encoder expects frames to have
    pub const fn width(&self) -> usize {
        self.width
    }
    /// Get the height the encoder expects frames to have
    pub const fn height(&self) -> usize {
        self.height
    }
    /// Get the depth the encoder expects frames to have
    pub const fn depth(&self) -> BitDepth {
        self.depth
    }
    /// Get the colorspace the encoder expects frames to be in
    pub const fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }
    /// Get the configured quality factor
    pub const fn quality(&self) -> u8 {
        self.quality
    }
    /// Get the animation loop count, 0 means loop forever
    pub const fn loop_count(&self) -> u16 {
        self.loop_count
    }
    /// Get the per frame delay in milliseconds
    pub const fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Set expected image width
    pub fn set_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
    /// Set expected image height
    pub fn set_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }
    /// Set expected image depth
    pub fn set_depth(mut self, depth: BitDepth) -> Self {
        self.depth = depth;
        self
    }
    /// Set expected image colorspace
    pub fn set_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.colorspace = colorspace;
        self
    }
    /// Set the quality factor, clamped to 1..=100
    pub fn set_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
    /// Set the animation loop count, 0 loops forever
    pub fn set_loop_count(mut self, count: u16) -> Self {
        self.loop_count = count;
        self
    }
    /// Set the per frame delay in milliseconds
    pub fn set_delay_ms(mut self, delay: u32) -> Self {
        self.delay_ms = delay;
        self
    }
}

/// Per format flags
impl EncoderOptions {
    /// Whether the bmp encoder should write a 32 bit BGRA file
    /// preserving the alpha channel
    pub const fn bmp_preserve_alpha(&self) -> bool {
        self.flags.bmp_preserve_alpha
    }
    /// Set whether the bmp encoder should write a 32 bit BGRA file
    pub fn bmp_set_preserve_alpha(mut self, yes: bool) -> Self {
        self.flags.bmp_preserve_alpha = yes;
        self
    }
    /// Whether the webp encoder should use the lossless VP8L path
    pub const fn webp_lossless(&self) -> bool {
        self.flags.webp_lossless
    }
    /// Set whether the webp encoder should use the lossless VP8L path
    pub fn webp_set_lossless(mut self, yes: bool) -> Self {
        self.flags.webp_lossless = yes;
        self
    }
    /// Whether the gif encoder should dither when quantizing
    pub const fn gif_dither(&self) -> bool {
        self.flags.gif_dither
    }
    /// Set whether the gif encoder should apply Floyd-Steinberg
    /// dithering after palette construction
    pub fn gif_set_dither(mut self, yes: bool) -> Self {
        self.flags.gif_dither = yes;
        self
    }
    /// Whether lossy encoders should subsample chroma 4:2:0
    pub const fn chroma_subsampling(&self) -> bool {
        self.flags.chroma_subsampling
    }
    /// Set whether lossy encoders should subsample chroma 4:2:0,
    /// when false chroma is kept at 4:4:4
    pub fn set_chroma_subsampling(mut self, yes: bool) -> Self {
        self.flags.chroma_subsampling = yes;
        self
    }
}

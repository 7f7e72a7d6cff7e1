/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Global decoder options

use crate::bit_depth::ByteEndian;

fn decoder_strict_mode() -> DecoderFlags {
    DecoderFlags {
        inflate_confirm_adler: true,
        png_confirm_crc:       true,
        error_on_non_conformance: true,
        decode_animated:       true
    }
}

/// Fast decoder options
///
/// Disables png adler and crc checking.
fn fast_options() -> DecoderFlags {
    DecoderFlags {
        inflate_confirm_adler: false,
        png_confirm_crc:       false,
        error_on_non_conformance: false,
        decode_animated:       true
    }
}

/// Decoder options that are flags
///
/// NOTE: When you extend this, add true or false to
/// all functions above that return a `DecoderFlags`
#[derive(Copy, Debug, Clone, Default)]
pub struct DecoderFlags {
    /// Whether the inflate decoder should confirm and report adler mismatch
    inflate_confirm_adler:    bool,
    /// Whether the PNG decoder should confirm crc
    png_confirm_crc:          bool,
    /// Whether decoders should error out on recoverable non-conformance
    error_on_non_conformance: bool,
    /// Decode all frames of an animated image instead of the first
    decode_animated:          bool
}

/// Decoder options
///
/// Not all options are respected by all decoders,
/// each option names the decoders that respect it
#[derive(Debug, Copy, Clone)]
pub struct DecoderOptions {
    /// Maximum width for which decoders will
    /// not try to decode images larger than
    /// the specified width.
    ///
    /// - Default value: 16384
    /// - Respected by: `all decoders`
    max_width:     usize,
    /// Maximum height for which decoders will not
    /// try to decode images larger than the
    /// specified height
    ///
    /// - Default value: 16384
    /// - Respected by: `all decoders`
    max_height:    usize,
    /// Maximum output size for inflate.
    /// Respected by all decoders that use inflate (png)
    deflate_limit: usize,
    /// Boolean flags that influence decoding
    flags:         DecoderFlags,
    /// The byte endian the returned bytes will be stored in,
    /// in case a single pixel sample spans more than a byte
    endianness:    ByteEndian
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_width:     1 << 14,
            max_height:    1 << 14,
            deflate_limit: 1 << 30,
            flags:         decoder_strict_mode(),
            endianness:    ByteEndian::BE
        }
    }
}

/// Initializers
impl DecoderOptions {
    /// Create the decoder options with most configurable
    /// options set to their safe counterparts.
    ///
    /// This is the same as `default`, which initializes
    /// options to the safe variant
    pub fn new_safe() -> DecoderOptions {
        DecoderOptions::default()
    }

    /// Create the decoder options with the configurable options
    /// set to their fast counterparts
    ///
    /// This skips checksum verification for formats that carry them
    pub fn new_fast() -> DecoderOptions {
        let flag = fast_options();
        DecoderOptions::default().set_decoder_flags(flag)
    }
}

/// Global options respected by all decoders
impl DecoderOptions {
    /// Get maximum width configured for which the decoder
    /// should not try to decode images greater than this width
    pub const fn max_width(&self) -> usize {
        self.max_width
    }

    /// Get maximum height configured for which the decoder should
    /// not try to decode images greater than this height
    pub const fn max_height(&self) -> usize {
        self.max_height
    }

    /// Return true whether the decoder should be in strict mode
    /// and reject most errors
    pub fn strict_mode(&self) -> bool {
        self.flags.error_on_non_conformance
            | self.flags.png_confirm_crc
            | self.flags.inflate_confirm_adler
    }

    /// Set maximum width for which the decoder should not try
    /// decoding images greater than that width
    ///
    /// # Arguments
    ///
    /// * `width`:  The maximum width allowed
    ///
    /// returns: DecoderOptions
    pub fn set_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Set maximum height for which the decoder should not try
    /// decoding images greater than that height
    ///
    /// # Arguments
    ///
    /// * `height`: The maximum height allowed
    ///
    /// returns: DecoderOptions
    pub fn set_max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }

    fn set_decoder_flags(mut self, flags: DecoderFlags) -> Self {
        self.flags = flags;
        self
    }
    /// Set whether the decoder should be in standards conforming/
    /// strict mode
    ///
    /// This reduces the error tolerance level for the decoders and invalid
    /// samples will be rejected
    pub fn set_strict_mode(mut self, yes: bool) -> Self {
        self.flags.error_on_non_conformance = yes;
        self.flags.png_confirm_crc = yes;
        self.flags.inflate_confirm_adler = yes;
        self
    }

    /// Set the byte endian for which raw samples will be stored in,
    /// in case a single pixel sample spans more than a byte.
    ///
    /// The default is big endian
    pub fn set_byte_endian(mut self, endian: ByteEndian) -> Self {
        self.endianness = endian;
        self
    }

    /// Get the byte endian for which samples that span more than
    /// one byte will be treated
    pub const fn byte_endian(&self) -> ByteEndian {
        self.endianness
    }
}

/// Options respected by specific decoders
impl DecoderOptions {
    /// Whether the inflate decoder should confirm
    /// adler checksums
    pub const fn inflate_confirm_adler(&self) -> bool {
        self.flags.inflate_confirm_adler
    }
    /// Set whether the inflate decoder should confirm
    /// adler checksums
    pub fn inflate_set_confirm_adler(mut self, yes: bool) -> Self {
        self.flags.inflate_confirm_adler = yes;
        self
    }
    /// Get default inflate limit for which the decoder
    /// will not try to decompress further
    pub const fn inflate_limit(&self) -> usize {
        self.deflate_limit
    }
    /// Set the default inflate limit for which decompressors
    /// relying on inflate won't surpass this limit
    #[must_use]
    pub fn inflate_set_limit(mut self, limit: usize) -> Self {
        self.deflate_limit = limit;
        self
    }
    /// Whether the png decoder should confirm
    /// crc 32 checksums
    pub const fn png_confirm_crc(&self) -> bool {
        self.flags.png_confirm_crc
    }
    /// Set whether the png decoder should confirm
    /// CRC 32 checksums
    #[must_use]
    pub fn png_set_confirm_crc(mut self, yes: bool) -> Self {
        self.flags.png_confirm_crc = yes;
        self
    }
    /// Whether decoders for animated formats should decode
    /// all frames or just the first
    pub const fn decode_animated(&self) -> bool {
        self.flags.decode_animated
    }
    /// Set whether decoders for animated formats should decode
    /// all frames or just the first
    pub fn set_decode_animated(mut self, yes: bool) -> Self {
        self.flags.decode_animated = yes;
        self
    }
}

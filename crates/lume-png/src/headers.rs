//! Parsers for individual png chunks

use log::trace;

use crate::decoder::{PLTEEntry, PngChunk, PngDecoder};
use crate::enums::{InterlaceMethod, PngColor};
use crate::error::PngErrors;

pub mod writers;

impl<'a> PngDecoder<'a> {
    pub(crate) fn parse_ihdr(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        if self.seen_hdr {
            return Err(PngErrors::GenericStatic("Multiple IHDR chunks, corrupt PNG"));
        }
        if chunk.length != 13 {
            return Err(PngErrors::GenericStatic("IHDR chunk must be 13 bytes long"));
        }

        self.png_info.width = self.stream.get_u32_be_err()? as usize;
        self.png_info.height = self.stream.get_u32_be_err()? as usize;

        if self.png_info.width == 0 || self.png_info.height == 0 {
            return Err(PngErrors::GenericStatic("Width or height cannot be zero"));
        }
        if self.png_info.width > self.options.max_width() {
            return Err(PngErrors::TooLargeDimensions(
                "width",
                self.options.max_width(),
                self.png_info.width
            ));
        }
        if self.png_info.height > self.options.max_height() {
            return Err(PngErrors::TooLargeDimensions(
                "height",
                self.options.max_height(),
                self.png_info.height
            ));
        }

        self.png_info.depth = self.stream.get_u8_err()?;

        let color = self.stream.get_u8_err()?;
        self.png_info.color = PngColor::from_int(color)
            .ok_or(PngErrors::Generic(format!("Unknown color type {color}")))?;

        // allowed depths per color type
        let valid = match self.png_info.color {
            PngColor::Luma => matches!(self.png_info.depth, 1 | 2 | 4 | 8 | 16),
            PngColor::Palette => matches!(self.png_info.depth, 1 | 2 | 4 | 8),
            _ => matches!(self.png_info.depth, 8 | 16)
        };
        if !valid {
            return Err(PngErrors::Generic(format!(
                "Invalid bit depth {} for color type {:?}",
                self.png_info.depth, self.png_info.color
            )));
        }

        if self.stream.get_u8_err()? != 0 {
            return Err(PngErrors::GenericStatic("Compression method must be 0"));
        }
        if self.stream.get_u8_err()? != 0 {
            return Err(PngErrors::GenericStatic("Filter method must be 0"));
        }

        let interlace = self.stream.get_u8_err()?;
        self.png_info.interlace_method = InterlaceMethod::from_int(interlace)
            .ok_or(PngErrors::Generic(format!("Unknown interlace method {interlace}")))?;

        trace!("Width: {}", self.png_info.width);
        trace!("Height: {}", self.png_info.height);
        trace!("Depth: {}", self.png_info.depth);
        trace!("Color type: {:?}", self.png_info.color);
        trace!("Interlace: {:?}", self.png_info.interlace_method);

        self.seen_hdr = true;
        Ok(())
    }

    pub(crate) fn parse_plte(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        if chunk.length % 3 != 0 {
            return Err(PngErrors::GenericStatic("Invalid PLTE length, corrupt PNG"));
        }
        let entries = chunk.length / 3;
        if entries > 256 {
            return Err(PngErrors::GenericStatic("PLTE has more than 256 entries"));
        }

        self.palette.resize(entries, PLTEEntry::default());
        for entry in self.palette.iter_mut() {
            entry.red = self.stream.get_u8_err()?;
            entry.green = self.stream.get_u8_err()?;
            entry.blue = self.stream.get_u8_err()?;
        }
        self.seen_ptle = true;
        Ok(())
    }

    pub(crate) fn parse_idat(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        // IDAT chunks concatenate into one zlib stream
        let data = self.stream.get_as_ref(chunk.length)?;
        self.idat_chunks.extend_from_slice(data);
        Ok(())
    }

    pub(crate) fn parse_trns(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        match self.png_info.color {
            PngColor::Luma => {
                if chunk.length != 2 {
                    return Err(PngErrors::GenericStatic("tRNS for grayscale must be 2 bytes"));
                }
                self.trns_bytes[0] = self.stream.get_u16_be_err()?;
            }
            PngColor::RGB => {
                if chunk.length != 6 {
                    return Err(PngErrors::GenericStatic("tRNS for RGB must be 6 bytes"));
                }
                self.trns_bytes[0] = self.stream.get_u16_be_err()?;
                self.trns_bytes[1] = self.stream.get_u16_be_err()?;
                self.trns_bytes[2] = self.stream.get_u16_be_err()?;
            }
            PngColor::Palette => {
                if !self.seen_ptle {
                    return Err(PngErrors::GenericStatic("tRNS before PLTE, corrupt PNG"));
                }
                if chunk.length > self.palette.len() {
                    return Err(PngErrors::GenericStatic(
                        "tRNS longer than palette, corrupt PNG"
                    ));
                }
                for i in 0..chunk.length {
                    self.palette[i].alpha = self.stream.get_u8_err()?;
                }
            }
            _ => {
                return Err(PngErrors::GenericStatic(
                    "tRNS not allowed for color types with alpha"
                ));
            }
        }
        self.seen_trns = true;
        Ok(())
    }

    pub(crate) fn parse_gama(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        if chunk.length != 4 {
            return Err(PngErrors::GenericStatic("gAMA chunk must be 4 bytes"));
        }
        self.gama = self.stream.get_u32_be_err()? as f32 / 100_000.0;
        self.seen_gamma = true;
        Ok(())
    }

    pub(crate) fn parse_phys(&mut self, chunk: PngChunk) -> Result<(), PngErrors> {
        if chunk.length != 9 {
            return Err(PngErrors::GenericStatic("pHYs chunk must be 9 bytes"));
        }
        let ppm_x = self.stream.get_u32_be_err()?;
        let ppm_y = self.stream.get_u32_be_err()?;
        let unit = self.stream.get_u8_err()?;

        // only the meter unit carries physical meaning
        if unit == 1 {
            self.png_info.ppm_x = ppm_x;
            self.png_info.ppm_y = ppm_y;
            self.seen_phys = true;
        }
        Ok(())
    }
}

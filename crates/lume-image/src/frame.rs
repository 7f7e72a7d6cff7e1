//! The in-memory raster frame

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;

use crate::errors::ImageErrors;

/// Per frame metadata a container may carry
#[derive(Clone, Default, Debug)]
pub struct FrameProperties {
    /// dots per inch, when the container stored a resolution
    pub dpi:         Option<(u32, u32)>,
    /// display duration in milliseconds for animation frames
    pub delay_ms:    Option<u32>,
    /// disposal method byte for gif frames
    pub disposal:    Option<u8>,
    /// an opaque XMP packet attached to this frame
    pub xmp:         Option<Vec<u8>>,
    /// an opaque HDR gain map payload attached to this frame
    pub gain_map:    Option<Vec<u8>>
}

/// One decoded raster frame.
///
/// Pixels are interleaved with a tight stride, the top row first.
/// Indexed frames keep their palette so callers interested in
/// re-encode fidelity can reach it.
#[derive(Clone)]
pub struct Frame {
    width:      usize,
    height:     usize,
    colorspace: ColorSpace,
    depth:      BitDepth,
    pixels:     Vec<u8>,
    palette:    Option<Vec<[u8; 4]>>,
    /// container supplied metadata
    pub properties: FrameProperties
}

impl Frame {
    /// Create a frame from interleaved 8 bit pixels
    pub fn from_u8(
        pixels: Vec<u8>, width: usize, height: usize, colorspace: ColorSpace
    ) -> Result<Frame, ImageErrors> {
        let expected = width * height * colorspace.num_components();
        if pixels.len() != expected {
            return Err(ImageErrors::InvalidParameter(format!(
                "pixel buffer is {} bytes, {width}x{height} {colorspace:?} needs {expected}",
                pixels.len()
            )));
        }
        Ok(Frame {
            width,
            height,
            colorspace,
            depth: BitDepth::Eight,
            pixels,
            palette: None,
            properties: FrameProperties::default()
        })
    }

    /// Create a frame from 16 bit samples, stored native endian
    pub fn from_u16(
        samples: Vec<u16>, width: usize, height: usize, colorspace: ColorSpace
    ) -> Result<Frame, ImageErrors> {
        let expected = width * height * colorspace.num_components();
        if samples.len() != expected {
            return Err(ImageErrors::InvalidParameter(format!(
                "sample buffer is {} samples, {width}x{height} {colorspace:?} needs {expected}",
                samples.len()
            )));
        }
        let pixels: Vec<u8> = bytemuck::cast_slice(&samples).to_vec();
        Ok(Frame {
            width,
            height,
            colorspace,
            depth: BitDepth::Sixteen,
            pixels,
            palette: None,
            properties: FrameProperties::default()
        })
    }

    /// Create an indexed frame, one palette index per pixel
    pub fn from_indexes(
        indexes: Vec<u8>, width: usize, height: usize, palette: Vec<[u8; 4]>
    ) -> Result<Frame, ImageErrors> {
        if palette.is_empty() || palette.len() > 256 {
            return Err(ImageErrors::InvalidParameter(format!(
                "palette must have 1 to 256 entries, has {}",
                palette.len()
            )));
        }
        if indexes.len() != width * height {
            return Err(ImageErrors::InvalidParameter(format!(
                "index buffer is {} bytes, {width}x{height} needs {}",
                indexes.len(),
                width * height
            )));
        }
        if let Some(bad) = indexes.iter().find(|i| usize::from(**i) >= palette.len()) {
            return Err(ImageErrors::OutOfBounds(format!(
                "palette index {bad} outside palette of {}",
                palette.len()
            )));
        }
        Ok(Frame {
            width,
            height,
            colorspace: ColorSpace::Indexed,
            depth: BitDepth::Eight,
            pixels: indexes,
            palette: Some(palette),
            properties: FrameProperties::default()
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    pub const fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Bytes one pixel occupies
    pub fn bytes_per_pixel(&self) -> usize {
        self.colorspace.num_components() * self.depth.size_of()
    }

    /// The whole pixel buffer, rows tightly packed
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// One row of pixels
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.bytes_per_pixel();
        &self.pixels[y * stride..(y + 1) * stride]
    }

    /// The palette of an indexed frame
    pub fn palette(&self) -> Option<&[[u8; 4]]> {
        self.palette.as_deref()
    }

    /// Consume the frame returning the pixel buffer
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// A copy of this frame expanded to interleaved RGBA, useful for
    /// encoders that want one input layout.
    ///
    /// 16 bit frames are reduced to 8 bits.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 4);

        match (self.colorspace, self.depth) {
            (ColorSpace::Indexed, _) => {
                let palette = self.palette.as_ref().unwrap();
                for index in &self.pixels {
                    out.extend_from_slice(&palette[usize::from(*index)]);
                }
            }
            (_, BitDepth::Sixteen) => {
                let components = self.colorspace.num_components();
                for px in self.pixels.chunks_exact(components * 2) {
                    let px8: Vec<u8> = px
                        .chunks_exact(2)
                        .map(|c| (u16::from_ne_bytes([c[0], c[1]]) >> 8) as u8)
                        .collect();
                    push_rgba(&mut out, &px8, self.colorspace);
                }
            }
            _ => {
                let components = self.colorspace.num_components();
                for px in self.pixels.chunks_exact(components) {
                    push_rgba(&mut out, px, self.colorspace);
                }
            }
        }
        out
    }
}

fn push_rgba(out: &mut Vec<u8>, px: &[u8], colorspace: ColorSpace) {
    match colorspace {
        ColorSpace::Luma => out.extend_from_slice(&[px[0], px[0], px[0], 255]),
        ColorSpace::LumaA => out.extend_from_slice(&[px[0], px[0], px[0], px[1]]),
        ColorSpace::RGB => out.extend_from_slice(&[px[0], px[1], px[2], 255]),
        ColorSpace::RGBA => out.extend_from_slice(px),
        ColorSpace::BGR => out.extend_from_slice(&[px[2], px[1], px[0], 255]),
        ColorSpace::BGRA => out.extend_from_slice(&[px[2], px[1], px[0], px[3]]),
        _ => out.extend_from_slice(&[0, 0, 0, 255])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_access_is_tight() {
        let pixels: Vec<u8> = (0..2 * 3 * 3).map(|i| i as u8).collect();
        let frame = Frame::from_u8(pixels, 2, 3, ColorSpace::RGB).unwrap();

        assert_eq!(frame.row(0), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(frame.row(2), &[12, 13, 14, 15, 16, 17]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        assert!(Frame::from_u8(vec![0; 10], 2, 2, ColorSpace::RGB).is_err());
    }

    #[test]
    fn indexes_are_validated() {
        let palette = vec![[0, 0, 0, 255], [255, 255, 255, 255]];
        assert!(Frame::from_indexes(vec![0, 1, 1, 0], 2, 2, palette.clone()).is_ok());
        assert!(Frame::from_indexes(vec![0, 2, 1, 0], 2, 2, palette).is_err());
    }

    #[test]
    fn rgba_expansion_handles_indexed() {
        let palette = vec![[10, 20, 30, 255], [40, 50, 60, 128]];
        let frame = Frame::from_indexes(vec![0, 1], 2, 1, palette).unwrap();

        assert_eq!(
            frame.to_rgba8(),
            vec![10, 20, 30, 255, 40, 50, 60, 128]
        );
    }
}

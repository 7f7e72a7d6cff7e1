use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;

use log::trace;

use crate::anim::{write_anim, write_anmf, AnimParams, FrameHeader};
use crate::errors::WebPErrors;
use crate::riff::write_container;
use crate::yuv::rgb_to_planes;
use crate::{vp8, vp8l};

/// A frame queued for encoding
struct PendingFrame {
    rgba:        Vec<u8>,
    duration_ms: u32
}

/// A WebP encoder.
///
/// Single frames become plain VP8 (lossy) or VP8L (lossless) files,
/// multiple frames become an animation with VP8X/ANIM/ANMF chunks.
/// Lossy output discards alpha, the format does not carry it in
/// VP8 payloads.
pub struct WebPEncoder {
    options: EncoderOptions,
    frames:  Vec<PendingFrame>
}

impl WebPEncoder {
    pub fn new(options: EncoderOptions) -> WebPEncoder {
        WebPEncoder {
            options,
            frames: Vec::new()
        }
    }

    /// Append a frame, RGB or RGBA at the configured dimensions
    pub fn add_frame(&mut self, pixels: &[u8], duration_ms: Option<u32>) -> Result<(), WebPErrors> {
        let (width, height) = (self.options.width(), self.options.height());

        let rgba = match self.options.colorspace() {
            ColorSpace::RGBA => {
                if pixels.len() != width * height * 4 {
                    return Err(WebPErrors::GenericStatic("Frame size mismatch"));
                }
                pixels.to_vec()
            }
            ColorSpace::RGB => {
                if pixels.len() != width * height * 3 {
                    return Err(WebPErrors::GenericStatic("Frame size mismatch"));
                }
                let mut rgba = Vec::with_capacity(width * height * 4);
                for px in pixels.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                rgba
            }
            _ => {
                return Err(WebPErrors::Unsupported(
                    "webp input must be RGB or RGBA".to_string()
                ))
            }
        };

        self.frames.push(PendingFrame {
            rgba,
            duration_ms: duration_ms.unwrap_or(self.options.delay_ms())
        });
        Ok(())
    }

    /// Encode all frames into a webp file
    pub fn encode(&mut self) -> Result<Vec<u8>, WebPErrors> {
        if self.frames.is_empty() {
            return Err(WebPErrors::GenericStatic("No frames to encode"));
        }
        let (width, height) = (self.options.width(), self.options.height());
        if width == 0 || width > 1 << 14 || height == 0 || height > 1 << 14 {
            return Err(WebPErrors::GenericStatic(
                "Dimensions not representable in a webp bitstream"
            ));
        }

        if self.frames.len() == 1 {
            let payload = self.encode_frame(&self.frames[0].rgba)?;
            let fourcc: &[u8; 4] = if self.options.webp_lossless() {
                b"VP8L"
            } else {
                b"VP8 "
            };
            return Ok(write_container(&[(fourcc, payload)]));
        }

        // animation: VP8X + ANIM + one ANMF per frame
        trace!("Encoding {} frame animation", self.frames.len());

        let mut vp8x = Vec::with_capacity(10);
        // animation flag
        vp8x.push(0x02);
        vp8x.extend_from_slice(&[0, 0, 0]);
        push_u24(&mut vp8x, width - 1);
        push_u24(&mut vp8x, height - 1);

        let anim = write_anim(&AnimParams {
            background: 0,
            loop_count: self.options.loop_count()
        });

        let mut chunks: Vec<(&[u8; 4], Vec<u8>)> = vec![(b"VP8X", vp8x), (b"ANIM", anim)];

        let mut anmf_payloads = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            let payload = self.encode_frame(&frame.rgba)?;

            // wrap the image chunk inside the ANMF payload
            let fourcc: &[u8; 4] = if self.options.webp_lossless() {
                b"VP8L"
            } else {
                b"VP8 "
            };
            let mut sub = Vec::with_capacity(8 + payload.len());
            sub.extend_from_slice(fourcc);
            sub.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            sub.extend_from_slice(&payload);
            if payload.len() % 2 == 1 {
                sub.push(0);
            }

            let header = FrameHeader {
                x: 0,
                y: 0,
                width,
                height,
                duration_ms: frame.duration_ms,
                dispose: false,
                blend: false
            };
            anmf_payloads.push(write_anmf(&header, &sub));
        }
        for payload in &anmf_payloads {
            chunks.push((b"ANMF", payload.clone()));
        }

        Ok(write_container(&chunks))
    }

    /// Encode one frame as a raw VP8 or VP8L payload
    fn encode_frame(&self, rgba: &[u8]) -> Result<Vec<u8>, WebPErrors> {
        let (width, height) = (self.options.width(), self.options.height());

        if self.options.webp_lossless() {
            let argb: Vec<u32> = rgba
                .chunks_exact(4)
                .map(|px| {
                    (u32::from(px[3]) << 24)
                        | (u32::from(px[0]) << 16)
                        | (u32::from(px[1]) << 8)
                        | u32::from(px[2])
                })
                .collect();
            return Ok(vp8l::encoder::encode(&argb, width, height));
        }

        let planes = rgb_to_planes(rgba, width, height, 4);
        Ok(vp8::encoder::encode(
            &planes.y,
            &planes.u,
            &planes.v,
            width,
            height,
            self.options.quality()
        ))
    }
}

fn push_u24(out: &mut Vec<u8>, value: usize) {
    out.push(value as u8);
    out.push((value >> 8) as u8);
    out.push((value >> 16) as u8);
}

//! Encode then decode through our own codec, asserting lossy bounds

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_jpeg::{JpegDecoder, JpegEncoder};

fn options(w: usize, h: usize, colorspace: ColorSpace) -> EncoderOptions {
    EncoderOptions::default()
        .set_width(w)
        .set_height(h)
        .set_colorspace(colorspace)
        .set_depth(BitDepth::Eight)
}

fn mean_abs_error(a: &[u8], b: &[u8]) -> f64 {
    assert_eq!(a.len(), b.len());
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.len() as f64
}

#[test]
fn solid_red_is_within_four() {
    // 16x16 solid red at quality 80, every pixel within +-4
    let (w, h) = (16, 16);
    let mut data = vec![0_u8; w * h * 3];
    for px in data.chunks_exact_mut(3) {
        px[0] = 255;
    }

    let file = JpegEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();

    let mut decoder = JpegDecoder::new(&file);
    let out = decoder.decode().unwrap();

    assert_eq!(decoder.dimensions(), Some((w, h)));
    for px in out.chunks_exact(3) {
        assert!(px[0] >= 251, "red {}", px[0]);
        assert!(px[1] <= 4, "green {}", px[1]);
        assert!(px[2] <= 4, "blue {}", px[2]);
    }
}

#[test]
fn gradient_mean_error_is_small() {
    // a smooth gradient, natural-image-like content
    let (w, h) = (64, 48);
    let mut data = vec![0_u8; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 3;
            data[i] = (x * 255 / w) as u8;
            data[i + 1] = (y * 255 / h) as u8;
            data[i + 2] = ((x + y) * 255 / (w + h)) as u8;
        }
    }

    let file = JpegEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();
    let out = JpegDecoder::new(&file).decode().unwrap();

    assert!(mean_abs_error(&data, &out) < 8.0);
}

#[test]
fn four_four_four_beats_subsampling_on_chroma_edges() {
    let (w, h) = (32, 32);
    // alternating saturated columns, worst case for chroma subsampling
    let mut data = vec![0_u8; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 3;
            if x % 2 == 0 {
                data[i] = 255;
            } else {
                data[i + 2] = 255;
            }
        }
    }

    let sub = JpegEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();
    let full = JpegEncoder::new(options(w, h, ColorSpace::RGB).set_chroma_subsampling(false))
        .encode(&data)
        .unwrap();

    let sub_out = JpegDecoder::new(&sub).decode().unwrap();
    let full_out = JpegDecoder::new(&full).decode().unwrap();

    assert!(mean_abs_error(&data, &full_out) < mean_abs_error(&data, &sub_out));
}

#[test]
fn grayscale_round_trips() {
    let (w, h) = (40, 25);
    let data: Vec<u8> = (0..w * h).map(|i| (i % 256) as u8).collect();

    let file = JpegEncoder::new(options(w, h, ColorSpace::Luma))
        .encode(&data)
        .unwrap();

    let mut decoder = JpegDecoder::new(&file);
    let out = decoder.decode().unwrap();

    assert_eq!(decoder.colorspace(), ColorSpace::Luma);
    assert_eq!(out.len(), w * h);
    assert!(mean_abs_error(&data, &out) < 8.0);
}

#[test]
fn odd_dimensions_round_trip() {
    // dimensions that are not multiples of the MCU size
    let (w, h) = (17, 11);
    let mut data = vec![0_u8; w * h * 3];
    for (i, b) in data.iter_mut().enumerate() {
        *b = ((i * 13) % 256) as u8;
    }

    let file = JpegEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();

    let mut decoder = JpegDecoder::new(&file);
    let out = decoder.decode().unwrap();
    assert_eq!(decoder.dimensions(), Some((w, h)));
    assert_eq!(out.len(), w * h * 3);
}

#[test]
fn truncated_file_errors() {
    let (w, h) = (16, 16);
    let data = vec![128_u8; w * h * 3];
    let file = JpegEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();

    // cut inside the headers
    assert!(JpegDecoder::new(&file[..40]).decode().is_err());
}

#[test]
fn progressive_is_rejected() {
    // SOI + SOF2 header
    let data = [
        0xFF, 0xD8, 0xFF, 0xC2, 0x00, 0x0B, 0x08, 0x00, 0x10, 0x00, 0x10, 0x01, 0x01, 0x11, 0x00
    ];
    let err = JpegDecoder::new(&data).decode().unwrap_err();
    assert!(matches!(err, lume_jpeg::DecodeErrors::Unsupported(_)));
}

//! Encode then decode through our own codec

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_webp::{probe_webp, WebPDecoder, WebPEncoder};

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
fn lossless_rgba_is_exact() {
    let (w, h) = (37, 23);
    let mut data = Vec::with_capacity(w * h * 4);
    for i in 0..w * h {
        data.extend_from_slice(&[
            (i * 7) as u8,
            (i * 13) as u8,
            (i * 29) as u8,
            if i % 5 == 0 { 128 } else { 255 }
        ]);
    }

    let mut encoder = WebPEncoder::new(options(w, h, ColorSpace::RGBA).webp_set_lossless(true));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();
    assert!(probe_webp(&file));

    let mut decoder = WebPDecoder::new(&file);
    let frames = decoder.decode_all().unwrap();

    assert_eq!(decoder.dimensions(), Some((w, h)));
    assert!(decoder.is_lossless());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].pixels, data);
}

#[test]
fn lossless_compresses_repetitive_content() {
    let (w, h) = (128, 128);
    // two-color checkerboard, the back references should bite
    let mut data = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        for x in 0..w {
            if (x / 8 + y / 8) % 2 == 0 {
                data.extend_from_slice(&[200, 30, 40, 255]);
            } else {
                data.extend_from_slice(&[20, 160, 220, 255]);
            }
        }
    }

    let mut encoder = WebPEncoder::new(options(w, h, ColorSpace::RGBA).webp_set_lossless(true));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    assert!(file.len() < data.len() / 10);

    let frames = WebPDecoder::new(&file).decode_all().unwrap();
    assert_eq!(frames[0].pixels, data);
}

#[test]
fn lossy_solid_color_is_close() {
    let (w, h) = (32, 32);
    let mut data = Vec::with_capacity(w * h * 3);
    for _ in 0..w * h {
        data.extend_from_slice(&[180, 60, 90]);
    }

    let mut encoder = WebPEncoder::new(options(w, h, ColorSpace::RGB).set_quality(80));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    let frames = WebPDecoder::new(&file).decode_all().unwrap();
    assert_eq!(frames.len(), 1);

    let rgb: Vec<u8> = frames[0]
        .pixels
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    assert!(mean_abs_error(&data, &rgb) < 8.0);
}

#[test]
fn lossy_gradient_mean_error_is_bounded() {
    let (w, h) = (64, 48);
    let mut data = vec![0_u8; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 3;
            data[i] = (x * 255 / w) as u8;
            data[i + 1] = (y * 255 / h) as u8;
            data[i + 2] = 128;
        }
    }

    let mut encoder = WebPEncoder::new(options(w, h, ColorSpace::RGB).set_quality(80));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    let frames = WebPDecoder::new(&file).decode_all().unwrap();
    let rgb: Vec<u8> = frames[0]
        .pixels
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    assert!(mean_abs_error(&data, &rgb) < 8.0);
}

#[test]
fn animation_round_trips_frames_and_durations() {
    let (w, h) = (16, 16);
    let frame_colors: [[u8; 4]; 3] = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];

    let mut encoder = WebPEncoder::new(
        options(w, h, ColorSpace::RGBA)
            .webp_set_lossless(true)
            .set_loop_count(4)
    );
    for (i, color) in frame_colors.iter().enumerate() {
        let data: Vec<u8> = color.iter().copied().cycle().take(w * h * 4).collect();
        encoder.add_frame(&data, Some((i as u32 + 1) * 100)).unwrap();
    }
    let file = encoder.encode().unwrap();

    let mut decoder = WebPDecoder::new(&file);
    let frames = decoder.decode_all().unwrap();

    assert_eq!(frames.len(), 3);
    assert_eq!(decoder.loop_count(), 4);
    for (frame, (i, color)) in frames.iter().zip(frame_colors.iter().enumerate()) {
        assert_eq!(frame.duration_ms, (i as u32 + 1) * 100);
        assert_eq!(&frame.pixels[..4], color);
    }
}

#[test]
fn odd_dimensions_round_trip_losslessly() {
    let (w, h) = (17, 5);
    let data: Vec<u8> = (0..w * h * 4).map(|i| (i * 11) as u8).collect();

    let mut encoder = WebPEncoder::new(options(w, h, ColorSpace::RGBA).webp_set_lossless(true));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    let frames = WebPDecoder::new(&file).decode_all().unwrap();
    assert_eq!(frames[0].pixels, data);
}

#[test]
fn garbage_is_rejected() {
    assert!(WebPDecoder::new(b"RIFFxxxxWAVE").decode_all().is_err());
    assert!(WebPDecoder::new(&[0; 4]).decode_all().is_err());
}

#[test]
fn truncated_lossless_errors() {
    let (w, h) = (64, 64);
    let data: Vec<u8> = (0..w * h * 4).map(|i| (i * 3) as u8).collect();

    let mut encoder = WebPEncoder::new(options(w, h, ColorSpace::RGBA).webp_set_lossless(true));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    assert!(WebPDecoder::new(&file[..file.len() / 2]).decode_all().is_err());
}

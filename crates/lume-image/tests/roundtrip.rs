//! Lossless and lossy round trip laws across every codec pair

use lume_core::colorspace::ColorSpace;
use lume_core::options::{DecoderOptions, EncoderOptions};
use lume_image::codecs::ImageFormat;
use lume_image::frame::Frame;
use lume_image::image::Image;
use nanorand::Rng;

fn random_rgba(w: usize, h: usize, seed: u64) -> Vec<u8> {
    let mut rng = nanorand::WyRand::new_seed(seed);
    let mut data = vec![0_u8; w * h * 4];
    rng.fill_bytes(&mut data);
    // avoid translucent pixels, gif thresholds alpha
    for px in data.chunks_exact_mut(4) {
        px[3] = 255;
    }
    data
}

fn mean_abs_error(a: &[u8], b: &[u8]) -> f64 {
    assert_eq!(a.len(), b.len());
    let total: u64 = a.iter().zip(b).map(|(x, y)| u64::from(x.abs_diff(*y))).sum();
    total as f64 / a.len() as f64
}

fn encode_decode(format: ImageFormat, frame: Frame, options: EncoderOptions) -> Image {
    let image = Image::from_frame(frame);
    let file = format.encode(&image, options).unwrap();

    // the sniffer must recognize our own output
    assert_eq!(lume_image::codecs::guess_format(&file), format);

    format.decode(&file, DecoderOptions::default()).unwrap()
}

#[test]
fn png_is_lossless_for_rgba() {
    let (w, h) = (23, 31);
    let data = random_rgba(w, h, 1);
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGBA).unwrap();

    let decoded = encode_decode(ImageFormat::PNG, frame, EncoderOptions::default());
    assert_eq!(decoded.frames()[0].pixels(), &data);
}

#[test]
fn bmp_is_lossless_for_rgb() {
    let (w, h) = (19, 7);
    let mut data = random_rgba(w, h, 2);
    data = data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGB).unwrap();

    let decoded = encode_decode(ImageFormat::BMP, frame, EncoderOptions::default());
    assert_eq!(decoded.frames()[0].pixels(), &data);
}

#[test]
fn tiff_is_lossless_for_rgba() {
    let (w, h) = (15, 15);
    let data = random_rgba(w, h, 3);
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGBA).unwrap();

    let decoded = encode_decode(ImageFormat::TIFF, frame, EncoderOptions::default());
    assert_eq!(decoded.frames()[0].pixels(), &data);
}

#[test]
fn webp_lossless_is_lossless() {
    let (w, h) = (22, 13);
    let data = random_rgba(w, h, 4);
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGBA).unwrap();

    let decoded = encode_decode(
        ImageFormat::WebP,
        frame,
        EncoderOptions::default().webp_set_lossless(true)
    );
    assert_eq!(decoded.frames()[0].pixels(), &data);
}

#[test]
fn gif_is_lossless_under_256_colors() {
    // 64 unique colors in a 16x16 image
    let (w, h) = (16, 16);
    let mut data = Vec::new();
    for i in 0..w * h {
        let c = (i % 64) as u8;
        data.extend_from_slice(&[c * 4, 255 - c * 2, c, 255]);
    }
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGBA).unwrap();

    let decoded = encode_decode(ImageFormat::GIF, frame, EncoderOptions::default());
    assert_eq!(decoded.frames()[0].pixels(), &data);
}

#[test]
fn jpeg_quality_80_bounds_mean_error_on_gradients() {
    let (w, h) = (48, 32);
    let mut data = vec![0_u8; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 3;
            data[i] = (x * 255 / w) as u8;
            data[i + 1] = ((x + y) * 255 / (w + h)) as u8;
            data[i + 2] = (y * 255 / h) as u8;
        }
    }
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGB).unwrap();

    let decoded = encode_decode(
        ImageFormat::JPEG,
        frame,
        EncoderOptions::default().set_quality(80)
    );
    assert!(mean_abs_error(&data, decoded.frames()[0].pixels()) < 8.0);
}

#[test]
fn webp_lossy_bounds_mean_error_on_gradients() {
    let (w, h) = (48, 32);
    let mut data = vec![0_u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            data[i] = (x * 255 / w) as u8;
            data[i + 1] = 100;
            data[i + 2] = (y * 255 / h) as u8;
            data[i + 3] = 255;
        }
    }
    let frame = Frame::from_u8(data.clone(), w, h, ColorSpace::RGBA).unwrap();

    let decoded = encode_decode(
        ImageFormat::WebP,
        frame,
        EncoderOptions::default().set_quality(80)
    );
    let rgb_in: Vec<u8> = data.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect();
    let rgb_out: Vec<u8> = decoded.frames()[0]
        .pixels()
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect();

    assert!(mean_abs_error(&rgb_in, &rgb_out) < 8.0);
}

#[test]
fn multi_frame_count_survives_gif_and_webp() {
    let (w, h) = (8, 8);
    let mut frames = Vec::new();
    for i in 0..4_usize {
        let data: Vec<u8> = std::iter::repeat([(i * 60) as u8, 80, 10, 255])
            .take(w * h)
            .flatten()
            .collect();
        let mut frame = Frame::from_u8(data, w, h, ColorSpace::RGBA).unwrap();
        frame.properties.delay_ms = Some(100);
        frames.push(frame);
    }

    for (format, options) in [
        (ImageFormat::GIF, EncoderOptions::default()),
        (
            ImageFormat::WebP,
            EncoderOptions::default().webp_set_lossless(true)
        )
    ] {
        let image = Image::new(frames.clone()).unwrap();
        let file = format.encode(&image, options).unwrap();
        let decoded = format.decode(&file, DecoderOptions::default()).unwrap();
        assert_eq!(decoded.frame_count(), 4, "{format:?}");
    }
}

//! Encode then decode round trips

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_gif::{GifDecoder, GifEncoder};

fn options(w: usize, h: usize, colorspace: ColorSpace) -> EncoderOptions {
    EncoderOptions::default()
        .set_width(w)
        .set_height(h)
        .set_colorspace(colorspace)
        .set_depth(BitDepth::Eight)
}

#[test]
fn few_colors_round_trip_exactly() {
    // 4 unique colors fit the palette, lossless by construction
    let (w, h) = (8, 4);
    let colors: [[u8; 3]; 4] = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [20, 20, 20]];
    let mut data = Vec::new();
    for i in 0..w * h {
        data.extend_from_slice(&colors[i % 4]);
    }

    let mut encoder = GifEncoder::new(options(w, h, ColorSpace::RGB));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    let frames = GifDecoder::new(&file).decode_all().unwrap();
    assert_eq!(frames.len(), 1);

    for (px, expected) in frames[0].pixels.chunks_exact(4).zip(data.chunks_exact(3)) {
        assert_eq!(&px[..3], expected);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn gradient_palette_is_bounded() {
    // a 256 pixel gradient: unique output colors must equal the
    // palette that was written and stay under 257
    let w = 256;
    let data: Vec<u8> = (0..w).flat_map(|i| [i as u8, i as u8, i as u8]).collect();

    let mut encoder = GifEncoder::new(options(w, 1, ColorSpace::RGB));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    let frames = GifDecoder::new(&file).decode_all().unwrap();
    let mut unique: Vec<&[u8]> = frames[0].pixels.chunks_exact(4).collect();
    unique.sort();
    unique.dedup();

    assert!(unique.len() <= 256);
}

#[test]
fn delays_survive_with_centisecond_rounding() {
    let (w, h) = (4, 4);
    let frame_a = vec![255_u8; w * h * 3];
    let frame_b = vec![0_u8; w * h * 3];
    let frame_c: Vec<u8> = (0..w * h * 3).map(|i| (i * 8) as u8).collect();

    let mut encoder = GifEncoder::new(options(w, h, ColorSpace::RGB));
    encoder.add_frame(&frame_a, Some(100)).unwrap();
    encoder.add_frame(&frame_b, Some(200)).unwrap();
    encoder.add_frame(&frame_c, Some(300)).unwrap();
    let file = encoder.encode().unwrap();

    let frames = GifDecoder::new(&file).decode_all().unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].delay_cs, 10);
    assert_eq!(frames[1].delay_cs, 20);
    assert_eq!(frames[2].delay_cs, 30);
}

#[test]
fn multi_frame_writes_loop_extension() {
    let (w, h) = (4, 4);
    let mut encoder = GifEncoder::new(options(w, h, ColorSpace::RGB).set_loop_count(5));
    encoder.add_frame(&vec![10_u8; w * h * 3], None).unwrap();
    encoder.add_frame(&vec![200_u8; w * h * 3], None).unwrap();
    let file = encoder.encode().unwrap();

    let mut decoder = GifDecoder::new(&file);
    decoder.decode_all().unwrap();
    assert_eq!(decoder.loop_count(), Some(5));
}

#[test]
fn transparent_pixels_reserve_an_index() {
    let (w, h) = (2, 2);
    // one fully transparent pixel
    #[rustfmt::skip]
    let data = [
        255, 0, 0, 255,
        0, 255, 0, 255,
        0, 0, 255, 255,
        0, 0, 0, 0
    ];

    let mut encoder = GifEncoder::new(options(w, h, ColorSpace::RGBA));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    let frames = GifDecoder::new(&file).decode_all().unwrap();
    assert!(frames[0].transparent.is_some());
    // the transparent pixel never got drawn, canvas stays clear
    assert_eq!(frames[0].pixels[3 * 4 + 3], 0);
}

#[test]
fn truncated_gif_errors() {
    let (w, h) = (8, 8);
    let data = vec![128_u8; w * h * 3];
    let mut encoder = GifEncoder::new(options(w, h, ColorSpace::RGB));
    encoder.add_frame(&data, None).unwrap();
    let file = encoder.encode().unwrap();

    assert!(GifDecoder::new(&file[..10]).decode_all().is_err());
}

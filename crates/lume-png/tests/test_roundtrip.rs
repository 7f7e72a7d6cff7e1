//! Encode then decode round trips through our own codec

use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_core::result::DecodingResult;
use lume_png::{PngDecoder, PngEncoder};
use nanorand::Rng;

fn encode(data: &[u8], width: usize, height: usize, colorspace: ColorSpace) -> Vec<u8> {
    let options = EncoderOptions::default()
        .set_width(width)
        .set_height(height)
        .set_colorspace(colorspace)
        .set_depth(BitDepth::Eight);

    PngEncoder::new(data, options).encode().unwrap()
}

fn decode_u8(file: &[u8]) -> Vec<u8> {
    match PngDecoder::new(file).decode().unwrap() {
        DecodingResult::U8(pixels) => pixels,
        _ => panic!("expected 8 bit output")
    }
}

#[test]
fn two_by_two_rgba_is_exact() {
    #[rustfmt::skip]
    let pixels = [
        255, 0, 0, 255,
        0, 255, 0, 255,
        0, 0, 255, 255,
        255, 255, 255, 128
    ];

    let file = encode(&pixels, 2, 2, ColorSpace::RGBA);
    assert_eq!(decode_u8(&file), &pixels);
}

#[test]
fn random_rgb_round_trips() {
    let mut rng = nanorand::WyRand::new_seed(99);
    let (w, h) = (129, 47);
    let mut pixels = vec![0_u8; w * h * 3];
    rng.fill_bytes(&mut pixels);

    let file = encode(&pixels, w, h, ColorSpace::RGB);
    assert_eq!(decode_u8(&file), pixels);
}

#[test]
fn luma_alpha_round_trips() {
    let (w, h) = (33, 9);
    let pixels: Vec<u8> = (0..w * h * 2).map(|i| (i * 31) as u8).collect();

    let file = encode(&pixels, w, h, ColorSpace::LumaA);
    assert_eq!(decode_u8(&file), pixels);
}

#[test]
fn sixteen_bit_round_trips() {
    let (w, h) = (21, 17);
    // big endian wire order input
    let samples: Vec<u16> = (0..w * h * 3).map(|i| (i * 997) as u16).collect();
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();

    let options = EncoderOptions::default()
        .set_width(w)
        .set_height(h)
        .set_colorspace(ColorSpace::RGB)
        .set_depth(BitDepth::Sixteen);

    let file = PngEncoder::new(&data, options).encode().unwrap();

    match PngDecoder::new(&file).decode().unwrap() {
        DecodingResult::U16(pixels) => assert_eq!(pixels, samples),
        _ => panic!("expected 16 bit output")
    }
}

#[test]
fn palette_round_trips_through_rgba() {
    let palette: Vec<[u8; 4]> = vec![
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [9, 9, 9, 0]
    ];
    let indices = [0_u8, 1, 2, 3, 3, 2, 1, 0, 0, 1, 2, 3];

    let options = EncoderOptions::default()
        .set_width(4)
        .set_height(3)
        .set_colorspace(ColorSpace::Indexed)
        .set_depth(BitDepth::Eight);

    let mut encoder = PngEncoder::new(&indices, options);
    encoder.set_palette(&palette);
    let file = encoder.encode().unwrap();

    let mut decoder = PngDecoder::new(&file);
    let pixels = match decoder.decode().unwrap() {
        DecodingResult::U8(pixels) => pixels,
        _ => panic!("expected 8 bit output")
    };

    // a tRNS was written, decode expands to RGBA
    assert_eq!(decoder.colorspace(), Some(ColorSpace::RGBA));
    for (i, px) in pixels.chunks_exact(4).enumerate() {
        let expected = palette[usize::from(indices[i])];
        assert_eq!(px, expected);
    }
}

#[test]
fn corrupt_crc_is_rejected() {
    let pixels = [1_u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
    let mut file = encode(&pixels, 2, 2, ColorSpace::RGB);

    // flip a bit inside the IHDR payload
    file[17] ^= 0x40;

    assert!(PngDecoder::new(&file).decode().is_err());
}

#[test]
fn truncated_file_is_rejected() {
    let pixels = [0_u8; 12];
    let file = encode(&pixels, 2, 2, ColorSpace::RGB);

    assert!(PngDecoder::new(&file[..file.len() / 2]).decode().is_err());
}

//! Encode then decode round trips

use lume_bmp::{probe_bmp, BmpDecoder, BmpEncoder};
use lume_core::bit_depth::BitDepth;
use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;

fn options(w: usize, h: usize, colorspace: ColorSpace) -> EncoderOptions {
    EncoderOptions::default()
        .set_width(w)
        .set_height(h)
        .set_colorspace(colorspace)
        .set_depth(BitDepth::Eight)
}

#[test]
fn rgb_round_trips_exactly() {
    // odd width exercises row padding
    let (w, h) = (3, 5);
    let data: Vec<u8> = (0..w * h * 3).map(|i| (i * 17) as u8).collect();

    let file = BmpEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();
    assert!(probe_bmp(&file));

    let mut decoder = BmpDecoder::new(&file);
    let out = decoder.decode().unwrap();

    assert_eq!(decoder.dimensions(), Some((w, h)));
    assert_eq!(decoder.colorspace(), Some(ColorSpace::RGB));
    assert_eq!(out, data);
}

#[test]
fn bgra_with_preserve_alpha_keeps_alpha() {
    let (w, h) = (4, 4);
    let mut data = Vec::new();
    for i in 0..w * h {
        data.extend_from_slice(&[(i * 3) as u8, (i * 5) as u8, (i * 7) as u8, (i * 11) as u8]);
    }

    let file = BmpEncoder::new(options(w, h, ColorSpace::BGRA).bmp_set_preserve_alpha(true))
        .encode(&data)
        .unwrap();

    // a V4 header was written
    assert_eq!(u32::from_le_bytes(file[14..18].try_into().unwrap()), 108);

    let mut decoder = BmpDecoder::new(&file);
    let out = decoder.decode().unwrap();

    assert_eq!(decoder.colorspace(), Some(ColorSpace::RGBA));
    for (src, dst) in data.chunks_exact(4).zip(out.chunks_exact(4)) {
        // decoder outputs RGBA, input was BGRA
        assert_eq!(dst, [src[2], src[1], src[0], src[3]]);
    }
}

#[test]
fn alpha_is_dropped_without_preserve() {
    let (w, h) = (2, 2);
    let data = vec![10_u8; w * h * 4];

    let file = BmpEncoder::new(options(w, h, ColorSpace::RGBA))
        .encode(&data)
        .unwrap();

    let mut decoder = BmpDecoder::new(&file);
    decoder.decode().unwrap();
    assert_eq!(decoder.colorspace(), Some(ColorSpace::RGB));
}

#[test]
fn rejects_sixteen_bit_files() {
    let (w, h) = (2, 2);
    let data = vec![0_u8; w * h * 3];
    let mut file = BmpEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();

    // patch the bit count to 16
    file[28] = 16;
    assert!(matches!(
        BmpDecoder::new(&file).decode(),
        Err(lume_bmp::BmpErrors::Unsupported(_))
    ));
}

#[test]
fn truncated_pixels_error() {
    let (w, h) = (8, 8);
    let data = vec![0_u8; w * h * 3];
    let file = BmpEncoder::new(options(w, h, ColorSpace::RGB))
        .encode(&data)
        .unwrap();

    assert!(BmpDecoder::new(&file[..file.len() - 10]).decode().is_err());
}

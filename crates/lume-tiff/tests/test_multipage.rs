//! Multi-page encode/decode behavior

use lume_core::colorspace::ColorSpace;
use lume_core::options::EncoderOptions;
use lume_tiff::{probe_tiff, TiffDecoder, TiffEncoder};

#[test]
fn single_rgb_page_round_trips() {
    let (w, h) = (31, 17);
    let data: Vec<u8> = (0..w * h * 3).map(|i| (i % 251) as u8).collect();

    let mut encoder = TiffEncoder::new(EncoderOptions::default());
    encoder.add_page(&data, w, h, ColorSpace::RGB).unwrap();
    let file = encoder.encode().unwrap();
    assert!(probe_tiff(&file));

    let mut decoder = TiffDecoder::new(&file);
    assert_eq!(decoder.pages().unwrap(), 1);
    assert_eq!(decoder.dimensions(0).unwrap(), (w, h));
    assert_eq!(decoder.colorspace(0).unwrap(), ColorSpace::RGB);
    assert_eq!(decoder.decode().unwrap(), data);
}

#[test]
fn three_pages_with_growing_dimensions() {
    // 10x10, 20x20, 30x30 pages come back in order with matching
    // dimensions
    let sizes = [10_usize, 20, 30];
    let mut encoder = TiffEncoder::new(EncoderOptions::default());

    for (i, size) in sizes.iter().enumerate() {
        let data = vec![(i * 80) as u8; size * size * 3];
        encoder.add_page(&data, *size, *size, ColorSpace::RGB).unwrap();
    }
    let file = encoder.encode().unwrap();

    let mut decoder = TiffDecoder::new(&file);
    assert_eq!(decoder.pages().unwrap(), 3);

    for (i, size) in sizes.iter().enumerate() {
        assert_eq!(decoder.dimensions(i).unwrap(), (*size, *size));
        let page = decoder.decode_page(i).unwrap();
        assert_eq!(page.len(), size * size * 3);
        assert!(page.iter().all(|v| *v == (i * 80) as u8));
    }
}

#[test]
fn rgba_pages_carry_extra_samples() {
    let (w, h) = (9, 9);
    let data: Vec<u8> = (0..w * h * 4).map(|i| (i * 3) as u8).collect();

    let mut encoder = TiffEncoder::new(EncoderOptions::default());
    encoder.add_page(&data, w, h, ColorSpace::RGBA).unwrap();
    let file = encoder.encode().unwrap();

    let mut decoder = TiffDecoder::new(&file);
    assert_eq!(decoder.colorspace(0).unwrap(), ColorSpace::RGBA);
    assert_eq!(decoder.decode().unwrap(), data);
}

#[test]
fn grayscale_round_trips() {
    let (w, h) = (300, 2);
    // wide enough that multiple strips are written
    let data: Vec<u8> = (0..w * h).map(|i| (i % 256) as u8).collect();

    let mut encoder = TiffEncoder::new(EncoderOptions::default());
    encoder.add_page(&data, w, h, ColorSpace::Luma).unwrap();
    let file = encoder.encode().unwrap();

    let mut decoder = TiffDecoder::new(&file);
    assert_eq!(decoder.colorspace(0).unwrap(), ColorSpace::Luma);
    assert_eq!(decoder.decode().unwrap(), data);
}

#[test]
fn resolution_defaults_to_72_dpi() {
    let data = vec![0_u8; 4 * 4 * 3];
    let mut encoder = TiffEncoder::new(EncoderOptions::default());
    encoder.add_page(&data, 4, 4, ColorSpace::RGB).unwrap();
    let file = encoder.encode().unwrap();

    let mut decoder = TiffDecoder::new(&file);
    assert_eq!(decoder.dpi(0).unwrap(), Some((72, 72)));
}

#[test]
fn big_endian_is_rejected() {
    let data = b"MM\0*\0\0\0\x08";
    assert!(matches!(
        TiffDecoder::new(data).decode_headers(),
        Err(lume_tiff::TiffErrors::Unsupported(_))
    ));
}

#[test]
fn page_index_out_of_bounds_errors() {
    let data = vec![0_u8; 2 * 2 * 3];
    let mut encoder = TiffEncoder::new(EncoderOptions::default());
    encoder.add_page(&data, 2, 2, ColorSpace::RGB).unwrap();
    let file = encoder.encode().unwrap();

    let mut decoder = TiffDecoder::new(&file);
    assert!(decoder.decode_page(1).is_err());
}

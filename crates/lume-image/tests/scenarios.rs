//! End to end behavior through the source/destination surface

use lume_core::colorspace::ColorSpace;
use lume_image::codecs::{guess_format, ImageFormat};
use lume_image::destination::Destination;
use lume_image::frame::Frame;
use lume_image::properties::{keys, PropertyMap, Value};
use lume_image::source::Source;

fn rgba_frame(pixels: &[u8], w: usize, h: usize) -> Frame {
    Frame::from_u8(pixels.to_vec(), w, h, ColorSpace::RGBA).unwrap()
}

#[test]
fn two_by_two_rgba_round_trips_through_png() {
    #[rustfmt::skip]
    let pixels = [
        255, 0, 0, 255,
        0, 255, 0, 255,
        0, 0, 255, 255,
        255, 255, 255, 128
    ];
    let frame = rgba_frame(&pixels, 2, 2);

    let mut dest = Destination::new("public.png", 1, None).unwrap();
    dest.add_image(&frame, None).unwrap();
    let file = dest.finalize().unwrap();

    let mut source = Source::new(&file).unwrap();
    assert_eq!(source.format(), ImageFormat::PNG);
    assert_eq!(source.count(), 1);
    assert_eq!(source.primary_index(), 0);

    let decoded = source.image_at(0).unwrap();
    assert_eq!(decoded.pixels(), &pixels);
}

#[test]
fn gradient_through_gif_stays_within_palette_budget() {
    // a 256 pixel gradient: decoded unique colors match the palette
    // that was written and never exceed 256
    let w = 256;
    let pixels: Vec<u8> = (0..w)
        .flat_map(|i| [i as u8, i as u8, i as u8, 255])
        .collect();
    let frame = rgba_frame(&pixels, w, 1);

    let mut dest = Destination::new("com.compuserve.gif", 1, None).unwrap();
    dest.add_image(&frame, None).unwrap();
    let file = dest.finalize().unwrap();

    let mut source = Source::new(&file).unwrap();
    let decoded = source.image_at(0).unwrap();

    let mut unique: Vec<&[u8]> = decoded.pixels().chunks_exact(4).collect();
    unique.sort();
    unique.dedup();
    assert!(unique.len() <= 256);
}

#[test]
fn solid_red_through_jpeg_is_within_four() {
    let (w, h) = (16, 16);
    let pixels: Vec<u8> = std::iter::repeat([255, 0, 0, 255])
        .take(w * h)
        .flatten()
        .collect();
    let frame = rgba_frame(&pixels, w, h);

    let mut options = PropertyMap::new();
    options.insert(keys::LOSSY_QUALITY.into(), Value::Float(0.8));

    let mut dest = Destination::new("public.jpeg", 1, Some(&options)).unwrap();
    dest.add_image(&frame, None).unwrap();
    let file = dest.finalize().unwrap();

    let mut source = Source::new(&file).unwrap();
    let decoded = source.image_at(0).unwrap();

    assert_eq!(decoded.colorspace(), ColorSpace::RGB);
    for px in decoded.pixels().chunks_exact(3) {
        assert!(px[0] >= 251);
        assert!(px[1] <= 4);
        assert!(px[2] <= 4);
    }
}

#[test]
fn three_tiff_pages_keep_their_dimensions() {
    let sizes = [10_usize, 20, 30];
    let mut dest = Destination::new("public.tiff", 3, None).unwrap();

    for size in sizes {
        let pixels = vec![99_u8; size * size * 4];
        dest.add_image(&rgba_frame(&pixels, size, size), None).unwrap();
    }
    let file = dest.finalize().unwrap();

    let mut source = Source::new(&file).unwrap();
    assert_eq!(source.count(), 3);

    for (i, size) in sizes.iter().enumerate() {
        let frame = source.image_at(i).unwrap();
        assert_eq!((frame.width(), frame.height()), (*size, *size));
    }
}

#[test]
fn gif_delays_survive_within_a_centisecond() {
    let (w, h) = (4, 4);
    let delays = [0.1_f64, 0.2, 0.3];

    let mut dest = Destination::new("com.compuserve.gif", 3, None).unwrap();
    for (i, delay) in delays.iter().enumerate() {
        let pixels: Vec<u8> = std::iter::repeat([(i * 90) as u8, 0, 0, 255])
            .take(w * h)
            .flatten()
            .collect();
        let mut props = PropertyMap::new();
        props.insert(keys::DELAY.into(), Value::Float(*delay));
        dest.add_image(&rgba_frame(&pixels, w, h), Some(&props)).unwrap();
    }
    let file = dest.finalize().unwrap();

    let mut source = Source::new(&file).unwrap();
    for (i, expected) in delays.iter().enumerate() {
        let props = source.properties_at(i).unwrap();
        let delay = props.get(keys::DELAY_TIME).unwrap().as_float().unwrap();
        assert!((delay - expected).abs() < 0.01, "frame {i}: {delay}");
    }
}

#[test]
fn bgra_through_bmp_preserves_alpha() {
    let (w, h) = (4, 4);
    let mut pixels = Vec::new();
    for i in 0..w * h {
        pixels.extend_from_slice(&[(i * 3) as u8, (i * 5) as u8, (i * 7) as u8, (i * 11) as u8]);
    }
    let frame = Frame::from_u8(pixels.clone(), w, h, ColorSpace::BGRA).unwrap();

    let mut options = PropertyMap::new();
    options.insert(keys::PRESERVE_ALPHA.into(), Value::Bool(true));

    let mut dest = Destination::new("com.microsoft.bmp", 1, Some(&options)).unwrap();
    dest.add_image(&frame, None).unwrap();
    let file = dest.finalize().unwrap();

    // a V4 header was written
    assert_eq!(u32::from_le_bytes(file[14..18].try_into().unwrap()), 108);

    let mut source = Source::new(&file).unwrap();
    let decoded = source.image_at(0).unwrap();
    assert!(decoded.colorspace().has_alpha());

    for (src, dst) in pixels.chunks_exact(4).zip(decoded.pixels().chunks_exact(4)) {
        // alpha must match exactly, color channels swizzle BGRA->RGBA
        assert_eq!(src[3], dst[3]);
        assert_eq!([src[2], src[1], src[0]], [dst[0], dst[1], dst[2]]);
    }
}

#[test]
fn unknown_uti_yields_no_destination() {
    assert!(Destination::new("public.heic", 1, None).is_none());
    assert!(Destination::new("not-a-uti", 1, None).is_none());
}

#[test]
fn frame_count_overflow_is_an_error() {
    let frame = rgba_frame(&[0, 0, 0, 255], 1, 1);

    let mut dest = Destination::new("public.png", 1, None).unwrap();
    dest.add_image(&frame, None).unwrap();
    assert!(dest.add_image(&frame, None).is_err());
}

#[test]
fn finalize_without_frames_is_an_error() {
    let dest = Destination::new("public.png", 1, None).unwrap();
    assert!(dest.finalize().is_err());
}

#[test]
fn sniffer_never_panics_on_random_bytes() {
    use nanorand::Rng;
    let mut rng = nanorand::WyRand::new_seed(1234);

    for len in [0_usize, 1, 2, 4, 11, 12, 64, 500] {
        for _ in 0..50 {
            let mut data = vec![0_u8; len];
            rng.fill_bytes(&mut data);
            let _ = guess_format(&data);
        }
    }
}

#[test]
fn sources_reject_garbage() {
    assert!(Source::new(b"definitely not an image").is_none());
    assert!(Source::new(&[]).is_none());
}

//! Differential tests against a third party deflate implementation

use std::io::{Read, Write};

use flate2::read::ZlibDecoder as Flate2Decoder;
use flate2::write::ZlibEncoder as Flate2Encoder;
use flate2::Compression;
use lume_inflate::{DeflateDecoder, DeflateEncoder, DeflateEncoderOptions, DeflateEncodingStrategy};
use nanorand::Rng;

fn flate2_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = Flate2Encoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn flate2_decompress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    Flate2Decoder::new(data).read_to_end(&mut out).unwrap();
    out
}

#[test]
fn inflate_matches_reference_on_random_data() {
    let mut rng = nanorand::WyRand::new_seed(0x1234);
    for size in [0_usize, 1, 37, 4096, 65537, 1 << 20] {
        let mut data = vec![0_u8; size];
        rng.fill_bytes(&mut data);

        let compressed = flate2_compress(&data);
        let ours = DeflateDecoder::new(&compressed).decode_zlib().unwrap();
        assert_eq!(ours, data, "mismatch at size {size}");
    }
}

#[test]
fn inflate_matches_reference_on_text() {
    let data = include_bytes!("../src/decoder.rs");
    let compressed = flate2_compress(data);
    let ours = DeflateDecoder::new(&compressed).decode_zlib().unwrap();
    assert_eq!(&ours, data);
}

#[test]
fn our_fixed_output_passes_reference_inflate() {
    let mut rng = nanorand::WyRand::new_seed(0xDEAD);
    for size in [0_usize, 1, 100, 3000, 70000] {
        // biased bytes so matches exist
        let mut data = vec![0_u8; size];
        rng.fill_bytes(&mut data);
        for b in data.iter_mut() {
            *b &= 0x0F;
        }

        let compressed = DeflateEncoder::new(&data).encode_zlib();
        assert_eq!(flate2_decompress(&compressed), data, "size {size}");
    }
}

#[test]
fn our_stored_output_passes_reference_inflate() {
    let data: Vec<u8> = (0..100_000_u32).map(|i| (i * 7) as u8).collect();
    let options =
        DeflateEncoderOptions::default().set_strategy(DeflateEncodingStrategy::NoCompression);
    let compressed = DeflateEncoder::new_with_options(&data, options).encode_zlib();

    assert_eq!(flate2_decompress(&compressed), data);
}

#[test]
fn round_trip_up_to_a_mebibyte() {
    let mut rng = nanorand::WyRand::new_seed(42);
    let mut data = vec![0_u8; 1 << 20];
    rng.fill_bytes(&mut data);
    // make runs so the matcher has something to chew on
    data[1000..200_000].fill(0x42);

    let compressed = DeflateEncoder::new(&data).encode_zlib();
    let ours = DeflateDecoder::new(&compressed).decode_zlib().unwrap();
    assert_eq!(ours, data);
}

//! Round-trip integration tests for fits-codec.
//!
//! Everything runs against in-memory buffers.

use std::io::Cursor;

use fits_codec::block::{BLOCK_SIZE, CARD_SIZE};
use fits_codec::{
    decode, encode, DecodeOptions, EncodeOptions, Endian, Frame, ImageList, Pixel, Quantum,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deterministic quantum ramp with some scatter.
fn sample_values(count: usize) -> Vec<Quantum> {
    let mut state: u32 = 0x1234_5678;
    (0..count)
        .map(|i| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            match i % 5 {
                0 => 0,
                1 => Quantum::MAX,
                _ => (state >> 16) as Quantum,
            }
        })
        .collect()
}

fn write(images: &ImageList, options: &EncodeOptions) -> Vec<u8> {
    let mut out = Vec::new();
    encode(&mut out, images, options).unwrap();
    out
}

fn read(bytes: Vec<u8>) -> ImageList {
    decode(Cursor::new(bytes), &DecodeOptions::default())
        .unwrap()
        .into_result()
        .unwrap()
}

fn assert_within(original: &Frame, decoded: &Frame, tolerance: u32) {
    assert_eq!(original.columns(), decoded.columns());
    assert_eq!(original.rows(), decoded.rows());
    for (a, b) in original.pixels().iter().zip(decoded.pixels()) {
        let diff = u32::from(a.red.abs_diff(b.red));
        assert!(diff <= tolerance, "{} vs {}", a.red, b.red);
    }
}

fn round_trip(depth: u32, endian: Endian, tolerance: u32) {
    let (columns, rows) = (13, 7);
    let original = Frame::from_gray(columns, rows, depth, &sample_values(columns * rows)).unwrap();
    let options = EncodeOptions {
        depth: Some(depth),
        endian,
        ..EncodeOptions::default()
    };
    let bytes = write(&ImageList::from(original.clone()), &options);
    assert_eq!(bytes.len() % BLOCK_SIZE, 0);

    let images = read(bytes);
    assert_eq!(images.len(), 1);
    let decoded = images.first().unwrap();
    assert_eq!(decoded.depth, depth);
    assert_eq!(decoded.endian, endian);
    assert_within(&original, decoded, tolerance);
}

// ---------------------------------------------------------------------------
// Depths
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_depth_8() {
    // One 8-bit step is 257 quanta.
    round_trip(8, Endian::Msb, 129);
}

#[test]
fn roundtrip_depth_16() {
    round_trip(16, Endian::Msb, 0);
}

#[test]
fn roundtrip_depth_32() {
    round_trip(32, Endian::Msb, 0);
}

#[test]
fn roundtrip_depth_64() {
    round_trip(64, Endian::Msb, 1);
}

#[test]
fn roundtrip_lsb_depth_16() {
    round_trip(16, Endian::Lsb, 0);
}

#[test]
fn roundtrip_lsb_depth_32() {
    round_trip(32, Endian::Lsb, 0);
}

#[test]
fn roundtrip_float_32() {
    let values = sample_values(20);
    let original = Frame::from_gray(5, 4, 32, &values).unwrap();
    let options = EncodeOptions {
        floating_point: true,
        ..EncodeOptions::default()
    };
    let decoded = read(write(&ImageList::from(original.clone()), &options));
    assert_within(&original, decoded.first().unwrap(), 0);
}

#[test]
fn roundtrip_float_64_lsb() {
    let values = sample_values(12);
    let original = Frame::from_gray(4, 3, 64, &values).unwrap();
    let options = EncodeOptions {
        depth: Some(64),
        floating_point: true,
        endian: Endian::Lsb,
        ..EncodeOptions::default()
    };
    let decoded = read(write(&ImageList::from(original.clone()), &options));
    assert_within(&original, decoded.first().unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[test]
fn decoded_pixels_are_gray() {
    let pixels: Vec<Pixel> = (0..6u16)
        .map(|i| Pixel {
            red: i * 1000,
            green: i * 2000,
            blue: i * 3000,
        })
        .collect();
    let rgb = Frame::from_pixels(3, 2, 16, pixels).unwrap();
    let images = read(write(&ImageList::from(rgb), &EncodeOptions::default()));
    assert_eq!(images.len(), 3);
    for frame in &images {
        assert!(frame.pixels().iter().all(Pixel::is_gray));
    }
    // Planes come back as red, green, blue.
    assert_eq!(images.get(1).unwrap().pixel(1, 0).unwrap().red, 2000);
    assert_eq!(images.get(2).unwrap().pixel(1, 0).unwrap().red, 3000);
}

#[test]
fn records_are_fixed_width_with_end() {
    let frame = Frame::from_gray(4, 4, 8, &[0; 16]).unwrap();
    let bytes = write(&ImageList::from(frame), &EncodeOptions::default());
    let header = &bytes[..BLOCK_SIZE];
    let end = header
        .chunks_exact(CARD_SIZE)
        .position(|card| card.starts_with(b"END "))
        .unwrap();
    let end_card = &header[end * CARD_SIZE..(end + 1) * CARD_SIZE];
    assert!(end_card[3..].iter().all(|&b| b == b' '));
    for card in header[..end * CARD_SIZE].chunks_exact(CARD_SIZE) {
        assert!(card.iter().all(|b| b.is_ascii() && !b.is_ascii_control()));
    }
    assert!(header[(end + 1) * CARD_SIZE..].iter().all(|&b| b == b' '));
}

#[test]
fn cube_round_trip_preserves_scene_order() {
    let frames: Vec<Frame> = (0..4u16)
        .map(|i| Frame::from_gray(3, 3, 16, &[i * 10_000; 9]).unwrap())
        .collect();
    let images = read(write(&ImageList::from(frames), &EncodeOptions::default()));
    let firsts: Vec<Quantum> = images.iter().map(|f| f.pixel(0, 0).unwrap().red).collect();
    assert_eq!(firsts, vec![0, 10_000, 20_000, 30_000]);
    let scenes: Vec<usize> = images.iter().map(|f| f.scene).collect();
    assert_eq!(scenes, vec![0, 1, 2, 3]);
}

#[test]
fn history_record_survives_as_property() {
    let frame = Frame::from_gray(1, 1, 8, &[0]).unwrap();
    let options = EncodeOptions {
        history: String::from("unit test writer"),
        ..EncodeOptions::default()
    };
    let images = read(write(&ImageList::from(frame), &options));
    let frame = images.first().unwrap();
    assert_eq!(frame.property("fits:history"), Some("unit test writer"));
    assert_eq!(frame.property("fits:bitpix"), Some("8"));
}

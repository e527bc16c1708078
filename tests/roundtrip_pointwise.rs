use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian};

use pointzip::{Compressor, Decompressor, RecordLayout};

const NUM_POINTS: usize = 1537;

/// xorshift64, deterministic across runs.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Rng(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

fn write_core(buf: &mut [u8], i: usize, rng: &mut Rng) {
    let i = i as i32;
    LittleEndian::write_i32(&mut buf[0..4], 636_000 + i * 25 + rng.below(7) as i32);
    LittleEndian::write_i32(&mut buf[4..8], 849_000 - i * 12 + rng.below(7) as i32);
    LittleEndian::write_i32(&mut buf[8..12], 42_000 + rng.below(400) as i32);
    LittleEndian::write_u16(&mut buf[12..14], 900 + rng.below(300) as u16);
    let number_of_returns = 1 + rng.below(5) as u8;
    let return_number = 1 + rng.below(u64::from(number_of_returns)) as u8;
    buf[14] = return_number
        | (number_of_returns << 3)
        | ((rng.below(2) as u8) << 6)
        | ((rng.below(8) == 0) as u8) << 7;
    buf[15] = [1u8, 2, 2, 2, 5][rng.below(5) as usize];
    buf[16] = (rng.below(31) as i8 - 15) as u8;
    buf[17] = 0;
    LittleEndian::write_u16(&mut buf[18..20], 7000 + rng.below(3) as u16);
}

fn write_gps_time(buf: &mut [u8], value: f64) {
    LittleEndian::write_f64(buf, value);
}

fn write_rgb(buf: &mut [u8], rng: &mut Rng) {
    let red = rng.below(1 << 16) as u16;
    // keep channels correlated most of the time, like real imagery
    let (green, blue) = if rng.below(4) == 0 {
        (rng.below(1 << 16) as u16, rng.below(1 << 16) as u16)
    } else {
        (
            red.wrapping_add(rng.below(100) as u16),
            red.wrapping_sub(rng.below(100) as u16),
        )
    };
    LittleEndian::write_u16(&mut buf[0..2], red);
    LittleEndian::write_u16(&mut buf[2..4], green);
    LittleEndian::write_u16(&mut buf[4..6], blue);
}

fn write_wave_packet(buf: &mut [u8], i: usize, rng: &mut Rng) {
    buf[0] = 1 + rng.below(2) as u8;
    LittleEndian::write_u64(&mut buf[1..9], (i as u64) * 192);
    LittleEndian::write_u32(&mut buf[9..13], 192);
    LittleEndian::write_f32(&mut buf[13..17], rng.below(1000) as f32 * 0.5);
    LittleEndian::write_f32(&mut buf[17..21], 0.001 + rng.below(10) as f32 * 0.0001);
    LittleEndian::write_f32(&mut buf[21..25], -0.002);
    LittleEndian::write_f32(&mut buf[25..29], 0.25);
}

/// Builds `count` records for the given pointwise format.
fn make_points(point_format_id: u8, extra_bytes: u16, count: usize) -> Vec<u8> {
    let layout = RecordLayout::for_point_format(point_format_id, extra_bytes).unwrap();
    let record_size = layout.record_size();
    let mut rng = Rng::new(0xACDC_1234_5678 + u64::from(point_format_id));
    let mut points = vec![0u8; record_size * count];

    for (i, record) in points.chunks_exact_mut(record_size).enumerate() {
        write_core(&mut record[0..20], i, &mut rng);
        let mut offset = 20;
        if matches!(point_format_id, 1 | 3 | 4 | 5) {
            write_gps_time(
                &mut record[offset..offset + 8],
                123_456.0 + i as f64 * 0.000_05,
            );
            offset += 8;
        }
        if matches!(point_format_id, 2 | 3 | 5) {
            write_rgb(&mut record[offset..offset + 6], &mut rng);
            offset += 6;
        }
        if matches!(point_format_id, 4 | 5) {
            write_wave_packet(&mut record[offset..offset + 29], i, &mut rng);
            offset += 29;
        }
        for byte in &mut record[offset..] {
            *byte = rng.below(4) as u8;
        }
    }
    points
}

fn compress(layout: &RecordLayout, points: &[u8]) -> Vec<u8> {
    let mut compressor = Compressor::new(Cursor::new(Vec::new()), layout.clone()).unwrap();
    compressor.compress_many(points).unwrap();
    compressor.done().unwrap();
    compressor.into_stream().into_inner()
}

fn roundtrip(point_format_id: u8, extra_bytes: u16) {
    let layout = RecordLayout::for_point_format(point_format_id, extra_bytes).unwrap();
    let points = make_points(point_format_id, extra_bytes, NUM_POINTS);
    let compressed = compress(&layout, &points);
    assert!(compressed.len() < points.len());

    let mut decompressor = Decompressor::new(Cursor::new(compressed), layout).unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();
    assert_eq!(decompressed, points);
}

#[test]
fn point_format_0() {
    roundtrip(0, 0);
}

#[test]
fn point_format_1() {
    roundtrip(1, 0);
}

#[test]
fn point_format_2() {
    roundtrip(2, 0);
}

#[test]
fn point_format_3() {
    roundtrip(3, 0);
}

#[test]
fn point_format_4() {
    roundtrip(4, 0);
}

#[test]
fn point_format_5() {
    roundtrip(5, 0);
}

#[test]
fn point_format_0_with_extra_bytes() {
    roundtrip(0, 1);
}

#[test]
fn point_format_3_with_extra_bytes() {
    roundtrip(3, 3);
}

#[test]
fn compression_is_deterministic() {
    let layout = RecordLayout::for_point_format(3, 0).unwrap();
    let points = make_points(3, 0, NUM_POINTS);
    assert_eq!(compress(&layout, &points), compress(&layout, &points));
}

/// Interleaved flight lines: the gps time jumps back and forth between
/// several ranges, which drives the multi sequence handling.
#[test]
fn gps_time_interleaved_sequences() {
    let layout = RecordLayout::for_point_format(1, 0).unwrap();
    let record_size = layout.record_size();
    let mut rng = Rng::new(0xBEEF);
    let bases = [100_000.0f64, 250_000.0, 400_000.0, 500_000.0];
    let mut counters = [0u64; 4];

    let mut points = vec![0u8; record_size * NUM_POINTS];
    for (i, record) in points.chunks_exact_mut(record_size).enumerate() {
        write_core(&mut record[0..20], i, &mut rng);
        let seq = rng.below(4) as usize;
        counters[seq] += 1;
        write_gps_time(
            &mut record[20..28],
            bases[seq] + counters[seq] as f64 * 0.000_01,
        );
    }

    let compressed = compress(&layout, &points);
    let mut decompressor = Decompressor::new(Cursor::new(compressed), layout).unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();
    assert_eq!(decompressed, points);
}

/// Regularly spaced pulses drive the multiplier-one path on every
/// point, so the predicted difference must track the coded one exactly
/// on both sides.
#[test]
fn gps_time_regularly_spaced_pulses() {
    let layout = RecordLayout::for_point_format(1, 0).unwrap();
    let record_size = layout.record_size();
    let mut rng = Rng::new(0xACE1);

    let mut points = vec![0u8; record_size * NUM_POINTS];
    for (i, record) in points.chunks_exact_mut(record_size).enumerate() {
        write_core(&mut record[0..20], i, &mut rng);
        write_gps_time(&mut record[20..28], 123_456.0 + i as f64 * 0.000_05);
    }

    let compressed = compress(&layout, &points);
    let mut decompressor = Decompressor::new(Cursor::new(compressed), layout).unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();
    assert_eq!(decompressed, points);
}

/// A large time step followed by a run of near-zero increments keeps
/// the multiplier at zero until the predicted difference re-anchors.
#[test]
fn gps_time_zero_multiplier_reanchor() {
    let layout = RecordLayout::for_point_format(1, 0).unwrap();
    let record_size = layout.record_size();
    let mut rng = Rng::new(0xF00D);

    let mut gps = 200_000.0f64;
    let mut points = vec![0u8; record_size * NUM_POINTS];
    for (i, record) in points.chunks_exact_mut(record_size).enumerate() {
        write_core(&mut record[0..20], i, &mut rng);
        gps += if i % 100 == 0 { 1.0 } else { 0.000_000_1 };
        write_gps_time(&mut record[20..28], gps);
    }

    let compressed = compress(&layout, &points);
    let mut decompressor = Decompressor::new(Cursor::new(compressed), layout).unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();
    assert_eq!(decompressed, points);
}

#[test]
fn multiple_chunks() {
    let layout = RecordLayout::for_point_format(2, 0).unwrap();
    let points = make_points(2, 0, NUM_POINTS);

    let mut compressor =
        Compressor::with_chunk_size(Cursor::new(Vec::new()), layout.clone(), 100).unwrap();
    compressor.compress_many(&points).unwrap();
    compressor.done().unwrap();
    let mut stream = compressor.into_stream();
    stream.set_position(0);

    let mut decompressor = Decompressor::with_chunk_size(
        stream,
        layout,
        pointzip::DecompressionSelector::all(),
        100,
    )
    .unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();
    assert_eq!(decompressed, points);
}

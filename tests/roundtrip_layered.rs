use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian};

use pointzip::{Compressor, Decompressor, DecompressionSelector, RecordLayout};

const NUM_POINTS: usize = 1201;

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

struct ExtendedWriter {
    rng: Rng,
    channel: u8,
    gps_times: [f64; 4],
}

impl ExtendedWriter {
    fn new(seed: u64) -> Self {
        Self {
            rng: Rng::new(seed),
            channel: 0,
            gps_times: [10_000.0, 20_000.0, 30_000.0, 40_000.0],
        }
    }

    fn write(&mut self, buf: &mut [u8], i: usize) {
        // channels mostly stick, the scanner switches now and then
        if self.rng.below(16) == 0 {
            self.channel = self.rng.below(4) as u8;
        }
        let channel = usize::from(self.channel);
        self.gps_times[channel] += 0.000_05 + self.rng.below(3) as f64 * 0.000_01;

        let i = i as i32;
        write_xyz_intensity(buf, i, &mut self.rng);
        let number_of_returns = 1 + self.rng.below(7) as u8;
        let return_number = 1 + self.rng.below(u64::from(number_of_returns)) as u8;
        buf[14] = return_number | (number_of_returns << 4);
        buf[15] = (self.rng.below(3) as u8)
            | (self.channel << 4)
            | ((self.rng.below(2) as u8) << 6)
            | ((self.rng.below(8) == 0) as u8) << 7;
        buf[16] = [2u8, 2, 3, 5, 6][self.rng.below(5) as usize];
        buf[17] = self.rng.below(2) as u8;
        LittleEndian::write_u16(&mut buf[18..20], (i * 30 % 30_000) as u16);
        LittleEndian::write_u16(&mut buf[20..22], 4000 + channel as u16);
        LittleEndian::write_f64(&mut buf[22..30], self.gps_times[channel]);
    }
}

// x/y/z and intensity, shared by every extended record
fn write_xyz_intensity(buf: &mut [u8], i: i32, rng: &mut Rng) {
    LittleEndian::write_i32(&mut buf[0..4], 500_000 + i * 17 + rng.below(5) as i32);
    LittleEndian::write_i32(&mut buf[4..8], 800_000 - i * 9 + rng.below(5) as i32);
    LittleEndian::write_i32(&mut buf[8..12], 30_000 + rng.below(250) as i32);
    LittleEndian::write_u16(&mut buf[12..14], 1200 + rng.below(200) as u16);
}

fn write_rgb_nir(buf: &mut [u8], rng: &mut Rng, with_nir: bool) {
    let red = rng.below(1 << 16) as u16;
    LittleEndian::write_u16(&mut buf[0..2], red);
    LittleEndian::write_u16(&mut buf[2..4], red.wrapping_add(rng.below(80) as u16));
    LittleEndian::write_u16(&mut buf[4..6], red.wrapping_sub(rng.below(80) as u16));
    if with_nir {
        LittleEndian::write_u16(&mut buf[6..8], 20_000 + rng.below(500) as u16);
    }
}

fn write_wave_packet(buf: &mut [u8], i: usize, rng: &mut Rng) {
    buf[0] = 1;
    LittleEndian::write_u64(&mut buf[1..9], (i as u64) * 128);
    LittleEndian::write_u32(&mut buf[9..13], 128);
    LittleEndian::write_f32(&mut buf[13..17], rng.below(500) as f32);
    LittleEndian::write_f32(&mut buf[17..21], 0.001);
    LittleEndian::write_f32(&mut buf[21..25], 0.002);
    LittleEndian::write_f32(&mut buf[25..29], -0.5);
}

fn make_points(point_format_id: u8, extra_bytes: u16, count: usize) -> Vec<u8> {
    let layout = RecordLayout::for_point_format(point_format_id, extra_bytes).unwrap();
    let record_size = layout.record_size();
    let mut writer = ExtendedWriter::new(0x1CEB_00DA + u64::from(point_format_id));
    let mut points = vec![0u8; record_size * count];

    for (i, record) in points.chunks_exact_mut(record_size).enumerate() {
        writer.write(&mut record[0..30], i);
        let mut offset = 30;
        if matches!(point_format_id, 7 | 8 | 10) {
            let with_nir = point_format_id != 7;
            let size = if with_nir { 8 } else { 6 };
            write_rgb_nir(&mut record[offset..offset + size], &mut writer.rng, with_nir);
            offset += size;
        }
        if matches!(point_format_id, 9 | 10) {
            write_wave_packet(&mut record[offset..offset + 29], i, &mut writer.rng);
            offset += 29;
        }
        for byte in &mut record[offset..] {
            *byte = writer.rng.below(3) as u8;
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
fn point_format_6() {
    roundtrip(6, 0);
}

#[test]
fn point_format_7() {
    roundtrip(7, 0);
}

#[test]
fn point_format_8() {
    roundtrip(8, 0);
}

#[test]
fn point_format_9() {
    roundtrip(9, 0);
}

#[test]
fn point_format_10() {
    roundtrip(10, 0);
}

#[test]
fn point_format_6_with_extra_bytes() {
    roundtrip(6, 5);
}

#[test]
fn point_format_8_with_extra_bytes() {
    roundtrip(8, 2);
}

/// With the rgb layer skipped, every other field still decodes exactly
/// and the rgb bytes stay at the value of the first point of the chunk.
#[test]
fn selective_decompression_skips_rgb() {
    let layout = RecordLayout::for_point_format(8, 0).unwrap();
    let record_size = layout.record_size();
    let points = make_points(8, 0, NUM_POINTS);
    let compressed = compress(&layout, &points);

    let selector = DecompressionSelector::all().skip_rgb();
    let mut decompressor =
        Decompressor::selective(Cursor::new(compressed), layout, selector).unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();

    let first_rgb = &points[30..36];
    for (original, decoded) in points
        .chunks_exact(record_size)
        .zip(decompressed.chunks_exact(record_size))
    {
        assert_eq!(&decoded[0..30], &original[0..30]);
        assert_eq!(&decoded[30..36], first_rgb);
        assert_eq!(&decoded[36..38], &original[36..38]);
    }
}

/// The channel layer can never be skipped: x, y and the return fields
/// survive even when everything else is.
#[test]
fn selective_decompression_base_keeps_geometry() {
    let layout = RecordLayout::for_point_format(6, 0).unwrap();
    let record_size = layout.record_size();
    let points = make_points(6, 0, NUM_POINTS);
    let compressed = compress(&layout, &points);

    let mut decompressor = Decompressor::selective(
        Cursor::new(compressed),
        layout,
        DecompressionSelector::base(),
    )
    .unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();

    for (original, decoded) in points
        .chunks_exact(record_size)
        .zip(decompressed.chunks_exact(record_size))
    {
        assert_eq!(&decoded[0..8], &original[0..8]);
        assert_eq!(decoded[14], original[14]);
        assert_eq!(decoded[15] & 0b0011_0000, original[15] & 0b0011_0000);
    }
}

#[test]
fn multiple_chunks() {
    let layout = RecordLayout::for_point_format(7, 0).unwrap();
    let points = make_points(7, 0, NUM_POINTS);

    let mut compressor =
        Compressor::with_chunk_size(Cursor::new(Vec::new()), layout.clone(), 128).unwrap();
    compressor.compress_many(&points).unwrap();
    compressor.done().unwrap();
    let mut stream = compressor.into_stream();
    stream.set_position(0);

    let mut decompressor =
        Decompressor::with_chunk_size(stream, layout, DecompressionSelector::all(), 128).unwrap();
    let mut decompressed = vec![0u8; points.len()];
    decompressor.decompress_many(&mut decompressed).unwrap();
    assert_eq!(decompressed, points);
}

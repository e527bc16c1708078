#[macro_use]
extern crate criterion;
extern crate pointzip;

use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian};
use criterion::Criterion;

use pointzip::record::record_compressor_from_layout;
use pointzip::RecordLayout;

struct RawPointsData {
    point_size: usize,
    points_data: Vec<u8>,
}

impl RawPointsData {
    fn cycling_iterator(&self) -> std::iter::Cycle<std::slice::ChunksExact<u8>> {
        self.points_data.chunks_exact(self.point_size).cycle()
    }
}

fn synthetic_points(layout: &RecordLayout, count: usize) -> RawPointsData {
    let point_size = layout.record_size();
    let mut points_data = vec![0u8; point_size * count];
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    for (i, record) in points_data.chunks_exact_mut(point_size).enumerate() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let i = i as i32;
        LittleEndian::write_i32(&mut record[0..4], 500_000 + i * 21 + (state % 7) as i32);
        LittleEndian::write_i32(&mut record[4..8], 780_000 - i * 13 + (state % 5) as i32);
        LittleEndian::write_i32(&mut record[8..12], 40_000 + (state % 300) as i32);
        LittleEndian::write_u16(&mut record[12..14], 1000 + (state % 256) as u16);
        record[14] = 0b0000_1001;
        for byte in &mut record[15..] {
            *byte = (state % 3) as u8;
        }
    }
    RawPointsData {
        point_size,
        points_data,
    }
}

fn point_format_0_compression_benchmark(c: &mut Criterion) {
    let layout = RecordLayout::for_point_format(0, 0).unwrap();
    let raw_points_data = synthetic_points(&layout, 10_000);

    let mut record_compressor =
        record_compressor_from_layout(Cursor::new(Vec::<u8>::new()), &layout).unwrap();

    c.bench_function("point_format_0_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

fn point_format_1_compression_benchmark(c: &mut Criterion) {
    let layout = RecordLayout::for_point_format(1, 0).unwrap();
    let raw_points_data = synthetic_points(&layout, 10_000);

    let mut record_compressor =
        record_compressor_from_layout(Cursor::new(Vec::<u8>::new()), &layout).unwrap();

    c.bench_function("point_format_1_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

fn point_format_2_compression_benchmark(c: &mut Criterion) {
    let layout = RecordLayout::for_point_format(2, 0).unwrap();
    let raw_points_data = synthetic_points(&layout, 10_000);

    let mut record_compressor =
        record_compressor_from_layout(Cursor::new(Vec::<u8>::new()), &layout).unwrap();

    c.bench_function("point_format_2_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

criterion_group!(
    pointwise_formats,
    point_format_0_compression_benchmark,
    point_format_1_compression_benchmark,
    point_format_2_compression_benchmark
);
criterion_main!(pointwise_formats);

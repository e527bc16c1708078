//! GPS time codecs.
//!
//! The time is a double on disk but is treated as its raw bit pattern,
//! differences between consecutive bit patterns are what gets modeled.

use crate::packing::Packable;

pub(crate) const GPS_TIME_MULTI: i32 = 500;
pub(crate) const GPS_TIME_MULTI_MINUS: i32 = -10;
const GPS_TIME_MULTI_UNCHANGED: i32 = GPS_TIME_MULTI - GPS_TIME_MULTI_MINUS + 1;
pub(crate) const GPS_TIME_MULTI_CODE_FULL: i32 = GPS_TIME_MULTI - GPS_TIME_MULTI_MINUS + 2;
pub(crate) const GPS_TIME_MULTI_TOTAL: i32 = GPS_TIME_MULTI - GPS_TIME_MULTI_MINUS + 6;

/// A GPS time value, kept as the bit pattern of its double.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct GpsTime {
    pub value: i64,
}

impl From<f64> for GpsTime {
    fn from(v: f64) -> Self {
        Self {
            value: v.to_bits() as i64,
        }
    }
}

impl From<GpsTime> for f64 {
    fn from(gps: GpsTime) -> Self {
        f64::from_bits(gps.value as u64)
    }
}

impl Packable for GpsTime {
    fn unpack_from(input: &[u8]) -> Self {
        let lower = u32::unpack_from(&input[0..4]);
        let upper = u32::unpack_from(&input[4..8]);
        GpsTime {
            value: i64::from(upper) << 32 | i64::from(lower),
        }
    }

    fn pack_into(&self, output: &mut [u8]) {
        ((self.value & 0xFFFF_FFFF) as u32).pack_into(&mut output[0..4]);
        ((self.value >> 32) as u32).pack_into(&mut output[4..8]);
    }
}

pub mod v1 {
    use std::io::{Read, Write};

    use num_traits::clamp;

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::{read_and_unpack, Packable};
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::GpsTime;

    const GPS_TIME_MULTI_MAX: u32 = 512;

    pub struct GpsTimeCompressor {
        last_gps: i64,
        multi_model: SymbolModel,
        zero_diff_model: SymbolModel,
        ic_gps_time: IntCompressor,
        multi_extreme_counter: i32,
        last_gps_time_diff: i32,
    }

    impl GpsTimeCompressor {
        pub fn new() -> Self {
            Self {
                last_gps: 0,
                multi_model: SymbolModel::new(GPS_TIME_MULTI_MAX),
                zero_diff_model: SymbolModel::new(3),
                ic_gps_time: IntCompressor::initialized(32, 6),
                multi_extreme_counter: 0,
                last_gps_time_diff: 0,
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for GpsTimeCompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<f64>()
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last_gps = GpsTime::unpack_from(buf).value;
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = GpsTime::unpack_from(buf).value;

            if self.last_gps_time_diff == 0 {
                if current == self.last_gps {
                    encoder.encode_symbol(&mut self.zero_diff_model, 0)?;
                } else {
                    let diff_64 = current.wrapping_sub(self.last_gps);
                    let diff_32 = diff_64 as i32;

                    if diff_64 == i64::from(diff_32) {
                        encoder.encode_symbol(&mut self.zero_diff_model, 1)?;
                        self.ic_gps_time.compress(encoder, 0, diff_32, 0)?;
                        self.last_gps_time_diff = diff_32;
                    } else {
                        // too big for 32 bits, store the value raw
                        encoder.encode_symbol(&mut self.zero_diff_model, 2)?;
                        encoder.write_int64(current as u64)?;
                    }
                    self.last_gps = current;
                }
            } else if current == self.last_gps {
                encoder.encode_symbol(&mut self.multi_model, GPS_TIME_MULTI_MAX - 1)?;
            } else {
                let diff_64 = current.wrapping_sub(self.last_gps);
                let diff_32 = diff_64 as i32;

                if diff_64 == i64::from(diff_32) {
                    let multi =
                        ((diff_32 as f32 / self.last_gps_time_diff as f32) + 0.5f32) as i32;
                    let multi = clamp(multi, 0, (GPS_TIME_MULTI_MAX - 3) as i32);
                    encoder.encode_symbol(&mut self.multi_model, multi as u32)?;

                    if multi == 1 {
                        self.ic_gps_time
                            .compress(encoder, self.last_gps_time_diff, diff_32, 1)?;
                        self.last_gps_time_diff = diff_32;
                        self.multi_extreme_counter = 0;
                    } else if multi == 0 {
                        self.ic_gps_time
                            .compress(encoder, self.last_gps_time_diff / 4, diff_32, 2)?;
                        self.multi_extreme_counter += 1;
                        if self.multi_extreme_counter > 3 {
                            self.last_gps_time_diff = diff_32;
                            self.multi_extreme_counter = 0;
                        }
                    } else if multi < 10 {
                        self.ic_gps_time.compress(
                            encoder,
                            self.last_gps_time_diff.wrapping_mul(multi),
                            diff_32,
                            3,
                        )?;
                    } else if multi < 50 {
                        self.ic_gps_time.compress(
                            encoder,
                            self.last_gps_time_diff.wrapping_mul(multi),
                            diff_32,
                            4,
                        )?;
                    } else {
                        self.ic_gps_time.compress(
                            encoder,
                            self.last_gps_time_diff.wrapping_mul(multi),
                            diff_32,
                            5,
                        )?;
                        if multi == (GPS_TIME_MULTI_MAX - 3) as i32 {
                            self.multi_extreme_counter += 1;
                            if self.multi_extreme_counter > 3 {
                                self.last_gps_time_diff = diff_32;
                                self.multi_extreme_counter = 0;
                            }
                        }
                    }
                } else {
                    encoder.encode_symbol(&mut self.multi_model, GPS_TIME_MULTI_MAX - 2)?;
                    encoder.write_int64(current as u64)?;
                }
                self.last_gps = current;
            }
            Ok(())
        }
    }

    pub struct GpsTimeDecompressor {
        last_gps: i64,
        multi_model: SymbolModel,
        zero_diff_model: SymbolModel,
        ic_gps_time: IntDecompressor,
        multi_extreme_counter: i32,
        last_gps_time_diff: i32,
    }

    impl GpsTimeDecompressor {
        pub fn new() -> Self {
            Self {
                last_gps: 0,
                multi_model: SymbolModel::new(GPS_TIME_MULTI_MAX),
                zero_diff_model: SymbolModel::new(3),
                ic_gps_time: IntDecompressor::initialized(32, 6),
                multi_extreme_counter: 0,
                last_gps_time_diff: 0,
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for GpsTimeDecompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<f64>()
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            self.last_gps = read_and_unpack::<_, GpsTime>(src, first_point)?.value;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            if self.last_gps_time_diff == 0 {
                let multi = decoder.decode_symbol(&mut self.zero_diff_model)?;
                if multi == 1 {
                    self.last_gps_time_diff = self.ic_gps_time.decompress(decoder, 0, 0)?;
                    self.last_gps = self
                        .last_gps
                        .wrapping_add(i64::from(self.last_gps_time_diff));
                } else if multi == 2 {
                    self.last_gps = decoder.read_int64()? as i64;
                }
            } else {
                let multi = decoder.decode_symbol(&mut self.multi_model)?;

                if multi < GPS_TIME_MULTI_MAX - 2 {
                    let gps_time_diff: i32;
                    if multi == 1 {
                        gps_time_diff =
                            self.ic_gps_time
                                .decompress(decoder, self.last_gps_time_diff, 1)?;
                        self.last_gps_time_diff = gps_time_diff;
                        self.multi_extreme_counter = 0;
                    } else if multi == 0 {
                        gps_time_diff = self.ic_gps_time.decompress(
                            decoder,
                            self.last_gps_time_diff / 4,
                            2,
                        )?;
                        self.multi_extreme_counter += 1;
                        if self.multi_extreme_counter > 3 {
                            self.last_gps_time_diff = gps_time_diff;
                            self.multi_extreme_counter = 0;
                        }
                    } else {
                        let context = if multi < 10 {
                            3
                        } else if multi < 50 {
                            4
                        } else {
                            5
                        };
                        gps_time_diff = self.ic_gps_time.decompress(
                            decoder,
                            self.last_gps_time_diff.wrapping_mul(multi as i32),
                            context,
                        )?;
                        if multi == GPS_TIME_MULTI_MAX - 3 {
                            self.multi_extreme_counter += 1;
                            if self.multi_extreme_counter > 3 {
                                self.last_gps_time_diff = gps_time_diff;
                                self.multi_extreme_counter = 0;
                            }
                        }
                    }
                    self.last_gps = self.last_gps.wrapping_add(i64::from(gps_time_diff));
                } else if multi < GPS_TIME_MULTI_MAX - 1 {
                    self.last_gps = decoder.read_int64()? as i64;
                }
            }
            GpsTime {
                value: self.last_gps,
            }
            .pack_into(buf);
            Ok(())
        }
    }
}

pub mod v2 {
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::{read_and_unpack, Packable};
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{FieldCompressor, FieldDecompressor};
    use crate::utils::i32_quantize;

    use super::{
        GpsTime, GPS_TIME_MULTI, GPS_TIME_MULTI_CODE_FULL, GPS_TIME_MULTI_MINUS,
        GPS_TIME_MULTI_TOTAL, GPS_TIME_MULTI_UNCHANGED,
    };

    /// State shared by both directions. Up to 4 interleaved time
    /// sequences are tracked, `last` is the active one.
    struct GpsTimeState {
        multi_model: SymbolModel,
        zero_diff_model: SymbolModel,
        last: usize,
        next: usize,
        last_gps_times: [GpsTime; 4],
        last_gps_time_diffs: [i32; 4],
        multi_extreme_counters: [i32; 4],
    }

    impl GpsTimeState {
        fn new() -> Self {
            Self {
                multi_model: SymbolModel::new(GPS_TIME_MULTI_TOTAL as u32),
                zero_diff_model: SymbolModel::new(6),
                last: 0,
                next: 0,
                last_gps_times: [GpsTime::default(); 4],
                last_gps_time_diffs: [0i32; 4],
                multi_extreme_counters: [0i32; 4],
            }
        }
    }

    pub struct GpsTimeCompressor {
        ic_gps_time: IntCompressor,
        state: GpsTimeState,
    }

    impl GpsTimeCompressor {
        pub fn new() -> Self {
            Self {
                ic_gps_time: IntCompressor::initialized(32, 9),
                state: GpsTimeState::new(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for GpsTimeCompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<i64>()
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.state.last_gps_times[0] = GpsTime::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = GpsTime::unpack_from(buf);
            let last = self.state.last;

            if self.state.last_gps_time_diffs[last] == 0 {
                // the last integer difference was zero
                if current.value == self.state.last_gps_times[last].value {
                    encoder.encode_symbol(&mut self.state.zero_diff_model, 0)?;
                    return Ok(());
                }
                let diff_64 = current.value.wrapping_sub(self.state.last_gps_times[last].value);
                let diff_32 = diff_64 as i32;

                if diff_64 == i64::from(diff_32) {
                    encoder.encode_symbol(&mut self.state.zero_diff_model, 1)?;
                    self.ic_gps_time.compress(encoder, 0, diff_32, 0)?;
                    self.state.last_gps_time_diffs[last] = diff_32;
                    self.state.multi_extreme_counters[last] = 0;
                } else {
                    // maybe the value belongs to another tracked sequence
                    for i in 1..4 {
                        let other_diff_64 = current
                            .value
                            .wrapping_sub(self.state.last_gps_times[(last + i) & 3].value);
                        if other_diff_64 == i64::from(other_diff_64 as i32) {
                            encoder
                                .encode_symbol(&mut self.state.zero_diff_model, (i + 2) as u32)?;
                            self.state.last = (last + i) & 3;
                            return self.compress_with(encoder, buf);
                        }
                    }
                    // no sequence matches, start a new one
                    encoder.encode_symbol(&mut self.state.zero_diff_model, 2)?;
                    self.ic_gps_time.compress(
                        encoder,
                        (self.state.last_gps_times[last].value >> 32) as i32,
                        (current.value >> 32) as i32,
                        8,
                    )?;
                    encoder.write_int(current.value as u32)?;

                    self.state.next = (self.state.next + 1) & 3;
                    self.state.last = self.state.next;
                    self.state.last_gps_time_diffs[self.state.last] = 0;
                    self.state.multi_extreme_counters[self.state.last] = 0;
                }
                self.state.last_gps_times[self.state.last] = current;
            } else {
                // the last integer difference was not zero
                if current.value == self.state.last_gps_times[last].value {
                    encoder.encode_symbol(
                        &mut self.state.multi_model,
                        GPS_TIME_MULTI_UNCHANGED as u32,
                    )?;
                    return Ok(());
                }
                let diff_64 = current.value.wrapping_sub(self.state.last_gps_times[last].value);
                let diff_32 = diff_64 as i32;

                if diff_64 == i64::from(diff_32) {
                    // multiplier between the current and last difference
                    let multi =
                        i32_quantize(diff_32 as f32 / self.state.last_gps_time_diffs[last] as f32);

                    if multi == 1 {
                        // the most common case, regularly spaced pulses
                        encoder.encode_symbol(&mut self.state.multi_model, 1)?;
                        self.ic_gps_time.compress(
                            encoder,
                            self.state.last_gps_time_diffs[last],
                            diff_32,
                            1,
                        )?;
                        self.state.last_gps_time_diffs[last] = diff_32;
                        self.state.multi_extreme_counters[last] = 0;
                    } else if multi > 0 {
                        if multi < GPS_TIME_MULTI {
                            encoder.encode_symbol(&mut self.state.multi_model, multi as u32)?;
                            let context = if multi < 10 { 2 } else { 3 };
                            self.ic_gps_time.compress(
                                encoder,
                                multi.wrapping_mul(self.state.last_gps_time_diffs[last]),
                                diff_32,
                                context,
                            )?;
                        } else {
                            encoder.encode_symbol(
                                &mut self.state.multi_model,
                                GPS_TIME_MULTI as u32,
                            )?;
                            self.ic_gps_time.compress(
                                encoder,
                                GPS_TIME_MULTI
                                    .wrapping_mul(self.state.last_gps_time_diffs[last]),
                                diff_32,
                                4,
                            )?;
                            let counter = &mut self.state.multi_extreme_counters[last];
                            *counter += 1;
                            if *counter > 3 {
                                self.state.last_gps_time_diffs[last] = diff_32;
                                *counter = 0;
                            }
                        }
                    } else if multi < 0 {
                        if multi > GPS_TIME_MULTI_MINUS {
                            encoder.encode_symbol(
                                &mut self.state.multi_model,
                                (GPS_TIME_MULTI - multi) as u32,
                            )?;
                            self.ic_gps_time.compress(
                                encoder,
                                multi.wrapping_mul(self.state.last_gps_time_diffs[last]),
                                diff_32,
                                5,
                            )?;
                        } else {
                            encoder.encode_symbol(
                                &mut self.state.multi_model,
                                (GPS_TIME_MULTI - GPS_TIME_MULTI_MINUS) as u32,
                            )?;
                            self.ic_gps_time.compress(
                                encoder,
                                GPS_TIME_MULTI_MINUS
                                    .wrapping_mul(self.state.last_gps_time_diffs[last]),
                                diff_32,
                                6,
                            )?;
                            let counter = &mut self.state.multi_extreme_counters[last];
                            *counter += 1;
                            if *counter > 3 {
                                self.state.last_gps_time_diffs[last] = diff_32;
                                *counter = 0;
                            }
                        }
                    } else {
                        encoder.encode_symbol(&mut self.state.multi_model, 0)?;
                        self.ic_gps_time.compress(encoder, 0, diff_32, 7)?;
                        let counter = &mut self.state.multi_extreme_counters[last];
                        *counter += 1;
                        if *counter > 3 {
                            self.state.last_gps_time_diffs[last] = diff_32;
                            *counter = 0;
                        }
                    }
                } else {
                    // huge difference, look for a matching sequence
                    for i in 1..4 {
                        let other_diff_64 = current
                            .value
                            .wrapping_sub(self.state.last_gps_times[(last + i) & 3].value);
                        if other_diff_64 == i64::from(other_diff_64 as i32) {
                            encoder.encode_symbol(
                                &mut self.state.multi_model,
                                (GPS_TIME_MULTI_CODE_FULL + i as i32) as u32,
                            )?;
                            self.state.last = (last + i) & 3;
                            return self.compress_with(encoder, buf);
                        }
                    }

                    encoder.encode_symbol(
                        &mut self.state.multi_model,
                        GPS_TIME_MULTI_CODE_FULL as u32,
                    )?;
                    self.ic_gps_time.compress(
                        encoder,
                        (self.state.last_gps_times[last].value >> 32) as i32,
                        (current.value >> 32) as i32,
                        8,
                    )?;
                    encoder.write_int(current.value as u32)?;

                    self.state.next = (self.state.next + 1) & 3;
                    self.state.last = self.state.next;
                    self.state.last_gps_time_diffs[self.state.last] = 0;
                    self.state.multi_extreme_counters[self.state.last] = 0;
                }
                self.state.last_gps_times[self.state.last] = current;
            }
            Ok(())
        }
    }

    pub struct GpsTimeDecompressor {
        ic_gps_time: IntDecompressor,
        state: GpsTimeState,
    }

    impl GpsTimeDecompressor {
        pub fn new() -> Self {
            Self {
                ic_gps_time: IntDecompressor::initialized(32, 9),
                state: GpsTimeState::new(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for GpsTimeDecompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<i64>()
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            self.state.last_gps_times[0] = read_and_unpack::<_, GpsTime>(src, first_point)?;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let last = self.state.last;

            if self.state.last_gps_time_diffs[last] == 0 {
                let multi = decoder.decode_symbol(&mut self.state.zero_diff_model)? as i32;

                if multi == 1 {
                    let diff = self.ic_gps_time.decompress(decoder, 0, 0)?;
                    self.state.last_gps_time_diffs[last] = diff;
                    self.state.last_gps_times[last].value = self.state.last_gps_times[last]
                        .value
                        .wrapping_add(i64::from(diff));
                    self.state.multi_extreme_counters[last] = 0;
                } else if multi == 2 {
                    // a new sequence starts
                    self.state.next = (self.state.next + 1) & 3;
                    let upper = self.ic_gps_time.decompress(
                        decoder,
                        (self.state.last_gps_times[last].value >> 32) as i32,
                        8,
                    )?;
                    let lower = decoder.read_int()?;
                    self.state.last_gps_times[self.state.next].value =
                        i64::from(upper) << 32 | i64::from(lower);

                    self.state.last = self.state.next;
                    self.state.last_gps_time_diffs[self.state.last] = 0;
                    self.state.multi_extreme_counters[self.state.last] = 0;
                } else if multi > 2 {
                    // switch to another tracked sequence
                    self.state.last = (last + multi as usize - 2) & 3;
                    return self.decompress_with(decoder, buf);
                }
            } else {
                let mut multi = decoder.decode_symbol(&mut self.state.multi_model)? as i32;

                if multi == 1 {
                    let diff = self.ic_gps_time.decompress(
                        decoder,
                        self.state.last_gps_time_diffs[last],
                        1,
                    )?;
                    self.state.last_gps_times[last].value = self.state.last_gps_times[last]
                        .value
                        .wrapping_add(i64::from(diff));
                    self.state.last_gps_time_diffs[last] = diff;
                    self.state.multi_extreme_counters[last] = 0;
                } else if multi < GPS_TIME_MULTI_UNCHANGED {
                    let gps_time_diff: i32;
                    if multi == 0 {
                        gps_time_diff = self.ic_gps_time.decompress(decoder, 0, 7)?;
                        self.state.multi_extreme_counters[last] += 1;
                        if self.state.multi_extreme_counters[last] > 3 {
                            self.state.last_gps_time_diffs[last] = gps_time_diff;
                            self.state.multi_extreme_counters[last] = 0;
                        }
                    } else if multi < GPS_TIME_MULTI {
                        let context = if multi < 10 { 2 } else { 3 };
                        gps_time_diff = self.ic_gps_time.decompress(
                            decoder,
                            multi.wrapping_mul(self.state.last_gps_time_diffs[last]),
                            context,
                        )?;
                    } else if multi == GPS_TIME_MULTI {
                        gps_time_diff = self.ic_gps_time.decompress(
                            decoder,
                            multi.wrapping_mul(self.state.last_gps_time_diffs[last]),
                            4,
                        )?;
                        self.state.multi_extreme_counters[last] += 1;
                        if self.state.multi_extreme_counters[last] > 3 {
                            self.state.last_gps_time_diffs[last] = gps_time_diff;
                            self.state.multi_extreme_counters[last] = 0;
                        }
                    } else {
                        multi = GPS_TIME_MULTI - multi;
                        if multi > GPS_TIME_MULTI_MINUS {
                            gps_time_diff = self.ic_gps_time.decompress(
                                decoder,
                                multi.wrapping_mul(self.state.last_gps_time_diffs[last]),
                                5,
                            )?;
                        } else {
                            gps_time_diff = self.ic_gps_time.decompress(
                                decoder,
                                GPS_TIME_MULTI_MINUS
                                    .wrapping_mul(self.state.last_gps_time_diffs[last]),
                                6,
                            )?;
                            self.state.multi_extreme_counters[last] += 1;
                            if self.state.multi_extreme_counters[last] > 3 {
                                self.state.last_gps_time_diffs[last] = gps_time_diff;
                                self.state.multi_extreme_counters[last] = 0;
                            }
                        }
                    }
                    self.state.last_gps_times[last].value = self.state.last_gps_times[last]
                        .value
                        .wrapping_add(i64::from(gps_time_diff));
                } else if multi == GPS_TIME_MULTI_CODE_FULL {
                    self.state.next = (self.state.next + 1) & 3;
                    let upper = self.ic_gps_time.decompress(
                        decoder,
                        (self.state.last_gps_times[last].value >> 32) as i32,
                        8,
                    )?;
                    let lower = decoder.read_int()?;
                    self.state.last_gps_times[self.state.next].value =
                        i64::from(upper) << 32 | i64::from(lower);

                    self.state.last = self.state.next;
                    self.state.last_gps_time_diffs[self.state.last] = 0;
                    self.state.multi_extreme_counters[self.state.last] = 0;
                } else if multi > GPS_TIME_MULTI_CODE_FULL {
                    self.state.last = (last + multi as usize - GPS_TIME_MULTI_CODE_FULL as usize) & 3;
                    return self.decompress_with(decoder, buf);
                }
            }
            self.state.last_gps_times[self.state.last].pack_into(buf);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_pattern_roundtrip() {
        let time = GpsTime::from(123_456.789_f64);
        let mut buf = [0u8; 8];
        time.pack_into(&mut buf);
        assert_eq!(GpsTime::unpack_from(&buf), time);
        assert_eq!(f64::from(time), 123_456.789_f64);
    }
}

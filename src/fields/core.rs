//! Codecs for the base point attributes: position, intensity, return
//! info, classification, scan angle, user data and point source id.

use std::mem::size_of;

use crate::packing::Packable;

#[derive(Default, Copy, Clone, PartialEq, Debug)]
pub struct CorePoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub intensity: u16,

    // 3 bits
    pub return_number: u8,
    // 3 bits
    pub number_of_returns: u8,
    // 1 bit
    pub scan_direction_flag: bool,
    // 1 bit
    pub edge_of_flight_line: bool,

    pub classification: u8,
    pub scan_angle_rank: i8,
    pub user_data: u8,
    pub point_source_id: u16,
}

impl CorePoint {
    pub fn set_bit_fields_from(&mut self, byte: u8) {
        self.return_number = byte & 0x7;
        self.number_of_returns = (byte >> 3) & 0x7;
        self.scan_direction_flag = ((byte >> 6) & 0x1) != 0;
        self.edge_of_flight_line = ((byte >> 7) & 0x1) != 0;
    }

    pub fn bit_fields_to_byte(&self) -> u8 {
        ((self.edge_of_flight_line as u8) << 7)
            | ((self.scan_direction_flag as u8) << 6)
            | ((self.number_of_returns & 0x7) << 3)
            | (self.return_number & 0x7)
    }
}

impl Packable for CorePoint {
    fn unpack_from(input: &[u8]) -> Self {
        let mut point = CorePoint::default();

        let mut start = 0;
        let mut end = size_of::<i32>();
        point.x = i32::unpack_from(&input[start..end]);
        start = end;
        end += size_of::<i32>();
        point.y = i32::unpack_from(&input[start..end]);
        start = end;
        end += size_of::<i32>();
        point.z = i32::unpack_from(&input[start..end]);

        start = end;
        end += size_of::<u16>();
        point.intensity = u16::unpack_from(&input[start..end]);

        point.set_bit_fields_from(input[end]);
        point.classification = input[end + 1];
        point.scan_angle_rank = input[end + 2] as i8;
        point.user_data = input[end + 3];
        point.point_source_id = u16::unpack_from(&input[end + 4..end + 6]);

        point
    }

    fn pack_into(&self, output: &mut [u8]) {
        let mut start = 0;
        let mut end = size_of::<i32>();
        self.x.pack_into(&mut output[start..end]);
        start = end;
        end += size_of::<i32>();
        self.y.pack_into(&mut output[start..end]);
        start = end;
        end += size_of::<i32>();
        self.z.pack_into(&mut output[start..end]);

        start = end;
        end += size_of::<u16>();
        self.intensity.pack_into(&mut output[start..end]);

        output[end] = self.bit_fields_to_byte();
        output[end + 1] = self.classification;
        output[end + 2] = self.scan_angle_rank as u8;
        output[end + 3] = self.user_data;
        self.point_source_id
            .pack_into(&mut output[end + 4..end + 6]);
    }
}

pub const CORE_FIELD_SIZE: usize = 20;

pub mod v1 {
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::Packable;
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::{CorePoint, CORE_FIELD_SIZE};

    /// median of the 3 preceding differences
    fn median_diff(diffs: &[i32; 3]) -> i32 {
        if diffs[0] < diffs[1] {
            if diffs[1] < diffs[2] {
                diffs[1]
            } else if diffs[0] < diffs[2] {
                diffs[2]
            } else {
                diffs[0]
            }
        } else if diffs[0] < diffs[2] {
            diffs[0]
        } else if diffs[1] < diffs[2] {
            diffs[2]
        } else {
            diffs[1]
        }
    }

    pub struct CoreCompressor {
        last: CorePoint,

        last_x_diffs: [i32; 3],
        last_y_diffs: [i32; 3],
        last_incr: usize,

        ic_dx: IntCompressor,
        ic_dy: IntCompressor,
        ic_dz: IntCompressor,
        ic_intensity: IntCompressor,
        ic_scan_angle_rank: IntCompressor,
        ic_point_source_id: IntCompressor,

        changed_values_model: SymbolModel,
        // lazily created, indexed by the last value of the byte they model
        bit_byte_models: Vec<Option<SymbolModel>>,
        classification_models: Vec<Option<SymbolModel>>,
        user_data_models: Vec<Option<SymbolModel>>,
    }

    impl CoreCompressor {
        pub fn new() -> Self {
            Self {
                last: Default::default(),
                last_x_diffs: [0i32; 3],
                last_y_diffs: [0i32; 3],
                last_incr: 0,
                ic_dx: IntCompressor::initialized(32, 1),
                ic_dy: IntCompressor::initialized(32, 20),
                ic_dz: IntCompressor::initialized(32, 20),
                ic_intensity: IntCompressor::initialized(16, 1),
                ic_scan_angle_rank: IntCompressor::initialized(8, 2),
                ic_point_source_id: IntCompressor::initialized(16, 1),
                changed_values_model: SymbolModel::new(64),
                bit_byte_models: (0..256).map(|_| None).collect(),
                classification_models: (0..256).map(|_| None).collect(),
                user_data_models: (0..256).map(|_| None).collect(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for CoreCompressor {
        fn size_of_field(&self) -> usize {
            CORE_FIELD_SIZE
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last = CorePoint::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = CorePoint::unpack_from(buf);
            let median_x = median_diff(&self.last_x_diffs);
            let median_y = median_diff(&self.last_y_diffs);

            let x_diff = current.x.wrapping_sub(self.last.x);
            let y_diff = current.y.wrapping_sub(self.last.y);

            self.ic_dx.compress(encoder, median_x, x_diff, 0)?;
            let k_bits = self.ic_dx.k();
            self.ic_dy
                .compress(encoder, median_y, y_diff, k_bits.min(19))?;

            let k_bits = (k_bits + self.ic_dy.k()) / 2;
            self.ic_dz
                .compress(encoder, self.last.z, current.z, k_bits.min(19))?;

            let changed_values: u8 = ((self.last.intensity != current.intensity) as u8) << 5
                | ((self.last.bit_fields_to_byte() != current.bit_fields_to_byte()) as u8) << 4
                | ((self.last.classification != current.classification) as u8) << 3
                | ((self.last.scan_angle_rank != current.scan_angle_rank) as u8) << 2
                | ((self.last.user_data != current.user_data) as u8) << 1
                | (self.last.point_source_id != current.point_source_id) as u8;

            encoder.encode_symbol(&mut self.changed_values_model, u32::from(changed_values))?;

            if changed_values != 0 {
                if (changed_values & 32) != 0 {
                    self.ic_intensity.compress(
                        encoder,
                        i32::from(self.last.intensity),
                        i32::from(current.intensity),
                        0,
                    )?;
                }

                if (changed_values & 16) != 0 {
                    let model = self.bit_byte_models
                        [self.last.bit_fields_to_byte() as usize]
                        .get_or_insert_with(|| SymbolModel::new(256));
                    encoder.encode_symbol(model, u32::from(current.bit_fields_to_byte()))?;
                }

                if (changed_values & 8) != 0 {
                    let model = self.classification_models[self.last.classification as usize]
                        .get_or_insert_with(|| SymbolModel::new(256));
                    encoder.encode_symbol(model, u32::from(current.classification))?;
                }

                if (changed_values & 4) != 0 {
                    self.ic_scan_angle_rank.compress(
                        encoder,
                        i32::from(self.last.scan_angle_rank),
                        i32::from(current.scan_angle_rank),
                        (k_bits < 3) as u32,
                    )?;
                }

                if (changed_values & 2) != 0 {
                    let model = self.user_data_models[self.last.user_data as usize]
                        .get_or_insert_with(|| SymbolModel::new(256));
                    encoder.encode_symbol(model, u32::from(current.user_data))?;
                }

                if (changed_values & 1) != 0 {
                    self.ic_point_source_id.compress(
                        encoder,
                        i32::from(self.last.point_source_id),
                        i32::from(current.point_source_id),
                        0,
                    )?;
                }
            }

            self.last_x_diffs[self.last_incr] = x_diff;
            self.last_y_diffs[self.last_incr] = y_diff;
            self.last_incr += 1;
            if self.last_incr > 2 {
                self.last_incr = 0;
            }
            self.last = current;
            Ok(())
        }
    }

    pub struct CoreDecompressor {
        last: CorePoint,

        last_x_diffs: [i32; 3],
        last_y_diffs: [i32; 3],
        last_incr: usize,

        ic_dx: IntDecompressor,
        ic_dy: IntDecompressor,
        ic_dz: IntDecompressor,
        ic_intensity: IntDecompressor,
        ic_scan_angle_rank: IntDecompressor,
        ic_point_source_id: IntDecompressor,

        changed_values_model: SymbolModel,
        bit_byte_models: Vec<Option<SymbolModel>>,
        classification_models: Vec<Option<SymbolModel>>,
        user_data_models: Vec<Option<SymbolModel>>,
    }

    impl CoreDecompressor {
        pub fn new() -> Self {
            Self {
                last: Default::default(),
                last_x_diffs: [0i32; 3],
                last_y_diffs: [0i32; 3],
                last_incr: 0,
                ic_dx: IntDecompressor::initialized(32, 1),
                ic_dy: IntDecompressor::initialized(32, 20),
                ic_dz: IntDecompressor::initialized(32, 20),
                ic_intensity: IntDecompressor::initialized(16, 1),
                ic_scan_angle_rank: IntDecompressor::initialized(8, 2),
                ic_point_source_id: IntDecompressor::initialized(16, 1),
                changed_values_model: SymbolModel::new(64),
                bit_byte_models: (0..256).map(|_| None).collect(),
                classification_models: (0..256).map(|_| None).collect(),
                user_data_models: (0..256).map(|_| None).collect(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for CoreDecompressor {
        fn size_of_field(&self) -> usize {
            CORE_FIELD_SIZE
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            src.read_exact(first_point)?;
            self.last = CorePoint::unpack_from(first_point);
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let median_x = median_diff(&self.last_x_diffs);
            let median_y = median_diff(&self.last_y_diffs);

            let x_diff = self.ic_dx.decompress(decoder, median_x, 0)?;
            self.last.x = self.last.x.wrapping_add(x_diff);
            // the corrector magnitude of x switches the y and z contexts
            let k_bits = self.ic_dx.k();
            let y_diff = self.ic_dy.decompress(decoder, median_y, k_bits.min(19))?;
            self.last.y = self.last.y.wrapping_add(y_diff);

            let k_bits = (k_bits + self.ic_dy.k()) / 2;
            self.last.z = self.ic_dz.decompress(decoder, self.last.z, k_bits.min(19))?;

            let changed_values = decoder.decode_symbol(&mut self.changed_values_model)?;

            if changed_values != 0 {
                if (changed_values & 32) != 0 {
                    self.last.intensity = self.ic_intensity.decompress(
                        decoder,
                        i32::from(self.last.intensity),
                        0,
                    )? as u16;
                }

                if (changed_values & 16) != 0 {
                    let model = self.bit_byte_models
                        [self.last.bit_fields_to_byte() as usize]
                        .get_or_insert_with(|| SymbolModel::new(256));
                    let byte = decoder.decode_symbol(model)? as u8;
                    self.last.set_bit_fields_from(byte);
                }

                if (changed_values & 8) != 0 {
                    let model = self.classification_models[self.last.classification as usize]
                        .get_or_insert_with(|| SymbolModel::new(256));
                    self.last.classification = decoder.decode_symbol(model)? as u8;
                }

                if (changed_values & 4) != 0 {
                    self.last.scan_angle_rank = self.ic_scan_angle_rank.decompress(
                        decoder,
                        i32::from(self.last.scan_angle_rank),
                        (k_bits < 3) as u32,
                    )? as i8;
                }

                if (changed_values & 2) != 0 {
                    let model = self.user_data_models[self.last.user_data as usize]
                        .get_or_insert_with(|| SymbolModel::new(256));
                    self.last.user_data = decoder.decode_symbol(model)? as u8;
                }

                if (changed_values & 1) != 0 {
                    self.last.point_source_id = self.ic_point_source_id.decompress(
                        decoder,
                        i32::from(self.last.point_source_id),
                        0,
                    )? as u16;
                }
            }

            self.last_x_diffs[self.last_incr] = x_diff;
            self.last_y_diffs[self.last_incr] = y_diff;
            self.last_incr += 1;
            if self.last_incr > 2 {
                self.last_incr = 0;
            }

            self.last.pack_into(buf);
            Ok(())
        }
    }
}

pub mod v2 {
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::Packable;
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{FieldCompressor, FieldDecompressor};
    use crate::utils::{u32_zero_lowest_bit, StreamingMedian, RETURN_LEVEL, RETURN_MAP};

    use super::{CorePoint, CORE_FIELD_SIZE};

    struct ChangedValues {
        value: u32,
    }

    // bit map of what changed since the previous point, x, y and z
    // excluded. The bit fields and intensity flags are swapped
    // compared to version 1.
    impl ChangedValues {
        fn of(current: &CorePoint, last: &CorePoint, last_intensity: u16) -> Self {
            let bit_fields_changed = current.bit_fields_to_byte() != last.bit_fields_to_byte();
            Self {
                value: (bit_fields_changed as u32) << 5
                    | (((last_intensity ^ current.intensity) != 0) as u32) << 4
                    | (((last.classification ^ current.classification) != 0) as u32) << 3
                    | (((last.scan_angle_rank ^ current.scan_angle_rank) != 0) as u32) << 2
                    | (((last.user_data ^ current.user_data) != 0) as u32) << 1
                    | ((last.point_source_id ^ current.point_source_id) != 0) as u32,
            }
        }

        fn bit_fields_changed(&self) -> bool {
            (self.value & (1 << 5)) != 0
        }

        fn intensity_changed(&self) -> bool {
            (self.value & (1 << 4)) != 0
        }

        fn classification_changed(&self) -> bool {
            (self.value & (1 << 3)) != 0
        }

        fn scan_angle_rank_changed(&self) -> bool {
            (self.value & (1 << 2)) != 0
        }

        fn user_data_changed(&self) -> bool {
            (self.value & (1 << 1)) != 0
        }

        fn point_source_id_changed(&self) -> bool {
            (self.value & 1) != 0
        }
    }

    /// State both directions share, contexts keyed by the return info.
    struct CoreState {
        last: CorePoint,
        last_intensity: [u16; 16],

        // 16 elements each, StreamingMedian is not Copy
        last_x_diff_median: Vec<StreamingMedian<i32>>,
        last_y_diff_median: Vec<StreamingMedian<i32>>,

        last_height: [i32; 8],

        changed_values: SymbolModel,

        scan_angle_rank: Vec<SymbolModel>,    // 2
        bit_byte: Vec<SymbolModel>,           // 256
        classification: Vec<SymbolModel>,     // 256
        user_data: Vec<SymbolModel>,          // 256
    }

    impl CoreState {
        fn new() -> Self {
            Self {
                last: Default::default(),
                last_intensity: [0u16; 16],
                last_x_diff_median: (0..16).map(|_| StreamingMedian::new()).collect(),
                last_y_diff_median: (0..16).map(|_| StreamingMedian::new()).collect(),
                last_height: [0i32; 8],
                changed_values: SymbolModel::new(64),
                scan_angle_rank: (0..2).map(|_| SymbolModel::new(256)).collect(),
                bit_byte: (0..256).map(|_| SymbolModel::new(256)).collect(),
                classification: (0..256).map(|_| SymbolModel::new(256)).collect(),
                user_data: (0..256).map(|_| SymbolModel::new(256)).collect(),
            }
        }
    }

    pub struct CoreCompressor {
        ic_intensity: IntCompressor,
        ic_point_source_id: IntCompressor,
        ic_dx: IntCompressor,
        ic_dy: IntCompressor,
        ic_z: IntCompressor,

        state: CoreState,
    }

    impl CoreCompressor {
        pub fn new() -> Self {
            Self {
                ic_intensity: IntCompressor::initialized(16, 4),
                ic_point_source_id: IntCompressor::initialized(16, 1),
                ic_dx: IntCompressor::initialized(32, 2),
                ic_dy: IntCompressor::initialized(32, 22),
                ic_z: IntCompressor::initialized(32, 20),
                state: CoreState::new(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for CoreCompressor {
        fn size_of_field(&self) -> usize {
            CORE_FIELD_SIZE
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.state.last = CorePoint::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = CorePoint::unpack_from(buf);

            let r = current.return_number;
            let n = current.number_of_returns;
            let m = RETURN_MAP[n as usize][r as usize];
            let l = RETURN_LEVEL[n as usize][r as usize];

            let changed = ChangedValues::of(
                &current,
                &self.state.last,
                self.state.last_intensity[m as usize],
            );
            encoder.encode_symbol(&mut self.state.changed_values, changed.value)?;

            if changed.bit_fields_changed() {
                let last_byte = self.state.last.bit_fields_to_byte();
                encoder.encode_symbol(
                    &mut self.state.bit_byte[last_byte as usize],
                    u32::from(current.bit_fields_to_byte()),
                )?;
            }

            if changed.intensity_changed() {
                self.ic_intensity.compress(
                    encoder,
                    i32::from(self.state.last_intensity[m as usize]),
                    i32::from(current.intensity),
                    u32::from(m.min(3)),
                )?;
                self.state.last_intensity[m as usize] = current.intensity;
            }

            if changed.classification_changed() {
                encoder.encode_symbol(
                    &mut self.state.classification[self.state.last.classification as usize],
                    u32::from(current.classification),
                )?;
            }

            if changed.scan_angle_rank_changed() {
                // the "as u8" truncation before widening is vital
                encoder.encode_symbol(
                    &mut self.state.scan_angle_rank[current.scan_direction_flag as usize],
                    u32::from(
                        current
                            .scan_angle_rank
                            .wrapping_sub(self.state.last.scan_angle_rank)
                            as u8,
                    ),
                )?;
            }

            if changed.user_data_changed() {
                encoder.encode_symbol(
                    &mut self.state.user_data[self.state.last.user_data as usize],
                    u32::from(current.user_data),
                )?;
            }

            if changed.point_source_id_changed() {
                self.ic_point_source_id.compress(
                    encoder,
                    i32::from(self.state.last.point_source_id),
                    i32::from(current.point_source_id),
                    0,
                )?;
            }

            let median = self.state.last_x_diff_median[m as usize].get();
            let diff = current.x.wrapping_sub(self.state.last.x);
            self.ic_dx.compress(encoder, median, diff, (n == 1) as u32)?;
            self.state.last_x_diff_median[m as usize].add(diff);

            let k_bits = self.ic_dx.k();
            let median = self.state.last_y_diff_median[m as usize].get();
            let diff = current.y.wrapping_sub(self.state.last.y);
            let context = (n == 1) as u32
                + if k_bits < 20 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    20
                };
            self.ic_dy.compress(encoder, median, diff, context)?;
            self.state.last_y_diff_median[m as usize].add(diff);

            let k_bits = (self.ic_dx.k() + self.ic_dy.k()) / 2;
            let context = (n == 1) as u32
                + if k_bits < 18 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    18
                };
            self.ic_z.compress(
                encoder,
                self.state.last_height[l as usize],
                current.z,
                context,
            )?;
            self.state.last_height[l as usize] = current.z;

            self.state.last = current;
            Ok(())
        }
    }

    pub struct CoreDecompressor {
        ic_intensity: IntDecompressor,
        ic_point_source_id: IntDecompressor,
        ic_dx: IntDecompressor,
        ic_dy: IntDecompressor,
        ic_z: IntDecompressor,

        state: CoreState,
    }

    impl CoreDecompressor {
        pub fn new() -> Self {
            Self {
                ic_intensity: IntDecompressor::initialized(16, 4),
                ic_point_source_id: IntDecompressor::initialized(16, 1),
                ic_dx: IntDecompressor::initialized(32, 2),
                ic_dy: IntDecompressor::initialized(32, 22),
                ic_z: IntDecompressor::initialized(32, 20),
                state: CoreState::new(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for CoreDecompressor {
        fn size_of_field(&self) -> usize {
            CORE_FIELD_SIZE
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            src.read_exact(first_point)?;
            self.state.last = CorePoint::unpack_from(first_point);
            // intensity prediction starts from 0
            self.state.last.intensity = 0;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let changed = ChangedValues {
                value: decoder.decode_symbol(&mut self.state.changed_values)?,
            };

            if changed.value != 0 {
                if changed.bit_fields_changed() {
                    let byte = self.state.last.bit_fields_to_byte();
                    let byte =
                        decoder.decode_symbol(&mut self.state.bit_byte[byte as usize])? as u8;
                    self.state.last.set_bit_fields_from(byte);
                }
            }

            let r = self.state.last.return_number;
            let n = self.state.last.number_of_returns;
            let m = RETURN_MAP[n as usize][r as usize];
            let l = RETURN_LEVEL[n as usize][r as usize];

            if changed.value != 0 {
                if changed.intensity_changed() {
                    self.state.last.intensity = self.ic_intensity.decompress(
                        decoder,
                        i32::from(self.state.last_intensity[m as usize]),
                        u32::from(m.min(3)),
                    )? as u16;
                    self.state.last_intensity[m as usize] = self.state.last.intensity;
                } else {
                    self.state.last.intensity = self.state.last_intensity[m as usize];
                }

                if changed.classification_changed() {
                    self.state.last.classification = decoder.decode_symbol(
                        &mut self.state.classification
                            [self.state.last.classification as usize],
                    )? as u8;
                }

                if changed.scan_angle_rank_changed() {
                    let diff = decoder.decode_symbol(
                        &mut self.state.scan_angle_rank
                            [self.state.last.scan_direction_flag as usize],
                    )? as u8;
                    self.state.last.scan_angle_rank =
                        self.state.last.scan_angle_rank.wrapping_add(diff as i8);
                }

                if changed.user_data_changed() {
                    self.state.last.user_data = decoder.decode_symbol(
                        &mut self.state.user_data[self.state.last.user_data as usize],
                    )? as u8;
                }

                if changed.point_source_id_changed() {
                    self.state.last.point_source_id = self.ic_point_source_id.decompress(
                        decoder,
                        i32::from(self.state.last.point_source_id),
                        0,
                    )? as u16;
                }
            }

            let median = self.state.last_x_diff_median[m as usize].get();
            let diff = self.ic_dx.decompress(decoder, median, (n == 1) as u32)?;
            self.state.last.x = self.state.last.x.wrapping_add(diff);
            self.state.last_x_diff_median[m as usize].add(diff);

            let k_bits = self.ic_dx.k();
            let median = self.state.last_y_diff_median[m as usize].get();
            let context = (n == 1) as u32
                + if k_bits < 20 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    20
                };
            let diff = self.ic_dy.decompress(decoder, median, context)?;
            self.state.last.y = self.state.last.y.wrapping_add(diff);
            self.state.last_y_diff_median[m as usize].add(diff);

            let k_bits = (self.ic_dx.k() + self.ic_dy.k()) / 2;
            let context = (n == 1) as u32
                + if k_bits < 18 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    18
                };
            self.state.last.z = self.ic_z.decompress(
                decoder,
                self.state.last_height[l as usize],
                context,
            )?;
            self.state.last_height[l as usize] = self.state.last.z;

            self.state.last.pack_into(buf);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_fields_byte_roundtrip() {
        for byte in 0..=255u8 {
            let mut point = CorePoint::default();
            point.set_bit_fields_from(byte);
            assert_eq!(point.bit_fields_to_byte(), byte);
        }
    }

    #[test]
    fn record_pack_unpack() {
        let point = CorePoint {
            x: -153,
            y: 78_412,
            z: 1_029,
            intensity: 412,
            return_number: 2,
            number_of_returns: 3,
            scan_direction_flag: true,
            edge_of_flight_line: false,
            classification: 5,
            scan_angle_rank: -17,
            user_data: 42,
            point_source_id: 7_001,
        };
        let mut buf = [0u8; CORE_FIELD_SIZE];
        point.pack_into(&mut buf);
        assert_eq!(CorePoint::unpack_from(&buf), point);
    }
}

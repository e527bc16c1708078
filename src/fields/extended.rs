//! Extended point record codec (formats 6 and up), layered wire format.

use byteorder::{ByteOrder, LittleEndian};

use crate::fields::gpstime::GpsTime;
use crate::packing::Packable;

pub const EXTENDED_FIELD_SIZE: usize = 30;

/// Extended record core attributes.
///
/// Return counts go up to 15 and the scanner channel lives in the
/// flags byte, between the classification flags and the direction and
/// edge bits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExtendedPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub intensity: u16,
    pub bit_fields: u8,
    pub flags: u8,
    pub classification: u8,
    pub user_data: u8,
    pub scan_angle: u16,
    pub point_source_id: u16,
    pub gps_time: GpsTime,

    // codec state only, not part of the record bytes
    pub(crate) gps_time_change: bool,
}

impl Default for ExtendedPoint {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            intensity: 0,
            bit_fields: 0,
            flags: 0,
            classification: 0,
            user_data: 0,
            scan_angle: 0,
            point_source_id: 0,
            gps_time: GpsTime::default(),
            gps_time_change: false,
        }
    }
}

impl ExtendedPoint {
    pub const SIZE: usize = EXTENDED_FIELD_SIZE;

    pub fn return_number(&self) -> u8 {
        self.bit_fields & 0b0000_1111
    }

    pub fn number_of_returns(&self) -> u8 {
        (self.bit_fields & 0b1111_0000) >> 4
    }

    pub fn classification_flags(&self) -> u8 {
        self.flags & 0b0000_1111
    }

    pub fn scanner_channel(&self) -> u8 {
        (self.flags & 0b0011_0000) >> 4
    }

    pub fn scan_direction_flag(&self) -> bool {
        self.flags & 0b0100_0000 != 0
    }

    pub fn edge_of_flight_line(&self) -> bool {
        self.flags & 0b1000_0000 != 0
    }

    pub fn set_return_number(&mut self, new_val: u8) {
        self.bit_fields = (self.bit_fields & 0b1111_0000) | (new_val & 0b0000_1111);
    }

    pub fn set_number_of_returns(&mut self, new_val: u8) {
        self.bit_fields = (self.bit_fields & 0b0000_1111) | ((new_val << 4) & 0b1111_0000);
    }

    pub fn set_scanner_channel(&mut self, new_val: u8) {
        self.flags = (self.flags & 0b1100_1111) | ((new_val << 4) & 0b0011_0000);
    }
}

impl Packable for ExtendedPoint {
    fn unpack_from(input: &[u8]) -> Self {
        Self {
            x: LittleEndian::read_i32(&input[0..4]),
            y: LittleEndian::read_i32(&input[4..8]),
            z: LittleEndian::read_i32(&input[8..12]),
            intensity: LittleEndian::read_u16(&input[12..14]),
            bit_fields: input[14],
            flags: input[15],
            classification: input[16],
            user_data: input[17],
            scan_angle: LittleEndian::read_u16(&input[18..20]),
            point_source_id: LittleEndian::read_u16(&input[20..22]),
            gps_time: GpsTime::unpack_from(&input[22..30]),
            gps_time_change: false,
        }
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_i32(&mut output[0..4], self.x);
        LittleEndian::write_i32(&mut output[4..8], self.y);
        LittleEndian::write_i32(&mut output[8..12], self.z);
        LittleEndian::write_u16(&mut output[12..14], self.intensity);
        output[14] = self.bit_fields;
        output[15] = self.flags;
        output[16] = self.classification;
        output[17] = self.user_data;
        LittleEndian::write_u16(&mut output[18..20], self.scan_angle);
        LittleEndian::write_u16(&mut output[20..22], self.point_source_id);
        self.gps_time.pack_into(&mut output[22..30]);
    }
}

pub mod v3 {
    use std::io::{Cursor, Read, Seek, Write};

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::fields::gpstime::{
        GpsTime, GPS_TIME_MULTI, GPS_TIME_MULTI_CODE_FULL, GPS_TIME_MULTI_MINUS,
        GPS_TIME_MULTI_TOTAL,
    };
    use crate::layers::{copy_bytes_into_decoder, copy_encoder_content_to, inner_buffer_len_of};
    use crate::layout::DecompressionSelector;
    use crate::packing::{read_and_unpack, Packable};
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{LayeredFieldCompressor, LayeredFieldDecompressor};
    use crate::utils::{
        i32_quantize, u32_zero_lowest_bit, StreamingMedian, RETURN_LEVEL_8CTX, RETURN_MAP_6CTX,
    };

    use super::ExtendedPoint;

    fn lazy_model(
        models: &mut [Option<SymbolModel>],
        index: usize,
        symbol_count: u32,
    ) -> &mut SymbolModel {
        models[index].get_or_insert_with(|| SymbolModel::new(symbol_count))
    }

    /// The flags byte without the scanner channel, which is coded
    /// separately.
    fn flags_symbol(point: &ExtendedPoint) -> u32 {
        (point.edge_of_flight_line() as u32) << 5
            | (point.scan_direction_flag() as u32) << 4
            | u32::from(point.classification_flags())
    }

    struct GpsTimeDecompressionState {
        last: usize,
        next: usize,
        last_gps_times: [GpsTime; 4],
        last_gps_diffs: [i32; 4],
        multi_extreme_counters: [i32; 4],
        multi_model: SymbolModel,
        no_diff_model: SymbolModel,
        ic_gps_time: IntDecompressor,
    }

    impl GpsTimeDecompressionState {
        fn from_point(point: &ExtendedPoint) -> Self {
            let mut last_gps_times = [GpsTime::default(); 4];
            last_gps_times[0] = point.gps_time;
            Self {
                last: 0,
                next: 0,
                last_gps_times,
                last_gps_diffs: [0; 4],
                multi_extreme_counters: [0; 4],
                multi_model: SymbolModel::new(GPS_TIME_MULTI_TOTAL as u32),
                no_diff_model: SymbolModel::new(5),
                ic_gps_time: IntDecompressor::initialized(32, 9),
            }
        }
    }

    struct GpsTimeCompressionState {
        last: usize,
        next: usize,
        last_gps_times: [GpsTime; 4],
        last_gps_diffs: [i32; 4],
        multi_extreme_counters: [i32; 4],
        multi_model: SymbolModel,
        no_diff_model: SymbolModel,
        ic_gps_time: IntCompressor,
    }

    impl GpsTimeCompressionState {
        fn from_point(point: &ExtendedPoint) -> Self {
            let mut last_gps_times = [GpsTime::default(); 4];
            last_gps_times[0] = point.gps_time;
            Self {
                last: 0,
                next: 0,
                last_gps_times,
                last_gps_diffs: [0; 4],
                multi_extreme_counters: [0; 4],
                multi_model: SymbolModel::new(GPS_TIME_MULTI_TOTAL as u32),
                no_diff_model: SymbolModel::new(5),
                ic_gps_time: IntCompressor::initialized(32, 9),
            }
        }
    }

    struct DecompressionContext {
        unused: bool,
        last_point: ExtendedPoint,
        last_intensities: [u16; 8],
        last_x_diff_median5: [StreamingMedian<i32>; 12],
        last_y_diff_median5: [StreamingMedian<i32>; 12],
        last_z: [i32; 8],

        changed_values_models: Vec<SymbolModel>, // 8
        scanner_channel_model: SymbolModel,
        number_of_returns_models: Vec<Option<SymbolModel>>, // 16
        return_number_models: Vec<Option<SymbolModel>>,     // 16
        return_number_gps_same_model: SymbolModel,
        classification_models: Vec<Option<SymbolModel>>, // 64
        flags_models: Vec<Option<SymbolModel>>,          // 64
        user_data_models: Vec<Option<SymbolModel>>,      // 64

        ic_dx: IntDecompressor,
        ic_dy: IntDecompressor,
        ic_z: IntDecompressor,
        ic_intensity: IntDecompressor,
        ic_scan_angle: IntDecompressor,
        ic_point_source_id: IntDecompressor,

        gps: GpsTimeDecompressionState,
    }

    impl DecompressionContext {
        fn from_last_point(point: &ExtendedPoint) -> Self {
            let mut me = Self {
                unused: false,
                last_point: *point,
                last_intensities: [point.intensity; 8],
                last_x_diff_median5: [StreamingMedian::<i32>::new(); 12],
                last_y_diff_median5: [StreamingMedian::<i32>::new(); 12],
                last_z: [point.z; 8],
                changed_values_models: (0..8).map(|_| SymbolModel::new(128)).collect(),
                scanner_channel_model: SymbolModel::new(3),
                number_of_returns_models: (0..16).map(|_| None).collect(),
                return_number_models: (0..16).map(|_| None).collect(),
                return_number_gps_same_model: SymbolModel::new(13),
                classification_models: (0..64).map(|_| None).collect(),
                flags_models: (0..64).map(|_| None).collect(),
                user_data_models: (0..64).map(|_| None).collect(),
                ic_dx: IntDecompressor::initialized(32, 2),
                ic_dy: IntDecompressor::initialized(32, 22),
                ic_z: IntDecompressor::initialized(32, 20),
                ic_intensity: IntDecompressor::initialized(16, 4),
                ic_scan_angle: IntDecompressor::initialized(16, 2),
                ic_point_source_id: IntDecompressor::initialized(16, 1),
                gps: GpsTimeDecompressionState::from_point(point),
            };
            me.last_point.gps_time_change = false;
            me
        }
    }

    struct CompressionContext {
        unused: bool,
        last_point: ExtendedPoint,
        last_intensities: [u16; 8],
        last_x_diff_median5: [StreamingMedian<i32>; 12],
        last_y_diff_median5: [StreamingMedian<i32>; 12],
        last_z: [i32; 8],

        changed_values_models: Vec<SymbolModel>, // 8
        scanner_channel_model: SymbolModel,
        number_of_returns_models: Vec<Option<SymbolModel>>, // 16
        return_number_models: Vec<Option<SymbolModel>>,     // 16
        return_number_gps_same_model: SymbolModel,
        classification_models: Vec<Option<SymbolModel>>, // 64
        flags_models: Vec<Option<SymbolModel>>,          // 64
        user_data_models: Vec<Option<SymbolModel>>,      // 64

        ic_dx: IntCompressor,
        ic_dy: IntCompressor,
        ic_z: IntCompressor,
        ic_intensity: IntCompressor,
        ic_scan_angle: IntCompressor,
        ic_point_source_id: IntCompressor,

        gps: GpsTimeCompressionState,
    }

    impl CompressionContext {
        fn from_last_point(point: &ExtendedPoint) -> Self {
            let mut me = Self {
                unused: false,
                last_point: *point,
                last_intensities: [point.intensity; 8],
                last_x_diff_median5: [StreamingMedian::<i32>::new(); 12],
                last_y_diff_median5: [StreamingMedian::<i32>::new(); 12],
                last_z: [point.z; 8],
                changed_values_models: (0..8).map(|_| SymbolModel::new(128)).collect(),
                scanner_channel_model: SymbolModel::new(3),
                number_of_returns_models: (0..16).map(|_| None).collect(),
                return_number_models: (0..16).map(|_| None).collect(),
                return_number_gps_same_model: SymbolModel::new(13),
                classification_models: (0..64).map(|_| None).collect(),
                flags_models: (0..64).map(|_| None).collect(),
                user_data_models: (0..64).map(|_| None).collect(),
                ic_dx: IntCompressor::initialized(32, 2),
                ic_dy: IntCompressor::initialized(32, 22),
                ic_z: IntCompressor::initialized(32, 20),
                ic_intensity: IntCompressor::initialized(16, 4),
                ic_scan_angle: IntCompressor::initialized(16, 2),
                ic_point_source_id: IntCompressor::initialized(16, 1),
                gps: GpsTimeCompressionState::from_point(point),
            };
            me.last_point.gps_time_change = false;
            me
        }
    }

    // Each layer carries its own arithmetic stream.
    struct LayerDecoders {
        channel_returns_xy: RangeDecoder<Cursor<Vec<u8>>>,
        z: RangeDecoder<Cursor<Vec<u8>>>,
        classification: RangeDecoder<Cursor<Vec<u8>>>,
        flags: RangeDecoder<Cursor<Vec<u8>>>,
        intensity: RangeDecoder<Cursor<Vec<u8>>>,
        scan_angle: RangeDecoder<Cursor<Vec<u8>>>,
        user_data: RangeDecoder<Cursor<Vec<u8>>>,
        point_source: RangeDecoder<Cursor<Vec<u8>>>,
        gps_time: RangeDecoder<Cursor<Vec<u8>>>,
    }

    impl Default for LayerDecoders {
        fn default() -> Self {
            Self {
                channel_returns_xy: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                z: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                classification: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                flags: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                intensity: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                scan_angle: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                user_data: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                point_source: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                gps_time: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
            }
        }
    }

    struct LayerEncoders {
        channel_returns_xy: RangeEncoder<Cursor<Vec<u8>>>,
        z: RangeEncoder<Cursor<Vec<u8>>>,
        classification: RangeEncoder<Cursor<Vec<u8>>>,
        flags: RangeEncoder<Cursor<Vec<u8>>>,
        intensity: RangeEncoder<Cursor<Vec<u8>>>,
        scan_angle: RangeEncoder<Cursor<Vec<u8>>>,
        user_data: RangeEncoder<Cursor<Vec<u8>>>,
        point_source: RangeEncoder<Cursor<Vec<u8>>>,
        gps_time: RangeEncoder<Cursor<Vec<u8>>>,
    }

    impl Default for LayerEncoders {
        fn default() -> Self {
            Self {
                channel_returns_xy: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                z: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                classification: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                flags: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                intensity: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                scan_angle: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                user_data: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                point_source: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                gps_time: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
            }
        }
    }

    #[derive(Copy, Clone, Default, Debug)]
    struct LayerSizes {
        channel_returns_xy: usize,
        z: usize,
        classification: usize,
        flags: usize,
        intensity: usize,
        scan_angle: usize,
        user_data: usize,
        point_source: usize,
        gps_time: usize,
    }

    impl LayerSizes {
        fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
            Ok(Self {
                channel_returns_xy: src.read_u32::<LittleEndian>()? as usize,
                z: src.read_u32::<LittleEndian>()? as usize,
                classification: src.read_u32::<LittleEndian>()? as usize,
                flags: src.read_u32::<LittleEndian>()? as usize,
                intensity: src.read_u32::<LittleEndian>()? as usize,
                scan_angle: src.read_u32::<LittleEndian>()? as usize,
                user_data: src.read_u32::<LittleEndian>()? as usize,
                point_source: src.read_u32::<LittleEndian>()? as usize,
                gps_time: src.read_u32::<LittleEndian>()? as usize,
            })
        }
    }

    pub struct ExtendedDecompressor {
        decoders: LayerDecoders,

        changed_z: bool,
        changed_classification: bool,
        changed_flags: bool,
        changed_intensity: bool,
        changed_scan_angle: bool,
        changed_user_data: bool,
        changed_point_source: bool,
        changed_gps_time: bool,
        layer_sizes: LayerSizes,

        selector: DecompressionSelector,

        current_context: usize,
        contexts: [DecompressionContext; 4],
    }

    impl ExtendedDecompressor {
        pub fn new() -> Self {
            Self::selective(DecompressionSelector::all())
        }

        pub fn selective(selector: DecompressionSelector) -> Self {
            let point = ExtendedPoint::default();
            Self {
                decoders: LayerDecoders::default(),
                changed_z: false,
                changed_classification: false,
                changed_flags: false,
                changed_intensity: false,
                changed_scan_angle: false,
                changed_user_data: false,
                changed_point_source: false,
                changed_gps_time: false,
                layer_sizes: LayerSizes::default(),
                selector,
                current_context: 0,
                contexts: [
                    DecompressionContext::from_last_point(&point),
                    DecompressionContext::from_last_point(&point),
                    DecompressionContext::from_last_point(&point),
                    DecompressionContext::from_last_point(&point),
                ],
            }
        }

        fn read_gps_time(&mut self) -> std::io::Result<()> {
            let the_context = &mut self.contexts[self.current_context].gps;

            if the_context.last_gps_diffs[the_context.last] == 0 {
                let multi = self
                    .decoders
                    .gps_time
                    .decode_symbol(&mut the_context.no_diff_model)? as i32;
                if multi == 0 {
                    // difference fits in 32 bits
                    let diff = the_context
                        .ic_gps_time
                        .decompress(&mut self.decoders.gps_time, 0, 0)?;
                    the_context.last_gps_diffs[the_context.last] = diff;
                    the_context.last_gps_times[the_context.last].value = the_context.last_gps_times
                        [the_context.last]
                        .value
                        .wrapping_add(i64::from(diff));
                    the_context.multi_extreme_counters[the_context.last] = 0;
                } else if multi == 1 {
                    // huge difference, start a new sequence
                    the_context.next = (the_context.next + 1) & 3;
                    let last_value = the_context.last_gps_times[the_context.last].value;
                    let mut value = i64::from(the_context.ic_gps_time.decompress(
                        &mut self.decoders.gps_time,
                        (last_value >> 32) as i32,
                        8,
                    )?);
                    value <<= 32;
                    value |= i64::from(self.decoders.gps_time.read_int()?);
                    the_context.last_gps_times[the_context.next].value = value;
                    the_context.last = the_context.next;
                    the_context.last_gps_diffs[the_context.last] = 0;
                    the_context.multi_extreme_counters[the_context.last] = 0;
                } else {
                    // switch to another sequence
                    the_context.last = (the_context.last + multi as usize - 1) & 3;
                    self.read_gps_time()?;
                }
            } else {
                let mut multi = self
                    .decoders
                    .gps_time
                    .decode_symbol(&mut the_context.multi_model)? as i32;
                if multi == 1 {
                    let diff = the_context.ic_gps_time.decompress(
                        &mut self.decoders.gps_time,
                        the_context.last_gps_diffs[the_context.last],
                        1,
                    )?;
                    the_context.last_gps_times[the_context.last].value = the_context.last_gps_times
                        [the_context.last]
                        .value
                        .wrapping_add(i64::from(diff));
                    the_context.multi_extreme_counters[the_context.last] = 0;
                } else if multi < GPS_TIME_MULTI_CODE_FULL {
                    let gps_time_diff: i32;
                    if multi == 0 {
                        gps_time_diff = the_context
                            .ic_gps_time
                            .decompress(&mut self.decoders.gps_time, 0, 7)?;
                        the_context.multi_extreme_counters[the_context.last] += 1;
                        if the_context.multi_extreme_counters[the_context.last] > 3 {
                            the_context.last_gps_diffs[the_context.last] = gps_time_diff;
                            the_context.multi_extreme_counters[the_context.last] = 0;
                        }
                    } else if multi < GPS_TIME_MULTI {
                        let context = if multi < 10 { 2 } else { 3 };
                        gps_time_diff = the_context.ic_gps_time.decompress(
                            &mut self.decoders.gps_time,
                            multi.wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                            context,
                        )?;
                    } else if multi == GPS_TIME_MULTI {
                        gps_time_diff = the_context.ic_gps_time.decompress(
                            &mut self.decoders.gps_time,
                            GPS_TIME_MULTI
                                .wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                            4,
                        )?;
                        the_context.multi_extreme_counters[the_context.last] += 1;
                        if the_context.multi_extreme_counters[the_context.last] > 3 {
                            the_context.last_gps_diffs[the_context.last] = gps_time_diff;
                            the_context.multi_extreme_counters[the_context.last] = 0;
                        }
                    } else {
                        multi = GPS_TIME_MULTI - multi;
                        if multi > GPS_TIME_MULTI_MINUS {
                            gps_time_diff = the_context.ic_gps_time.decompress(
                                &mut self.decoders.gps_time,
                                multi.wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                                5,
                            )?;
                        } else {
                            gps_time_diff = the_context.ic_gps_time.decompress(
                                &mut self.decoders.gps_time,
                                GPS_TIME_MULTI_MINUS
                                    .wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                                6,
                            )?;
                            the_context.multi_extreme_counters[the_context.last] += 1;
                            if the_context.multi_extreme_counters[the_context.last] > 3 {
                                the_context.last_gps_diffs[the_context.last] = gps_time_diff;
                                the_context.multi_extreme_counters[the_context.last] = 0;
                            }
                        }
                    }
                    the_context.last_gps_times[the_context.last].value = the_context.last_gps_times
                        [the_context.last]
                        .value
                        .wrapping_add(i64::from(gps_time_diff));
                } else if multi == GPS_TIME_MULTI_CODE_FULL {
                    the_context.next = (the_context.next + 1) & 3;
                    let last_value = the_context.last_gps_times[the_context.last].value;
                    let mut value = i64::from(the_context.ic_gps_time.decompress(
                        &mut self.decoders.gps_time,
                        (last_value >> 32) as i32,
                        8,
                    )?);
                    value <<= 32;
                    value |= i64::from(self.decoders.gps_time.read_int()?);
                    the_context.last_gps_times[the_context.next].value = value;
                    the_context.last = the_context.next;
                    the_context.last_gps_diffs[the_context.last] = 0;
                    the_context.multi_extreme_counters[the_context.last] = 0;
                } else {
                    the_context.last = (the_context.last + multi as usize
                        - GPS_TIME_MULTI_CODE_FULL as usize)
                        & 3;
                    self.read_gps_time()?;
                }
            }
            Ok(())
        }
    }

    impl<R: Read + Seek> LayeredFieldDecompressor<R> for ExtendedDecompressor {
        fn size_of_field(&self) -> usize {
            ExtendedPoint::SIZE
        }

        fn init_first_point(
            &mut self,
            src: &mut R,
            first_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            let point = read_and_unpack::<_, ExtendedPoint>(src, first_point)?;

            for channel_context in &mut self.contexts {
                channel_context.unused = true;
            }

            self.current_context = usize::from(point.scanner_channel());
            *context = self.current_context;

            self.contexts[self.current_context] = DecompressionContext::from_last_point(&point);
            Ok(())
        }

        fn decompress_field_with(
            &mut self,
            current_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            let changed_values = {
                let the_context = &mut self.contexts[self.current_context];
                let last_point = &the_context.last_point;
                // last point return context: first / last / gps change
                let mut lpr = (last_point.return_number() == 1) as usize;
                lpr += if last_point.return_number() >= last_point.number_of_returns() {
                    2
                } else {
                    0
                };
                lpr += if last_point.gps_time_change { 4 } else { 0 };

                self.decoders
                    .channel_returns_xy
                    .decode_symbol(&mut the_context.changed_values_models[lpr])?
            };

            if changed_values & (1 << 6) != 0 {
                let diff = self.decoders.channel_returns_xy.decode_symbol(
                    &mut self.contexts[self.current_context].scanner_channel_model,
                )?;
                let scanner_channel = (self.current_context + diff as usize + 1) % 4;

                if self.contexts[scanner_channel].unused {
                    self.contexts[scanner_channel] = DecompressionContext::from_last_point(
                        &self.contexts[self.current_context].last_point,
                    );
                }
                self.current_context = scanner_channel;
            }
            *context = self.current_context;

            let point_source_changed = changed_values & (1 << 5) != 0;
            let gps_time_changed = changed_values & (1 << 4) != 0;
            let scan_angle_changed = changed_values & (1 << 3) != 0;

            {
                let the_context = &mut self.contexts[self.current_context];
                let last_point = &mut the_context.last_point;
                last_point.set_scanner_channel(self.current_context as u8);

                let last_n = last_point.number_of_returns();
                let last_r = last_point.return_number();

                let n = if changed_values & (1 << 2) != 0 {
                    self.decoders.channel_returns_xy.decode_symbol(lazy_model(
                        &mut the_context.number_of_returns_models,
                        usize::from(last_n),
                        16,
                    ))?
                } else {
                    u32::from(last_n)
                };
                last_point.set_number_of_returns(n as u8);

                let r: u32 = match changed_values & 3 {
                    0 => u32::from(last_r),
                    1 => u32::from((last_r + 1) % 16),
                    2 => u32::from((last_r + 15) % 16),
                    _ => {
                        if gps_time_changed {
                            self.decoders.channel_returns_xy.decode_symbol(lazy_model(
                                &mut the_context.return_number_models,
                                usize::from(last_r),
                                16,
                            ))?
                        } else {
                            let sym = self
                                .decoders
                                .channel_returns_xy
                                .decode_symbol(&mut the_context.return_number_gps_same_model)?;
                            (u32::from(last_r) + sym + 2) % 16
                        }
                    }
                };
                last_point.set_return_number(r as u8);

                let m = usize::from(RETURN_MAP_6CTX[n as usize][r as usize]);
                let l = usize::from(RETURN_LEVEL_8CTX[n as usize][r as usize]);

                // current point return context: first / last
                let mut cpr = if r == 1 { 2u32 } else { 0 };
                cpr += (r >= n) as u32;

                let median_idx = (m << 1) | gps_time_changed as usize;

                let median = the_context.last_x_diff_median5[median_idx].get();
                let diff = the_context.ic_dx.decompress(
                    &mut self.decoders.channel_returns_xy,
                    median,
                    (n == 1) as u32,
                )?;
                last_point.x = last_point.x.wrapping_add(diff);
                the_context.last_x_diff_median5[median_idx].add(diff);

                let median = the_context.last_y_diff_median5[median_idx].get();
                let k_bits = the_context.ic_dx.k();
                let mut dy_context = (n == 1) as u32;
                dy_context += if k_bits < 20 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    20
                };
                let diff = the_context.ic_dy.decompress(
                    &mut self.decoders.channel_returns_xy,
                    median,
                    dy_context,
                )?;
                last_point.y = last_point.y.wrapping_add(diff);
                the_context.last_y_diff_median5[median_idx].add(diff);

                if self.changed_z {
                    let k_bits = (the_context.ic_dx.k() + the_context.ic_dy.k()) / 2;
                    let mut z_context = (n == 1) as u32;
                    z_context += if k_bits < 18 {
                        u32_zero_lowest_bit(k_bits)
                    } else {
                        18
                    };
                    last_point.z = the_context.ic_z.decompress(
                        &mut self.decoders.z,
                        the_context.last_z[l],
                        z_context,
                    )?;
                    the_context.last_z[l] = last_point.z;
                }

                if self.changed_classification {
                    let ccc = usize::from((last_point.classification & 0x1F) << 1)
                        + (cpr == 3) as usize;
                    last_point.classification = self.decoders.classification.decode_symbol(
                        lazy_model(&mut the_context.classification_models, ccc, 256),
                    )? as u8;
                }

                if self.changed_flags {
                    let last_flags = flags_symbol(last_point) as usize;
                    let flags = self.decoders.flags.decode_symbol(lazy_model(
                        &mut the_context.flags_models,
                        last_flags,
                        64,
                    ))?;
                    last_point.flags = ((flags >> 5 & 1) << 7
                        | (flags >> 4 & 1) << 6
                        | u32::from(last_point.scanner_channel()) << 4
                        | (flags & 0b0000_1111)) as u8;
                }

                if self.changed_intensity {
                    let idx = (cpr << 1 | gps_time_changed as u32) as usize;
                    last_point.intensity = the_context.ic_intensity.decompress(
                        &mut self.decoders.intensity,
                        i32::from(the_context.last_intensities[idx]),
                        cpr,
                    )? as u16;
                    the_context.last_intensities[idx] = last_point.intensity;
                }

                if self.changed_scan_angle && scan_angle_changed {
                    last_point.scan_angle = the_context.ic_scan_angle.decompress(
                        &mut self.decoders.scan_angle,
                        i32::from(last_point.scan_angle),
                        gps_time_changed as u32,
                    )? as u16;
                }

                if self.changed_user_data {
                    let user_data = self.decoders.user_data.decode_symbol(lazy_model(
                        &mut the_context.user_data_models,
                        usize::from(last_point.user_data / 4),
                        256,
                    ))?;
                    last_point.user_data = user_data as u8;
                }

                if self.changed_point_source && point_source_changed {
                    last_point.point_source_id = the_context.ic_point_source_id.decompress(
                        &mut self.decoders.point_source,
                        i32::from(last_point.point_source_id),
                        0,
                    )? as u16;
                }
                last_point.gps_time_change = gps_time_changed;
            }

            if self.changed_gps_time && gps_time_changed {
                self.read_gps_time()?;
                let gps = &self.contexts[self.current_context].gps;
                let value = gps.last_gps_times[gps.last];
                self.contexts[self.current_context].last_point.gps_time = value;
            }

            self.contexts[self.current_context]
                .last_point
                .pack_into(current_point);
            Ok(())
        }

        fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()> {
            self.layer_sizes = LayerSizes::read_from(src)?;
            Ok(())
        }

        fn read_layers(&mut self, src: &mut R) -> std::io::Result<()> {
            let sizes = self.layer_sizes;

            // channel, returns, x and y always decode
            copy_bytes_into_decoder(
                true,
                sizes.channel_returns_xy,
                &mut self.decoders.channel_returns_xy,
                src,
            )?;
            self.changed_z =
                copy_bytes_into_decoder(self.selector.z_requested(), sizes.z, &mut self.decoders.z, src)?;
            self.changed_classification = copy_bytes_into_decoder(
                self.selector.classification_requested(),
                sizes.classification,
                &mut self.decoders.classification,
                src,
            )?;
            self.changed_flags = copy_bytes_into_decoder(
                self.selector.flags_requested(),
                sizes.flags,
                &mut self.decoders.flags,
                src,
            )?;
            self.changed_intensity = copy_bytes_into_decoder(
                self.selector.intensity_requested(),
                sizes.intensity,
                &mut self.decoders.intensity,
                src,
            )?;
            self.changed_scan_angle = copy_bytes_into_decoder(
                self.selector.scan_angle_requested(),
                sizes.scan_angle,
                &mut self.decoders.scan_angle,
                src,
            )?;
            self.changed_user_data = copy_bytes_into_decoder(
                self.selector.user_data_requested(),
                sizes.user_data,
                &mut self.decoders.user_data,
                src,
            )?;
            self.changed_point_source = copy_bytes_into_decoder(
                self.selector.point_source_requested(),
                sizes.point_source,
                &mut self.decoders.point_source,
                src,
            )?;
            self.changed_gps_time = copy_bytes_into_decoder(
                self.selector.gps_time_requested(),
                sizes.gps_time,
                &mut self.decoders.gps_time,
                src,
            )?;
            Ok(())
        }
    }

    pub struct ExtendedCompressor {
        encoders: LayerEncoders,

        changed_z: bool,
        changed_classification: bool,
        changed_flags: bool,
        changed_intensity: bool,
        changed_scan_angle: bool,
        changed_user_data: bool,
        changed_point_source: bool,
        changed_gps_time: bool,

        current_context: usize,
        contexts: [CompressionContext; 4],
    }

    impl ExtendedCompressor {
        pub fn new() -> Self {
            let point = ExtendedPoint::default();
            Self {
                encoders: LayerEncoders::default(),
                changed_z: false,
                changed_classification: false,
                changed_flags: false,
                changed_intensity: false,
                changed_scan_angle: false,
                changed_user_data: false,
                changed_point_source: false,
                changed_gps_time: false,
                current_context: 0,
                contexts: [
                    CompressionContext::from_last_point(&point),
                    CompressionContext::from_last_point(&point),
                    CompressionContext::from_last_point(&point),
                    CompressionContext::from_last_point(&point),
                ],
            }
        }

        fn write_gps_time(&mut self, current: GpsTime) -> std::io::Result<()> {
            let the_context = &mut self.contexts[self.current_context].gps;

            if the_context.last_gps_diffs[the_context.last] == 0 {
                let diff_64 = current
                    .value
                    .wrapping_sub(the_context.last_gps_times[the_context.last].value);
                if diff_64 == i64::from(diff_64 as i32) {
                    // difference fits in 32 bits
                    self.encoders
                        .gps_time
                        .encode_symbol(&mut the_context.no_diff_model, 0)?;
                    the_context.ic_gps_time.compress(
                        &mut self.encoders.gps_time,
                        0,
                        diff_64 as i32,
                        0,
                    )?;
                    the_context.last_gps_diffs[the_context.last] = diff_64 as i32;
                    the_context.multi_extreme_counters[the_context.last] = 0;
                    the_context.last_gps_times[the_context.last] = current;
                } else {
                    // maybe the value belongs to another sequence
                    for i in 1..4 {
                        let other_diff_64 = current.value.wrapping_sub(
                            the_context.last_gps_times[(the_context.last + i) & 3].value,
                        );
                        if other_diff_64 == i64::from(other_diff_64 as i32) {
                            self.encoders
                                .gps_time
                                .encode_symbol(&mut the_context.no_diff_model, (i + 1) as u32)?;
                            the_context.last = (the_context.last + i) & 3;
                            return self.write_gps_time(current);
                        }
                    }
                    // no luck, start a new sequence
                    self.encoders
                        .gps_time
                        .encode_symbol(&mut the_context.no_diff_model, 1)?;
                    the_context.ic_gps_time.compress(
                        &mut self.encoders.gps_time,
                        (the_context.last_gps_times[the_context.last].value >> 32) as i32,
                        (current.value >> 32) as i32,
                        8,
                    )?;
                    self.encoders.gps_time.write_int(current.value as u32)?;
                    the_context.next = (the_context.next + 1) & 3;
                    the_context.last = the_context.next;
                    the_context.last_gps_diffs[the_context.last] = 0;
                    the_context.multi_extreme_counters[the_context.last] = 0;
                    the_context.last_gps_times[the_context.last] = current;
                }
            } else {
                let diff_64 = current
                    .value
                    .wrapping_sub(the_context.last_gps_times[the_context.last].value);
                if diff_64 == i64::from(diff_64 as i32) {
                    let diff = diff_64 as i32;
                    let multi = i32_quantize(
                        diff as f32 / the_context.last_gps_diffs[the_context.last] as f32,
                    );

                    if multi == 1 {
                        self.encoders
                            .gps_time
                            .encode_symbol(&mut the_context.multi_model, 1)?;
                        the_context.ic_gps_time.compress(
                            &mut self.encoders.gps_time,
                            the_context.last_gps_diffs[the_context.last],
                            diff,
                            1,
                        )?;
                        the_context.multi_extreme_counters[the_context.last] = 0;
                    } else if multi > 0 {
                        if multi < GPS_TIME_MULTI {
                            self.encoders
                                .gps_time
                                .encode_symbol(&mut the_context.multi_model, multi as u32)?;
                            let context = if multi < 10 { 2 } else { 3 };
                            the_context.ic_gps_time.compress(
                                &mut self.encoders.gps_time,
                                multi.wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                                diff,
                                context,
                            )?;
                        } else {
                            self.encoders.gps_time.encode_symbol(
                                &mut the_context.multi_model,
                                GPS_TIME_MULTI as u32,
                            )?;
                            the_context.ic_gps_time.compress(
                                &mut self.encoders.gps_time,
                                GPS_TIME_MULTI
                                    .wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                                diff,
                                4,
                            )?;
                            the_context.multi_extreme_counters[the_context.last] += 1;
                            if the_context.multi_extreme_counters[the_context.last] > 3 {
                                the_context.last_gps_diffs[the_context.last] = diff;
                                the_context.multi_extreme_counters[the_context.last] = 0;
                            }
                        }
                    } else if multi < 0 {
                        if multi > GPS_TIME_MULTI_MINUS {
                            self.encoders.gps_time.encode_symbol(
                                &mut the_context.multi_model,
                                (GPS_TIME_MULTI - multi) as u32,
                            )?;
                            the_context.ic_gps_time.compress(
                                &mut self.encoders.gps_time,
                                multi.wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                                diff,
                                5,
                            )?;
                        } else {
                            self.encoders.gps_time.encode_symbol(
                                &mut the_context.multi_model,
                                (GPS_TIME_MULTI - GPS_TIME_MULTI_MINUS) as u32,
                            )?;
                            the_context.ic_gps_time.compress(
                                &mut self.encoders.gps_time,
                                GPS_TIME_MULTI_MINUS
                                    .wrapping_mul(the_context.last_gps_diffs[the_context.last]),
                                diff,
                                6,
                            )?;
                            the_context.multi_extreme_counters[the_context.last] += 1;
                            if the_context.multi_extreme_counters[the_context.last] > 3 {
                                the_context.last_gps_diffs[the_context.last] = diff;
                                the_context.multi_extreme_counters[the_context.last] = 0;
                            }
                        }
                    } else {
                        self.encoders
                            .gps_time
                            .encode_symbol(&mut the_context.multi_model, 0)?;
                        the_context.ic_gps_time.compress(
                            &mut self.encoders.gps_time,
                            0,
                            diff,
                            7,
                        )?;
                        the_context.multi_extreme_counters[the_context.last] += 1;
                        if the_context.multi_extreme_counters[the_context.last] > 3 {
                            the_context.last_gps_diffs[the_context.last] = diff;
                            the_context.multi_extreme_counters[the_context.last] = 0;
                        }
                    }
                    the_context.last_gps_times[the_context.last].value = the_context.last_gps_times
                        [the_context.last]
                        .value
                        .wrapping_add(i64::from(diff));
                } else {
                    for i in 1..4 {
                        let other_diff_64 = current.value.wrapping_sub(
                            the_context.last_gps_times[(the_context.last + i) & 3].value,
                        );
                        if other_diff_64 == i64::from(other_diff_64 as i32) {
                            self.encoders.gps_time.encode_symbol(
                                &mut the_context.multi_model,
                                (GPS_TIME_MULTI_CODE_FULL + i as i32) as u32,
                            )?;
                            the_context.last = (the_context.last + i) & 3;
                            return self.write_gps_time(current);
                        }
                    }
                    self.encoders.gps_time.encode_symbol(
                        &mut the_context.multi_model,
                        GPS_TIME_MULTI_CODE_FULL as u32,
                    )?;
                    the_context.ic_gps_time.compress(
                        &mut self.encoders.gps_time,
                        (the_context.last_gps_times[the_context.last].value >> 32) as i32,
                        (current.value >> 32) as i32,
                        8,
                    )?;
                    self.encoders.gps_time.write_int(current.value as u32)?;
                    the_context.next = (the_context.next + 1) & 3;
                    the_context.last = the_context.next;
                    the_context.last_gps_diffs[the_context.last] = 0;
                    the_context.multi_extreme_counters[the_context.last] = 0;
                    the_context.last_gps_times[the_context.last] = current;
                }
            }
            Ok(())
        }
    }

    impl<W: Write> LayeredFieldCompressor<W> for ExtendedCompressor {
        fn size_of_field(&self) -> usize {
            ExtendedPoint::SIZE
        }

        fn init_first_point(
            &mut self,
            dst: &mut W,
            first_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            dst.write_all(first_point)?;
            let point = ExtendedPoint::unpack_from(first_point);

            for channel_context in &mut self.contexts {
                channel_context.unused = true;
            }

            self.current_context = usize::from(point.scanner_channel());
            *context = self.current_context;

            self.contexts[self.current_context] = CompressionContext::from_last_point(&point);
            Ok(())
        }

        fn compress_field_with(&mut self, buf: &[u8], context: &mut usize) -> std::io::Result<()> {
            let current = ExtendedPoint::unpack_from(buf);
            let scanner_channel = usize::from(current.scanner_channel());
            let channel_changed = scanner_channel != self.current_context;

            // the decoder differences against the target channel's last
            // point when that channel was already started, otherwise the
            // target gets seeded from the channel we come from
            let reference_context =
                if channel_changed && !self.contexts[scanner_channel].unused {
                    scanner_channel
                } else {
                    self.current_context
                };

            let reference = self.contexts[reference_context].last_point;
            let point_source_changed = current.point_source_id != reference.point_source_id;
            let gps_time_changed = current.gps_time != reference.gps_time;
            let scan_angle_changed = current.scan_angle != reference.scan_angle;
            let n_changed = current.number_of_returns() != reference.number_of_returns();
            let last_r = reference.return_number();
            let r = current.return_number();
            let return_code: u8 = if r == last_r {
                0
            } else if r == (last_r + 1) % 16 {
                1
            } else if r == (last_r + 15) % 16 {
                2
            } else {
                3
            };

            let changed_values = (channel_changed as u32) << 6
                | (point_source_changed as u32) << 5
                | (gps_time_changed as u32) << 4
                | (scan_angle_changed as u32) << 3
                | (n_changed as u32) << 2
                | u32::from(return_code);

            {
                let the_context = &mut self.contexts[self.current_context];
                let last_point = &the_context.last_point;
                let mut lpr = (last_point.return_number() == 1) as usize;
                lpr += if last_point.return_number() >= last_point.number_of_returns() {
                    2
                } else {
                    0
                };
                lpr += if last_point.gps_time_change { 4 } else { 0 };

                self.encoders
                    .channel_returns_xy
                    .encode_symbol(&mut the_context.changed_values_models[lpr], changed_values)?;
            }

            if channel_changed {
                let diff = (scanner_channel + 4 - self.current_context - 1) % 4;
                self.encoders.channel_returns_xy.encode_symbol(
                    &mut self.contexts[self.current_context].scanner_channel_model,
                    diff as u32,
                )?;
                if self.contexts[scanner_channel].unused {
                    self.contexts[scanner_channel] = CompressionContext::from_last_point(
                        &self.contexts[self.current_context].last_point,
                    );
                }
                self.current_context = scanner_channel;
            }
            *context = self.current_context;

            {
                let the_context = &mut self.contexts[self.current_context];
                let last_point = &mut the_context.last_point;
                last_point.set_scanner_channel(self.current_context as u8);

                let last_n = last_point.number_of_returns();
                let last_r = last_point.return_number();
                let n = current.number_of_returns();

                if n_changed {
                    self.encoders.channel_returns_xy.encode_symbol(
                        lazy_model(
                            &mut the_context.number_of_returns_models,
                            usize::from(last_n),
                            16,
                        ),
                        u32::from(n),
                    )?;
                }
                last_point.set_number_of_returns(n);

                if return_code == 3 {
                    if gps_time_changed {
                        self.encoders.channel_returns_xy.encode_symbol(
                            lazy_model(
                                &mut the_context.return_number_models,
                                usize::from(last_r),
                                16,
                            ),
                            u32::from(r),
                        )?;
                    } else {
                        let sym = (u32::from(r) + 16 - u32::from(last_r) - 2) % 16;
                        self.encoders
                            .channel_returns_xy
                            .encode_symbol(&mut the_context.return_number_gps_same_model, sym)?;
                    }
                }
                last_point.set_return_number(r);

                let m = usize::from(RETURN_MAP_6CTX[usize::from(n)][usize::from(r)]);
                let l = usize::from(RETURN_LEVEL_8CTX[usize::from(n)][usize::from(r)]);

                let mut cpr = if r == 1 { 2u32 } else { 0 };
                cpr += (r >= n) as u32;

                let median_idx = (m << 1) | gps_time_changed as usize;

                let median = the_context.last_x_diff_median5[median_idx].get();
                let diff = current.x.wrapping_sub(last_point.x);
                the_context.ic_dx.compress(
                    &mut self.encoders.channel_returns_xy,
                    median,
                    diff,
                    (n == 1) as u32,
                )?;
                the_context.last_x_diff_median5[median_idx].add(diff);
                last_point.x = current.x;

                let median = the_context.last_y_diff_median5[median_idx].get();
                let k_bits = the_context.ic_dx.k();
                let mut dy_context = (n == 1) as u32;
                dy_context += if k_bits < 20 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    20
                };
                let diff = current.y.wrapping_sub(last_point.y);
                the_context.ic_dy.compress(
                    &mut self.encoders.channel_returns_xy,
                    median,
                    diff,
                    dy_context,
                )?;
                the_context.last_y_diff_median5[median_idx].add(diff);
                last_point.y = current.y;

                // z
                if current.z != last_point.z {
                    self.changed_z = true;
                }
                let k_bits = (the_context.ic_dx.k() + the_context.ic_dy.k()) / 2;
                let mut z_context = (n == 1) as u32;
                z_context += if k_bits < 18 {
                    u32_zero_lowest_bit(k_bits)
                } else {
                    18
                };
                the_context.ic_z.compress(
                    &mut self.encoders.z,
                    the_context.last_z[l],
                    current.z,
                    z_context,
                )?;
                the_context.last_z[l] = current.z;
                last_point.z = current.z;

                // classification
                if current.classification != last_point.classification {
                    self.changed_classification = true;
                }
                let ccc =
                    usize::from((last_point.classification & 0x1F) << 1) + (cpr == 3) as usize;
                self.encoders.classification.encode_symbol(
                    lazy_model(&mut the_context.classification_models, ccc, 256),
                    u32::from(current.classification),
                )?;
                last_point.classification = current.classification;

                // flags, without the scanner channel bits
                let current_flags = flags_symbol(&current);
                let last_flags = flags_symbol(last_point);
                if current_flags != last_flags {
                    self.changed_flags = true;
                }
                self.encoders.flags.encode_symbol(
                    lazy_model(&mut the_context.flags_models, last_flags as usize, 64),
                    current_flags,
                )?;
                last_point.flags = current.flags;
                last_point.set_scanner_channel(self.current_context as u8);

                // intensity
                if current.intensity != last_point.intensity {
                    self.changed_intensity = true;
                }
                let idx = (cpr << 1 | gps_time_changed as u32) as usize;
                the_context.ic_intensity.compress(
                    &mut self.encoders.intensity,
                    i32::from(the_context.last_intensities[idx]),
                    i32::from(current.intensity),
                    cpr,
                )?;
                the_context.last_intensities[idx] = current.intensity;
                last_point.intensity = current.intensity;

                if scan_angle_changed {
                    self.changed_scan_angle = true;
                    the_context.ic_scan_angle.compress(
                        &mut self.encoders.scan_angle,
                        i32::from(last_point.scan_angle),
                        i32::from(current.scan_angle),
                        gps_time_changed as u32,
                    )?;
                    last_point.scan_angle = current.scan_angle;
                }

                // user data
                if current.user_data != last_point.user_data {
                    self.changed_user_data = true;
                }
                self.encoders.user_data.encode_symbol(
                    lazy_model(
                        &mut the_context.user_data_models,
                        usize::from(last_point.user_data / 4),
                        256,
                    ),
                    u32::from(current.user_data),
                )?;
                last_point.user_data = current.user_data;

                if point_source_changed {
                    self.changed_point_source = true;
                    the_context.ic_point_source_id.compress(
                        &mut self.encoders.point_source,
                        i32::from(last_point.point_source_id),
                        i32::from(current.point_source_id),
                        0,
                    )?;
                    last_point.point_source_id = current.point_source_id;
                }
                last_point.gps_time_change = gps_time_changed;
            }

            if gps_time_changed {
                self.changed_gps_time = true;
                self.write_gps_time(current.gps_time)?;
                self.contexts[self.current_context].last_point.gps_time = current.gps_time;
            }
            Ok(())
        }

        fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()> {
            fn size_of<W2: Write>(
                dst: &mut W2,
                encoder: &mut RangeEncoder<Cursor<Vec<u8>>>,
                changed: bool,
            ) -> std::io::Result<()> {
                if changed {
                    encoder.done()?;
                    dst.write_u32::<LittleEndian>(inner_buffer_len_of(encoder) as u32)
                } else {
                    dst.write_u32::<LittleEndian>(0)
                }
            }

            self.encoders.channel_returns_xy.done()?;
            dst.write_u32::<LittleEndian>(
                inner_buffer_len_of(&self.encoders.channel_returns_xy) as u32
            )?;
            size_of(dst, &mut self.encoders.z, self.changed_z)?;
            size_of(
                dst,
                &mut self.encoders.classification,
                self.changed_classification,
            )?;
            size_of(dst, &mut self.encoders.flags, self.changed_flags)?;
            size_of(dst, &mut self.encoders.intensity, self.changed_intensity)?;
            size_of(dst, &mut self.encoders.scan_angle, self.changed_scan_angle)?;
            size_of(dst, &mut self.encoders.user_data, self.changed_user_data)?;
            size_of(
                dst,
                &mut self.encoders.point_source,
                self.changed_point_source,
            )?;
            size_of(dst, &mut self.encoders.gps_time, self.changed_gps_time)?;
            Ok(())
        }

        fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()> {
            copy_encoder_content_to(&mut self.encoders.channel_returns_xy, dst)?;
            if self.changed_z {
                copy_encoder_content_to(&mut self.encoders.z, dst)?;
            }
            if self.changed_classification {
                copy_encoder_content_to(&mut self.encoders.classification, dst)?;
            }
            if self.changed_flags {
                copy_encoder_content_to(&mut self.encoders.flags, dst)?;
            }
            if self.changed_intensity {
                copy_encoder_content_to(&mut self.encoders.intensity, dst)?;
            }
            if self.changed_scan_angle {
                copy_encoder_content_to(&mut self.encoders.scan_angle, dst)?;
            }
            if self.changed_user_data {
                copy_encoder_content_to(&mut self.encoders.user_data, dst)?;
            }
            if self.changed_point_source {
                copy_encoder_content_to(&mut self.encoders.point_source, dst)?;
            }
            if self.changed_gps_time {
                copy_encoder_content_to(&mut self.encoders.gps_time, dst)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_field_accessors() {
        let mut p = ExtendedPoint::default();
        p.set_number_of_returns(1);
        p.set_return_number(1);
        assert_eq!(p.bit_fields, 17);

        p.set_number_of_returns(2);
        assert_eq!(p.number_of_returns(), 2);
        assert_eq!(p.return_number(), 1);
        assert_eq!(p.bit_fields, 33);

        p.set_scanner_channel(3);
        assert_eq!(p.scanner_channel(), 3);
        assert!(!p.scan_direction_flag());
        assert!(!p.edge_of_flight_line());
    }

    #[test]
    fn record_pack_unpack() {
        let mut p = ExtendedPoint::default();
        p.x = -20_501;
        p.y = 42;
        p.z = 1_001;
        p.intensity = 1_234;
        p.set_return_number(7);
        p.set_number_of_returns(10);
        p.set_scanner_channel(2);
        p.classification = 65;
        p.user_data = 9;
        p.scan_angle = 15_000;
        p.point_source_id = 17;
        p.gps_time = GpsTime::from(123.456_f64);

        let mut buf = [0u8; ExtendedPoint::SIZE];
        p.pack_into(&mut buf);
        assert_eq!(ExtendedPoint::unpack_from(&buf), p);
    }
}

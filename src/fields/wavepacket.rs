//! Waveform packet descriptor codec.

use crate::packing::Packable;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct WavePacket {
    pub descriptor_index: u8,
    // offset in bytes to the waveform data
    pub offset: u64,
    // in bytes
    pub size: u32,
    pub return_point: f32,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

impl WavePacket {
    pub const SIZE: usize = 29;
}

impl Packable for WavePacket {
    fn unpack_from(input: &[u8]) -> Self {
        Self {
            descriptor_index: input[0],
            offset: u64::unpack_from(&input[1..9]),
            size: u32::unpack_from(&input[9..13]),
            return_point: f32::unpack_from(&input[13..17]),
            dx: f32::unpack_from(&input[17..21]),
            dy: f32::unpack_from(&input[21..25]),
            dz: f32::unpack_from(&input[25..29]),
        }
    }

    fn pack_into(&self, output: &mut [u8]) {
        output[0] = self.descriptor_index;
        self.offset.pack_into(&mut output[1..9]);
        self.size.pack_into(&mut output[9..13]);
        self.return_point.pack_into(&mut output[13..17]);
        self.dx.pack_into(&mut output[17..21]);
        self.dy.pack_into(&mut output[21..25]);
        self.dz.pack_into(&mut output[25..29]);
    }
}

pub mod v1 {
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::{read_and_unpack, Packable};
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::WavePacket;

    const DX_CONTEXT: u32 = 0;
    const DY_CONTEXT: u32 = 1;
    const DZ_CONTEXT: u32 = 2;

    pub struct WavePacketDecompressor {
        last: WavePacket,
        last_offset_diff: i32,
        last_sym_offset_diff: u32,

        packet_index_model: SymbolModel,
        offset_diff_models: [SymbolModel; 4],

        ic_offset_diff: IntDecompressor,
        ic_packet_size: IntDecompressor,
        ic_return_point: IntDecompressor,
        ic_xyz: IntDecompressor,
    }

    impl WavePacketDecompressor {
        pub fn new() -> Self {
            Self {
                last: WavePacket::default(),
                last_offset_diff: 0,
                last_sym_offset_diff: 0,
                packet_index_model: SymbolModel::new(256),
                offset_diff_models: [
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                ],
                ic_offset_diff: IntDecompressor::initialized(32, 1),
                ic_packet_size: IntDecompressor::initialized(32, 1),
                ic_return_point: IntDecompressor::initialized(32, 1),
                // dx, dy and dz share the models, one context each
                ic_xyz: IntDecompressor::initialized(32, 3),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for WavePacketDecompressor {
        fn size_of_field(&self) -> usize {
            WavePacket::SIZE
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            self.last = read_and_unpack::<_, WavePacket>(src, first_point)?;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let mut current = WavePacket::default();

            current.descriptor_index = decoder.decode_symbol(&mut self.packet_index_model)? as u8;

            self.last_sym_offset_diff = decoder
                .decode_symbol(&mut self.offset_diff_models[self.last_sym_offset_diff as usize])?;

            match self.last_sym_offset_diff {
                0 => {
                    current.offset = self.last.offset;
                }
                1 => {
                    current.offset = self.last.offset.wrapping_add(u64::from(self.last.size));
                }
                2 => {
                    self.last_offset_diff =
                        self.ic_offset_diff
                            .decompress(decoder, self.last_offset_diff, 0)?;
                    current.offset = self
                        .last
                        .offset
                        .wrapping_add(self.last_offset_diff as u64);
                }
                _ => {
                    current.offset = decoder.read_int64()?;
                }
            }

            current.size =
                self.ic_packet_size
                    .decompress(decoder, self.last.size as i32, 0)? as u32;

            let pred = self.last.return_point.to_bits() as i32;
            current.return_point =
                f32::from_bits(self.ic_return_point.decompress(decoder, pred, 0)? as u32);

            let pred = self.last.dx.to_bits() as i32;
            current.dx = f32::from_bits(self.ic_xyz.decompress(decoder, pred, DX_CONTEXT)? as u32);

            let pred = self.last.dy.to_bits() as i32;
            current.dy = f32::from_bits(self.ic_xyz.decompress(decoder, pred, DY_CONTEXT)? as u32);

            let pred = self.last.dz.to_bits() as i32;
            current.dz = f32::from_bits(self.ic_xyz.decompress(decoder, pred, DZ_CONTEXT)? as u32);

            current.pack_into(buf);
            self.last = current;
            Ok(())
        }
    }

    pub struct WavePacketCompressor {
        last: WavePacket,
        last_offset_diff: i32,
        last_sym_offset_diff: u32,

        packet_index_model: SymbolModel,
        offset_diff_models: [SymbolModel; 4],

        ic_offset_diff: IntCompressor,
        ic_packet_size: IntCompressor,
        ic_return_point: IntCompressor,
        ic_xyz: IntCompressor,
    }

    impl WavePacketCompressor {
        pub fn new() -> Self {
            Self {
                last: WavePacket::default(),
                last_offset_diff: 0,
                last_sym_offset_diff: 0,
                packet_index_model: SymbolModel::new(256),
                offset_diff_models: [
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                ],
                ic_offset_diff: IntCompressor::initialized(32, 1),
                ic_packet_size: IntCompressor::initialized(32, 1),
                ic_return_point: IntCompressor::initialized(32, 1),
                ic_xyz: IntCompressor::initialized(32, 3),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for WavePacketCompressor {
        fn size_of_field(&self) -> usize {
            WavePacket::SIZE
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last = WavePacket::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = WavePacket::unpack_from(buf);
            encoder.encode_symbol(
                &mut self.packet_index_model,
                u32::from(current.descriptor_index),
            )?;

            let offset_diff_64 = current.offset.wrapping_sub(self.last.offset) as i64;
            let offset_diff_32 = offset_diff_64 as i32;

            if offset_diff_64 == i64::from(offset_diff_32) {
                let sym = if offset_diff_32 == 0 {
                    0
                } else if offset_diff_32 == self.last.size as i32 {
                    1
                } else {
                    2
                };
                encoder.encode_symbol(
                    &mut self.offset_diff_models[self.last_sym_offset_diff as usize],
                    sym,
                )?;
                if sym == 2 {
                    self.ic_offset_diff.compress(
                        encoder,
                        self.last_offset_diff,
                        offset_diff_32,
                        0,
                    )?;
                    self.last_offset_diff = offset_diff_32;
                }
                self.last_sym_offset_diff = sym;
            } else {
                encoder.encode_symbol(
                    &mut self.offset_diff_models[self.last_sym_offset_diff as usize],
                    3,
                )?;
                self.last_sym_offset_diff = 3;
                encoder.write_int64(current.offset)?;
            }

            self.ic_packet_size
                .compress(encoder, self.last.size as i32, current.size as i32, 0)?;

            self.ic_return_point.compress(
                encoder,
                self.last.return_point.to_bits() as i32,
                current.return_point.to_bits() as i32,
                0,
            )?;
            self.ic_xyz.compress(
                encoder,
                self.last.dx.to_bits() as i32,
                current.dx.to_bits() as i32,
                DX_CONTEXT,
            )?;
            self.ic_xyz.compress(
                encoder,
                self.last.dy.to_bits() as i32,
                current.dy.to_bits() as i32,
                DY_CONTEXT,
            )?;
            self.ic_xyz.compress(
                encoder,
                self.last.dz.to_bits() as i32,
                current.dz.to_bits() as i32,
                DZ_CONTEXT,
            )?;

            self.last = current;
            Ok(())
        }
    }
}

pub mod v3 {
    //! The pointwise modeling wrapped in scanner channel contexts, in
    //! its own layer.
    use std::io::{Cursor, Read, Seek, Write};

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::layers::{copy_bytes_into_decoder, copy_encoder_content_to, inner_buffer_len_of};
    use crate::layout::DecompressionSelector;
    use crate::packing::{read_and_unpack, Packable};
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{LayeredFieldCompressor, LayeredFieldDecompressor};

    use super::WavePacket;

    const DX_CONTEXT: u32 = 0;
    const DY_CONTEXT: u32 = 1;
    const DZ_CONTEXT: u32 = 2;

    struct DecompressionContext {
        unused: bool,
        last: WavePacket,
        last_offset_diff: i32,
        last_sym_offset_diff: u32,

        packet_index_model: SymbolModel,
        offset_diff_models: [SymbolModel; 4],

        ic_offset_diff: IntDecompressor,
        ic_packet_size: IntDecompressor,
        ic_return_point: IntDecompressor,
        ic_xyz: IntDecompressor,
    }

    impl DecompressionContext {
        fn from_last(last: WavePacket) -> Self {
            Self {
                unused: false,
                last,
                last_offset_diff: 0,
                last_sym_offset_diff: 0,
                packet_index_model: SymbolModel::new(256),
                offset_diff_models: [
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                ],
                ic_offset_diff: IntDecompressor::initialized(32, 1),
                ic_packet_size: IntDecompressor::initialized(32, 1),
                ic_return_point: IntDecompressor::initialized(32, 1),
                ic_xyz: IntDecompressor::initialized(32, 3),
            }
        }

        fn new() -> Self {
            Self::from_last(WavePacket::default())
        }
    }

    struct CompressionContext {
        unused: bool,
        last: WavePacket,
        last_offset_diff: i32,
        last_sym_offset_diff: u32,

        packet_index_model: SymbolModel,
        offset_diff_models: [SymbolModel; 4],

        ic_offset_diff: IntCompressor,
        ic_packet_size: IntCompressor,
        ic_return_point: IntCompressor,
        ic_xyz: IntCompressor,
    }

    impl CompressionContext {
        fn from_last(last: WavePacket) -> Self {
            Self {
                unused: false,
                last,
                last_offset_diff: 0,
                last_sym_offset_diff: 0,
                packet_index_model: SymbolModel::new(256),
                offset_diff_models: [
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                    SymbolModel::new(4),
                ],
                ic_offset_diff: IntCompressor::initialized(32, 1),
                ic_packet_size: IntCompressor::initialized(32, 1),
                ic_return_point: IntCompressor::initialized(32, 1),
                ic_xyz: IntCompressor::initialized(32, 3),
            }
        }

        fn new() -> Self {
            Self::from_last(WavePacket::default())
        }
    }

    pub struct WavePacketDecompressor {
        decoder: RangeDecoder<Cursor<Vec<u8>>>,
        changed_wave_packet: bool,
        requested_wave_packet: bool,
        layer_size: u32,
        last_context_used: usize,
        contexts: [DecompressionContext; 4],
    }

    impl WavePacketDecompressor {
        pub fn new() -> Self {
            Self::selective(DecompressionSelector::all())
        }

        pub fn selective(selector: DecompressionSelector) -> Self {
            Self {
                decoder: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                changed_wave_packet: false,
                requested_wave_packet: selector.wave_packet_requested(),
                layer_size: 0,
                last_context_used: 0,
                contexts: [
                    DecompressionContext::new(),
                    DecompressionContext::new(),
                    DecompressionContext::new(),
                    DecompressionContext::new(),
                ],
            }
        }
    }

    impl<R: Read + Seek> LayeredFieldDecompressor<R> for WavePacketDecompressor {
        fn size_of_field(&self) -> usize {
            WavePacket::SIZE
        }

        fn init_first_point(
            &mut self,
            src: &mut R,
            first_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for wave_context in &mut self.contexts {
                wave_context.unused = true;
            }
            let first = read_and_unpack::<_, WavePacket>(src, first_point)?;
            self.contexts[*context] = DecompressionContext::from_last(first);
            self.last_context_used = *context;
            Ok(())
        }

        fn decompress_field_with(
            &mut self,
            current_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            if self.last_context_used != *context {
                if self.contexts[*context].unused {
                    let last = self.contexts[self.last_context_used].last;
                    self.contexts[*context] = DecompressionContext::from_last(last);
                }
                self.last_context_used = *context;
            }

            let the_context = &mut self.contexts[*context];
            if !self.changed_wave_packet {
                the_context.last.pack_into(current_point);
                return Ok(());
            }

            let mut current = WavePacket::default();

            current.descriptor_index = self
                .decoder
                .decode_symbol(&mut the_context.packet_index_model)?
                as u8;

            the_context.last_sym_offset_diff = self.decoder.decode_symbol(
                &mut the_context.offset_diff_models[the_context.last_sym_offset_diff as usize],
            )?;

            match the_context.last_sym_offset_diff {
                0 => {
                    current.offset = the_context.last.offset;
                }
                1 => {
                    current.offset = the_context
                        .last
                        .offset
                        .wrapping_add(u64::from(the_context.last.size));
                }
                2 => {
                    the_context.last_offset_diff = the_context.ic_offset_diff.decompress(
                        &mut self.decoder,
                        the_context.last_offset_diff,
                        0,
                    )?;
                    current.offset = the_context
                        .last
                        .offset
                        .wrapping_add(the_context.last_offset_diff as u64);
                }
                _ => {
                    current.offset = self.decoder.read_int64()?;
                }
            }

            current.size = the_context.ic_packet_size.decompress(
                &mut self.decoder,
                the_context.last.size as i32,
                0,
            )? as u32;

            let pred = the_context.last.return_point.to_bits() as i32;
            current.return_point = f32::from_bits(the_context.ic_return_point.decompress(
                &mut self.decoder,
                pred,
                0,
            )? as u32);

            let pred = the_context.last.dx.to_bits() as i32;
            current.dx = f32::from_bits(
                the_context
                    .ic_xyz
                    .decompress(&mut self.decoder, pred, DX_CONTEXT)? as u32,
            );
            let pred = the_context.last.dy.to_bits() as i32;
            current.dy = f32::from_bits(
                the_context
                    .ic_xyz
                    .decompress(&mut self.decoder, pred, DY_CONTEXT)? as u32,
            );
            let pred = the_context.last.dz.to_bits() as i32;
            current.dz = f32::from_bits(
                the_context
                    .ic_xyz
                    .decompress(&mut self.decoder, pred, DZ_CONTEXT)? as u32,
            );

            current.pack_into(current_point);
            the_context.last = current;
            Ok(())
        }

        fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()> {
            self.layer_size = src.read_u32::<LittleEndian>()?;
            Ok(())
        }

        fn read_layers(&mut self, src: &mut R) -> std::io::Result<()> {
            self.changed_wave_packet = copy_bytes_into_decoder(
                self.requested_wave_packet,
                self.layer_size as usize,
                &mut self.decoder,
                src,
            )?;
            Ok(())
        }
    }

    pub struct WavePacketCompressor {
        encoder: RangeEncoder<Cursor<Vec<u8>>>,
        wave_packet_has_changed: bool,
        last_context_used: usize,
        contexts: [CompressionContext; 4],
    }

    impl WavePacketCompressor {
        pub fn new() -> Self {
            Self {
                encoder: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                wave_packet_has_changed: false,
                last_context_used: 0,
                contexts: [
                    CompressionContext::new(),
                    CompressionContext::new(),
                    CompressionContext::new(),
                    CompressionContext::new(),
                ],
            }
        }
    }

    impl<W: Write> LayeredFieldCompressor<W> for WavePacketCompressor {
        fn size_of_field(&self) -> usize {
            WavePacket::SIZE
        }

        fn init_first_point(
            &mut self,
            dst: &mut W,
            first_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for wave_context in &mut self.contexts {
                wave_context.unused = true;
            }
            dst.write_all(first_point)?;
            self.contexts[*context] =
                CompressionContext::from_last(WavePacket::unpack_from(first_point));
            self.last_context_used = *context;
            Ok(())
        }

        fn compress_field_with(&mut self, buf: &[u8], context: &mut usize) -> std::io::Result<()> {
            if self.last_context_used != *context {
                if self.contexts[*context].unused {
                    let last = self.contexts[self.last_context_used].last;
                    self.contexts[*context] = CompressionContext::from_last(last);
                }
                self.last_context_used = *context;
            }

            let current = WavePacket::unpack_from(buf);
            let the_context = &mut self.contexts[*context];

            if current != the_context.last {
                self.wave_packet_has_changed = true;
            }

            self.encoder.encode_symbol(
                &mut the_context.packet_index_model,
                u32::from(current.descriptor_index),
            )?;

            let offset_diff_64 = current.offset.wrapping_sub(the_context.last.offset) as i64;
            let offset_diff_32 = offset_diff_64 as i32;

            if offset_diff_64 == i64::from(offset_diff_32) {
                let sym = if offset_diff_32 == 0 {
                    0
                } else if offset_diff_32 == the_context.last.size as i32 {
                    1
                } else {
                    2
                };
                self.encoder.encode_symbol(
                    &mut the_context.offset_diff_models[the_context.last_sym_offset_diff as usize],
                    sym,
                )?;
                if sym == 2 {
                    the_context.ic_offset_diff.compress(
                        &mut self.encoder,
                        the_context.last_offset_diff,
                        offset_diff_32,
                        0,
                    )?;
                    the_context.last_offset_diff = offset_diff_32;
                }
                the_context.last_sym_offset_diff = sym;
            } else {
                self.encoder.encode_symbol(
                    &mut the_context.offset_diff_models[the_context.last_sym_offset_diff as usize],
                    3,
                )?;
                the_context.last_sym_offset_diff = 3;
                self.encoder.write_int64(current.offset)?;
            }

            the_context.ic_packet_size.compress(
                &mut self.encoder,
                the_context.last.size as i32,
                current.size as i32,
                0,
            )?;
            the_context.ic_return_point.compress(
                &mut self.encoder,
                the_context.last.return_point.to_bits() as i32,
                current.return_point.to_bits() as i32,
                0,
            )?;
            the_context.ic_xyz.compress(
                &mut self.encoder,
                the_context.last.dx.to_bits() as i32,
                current.dx.to_bits() as i32,
                DX_CONTEXT,
            )?;
            the_context.ic_xyz.compress(
                &mut self.encoder,
                the_context.last.dy.to_bits() as i32,
                current.dy.to_bits() as i32,
                DY_CONTEXT,
            )?;
            the_context.ic_xyz.compress(
                &mut self.encoder,
                the_context.last.dz.to_bits() as i32,
                current.dz.to_bits() as i32,
                DZ_CONTEXT,
            )?;

            the_context.last = current;
            Ok(())
        }

        fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()> {
            if self.wave_packet_has_changed {
                self.encoder.done()?;
                dst.write_u32::<LittleEndian>(inner_buffer_len_of(&self.encoder) as u32)?;
            } else {
                dst.write_u32::<LittleEndian>(0)?;
            }
            Ok(())
        }

        fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()> {
            if self.wave_packet_has_changed {
                copy_encoder_content_to(&mut self.encoder, dst)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_pack_unpack() {
        let wp = WavePacket {
            descriptor_index: 3,
            offset: 0x0123_4567_89AB_CDEF,
            size: 1024,
            return_point: 1.5,
            dx: 0.25,
            dy: -0.5,
            dz: 12.0,
        };
        let mut buf = [0u8; WavePacket::SIZE];
        wp.pack_into(&mut buf);
        assert_eq!(WavePacket::unpack_from(&buf), wp);
    }
}

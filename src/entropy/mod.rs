//! Adaptive arithmetic (range) coding primitives.
//!
//! This is the entropy layer every field codec sits on: a 32-bit range
//! coder plus adaptive symbol/bit models. Encoder and decoder are strict
//! mirrors; feeding the decoder the encoder's output with the same model
//! history reproduces the exact symbol sequence.

mod decoder;
mod encoder;
mod models;

pub use decoder::RangeDecoder;
pub use encoder::RangeEncoder;
pub use models::{BitModel, SymbolModel};

/// Interval length the coder starts from.
pub(crate) const MAX_INTERVAL: u32 = 0xFFFF_FFFF;
/// Renormalization threshold.
pub(crate) const MIN_INTERVAL: u32 = 0x0100_0000;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn symbols_roundtrip() {
        let symbols = [0u32, 3, 1, 1, 7, 2, 0, 5, 5, 5, 6, 4, 3, 3, 0, 7];

        let mut encoder = RangeEncoder::new(Cursor::new(Vec::new()));
        let mut model = SymbolModel::new(8);
        for &s in &symbols {
            encoder.encode_symbol(&mut model, s).unwrap();
        }
        encoder.done().unwrap();

        let data = encoder.into_inner().into_inner();
        let mut decoder = RangeDecoder::new(Cursor::new(data));
        decoder.read_init_bytes().unwrap();
        let mut model = SymbolModel::new(8);
        for &expected in &symbols {
            assert_eq!(decoder.decode_symbol(&mut model).unwrap(), expected);
        }
    }

    #[test]
    fn bits_and_raw_values_roundtrip() {
        let mut encoder = RangeEncoder::new(Cursor::new(Vec::new()));
        let mut bit_model = BitModel::new();
        for bit in [1u32, 0, 0, 1, 1, 1, 0] {
            encoder.encode_bit(&mut bit_model, bit).unwrap();
        }
        encoder.write_int(0xDEAD_BEEF).unwrap();
        encoder.write_int64(0x0123_4567_89AB_CDEF).unwrap();
        encoder.write_bits(13, 0x1ABC).unwrap();
        encoder.done().unwrap();

        let data = encoder.into_inner().into_inner();
        let mut decoder = RangeDecoder::new(Cursor::new(data));
        decoder.read_init_bytes().unwrap();
        let mut bit_model = BitModel::new();
        for expected in [1u32, 0, 0, 1, 1, 1, 0] {
            assert_eq!(decoder.decode_bit(&mut bit_model).unwrap(), expected);
        }
        assert_eq!(decoder.read_int().unwrap(), 0xDEAD_BEEF);
        assert_eq!(decoder.read_int64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert_eq!(decoder.read_bits(13).unwrap(), 0x1ABC);
    }

    #[test]
    fn long_symbol_stream_exercises_buffer_wrap() {
        // enough symbols to force several pending-buffer flushes
        let mut encoder = RangeEncoder::new(Cursor::new(Vec::new()));
        let mut model = SymbolModel::new(256);
        for i in 0..20_000u32 {
            encoder
                .encode_symbol(&mut model, (i * 7919) % 256)
                .unwrap();
        }
        encoder.done().unwrap();

        let data = encoder.into_inner().into_inner();
        let mut decoder = RangeDecoder::new(Cursor::new(data));
        decoder.read_init_bytes().unwrap();
        let mut model = SymbolModel::new(256);
        for i in 0..20_000u32 {
            assert_eq!(decoder.decode_symbol(&mut model).unwrap(), (i * 7919) % 256);
        }
    }
}

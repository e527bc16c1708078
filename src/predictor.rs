//! Predictive integer coding.
//!
//! [`IntCompressor`] codes the difference between a predicted and an
//! actual value in two parts: the bit magnitude `k` of the corrector goes
//! through one adaptive model per caller context, then the corrector
//! itself through a model sized for that magnitude (split into a modeled
//! high part and raw low bits when `k` exceeds [`BITS_HIGH`]).
//! [`IntDecompressor`] replays the same arithmetic in reverse.
//!
//! After each call `k()` exposes the magnitude of the last corrector so
//! callers can derive the context of their next call from it.

use std::io::{Read, Write};

use crate::entropy::{BitModel, RangeDecoder, RangeEncoder, SymbolModel};

/// Magnitudes up to this many bits are coded through a single model.
const BITS_HIGH: u32 = 8;

/// Corrector interval parameters shared by both directions.
#[derive(Debug, Clone, Copy)]
struct CorrectorRange {
    bits: u32,
    range: u32,
    min: i32,
    max: i32,
}

impl CorrectorRange {
    fn from_bits(bits: u32) -> Self {
        if bits >= 1 && bits < 32 {
            let range = 1u32 << bits;
            let min = -((range / 2) as i32);
            Self {
                bits,
                range,
                min,
                max: min + (range - 1) as i32,
            }
        } else {
            Self {
                bits: 32,
                range: 0,
                min: i32::min_value(),
                max: i32::max_value(),
            }
        }
    }
}

fn make_magnitude_models(corr_bits: u32, contexts: u32) -> Vec<SymbolModel> {
    (0..contexts).map(|_| SymbolModel::new(corr_bits + 1)).collect()
}

fn make_corrector_models(corr_bits: u32) -> Vec<SymbolModel> {
    (1..=corr_bits)
        .map(|i| {
            let symbols = if i <= BITS_HIGH {
                1u32 << i
            } else {
                1u32 << BITS_HIGH
            };
            SymbolModel::new(symbols)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct IntCompressor {
    k: u32,
    contexts: u32,
    corr: CorrectorRange,

    magnitude_models: Vec<SymbolModel>,
    corrector_zero: BitModel,
    corrector_models: Vec<SymbolModel>,
}

impl IntCompressor {
    pub fn new(bits: u32, contexts: u32) -> Self {
        Self {
            k: 0,
            contexts,
            corr: CorrectorRange::from_bits(bits),
            magnitude_models: vec![],
            corrector_zero: BitModel::new(),
            corrector_models: vec![],
        }
    }

    pub fn initialized(bits: u32, contexts: u32) -> Self {
        let mut ic = Self::new(bits, contexts);
        ic.init();
        ic
    }

    /// Allocates the adaptive models. Idempotent.
    pub fn init(&mut self) {
        if self.magnitude_models.is_empty() {
            self.magnitude_models = make_magnitude_models(self.corr.bits, self.contexts);
            self.corrector_models = make_corrector_models(self.corr.bits);
        }
    }

    /// Bit magnitude of the most recently coded corrector.
    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn compress<W: Write>(
        &mut self,
        encoder: &mut RangeEncoder<W>,
        predicted: i32,
        actual: i32,
        context: u32,
    ) -> std::io::Result<()> {
        // fold the corrector into [corr.min, corr.max]
        let mut c = actual.wrapping_sub(predicted);
        if c < self.corr.min {
            c += self.corr.range as i32;
        } else if c > self.corr.max {
            c -= self.corr.range as i32;
        }

        // tightest interval [-(2^k - 1), 2^k] containing c
        self.k = 0;
        let mut magnitude = if c <= 0 { c.wrapping_neg() } else { c - 1 } as u32;
        while magnitude != 0 {
            magnitude >>= 1;
            self.k += 1;
        }

        encoder.encode_symbol(&mut self.magnitude_models[context as usize], self.k)?;

        if self.k != 0 {
            debug_assert!(c != 0 && c != 1);
            if self.k < 32 {
                // shift c into [0, 2^k - 1]
                if c >= 0 {
                    c -= 1;
                } else {
                    c += ((1u32 << self.k) - 1) as i32;
                }

                if self.k <= BITS_HIGH {
                    encoder
                        .encode_symbol(&mut self.corrector_models[self.k as usize - 1], c as u32)?;
                } else {
                    // model the high bits, store the low bits raw
                    let low_bits = self.k - BITS_HIGH;
                    let low = (c & ((1u32 << low_bits) - 1) as i32) as u32;
                    c >>= low_bits;
                    encoder
                        .encode_symbol(&mut self.corrector_models[self.k as usize - 1], c as u32)?;
                    encoder.write_bits(low_bits, low)?;
                }
            }
        } else {
            debug_assert!(c == 0 || c == 1);
            encoder.encode_bit(&mut self.corrector_zero, c as u32)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct IntDecompressor {
    k: u32,
    contexts: u32,
    corr: CorrectorRange,

    magnitude_models: Vec<SymbolModel>,
    corrector_zero: BitModel,
    corrector_models: Vec<SymbolModel>,
}

impl IntDecompressor {
    pub fn new(bits: u32, contexts: u32) -> Self {
        Self {
            k: 0,
            contexts,
            corr: CorrectorRange::from_bits(bits),
            magnitude_models: vec![],
            corrector_zero: BitModel::new(),
            corrector_models: vec![],
        }
    }

    pub fn initialized(bits: u32, contexts: u32) -> Self {
        let mut id = Self::new(bits, contexts);
        id.init();
        id
    }

    pub fn init(&mut self) {
        if self.magnitude_models.is_empty() {
            self.magnitude_models = make_magnitude_models(self.corr.bits, self.contexts);
            self.corrector_models = make_corrector_models(self.corr.bits);
        }
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn decompress<R: Read>(
        &mut self,
        decoder: &mut RangeDecoder<R>,
        predicted: i32,
        context: u32,
    ) -> std::io::Result<i32> {
        self.k = decoder.decode_symbol(&mut self.magnitude_models[context as usize])?;

        let c: i32 = if self.k != 0 {
            if self.k < 32 {
                let mut c = if self.k <= BITS_HIGH {
                    decoder.decode_symbol(&mut self.corrector_models[self.k as usize - 1])? as i32
                } else {
                    let low_bits = self.k - BITS_HIGH;
                    let high = decoder
                        .decode_symbol(&mut self.corrector_models[self.k as usize - 1])?
                        as i32;
                    let low = decoder.read_bits(low_bits)?;
                    (high << low_bits) | low as i32
                };

                // shift c back into its signed interval
                if c >= (1u32 << (self.k - 1)) as i32 {
                    c += 1;
                } else {
                    c -= ((1u32 << self.k) - 1) as i32;
                }
                c
            } else {
                self.corr.min
            }
        } else {
            decoder.decode_bit(&mut self.corrector_zero)? as i32
        };

        let mut actual = predicted.wrapping_add(c);
        if actual < 0 {
            actual += self.corr.range as i32;
        } else if actual >= self.corr.range as i32 {
            actual -= self.corr.range as i32;
        }
        Ok(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn corrector_range_for_16_bits() {
        let r = CorrectorRange::from_bits(16);
        assert_eq!(r.range, 1 << 16);
        assert_eq!(r.min, -(1 << 15));
        assert_eq!(r.max, (1 << 15) - 1);
    }

    #[test]
    fn values_roundtrip_through_predictor() {
        let values: Vec<i32> = vec![
            0, 5, 6, 7, 100, -4, 1 << 20, -(1 << 20), 42, 43, 44, i32::max_value(),
            i32::min_value(), 0,
        ];

        let mut encoder = RangeEncoder::new(Cursor::new(Vec::new()));
        let mut ic = IntCompressor::initialized(32, 2);
        let mut prev = 0i32;
        for &v in &values {
            ic.compress(&mut encoder, prev, v, 0).unwrap();
            prev = v;
        }
        encoder.done().unwrap();

        let data = encoder.into_inner().into_inner();
        let mut decoder = RangeDecoder::new(Cursor::new(data));
        decoder.read_init_bytes().unwrap();
        let mut id = IntDecompressor::initialized(32, 2);
        let mut prev = 0i32;
        for &v in &values {
            let decoded = id.decompress(&mut decoder, prev, 0).unwrap();
            assert_eq!(decoded, v);
            prev = v;
        }
    }

    #[test]
    fn k_matches_between_both_sides() {
        let mut encoder = RangeEncoder::new(Cursor::new(Vec::new()));
        let mut ic = IntCompressor::initialized(16, 1);
        ic.compress(&mut encoder, 10, 300, 0).unwrap();
        let encode_k = ic.k();
        encoder.done().unwrap();

        let data = encoder.into_inner().into_inner();
        let mut decoder = RangeDecoder::new(Cursor::new(data));
        decoder.read_init_bytes().unwrap();
        let mut id = IntDecompressor::initialized(16, 1);
        assert_eq!(id.decompress(&mut decoder, 10, 0).unwrap(), 300);
        assert_eq!(id.k(), encode_k);
    }
}

//! Range decoder half of the entropy layer, mirror of the encoder.

use byteorder::ReadBytesExt;
use std::io::Read;

use super::models::{BitModel, SymbolModel, BIT_MODEL_SHIFT, SYMBOL_MODEL_SHIFT};
use super::{MAX_INTERVAL, MIN_INTERVAL};

pub struct RangeDecoder<R: Read> {
    source: R,
    value: u32,
    length: u32,
}

impl<R: Read> RangeDecoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            value: 0,
            length: MAX_INTERVAL,
        }
    }

    pub fn reset(&mut self) {
        self.value = 0;
        self.length = MAX_INTERVAL;
    }

    /// Primes the interval with the first four bytes of the stream.
    pub fn read_init_bytes(&mut self) -> std::io::Result<()> {
        let mut bytes = [0u8; 4];
        self.source.read_exact(&mut bytes)?;
        self.value = u32::from_be_bytes(bytes);
        Ok(())
    }

    pub fn decode_bit(&mut self, model: &mut BitModel) -> std::io::Result<u32> {
        let x = model.zero_prob * (self.length >> BIT_MODEL_SHIFT);
        let bit = u32::from(self.value >= x);

        if bit == 0 {
            self.length = x;
            model.zero_count += 1;
        } else {
            self.value -= x;
            self.length -= x;
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }

        model.bits_until_update -= 1;
        if model.bits_until_update == 0 {
            model.update();
        }
        Ok(bit)
    }

    pub fn decode_symbol(&mut self, model: &mut SymbolModel) -> std::io::Result<u32> {
        let mut symbol;
        let mut upper;
        let x;
        let mut y = self.length;

        if !model.lookup.is_empty() {
            self.length >>= SYMBOL_MODEL_SHIFT;
            let dv = self.value / self.length;
            let t = dv >> model.lookup_shift;

            // first guess from the table, then bisection between the
            // bracketing entries
            symbol = model.lookup[t as usize];
            upper = model.lookup[t as usize + 1] + 1;
            while upper > symbol + 1 {
                let mid = (symbol + upper) >> 1;
                if model.distribution[mid as usize] > dv {
                    upper = mid;
                } else {
                    symbol = mid;
                }
            }

            x = model.distribution[symbol as usize] * self.length;
            if symbol != model.last_symbol {
                y = model.distribution[symbol as usize + 1] * self.length;
            }
        } else {
            symbol = 0;
            let mut low = 0;
            self.length >>= SYMBOL_MODEL_SHIFT;
            upper = model.symbol_count;
            let mut mid = upper >> 1;

            loop {
                let z = self.length * model.distribution[mid as usize];
                if z > self.value {
                    upper = mid;
                    y = z;
                } else {
                    symbol = mid;
                    low = z;
                }
                mid = (symbol + upper) >> 1;
                if mid == symbol {
                    break;
                }
            }
            x = low;
        }

        self.value -= x;
        self.length = y - x;
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }

        model.counts[symbol as usize] += 1;
        model.symbols_until_update -= 1;
        if model.symbols_until_update == 0 {
            model.update();
        }
        Ok(symbol)
    }

    pub fn read_bit(&mut self) -> std::io::Result<u32> {
        self.length >>= 1;
        let bit = self.value / self.length;
        self.value -= self.length * bit;

        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        Ok(bit)
    }

    pub fn read_bits(&mut self, mut bits: u32) -> std::io::Result<u32> {
        debug_assert!(bits > 0 && bits <= 32);
        if bits > 19 {
            let low = u32::from(self.read_short()?);
            bits -= 16;
            let high = self.read_bits(bits)? << 16;
            Ok(high | low)
        } else {
            self.length >>= bits;
            let value = self.value / self.length;
            self.value -= self.length * value;

            if self.length < MIN_INTERVAL {
                self.renormalize()?;
            }
            Ok(value)
        }
    }

    pub fn read_byte(&mut self) -> std::io::Result<u8> {
        self.length >>= 8;
        let value = self.value / self.length;
        self.value -= self.length * value;

        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        debug_assert!(value < (1 << 8));
        Ok(value as u8)
    }

    pub fn read_short(&mut self) -> std::io::Result<u16> {
        self.length >>= 16;
        let value = self.value / self.length;
        self.value -= self.length * value;

        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        debug_assert!(value < (1 << 16));
        Ok(value as u16)
    }

    pub fn read_int(&mut self) -> std::io::Result<u32> {
        let low = u32::from(self.read_short()?);
        let high = u32::from(self.read_short()?);
        Ok((high << 16) | low)
    }

    pub fn read_int64(&mut self) -> std::io::Result<u64> {
        let low = u64::from(self.read_int()?);
        let high = u64::from(self.read_int()?);
        Ok((high << 32) | low)
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn renormalize(&mut self) -> std::io::Result<()> {
        loop {
            self.value = (self.value << 8) | u32::from(self.source.read_u8()?);
            self.length <<= 8;
            if self.length >= MIN_INTERVAL {
                break;
            }
        }
        Ok(())
    }
}

//! Range encoder half of the entropy layer.
//!
//! 32-bit base/length implementation after Said's fast arithmetic coder:
//! the interval is renormalized a byte at a time once its length drops
//! below [`MIN_INTERVAL`], and carries are propagated backwards through a
//! double buffer of not-yet-flushed output bytes.

use std::io::Write;

use super::models::{BitModel, SymbolModel, BIT_MODEL_SHIFT, SYMBOL_MODEL_SHIFT};
use super::{MAX_INTERVAL, MIN_INTERVAL};

/// Bytes kept in each half of the pending-output buffer.
const HALF_BUFFER_LEN: usize = 1024;
const FULL_BUFFER_LEN: usize = 2 * HALF_BUFFER_LEN;

pub struct RangeEncoder<W: Write> {
    /// Ring of pending bytes; one half is flushed while the other fills,
    /// so a carry can still reach recently produced bytes.
    pending: Vec<u8>,
    /// Next write position in `pending`.
    cursor: usize,
    /// Position at which the next flush is triggered.
    flush_at: usize,

    base: u32,
    length: u32,

    dest: W,
}

impl<W: Write> RangeEncoder<W> {
    pub fn new(dest: W) -> Self {
        Self {
            pending: vec![0u8; FULL_BUFFER_LEN],
            cursor: 0,
            flush_at: FULL_BUFFER_LEN,
            base: 0,
            length: MAX_INTERVAL,
            dest,
        }
    }

    /// Forgets all coder state, making the encoder ready for a new chunk.
    pub fn reset(&mut self) {
        self.base = 0;
        self.length = MAX_INTERVAL;
        self.pending.iter_mut().for_each(|b| *b = 0);
        self.cursor = 0;
        self.flush_at = FULL_BUFFER_LEN;
    }

    /// Terminates the interval and flushes every pending byte.
    ///
    /// Appends the 2 or 3 tail bytes that let the paired decoder
    /// reconstruct the final interval.
    pub fn done(&mut self) -> std::io::Result<()> {
        let init_base = self.base;
        let another_byte;

        if self.length > 2 * MIN_INTERVAL {
            self.base = self.base.wrapping_add(MIN_INTERVAL);
            self.length = MIN_INTERVAL >> 1;
            another_byte = true;
        } else {
            self.base = self.base.wrapping_add(MIN_INTERVAL >> 1);
            self.length = MIN_INTERVAL >> 9;
            another_byte = false;
        }

        if init_base > self.base {
            self.propagate_carry();
        }
        self.renormalize()?;

        // If a flush already happened the upper half still holds older
        // bytes that must go out before the ones at the front of the ring.
        if self.flush_at != FULL_BUFFER_LEN {
            debug_assert!(self.cursor < HALF_BUFFER_LEN);
            self.dest.write_all(&self.pending[HALF_BUFFER_LEN..])?;
        }
        if self.cursor != 0 {
            let upto = self.cursor;
            self.dest.write_all(&self.pending[..upto])?;
        }

        self.dest.write_all(&[0u8, 0u8])?;
        if another_byte {
            self.dest.write_all(&[0u8])?;
        }
        Ok(())
    }

    pub fn encode_bit(&mut self, model: &mut BitModel, bit: u32) -> std::io::Result<()> {
        debug_assert!(bit <= 1);
        let x = model.zero_prob * (self.length >> BIT_MODEL_SHIFT);

        if bit == 0 {
            self.length = x;
            model.zero_count += 1;
        } else {
            let init_base = self.base;
            self.base = self.base.wrapping_add(x);
            self.length -= x;
            if init_base > self.base {
                self.propagate_carry();
            }
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }

        model.bits_until_update -= 1;
        if model.bits_until_update == 0 {
            model.update();
        }
        Ok(())
    }

    pub fn encode_symbol(&mut self, model: &mut SymbolModel, symbol: u32) -> std::io::Result<()> {
        debug_assert!(symbol <= model.last_symbol);
        let init_base = self.base;

        if symbol == model.last_symbol {
            let x = model.distribution[symbol as usize] * (self.length >> SYMBOL_MODEL_SHIFT);
            self.base = self.base.wrapping_add(x);
            self.length -= x;
        } else {
            self.length >>= SYMBOL_MODEL_SHIFT;
            let x = model.distribution[symbol as usize] * self.length;
            self.base = self.base.wrapping_add(x);
            self.length = model.distribution[symbol as usize + 1] * self.length - x;
        }

        if init_base > self.base {
            self.propagate_carry();
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }

        model.counts[symbol as usize] += 1;
        model.symbols_until_update -= 1;
        if model.symbols_until_update == 0 {
            model.update();
        }
        Ok(())
    }

    /// Writes one raw (unmodeled) bit.
    pub fn write_bit(&mut self, bit: u32) -> std::io::Result<()> {
        debug_assert!(bit <= 1);
        let init_base = self.base;
        self.length >>= 1;
        self.base = self.base.wrapping_add(bit * self.length);

        if init_base > self.base {
            self.propagate_carry();
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        Ok(())
    }

    /// Writes the low `bits` bits of `value`, unmodeled.
    pub fn write_bits(&mut self, mut bits: u32, mut value: u32) -> std::io::Result<()> {
        debug_assert!(bits <= 32 && (bits == 32 || value < (1u32 << bits)));

        if bits > 19 {
            self.write_short((value & 0xFFFF) as u16)?;
            value >>= 16;
            bits -= 16;
        }

        let init_base = self.base;
        self.length >>= bits;
        self.base = self.base.wrapping_add(value * self.length);

        if init_base > self.base {
            self.propagate_carry();
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        Ok(())
    }

    pub fn write_byte(&mut self, value: u8) -> std::io::Result<()> {
        let init_base = self.base;
        self.length >>= 8;
        self.base = self.base.wrapping_add(u32::from(value) * self.length);

        if init_base > self.base {
            self.propagate_carry();
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        Ok(())
    }

    pub fn write_short(&mut self, value: u16) -> std::io::Result<()> {
        let init_base = self.base;
        self.length >>= 16;
        self.base = self.base.wrapping_add(u32::from(value) * self.length);

        if init_base > self.base {
            self.propagate_carry();
        }
        if self.length < MIN_INTERVAL {
            self.renormalize()?;
        }
        Ok(())
    }

    pub fn write_int(&mut self, value: u32) -> std::io::Result<()> {
        self.write_short((value & 0xFFFF) as u16)?;
        self.write_short((value >> 16) as u16)
    }

    pub fn write_int64(&mut self, value: u64) -> std::io::Result<()> {
        self.write_int((value & 0xFFFF_FFFF) as u32)?;
        self.write_int((value >> 32) as u32)
    }

    pub fn get_ref(&self) -> &W {
        &self.dest
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.dest
    }

    pub fn into_inner(self) -> W {
        self.dest
    }

    fn propagate_carry(&mut self) {
        let mut i = if self.cursor == 0 {
            FULL_BUFFER_LEN - 1
        } else {
            self.cursor - 1
        };
        while self.pending[i] == 0xFF {
            self.pending[i] = 0;
            i = if i == 0 { FULL_BUFFER_LEN - 1 } else { i - 1 };
        }
        self.pending[i] += 1;
    }

    fn renormalize(&mut self) -> std::io::Result<()> {
        loop {
            self.pending[self.cursor] = (self.base >> 24) as u8;
            self.cursor += 1;
            if self.cursor == self.flush_at {
                self.flush_half()?;
            }
            self.base <<= 8;
            self.length <<= 8;
            if self.length >= MIN_INTERVAL {
                break;
            }
        }
        Ok(())
    }

    /// Flushes the half of the ring the cursor is about to refill.
    fn flush_half(&mut self) -> std::io::Result<()> {
        if self.cursor == FULL_BUFFER_LEN {
            self.cursor = 0;
        }
        self.dest
            .write_all(&self.pending[self.cursor..self.cursor + HALF_BUFFER_LEN])?;
        self.flush_at = self.cursor + HALF_BUFFER_LEN;
        Ok(())
    }
}

//! Adaptive probability models driven by the range coder.
//!
//! Models are symmetric: as long as the encoder and the decoder feed the
//! same symbol sequence through a model, its internal statistics (and thus
//! the intervals of the coder) evolve identically on both sides.

/// Probability bits of a multi-symbol model.
pub(crate) const SYMBOL_MODEL_SHIFT: u32 = 15;
pub(crate) const SYMBOL_MODEL_MAX_COUNT: u32 = 1 << SYMBOL_MODEL_SHIFT;

/// Probability bits of a binary model.
pub(crate) const BIT_MODEL_SHIFT: u32 = 13;
pub(crate) const BIT_MODEL_MAX_COUNT: u32 = 1 << BIT_MODEL_SHIFT;

/// Adaptive model over `symbol_count` outcomes.
///
/// Keeps per-symbol frequencies and a cumulative distribution that is
/// rebuilt every `update_cycle` coded symbols, halving the counts once
/// their total passes [`SYMBOL_MODEL_MAX_COUNT`]. Alphabets larger than
/// 16 symbols also carry a lookup table that lets the decoder narrow its
/// bisection search.
#[derive(Debug, Clone)]
pub struct SymbolModel {
    pub(crate) symbol_count: u32,
    pub(crate) last_symbol: u32,

    pub(crate) counts: Vec<u32>,
    pub(crate) distribution: Vec<u32>,
    pub(crate) lookup: Vec<u32>,

    pub(crate) total_count: u32,
    pub(crate) update_cycle: u32,
    pub(crate) symbols_until_update: u32,
    pub(crate) lookup_shift: u32,
    lookup_size: u32,
}

impl SymbolModel {
    pub fn new(symbol_count: u32) -> Self {
        Self::with_initial_counts(symbol_count, &[])
    }

    /// Creates a model whose starting frequencies are `initial_counts`
    /// instead of the uniform all-ones table.
    pub fn with_initial_counts(symbol_count: u32, initial_counts: &[u32]) -> Self {
        assert!(
            (2..=(1 << 11)).contains(&symbol_count),
            "unsupported symbol count"
        );

        let (lookup_size, lookup_shift, lookup) = if symbol_count > 16 {
            let mut table_bits = 3u32;
            while symbol_count > (1u32 << (table_bits + 2)) {
                table_bits += 1;
            }
            let size = 1u32 << table_bits;
            (
                size,
                SYMBOL_MODEL_SHIFT - table_bits,
                vec![0u32; size as usize + 2],
            )
        } else {
            (0, 0, Vec::new())
        };

        let counts = if initial_counts.is_empty() {
            vec![1u32; symbol_count as usize]
        } else {
            debug_assert_eq!(initial_counts.len(), symbol_count as usize);
            initial_counts.to_vec()
        };

        let mut model = Self {
            symbol_count,
            last_symbol: symbol_count - 1,
            counts,
            distribution: vec![0u32; symbol_count as usize],
            lookup,
            total_count: 0,
            update_cycle: symbol_count,
            symbols_until_update: 0,
            lookup_shift,
            lookup_size,
        };
        model.update();
        model.update_cycle = (symbol_count + 6) >> 1;
        model.symbols_until_update = model.update_cycle;
        model
    }

    pub(crate) fn update(&mut self) {
        self.total_count += self.update_cycle;
        if self.total_count > SYMBOL_MODEL_MAX_COUNT {
            self.total_count = 0;
            for count in &mut self.counts {
                *count = (*count + 1) >> 1;
                self.total_count += *count;
            }
        }

        let scale = 0x8000_0000u32 / self.total_count;
        let mut sum = 0u32;

        if self.lookup_size == 0 {
            for (cumulative, count) in self.distribution.iter_mut().zip(&self.counts) {
                *cumulative = (scale * sum) >> (31 - SYMBOL_MODEL_SHIFT);
                sum += *count;
            }
        } else {
            let mut filled = 0usize;
            for (k, (cumulative, count)) in
                self.distribution.iter_mut().zip(&self.counts).enumerate()
            {
                *cumulative = (scale * sum) >> (31 - SYMBOL_MODEL_SHIFT);
                sum += *count;
                let w = (*cumulative >> self.lookup_shift) as usize;
                while filled < w {
                    filled += 1;
                    self.lookup[filled] = (k - 1) as u32;
                }
            }
            self.lookup[0] = 0;
            while filled <= self.lookup_size as usize {
                filled += 1;
                self.lookup[filled] = self.symbol_count - 1;
            }
        }

        self.update_cycle = (5 * self.update_cycle) >> 2;
        let max_cycle = (self.symbol_count + 6) << 3;
        if self.update_cycle > max_cycle {
            self.update_cycle = max_cycle;
        }
        self.symbols_until_update = self.update_cycle;
    }
}

/// Adaptive model over a single bit.
#[derive(Debug, Clone)]
pub struct BitModel {
    pub(crate) zero_count: u32,
    pub(crate) total_count: u32,
    pub(crate) zero_prob: u32,
    pub(crate) bits_until_update: u32,
    pub(crate) update_cycle: u32,
}

impl BitModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update(&mut self) {
        self.total_count += self.update_cycle;
        if self.total_count > BIT_MODEL_MAX_COUNT {
            self.total_count = (self.total_count + 1) >> 1;
            self.zero_count = (self.zero_count + 1) >> 1;
            if self.zero_count == self.total_count {
                self.total_count += 1;
            }
        }

        let scale = 0x8000_0000u32 / self.total_count;
        self.zero_prob = (self.zero_count * scale) >> (31 - BIT_MODEL_SHIFT);

        self.update_cycle = (5 * self.update_cycle) >> 2;
        if self.update_cycle > 64 {
            self.update_cycle = 64;
        }
        self.bits_until_update = self.update_cycle;
    }
}

impl Default for BitModel {
    fn default() -> Self {
        Self {
            zero_count: 1,
            total_count: 2,
            zero_prob: 1u32 << (BIT_MODEL_SHIFT - 1),
            bits_until_update: 4,
            update_cycle: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_model_starts_equiprobable() {
        let model = SymbolModel::new(4);
        assert_eq!(model.counts, vec![1, 1, 1, 1]);
        // cumulative distribution must be non decreasing and start at zero
        assert_eq!(model.distribution[0], 0);
        for pair in model.distribution.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn large_alphabet_gets_lookup_table() {
        let model = SymbolModel::new(256);
        assert!(!model.lookup.is_empty());
        let small = SymbolModel::new(16);
        assert!(small.lookup.is_empty());
    }

    #[test]
    fn bit_model_probability_is_half_initially() {
        let model = BitModel::new();
        assert_eq!(model.zero_prob, 1 << (BIT_MODEL_SHIFT - 1));
    }
}

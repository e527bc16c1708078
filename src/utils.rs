//! Numeric helpers and prediction-context tables shared by the field
//! codecs.

use num_traits::Zero;

/// Rolling median over the last 5 inserted values.
///
/// Insertion keeps the window ordered with a circular shift that
/// alternates between evicting towards the high and the low end, so
/// `get()` is always the middle-ranked element of the last five values.
/// Both coder sides must insert the same deltas in the same order, since
/// the median seeds the next coordinate prediction.
#[derive(Debug, Copy, Clone)]
pub struct StreamingMedian<T: Zero + Copy + PartialOrd> {
    values: [T; 5],
    high: bool,
}

impl<T: Zero + Copy + PartialOrd> Default for StreamingMedian<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Zero + Copy + PartialOrd> StreamingMedian<T> {
    pub fn new() -> Self {
        Self {
            values: [T::zero(); 5],
            high: true,
        }
    }

    pub fn add(&mut self, v: T) {
        let values = &mut self.values;
        if self.high {
            if v < values[2] {
                values[4] = values[3];
                values[3] = values[2];
                if v < values[0] {
                    values[2] = values[1];
                    values[1] = values[0];
                    values[0] = v;
                } else if v < values[1] {
                    values[2] = values[1];
                    values[1] = v;
                } else {
                    values[2] = v;
                }
            } else {
                if v < values[3] {
                    values[4] = values[3];
                    values[3] = v;
                } else {
                    values[4] = v;
                }
                self.high = false;
            }
        } else if values[2] < v {
            values[0] = values[1];
            values[1] = values[2];
            if values[4] < v {
                values[2] = values[3];
                values[3] = values[4];
                values[4] = v;
            } else if values[3] < v {
                values[2] = values[3];
                values[3] = v;
            } else {
                values[2] = v;
            }
        } else {
            if values[1] < v {
                values[0] = values[1];
                values[1] = v;
            } else {
                values[0] = v;
            }
            self.high = true;
        }
    }

    pub fn get(&self) -> T {
        self.values[2]
    }
}

/// Clears the lowest bit, used to bucket predictor magnitudes pairwise.
#[inline]
pub(crate) fn u32_zero_lowest_bit(n: u32) -> u32 {
    n & 0xFFFF_FFFE
}

/// Clamps a chained prediction into byte range; both coder sides compute
/// the identical clamped intermediate before applying a correction.
#[inline]
pub(crate) fn u8_clamp(n: i32) -> u8 {
    num_traits::clamp(n, i32::from(u8::min_value()), i32::from(u8::max_value())) as u8
}

/// Folds a difference into the byte alphabet by modular wraparound.
#[inline]
pub(crate) fn u8_fold(n: i32) -> u8 {
    (n & 0xFF) as u8
}

#[inline(always)]
pub(crate) fn lower_byte(n: u16) -> u8 {
    (n & 0x00FF) as u8
}

#[inline(always)]
pub(crate) fn upper_byte(n: u16) -> u8 {
    (n >> 8) as u8
}

#[inline(always)]
pub(crate) fn lower_byte_changed(lhs: u16, rhs: u16) -> bool {
    lower_byte(lhs) != lower_byte(rhs)
}

#[inline(always)]
pub(crate) fn upper_byte_changed(lhs: u16, rhs: u16) -> bool {
    upper_byte(lhs) != upper_byte(rhs)
}

/// Round-to-nearest quantization matching the reference arithmetic.
#[inline]
pub(crate) fn i32_quantize(n: f32) -> i32 {
    if n >= 0.0f32 {
        (n + 0.5f32) as i32
    } else {
        (n - 0.5f32) as i32
    }
}

// for records with the return number (r) and the number of returns (n)
// correctly populated only the upper-left triangle of these tables would
// be reachable. real files also contain zero-based or swapped r/n, so
// the remaining combinations are mapped to distinct contexts as well.
pub(crate) const RETURN_MAP: [[u8; 8]; 8] = [
    [15, 14, 13, 12, 11, 10, 9, 8],
    [14, 0, 1, 3, 6, 10, 10, 9],
    [13, 1, 2, 4, 7, 11, 11, 10],
    [12, 3, 4, 5, 8, 12, 12, 11],
    [11, 6, 7, 8, 9, 13, 13, 12],
    [10, 10, 11, 12, 13, 14, 14, 13],
    [9, 10, 11, 12, 13, 14, 15, 14],
    [8, 9, 10, 11, 12, 13, 14, 15],
];

// penetration level (n - r), completed for out-of-range combinations
pub(crate) const RETURN_LEVEL: [[u8; 8]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7],
    [1, 0, 1, 2, 3, 4, 5, 6],
    [2, 1, 0, 1, 2, 3, 4, 5],
    [3, 2, 1, 0, 1, 2, 3, 4],
    [4, 3, 2, 1, 0, 1, 2, 3],
    [5, 4, 3, 2, 1, 0, 1, 2],
    [6, 5, 4, 3, 2, 1, 0, 1],
    [7, 6, 5, 4, 3, 2, 1, 0],
];

// extended records allow r and n up to 15; the full combination count is
// collapsed to 6 contexts, higher returns carry no extra entropy
pub(crate) const RETURN_MAP_6CTX: [[u8; 16]; 16] = [
    [0, 1, 2, 3, 4, 5, 3, 4, 4, 5, 5, 5, 5, 5, 5, 5],
    [1, 0, 1, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3],
    [2, 1, 2, 4, 4, 4, 4, 4, 4, 4, 4, 3, 3, 3, 3, 3],
    [3, 3, 4, 5, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
    [4, 3, 4, 4, 5, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
    [5, 3, 4, 4, 4, 5, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
    [3, 3, 4, 4, 4, 4, 5, 4, 4, 4, 4, 4, 4, 4, 4, 4],
    [4, 3, 4, 4, 4, 4, 4, 5, 4, 4, 4, 4, 4, 4, 4, 4],
    [4, 3, 4, 4, 4, 4, 4, 4, 5, 4, 4, 4, 4, 4, 4, 4],
    [5, 3, 4, 4, 4, 4, 4, 4, 4, 5, 4, 4, 4, 4, 4, 4],
    [5, 3, 4, 4, 4, 4, 4, 4, 4, 4, 5, 4, 4, 4, 4, 4],
    [5, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 4, 4, 4],
    [5, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 4, 4],
    [5, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 4],
    [5, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5],
    [5, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5],
];

// extended penetration level, capped at 7
pub(crate) const RETURN_LEVEL_8CTX: [[u8; 16]; 16] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 7, 7, 7, 7, 7, 7, 7, 7],
    [1, 0, 1, 2, 3, 4, 5, 6, 7, 7, 7, 7, 7, 7, 7, 7],
    [2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 7, 7, 7, 7, 7, 7],
    [3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 7, 7, 7, 7, 7],
    [4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 7, 7, 7, 7],
    [5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 7, 7, 7],
    [6, 5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 7, 7],
    [7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 7],
    [7, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7],
    [7, 7, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6],
    [7, 7, 7, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5],
    [7, 7, 7, 7, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 3, 4],
    [7, 7, 7, 7, 7, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 3],
    [7, 7, 7, 7, 7, 7, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2],
    [7, 7, 7, 7, 7, 7, 7, 7, 6, 5, 4, 3, 2, 1, 0, 1],
    [7, 7, 7, 7, 7, 7, 7, 7, 7, 6, 5, 4, 3, 2, 1, 0],
];

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_median(window: &[i32; 5]) -> i32 {
        let mut sorted = *window;
        sorted.sort_unstable();
        sorted[2]
    }

    #[test]
    fn median_matches_naive_reference_after_priming() {
        // after priming with [5, 1, 1, 1, 1], any 6th value must yield
        // the middle-ranked element of the last five inserted values
        for sixth in [-100, -3, 0, 1, 2, 5, 1000] {
            let mut median = StreamingMedian::<i32>::new();
            for v in [5, 1, 1, 1, 1] {
                median.add(v);
            }
            median.add(sixth);
            assert_eq!(
                median.get(),
                reference_median(&[1, 1, 1, 1, sixth]),
                "median diverged for sixth value {}",
                sixth
            );
        }
    }

    #[test]
    fn median_of_constant_stream_is_the_constant() {
        let mut median = StreamingMedian::<i32>::new();
        for _ in 0..10 {
            median.add(42);
        }
        assert_eq!(median.get(), 42);
    }

    #[test]
    fn median_of_partial_window_counts_zero_seeds() {
        let mut median = StreamingMedian::<i32>::new();
        median.add(5);
        median.add(1);
        // window is [5, 1, 0, 0, 0], three zero seeds still outvote
        assert_eq!(median.get(), 0);
    }

    #[test]
    fn fold_and_clamp() {
        assert_eq!(u8_fold(300), 44);
        assert_eq!(u8_fold(-1), 255);
        assert_eq!(u8_clamp(-5), 0);
        assert_eq!(u8_clamp(270), 255);
        assert_eq!(u8_clamp(128), 128);
    }

    #[test]
    fn fold_unfold_identity() {
        for last in [0u8, 1, 77, 128, 255] {
            for value in 0..=255u8 {
                let diff = i32::from(value) - i32::from(last);
                let folded = u8_fold(diff);
                // the decode side adds the folded correction back
                let unfolded = u8_fold(i32::from(folded) + i32::from(last));
                assert_eq!(unfolded, value);
            }
        }
    }

    #[test]
    fn byte_helpers() {
        assert_eq!(lower_byte(0xABCD), 0xCD);
        assert_eq!(upper_byte(0xABCD), 0xAB);
        assert!(lower_byte_changed(0x00FF, 0x00FE));
        assert!(!upper_byte_changed(0x01FF, 0x01FE));
    }

    #[test]
    fn quantize_rounds_half_away_from_zero() {
        assert_eq!(i32_quantize(1.4), 1);
        assert_eq!(i32_quantize(1.5), 2);
        assert_eq!(i32_quantize(-1.5), -2);
        assert_eq!(i32_quantize(-0.4), 0);
    }
}

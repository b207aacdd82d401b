//! Implementation of a saturating counter.

use crate::branch::Outcome;

/// Return the taken/not-taken decision threshold for a counter of the
/// given width.
///
/// A counter reads as taken when its value is *strictly above*
/// `2^(w-1) - 1`. The boundary sits one below the midpoint, so for a
/// 2-bit counter the values 2 and 3 predict taken and 0 and 1 do not.
pub fn taken_threshold(bits: u32) -> u32 {
    ((1u64 << (bits - 1)) - 1) as u32
}

/// An n-bit unsigned counter that clamps at its bounds instead of
/// wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturatingCounter {
    bits: u32,
    val: u32,
}
impl SaturatingCounter {
    /// Create a counter of the given width, initialized to all ones.
    pub fn new(bits: u32) -> Self {
        debug_assert!((1..=32).contains(&bits));
        Self {
            bits,
            val: (((1u64) << bits) - 1) as u32,
        }
    }

    fn limit(&self) -> u32 {
        (((1u64) << self.bits) - 1) as u32
    }

    /// Resize the counter, resetting it to the maximum value.
    pub fn set_bits(&mut self, bits: u32) {
        *self = Self::new(bits);
    }

    pub fn increment(&mut self) {
        if self.val < self.limit() {
            self.val += 1;
        }
    }

    pub fn decrement(&mut self) {
        self.val = self.val.saturating_sub(1);
    }

    /// Return the current counter value.
    pub fn read(&self) -> u32 {
        self.val
    }

    /// Step the counter toward an outcome.
    pub fn update(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::T => self.increment(),
            Outcome::N => self.decrement(),
        }
    }
}

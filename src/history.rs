//! Global branch history tracking.

use crate::branch::Outcome;

/// A shift register holding the outcomes of the most recent branches.
///
/// The register is updated *speculatively*: every prediction shifts the
/// predicted outcome in before the branch actually resolves. A caller that
/// discovers a misprediction later recovers with [`Self::rollback`] (which
/// re-derives the history from a snapshot taken before the bad prediction)
/// or [`Self::restore`] (which reverts to the snapshot outright).
#[derive(Clone, Debug)]
pub struct GlobalHistoryRegister {
    /// Current history bits
    reg: u64,
    /// Mask selecting the bits actually tracked
    mask: u64,
}

// Presents the tracked bits with the newest outcome rightmost.
impl std::fmt::Display for GlobalHistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let width = self.mask.count_ones() as usize;
        write!(f, "{:0width$b}", self.reg, width = width)
    }
}

impl GlobalHistoryRegister {
    /// Create a register tracking the specified number of bits.
    /// All bits in the register are initialized to zero.
    pub fn new(bits: u32) -> Self {
        debug_assert!(bits < 64);
        Self {
            reg: 0,
            mask: (1u64 << bits) - 1,
        }
    }

    /// Return the current history bits.
    pub fn read(&self) -> u64 {
        self.reg
    }

    /// Return the mask covering the tracked bits.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Shift an outcome into the register.
    pub fn advance(&mut self, outcome: Outcome) {
        self.reg = ((self.reg << 1) | outcome as u64) & self.mask;
    }

    /// Recover from a misprediction: rebuild the history from the snapshot
    /// taken before the mispredicted branch, corrected with the actual
    /// outcome. Any outcomes shifted in after the snapshot are discarded.
    pub fn rollback(&mut self, snapshot: u64, outcome: Outcome) {
        self.reg = ((snapshot << 1) | outcome as u64) & self.mask;
    }

    /// Revert the register to a snapshot, discarding everything shifted in
    /// after it was taken.
    pub fn restore(&mut self, snapshot: u64) {
        self.reg = snapshot & self.mask;
    }

    /// Clear the most recently recorded outcome in place. Signals a
    /// target-buffer miss for the branch that produced it.
    pub fn clear_latest(&mut self) {
        self.reg &= self.mask & !1;
    }

    /// Zero the register.
    pub fn reset(&mut self) {
        self.reg = 0;
    }
}

//! Implementation of a gshare predictor.
//!
//! A single table of saturating counters indexed by the exclusive-or of
//! the instruction address and the global history register.

use log::info;

use crate::branch::Outcome;
use crate::error::BuildError;
use crate::history::GlobalHistoryRegister;
use crate::predictor::counter::{taken_threshold, SaturatingCounter};
use crate::predictor::BranchPredictor;

/// Configuration for a [`GsharePredictor`].
#[derive(Clone, Copy, Debug)]
pub struct GshareConfig {
    /// Number of counters in the prediction table (power of two)
    pub table_size: usize,

    /// Width of each counter in bits
    pub ctr_bits: u32,

    /// Bits to shift off an instruction address to discard the byte offset
    pub inst_shift_amt: u32,
}
impl GshareConfig {
    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        self.table_size * self.ctr_bits as usize
            + self.table_size.ilog2() as usize
    }

    /// Use this configuration to create a new [`GsharePredictor`].
    pub fn build(self) -> Result<GsharePredictor, BuildError> {
        if !self.table_size.is_power_of_two() {
            return Err(BuildError::TableSize(self.table_size));
        }
        if !(1..=32).contains(&self.ctr_bits) {
            return Err(BuildError::CounterWidth(self.ctr_bits));
        }

        let history_bits = self.table_size.ilog2();
        let threshold = taken_threshold(self.ctr_bits);
        info!(
            "gshare: {} entries, {}-bit counters, {} history bits, threshold {}",
            self.table_size, self.ctr_bits, history_bits, threshold
        );

        Ok(GsharePredictor {
            ctrs: vec![SaturatingCounter::new(self.ctr_bits); self.table_size],
            ghr: GlobalHistoryRegister::new(history_bits),
            threshold,
            cfg: self,
        })
    }
}

/// Per-prediction state for a [`GsharePredictor`]: the history snapshot
/// taken before the prediction shifted in, and the prediction itself.
#[derive(Debug)]
pub struct GshareRecord {
    history: u64,
    prediction: Outcome,
}
impl GshareRecord {
    /// The prediction this record was created with.
    pub fn prediction(&self) -> Outcome {
        self.prediction
    }
}

/// A global-history-indexed table predictor.
pub struct GsharePredictor {
    cfg: GshareConfig,
    ctrs: Vec<SaturatingCounter>,
    ghr: GlobalHistoryRegister,
    threshold: u32,
}
impl GsharePredictor {
    /// Table index for an address hashed against a history value.
    fn index(&self, addr: usize, history: u64) -> usize {
        let addr_bits = (addr >> self.cfg.inst_shift_amt) as u64;
        let idx = ((addr_bits ^ history) & self.ghr.mask()) as usize;
        debug_assert!(idx < self.ctrs.len());
        idx
    }

    pub fn config(&self) -> &GshareConfig {
        &self.cfg
    }
}

impl BranchPredictor for GsharePredictor {
    type Record = GshareRecord;

    fn name(&self) -> &'static str {
        "gshare"
    }

    fn predict(&mut self, addr: usize) -> (Outcome, GshareRecord) {
        let idx = self.index(addr, self.ghr.read());
        let prediction =
            Outcome::from(self.ctrs[idx].read() > self.threshold);
        let record = GshareRecord {
            history: self.ghr.read(),
            prediction,
        };
        self.ghr.advance(prediction);
        (prediction, record)
    }

    fn predict_unconditional(&mut self) -> GshareRecord {
        let record = GshareRecord {
            history: self.ghr.read(),
            prediction: Outcome::T,
        };
        self.ghr.advance(Outcome::T);
        record
    }

    fn on_target_miss(&mut self, _addr: usize, _record: &mut GshareRecord) {
        self.ghr.clear_latest();
    }

    fn resolve(
        &mut self,
        addr: usize,
        outcome: Outcome,
        record: Option<GshareRecord>,
        squashed: bool,
    ) {
        let Some(record) = record else { return };

        // The live register has moved on; the counter for this branch is
        // found through the snapshot.
        let idx = self.index(addr, record.history);
        self.ctrs[idx].update(outcome);

        if squashed {
            self.ghr.rollback(record.history, outcome);
        }
    }

    fn squash(&mut self, record: Option<GshareRecord>) {
        if let Some(record) = record {
            self.ghr.restore(record.history);
        }
    }

    fn reset(&mut self) {
        for ctr in self.ctrs.iter_mut() {
            ctr.set_bits(self.cfg.ctr_bits);
        }
        self.ghr.reset();
    }
}

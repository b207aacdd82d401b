//! Implementation of a YAGS ("yet another global scheme") predictor.
//!
//! A plain history-indexed table spends capacity on branches whose
//! direction never changes. YAGS instead keeps a cheap address-indexed
//! choice predictor for the common direction of each branch, and a pair
//! of tagged direction caches that record only the *exceptions*: the
//! address/history contexts where the real direction contradicts the
//! bias. Cache capacity then scales with how often a branch misbehaves
//! rather than with how many branches exist.

use log::info;

use crate::branch::Outcome;
use crate::error::BuildError;
use crate::history::GlobalHistoryRegister;
use crate::predictor::cache::DirectionCache;
use crate::predictor::counter::{taken_threshold, SaturatingCounter};
use crate::predictor::BranchPredictor;

/// Configuration for a [`YagsPredictor`].
#[derive(Clone, Copy, Debug)]
pub struct YagsConfig {
    /// Number of counters in the choice table (power of two)
    pub choice_size: usize,

    /// Width of each choice counter in bits
    pub choice_ctr_bits: u32,

    /// Total entries in each direction cache; the entry count divided by
    /// the associativity (the set count) must be a power of two
    pub global_size: usize,

    /// Width of each direction cache counter in bits
    pub global_ctr_bits: u32,

    /// Bits to shift off an instruction address to discard the byte offset
    pub inst_shift_amt: u32,

    /// Number of address bits kept in a direction cache tag
    pub tag_bits: u32,

    /// Direction cache associativity (nonzero power of two)
    pub associativity: usize,
}
impl YagsConfig {
    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        self.choice_size * self.choice_ctr_bits as usize
            + 2 * self.global_size
                * (self.global_ctr_bits + self.tag_bits) as usize
            + self.global_size.ilog2() as usize
    }

    /// Use this configuration to create a new [`YagsPredictor`].
    pub fn build(self) -> Result<YagsPredictor, BuildError> {
        if !self.choice_size.is_power_of_two() {
            return Err(BuildError::ChoiceSize(self.choice_size));
        }
        if self.associativity == 0 || !self.associativity.is_power_of_two() {
            return Err(BuildError::Associativity(self.associativity));
        }

        // Both caches are organized as (global_size / associativity) sets.
        let num_sets = self.global_size / self.associativity;
        if !num_sets.is_power_of_two() {
            return Err(BuildError::TableSize(num_sets));
        }
        if !(1..=32).contains(&self.choice_ctr_bits) {
            return Err(BuildError::CounterWidth(self.choice_ctr_bits));
        }
        if !(1..=32).contains(&self.global_ctr_bits) {
            return Err(BuildError::CounterWidth(self.global_ctr_bits));
        }
        if !(1..=32).contains(&self.tag_bits) {
            return Err(BuildError::TagLength(self.tag_bits));
        }

        // The history is as wide as the full (undivided) entry count; the
        // set index only consumes the low bits, and the high bits left
        // over are folded into the tags instead.
        let history_bits = self.global_size.ilog2();
        let ghr = GlobalHistoryRegister::new(history_bits);
        let assoc_shift = self.associativity.ilog2();
        let unused_mask = ghr.mask() - (ghr.mask() >> assoc_shift);
        let tag_mask = (1u64 << self.tag_bits) - 1;

        info!(
            "yags: choice {}x{}-bit, {} sets x {} ways of {}-bit counters",
            self.choice_size,
            self.choice_ctr_bits,
            num_sets,
            self.associativity,
            self.global_ctr_bits
        );
        info!(
            "yags: history mask {:#x}, unused history mask {:#x}, tag mask {:#x}",
            ghr.mask(),
            unused_mask,
            tag_mask
        );

        Ok(YagsPredictor {
            choice: vec![
                SaturatingCounter::new(self.choice_ctr_bits);
                self.choice_size
            ],
            taken_cache: DirectionCache::new(
                num_sets,
                self.associativity,
                self.global_ctr_bits,
            ),
            not_taken_cache: DirectionCache::new(
                num_sets,
                self.associativity,
                self.global_ctr_bits,
            ),
            ghr,
            choice_mask: self.choice_size - 1,
            set_mask: (num_sets - 1) as u64,
            unused_mask,
            tag_mask,
            assoc_shift,
            choice_threshold: taken_threshold(self.choice_ctr_bits),
            cfg: self,
        })
    }
}

/// Which component supplied an accepted prediction. Cache hits carry the
/// sub-prediction the cache produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YagsProvider {
    /// The choice predictor's bias was used directly
    Choice,

    /// A taken-cache hit overrode the choice
    TakenCache(Outcome),

    /// A not-taken-cache hit overrode the choice
    NotTakenCache(Outcome),
}

/// Per-prediction state for a [`YagsPredictor`].
#[derive(Debug)]
pub struct YagsRecord {
    history: u64,
    provider: YagsProvider,
    prediction: Outcome,
}
impl YagsRecord {
    /// The prediction this record was created with.
    pub fn prediction(&self) -> Outcome {
        self.prediction
    }

    /// The component that supplied the prediction.
    pub fn provider(&self) -> YagsProvider {
        self.provider
    }
}

/// A choice-gated dual-direction-cache predictor.
pub struct YagsPredictor {
    cfg: YagsConfig,
    choice: Vec<SaturatingCounter>,
    taken_cache: DirectionCache,
    not_taken_cache: DirectionCache,
    ghr: GlobalHistoryRegister,
    choice_mask: usize,
    set_mask: u64,
    unused_mask: u64,
    tag_mask: u64,
    assoc_shift: u32,
    choice_threshold: u32,
}
impl YagsPredictor {
    fn choice_index(&self, addr: usize) -> usize {
        let idx = (addr >> self.cfg.inst_shift_amt) & self.choice_mask;
        debug_assert!(idx < self.choice.len());
        idx
    }

    /// Direction cache set index for an address hashed against a history
    /// value.
    fn cache_index(&self, addr: usize, history: u64) -> usize {
        let addr_bits = (addr >> self.cfg.inst_shift_amt) as u64;
        let idx = ((addr_bits ^ history) & self.set_mask) as usize;
        debug_assert!(idx < self.taken_cache.num_sets());
        idx
    }

    /// Direction cache tag: truncated address bits, disambiguated with
    /// the history bits the set index leaves unused.
    fn cache_tag(&self, addr: usize, history: u64) -> u64 {
        let addr_bits = (addr >> self.cfg.inst_shift_amt) as u64;
        (addr_bits & self.tag_mask)
            | ((history & self.unused_mask) << self.assoc_shift)
    }

    fn choice_prediction(&self, idx: usize) -> Outcome {
        Outcome::from(self.choice[idx].read() > self.choice_threshold)
    }

    /// Discard the record of a prediction that was squashed upstream and
    /// will never reach resolution. Pure cleanup; no predictor state
    /// changes.
    pub fn retire_squashed(&mut self, record: Option<YagsRecord>) {
        drop(record);
    }

    pub fn config(&self) -> &YagsConfig {
        &self.cfg
    }
}

impl BranchPredictor for YagsPredictor {
    type Record = YagsRecord;

    fn name(&self) -> &'static str {
        "yags"
    }

    fn predict(&mut self, addr: usize) -> (Outcome, YagsRecord) {
        let history = self.ghr.read();
        let choice_idx = self.choice_index(addr);
        let set = self.cache_index(addr, history);
        let tag = self.cache_tag(addr, history);

        // The cache probed is the one matching the choice's direction; a
        // tag hit overrides the bias for this particular context.
        let choice_pred = self.choice_prediction(choice_idx);
        let (provider, prediction) = match choice_pred {
            Outcome::T => match self.taken_cache.lookup(set, tag) {
                Some(pred) => (YagsProvider::TakenCache(pred), pred),
                None => (YagsProvider::Choice, choice_pred),
            },
            Outcome::N => match self.not_taken_cache.lookup(set, tag) {
                Some(pred) => (YagsProvider::NotTakenCache(pred), pred),
                None => (YagsProvider::Choice, choice_pred),
            },
        };

        let record = YagsRecord {
            history,
            provider,
            prediction,
        };
        self.ghr.advance(prediction);
        (prediction, record)
    }

    fn predict_unconditional(&mut self) -> YagsRecord {
        let record = YagsRecord {
            history: self.ghr.read(),
            provider: YagsProvider::Choice,
            prediction: Outcome::T,
        };
        self.ghr.advance(Outcome::T);
        record
    }

    fn on_target_miss(&mut self, _addr: usize, _record: &mut YagsRecord) {
        self.ghr.clear_latest();
    }

    fn resolve(
        &mut self,
        addr: usize,
        outcome: Outcome,
        record: Option<YagsRecord>,
        squashed: bool,
    ) {
        let Some(record) = record else { return };

        let choice_idx = self.choice_index(addr);
        let set = self.cache_index(addr, record.history);
        let tag = self.cache_tag(addr, record.history);

        match record.provider {
            YagsProvider::Choice => {
                // A mispredicted bias allocates an exception entry in the
                // cache for the direction the choice failed to produce.
                if record.prediction != outcome {
                    match outcome {
                        Outcome::T => {
                            self.taken_cache.update(set, tag, outcome)
                        }
                        Outcome::N => {
                            self.not_taken_cache.update(set, tag, outcome)
                        }
                    }
                }
                self.choice[choice_idx].update(outcome);
            }
            YagsProvider::TakenCache(pred) => {
                // The entry that provided the prediction always trains;
                // the bias only trains when the entry got it wrong.
                if pred != outcome {
                    self.choice[choice_idx].update(outcome);
                }
                self.taken_cache.update(set, tag, outcome);
            }
            YagsProvider::NotTakenCache(pred) => {
                if pred != outcome {
                    self.choice[choice_idx].update(outcome);
                }
                self.not_taken_cache.update(set, tag, outcome);
            }
        }

        if squashed {
            self.ghr.rollback(record.history, outcome);
        }
    }

    fn squash(&mut self, record: Option<YagsRecord>) {
        if let Some(record) = record {
            self.ghr.restore(record.history);
        }
    }

    fn reset(&mut self) {
        for ctr in self.choice.iter_mut() {
            ctr.set_bits(self.cfg.choice_ctr_bits);
        }
        self.taken_cache.reset();
        self.not_taken_cache.reset();
        self.ghr.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> YagsPredictor {
        YagsConfig {
            choice_size: 4,
            choice_ctr_bits: 2,
            global_size: 8,
            global_ctr_bits: 2,
            inst_shift_amt: 0,
            tag_bits: 8,
            associativity: 1,
        }
        .build()
        .unwrap()
    }

    fn two_way() -> YagsPredictor {
        YagsConfig {
            choice_size: 4,
            choice_ctr_bits: 2,
            global_size: 8,
            global_ctr_bits: 2,
            inst_shift_amt: 0,
            tag_bits: 8,
            associativity: 2,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn rejects_bad_geometry() {
        let good = YagsConfig {
            choice_size: 4,
            choice_ctr_bits: 2,
            global_size: 8,
            global_ctr_bits: 2,
            inst_shift_amt: 0,
            tag_bits: 8,
            associativity: 1,
        };

        let cfg = YagsConfig {
            choice_size: 3,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::ChoiceSize(3)));

        let cfg = YagsConfig {
            associativity: 3,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::Associativity(3)));

        let cfg = YagsConfig {
            associativity: 0,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::Associativity(0)));

        let cfg = YagsConfig {
            global_size: 12,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::TableSize(12)));

        // More ways than entries leaves zero sets.
        let cfg = YagsConfig {
            global_size: 2,
            associativity: 4,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::TableSize(0)));

        let cfg = YagsConfig {
            choice_ctr_bits: 0,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::CounterWidth(0)));

        let cfg = YagsConfig {
            tag_bits: 33,
            ..good
        };
        assert_eq!(cfg.build().err(), Some(BuildError::TagLength(33)));
    }

    #[test]
    fn fresh_choice_predicts_taken() {
        let mut bp = small();
        let (outcome, record) = bp.predict(0x5);
        assert_eq!(outcome, Outcome::T);
        assert_eq!(record.provider(), YagsProvider::Choice);
        assert_eq!(bp.ghr.read(), 1);
        bp.resolve(0x5, Outcome::T, Some(record), false);
    }

    #[test]
    fn choice_miss_installs_exception_entry() {
        let mut bp = small();
        let addr = 0x5;

        // Bias says taken; the branch is not. The miss decrements the
        // choice counter once and installs a not-taken-cache entry for
        // this (address, history) context.
        let (outcome, record) = bp.predict(addr);
        assert_eq!(outcome, Outcome::T);
        bp.resolve(addr, Outcome::N, Some(record), true);
        assert_eq!(bp.choice[1].read(), 2);
        assert_eq!(bp.ghr.read(), 0);

        // The bias still reads taken, and with the same history the
        // taken cache still misses, so the second miss trains again.
        let (outcome, record) = bp.predict(addr);
        assert_eq!(outcome, Outcome::T);
        assert_eq!(record.provider(), YagsProvider::Choice);
        bp.resolve(addr, Outcome::N, Some(record), true);
        assert_eq!(bp.choice[1].read(), 1);

        // The bias has flipped; the probe now lands on the entry the
        // first misprediction installed.
        let (outcome, record) = bp.predict(addr);
        assert_eq!(outcome, Outcome::N);
        assert_eq!(record.provider(), YagsProvider::NotTakenCache(Outcome::N));
        bp.resolve(addr, Outcome::N, Some(record), false);

        // The entry agreed with the outcome, so the bias is untouched.
        assert_eq!(bp.choice[1].read(), 1);
    }

    #[test]
    fn choice_not_taken_miss_installs_taken_entry() {
        let mut bp = small();

        // Drag the shared choice counter down to not-taken with one
        // address, then miss with another address that aliases the same
        // counter and set but carries a different tag.
        for _ in 0..2 {
            let (_, record) = bp.predict(0x5);
            bp.resolve(0x5, Outcome::N, Some(record), true);
        }
        assert_eq!(bp.choice[1].read(), 1);

        let (outcome, record) = bp.predict(0xd);
        assert_eq!(outcome, Outcome::N);
        assert_eq!(record.provider(), YagsProvider::Choice);

        // Not-taken bias, taken outcome: a taken-cache entry appears at
        // the set's LRU way with a fresh counter stepped once (clamped
        // at its maximum), and the bias trains back up.
        bp.resolve(0xd, Outcome::T, Some(record), true);
        assert_eq!(bp.choice[1].read(), 2);

        // Park the history back at the install context and probe it.
        bp.ghr.reset();
        let (outcome, record) = bp.predict(0xd);
        assert_eq!(outcome, Outcome::T);
        assert_eq!(record.provider(), YagsProvider::TakenCache(Outcome::T));
        bp.resolve(0xd, Outcome::T, Some(record), false);
    }

    #[test]
    fn cache_miss_trains_choice_toward_outcome() {
        let mut bp = small();
        let addr = 0x5;

        // Drive the bias down to not-taken through choice-path misses,
        // then force a taken outcome through the cache-provided path and
        // check the bias is corrected on the sub-prediction mismatch.
        for _ in 0..2 {
            let (_, record) = bp.predict(addr);
            bp.resolve(addr, Outcome::N, Some(record), true);
        }
        let (outcome, record) = bp.predict(addr);
        assert_eq!(outcome, Outcome::N);
        assert_eq!(record.provider(), YagsProvider::NotTakenCache(Outcome::N));
        assert_eq!(bp.choice[1].read(), 1);

        bp.resolve(addr, Outcome::T, Some(record), true);
        assert_eq!(bp.choice[1].read(), 2);
    }

    #[test]
    fn fresh_cache_line_hits_tag_zero() {
        // An address whose tag collapses to zero matches the
        // zero-initialized ways, so the very first prediction is already
        // cache-provided.
        let mut bp = small();
        let addr = 0x100;

        let (outcome, record) = bp.predict(addr);
        assert_eq!(outcome, Outcome::T);
        assert_eq!(record.provider(), YagsProvider::TakenCache(Outcome::T));
        bp.resolve(addr, Outcome::N, Some(record), true);

        // Sub-prediction mismatch: the entry trains and so does the bias.
        assert_eq!(bp.choice[0].read(), 2);

        let (_, record) = bp.predict(addr);
        bp.resolve(addr, Outcome::N, Some(record), true);
        assert_eq!(bp.choice[0].read(), 1);

        // The bias now reads not-taken, and the probe moves to the other
        // cache, whose zero tag also hits with its fresh taken counter.
        let (outcome, record) = bp.predict(addr);
        assert_eq!(outcome, Outcome::T);
        assert_eq!(record.provider(), YagsProvider::NotTakenCache(Outcome::T));
        bp.resolve(addr, Outcome::T, Some(record), false);

        // The entry was right, so the bias stays where it was.
        assert_eq!(bp.choice[0].read(), 1);
    }

    #[test]
    fn unused_history_bits_disambiguate_tags() {
        let bp = two_way();

        // Four sets from eight entries: the top history bit is unused by
        // the set index and lands in the tag instead.
        assert_eq!(bp.set_mask, 3);
        assert_eq!(bp.unused_mask, 0b100);
        assert_eq!(bp.cache_index(0x1, 0b000), bp.cache_index(0x1, 0b100));
        assert_ne!(bp.cache_tag(0x1, 0b000), bp.cache_tag(0x1, 0b100));
        assert_eq!(bp.cache_tag(0x1, 0b000), 0x1);
        assert_eq!(bp.cache_tag(0x1, 0b100), 0x1 | 0b1000);
    }

    #[test]
    fn unconditional_branch_advances_history() {
        let mut bp = small();
        let record = bp.predict_unconditional();
        assert_eq!(record.prediction(), Outcome::T);
        assert_eq!(record.provider(), YagsProvider::Choice);
        assert_eq!(bp.ghr.read(), 1);
        bp.resolve(0x5, Outcome::T, Some(record), false);
    }

    #[test]
    fn target_miss_clears_latest_history_bit() {
        let mut bp = small();
        let (_, mut record) = bp.predict(0x5);
        assert_eq!(bp.ghr.read() & 1, 1);
        bp.on_target_miss(0x5, &mut record);
        assert_eq!(bp.ghr.read() & 1, 0);
        bp.resolve(0x5, Outcome::T, Some(record), false);
    }

    #[test]
    fn squash_restores_snapshot_exactly() {
        let mut bp = small();
        let (_, first) = bp.predict(0x5);
        let snapshot = first.history;
        let (_, second) = bp.predict(0x6);
        bp.squash(Some(second));
        bp.squash(Some(first));
        assert_eq!(bp.ghr.read(), snapshot);
    }

    #[test]
    fn retire_squashed_mutates_nothing() {
        let mut bp = small();
        let (_, record) = bp.predict(0x5);
        let after_predict = bp.ghr.read();

        // Retirement drops the record without rolling anything back.
        bp.retire_squashed(Some(record));
        assert_eq!(bp.ghr.read(), after_predict);
        assert_eq!(bp.choice[1].read(), 3);
        bp.retire_squashed(None);
    }

    #[test]
    fn absent_record_is_a_no_op() {
        let mut bp = small();
        bp.resolve(0x5, Outcome::N, None, true);
        bp.squash(None);
        assert_eq!(bp.ghr.read(), 0);
        assert_eq!(bp.choice[1].read(), 3);
    }

    #[test]
    fn records_resolve_out_of_order() {
        let mut bp = small();
        let (_, first) = bp.predict(0x4);
        let (_, second) = bp.predict(0x5);
        let (_, third) = bp.predict(0x6);

        bp.resolve(0x6, Outcome::T, Some(third), false);
        bp.resolve(0x4, Outcome::N, Some(first), false);
        bp.resolve(0x5, Outcome::T, Some(second), false);
    }

    #[test]
    fn reset_restores_construction_state() {
        let mut bp = small();
        for _ in 0..3 {
            let (_, record) = bp.predict(0x5);
            bp.resolve(0x5, Outcome::N, Some(record), true);
        }
        bp.reset();
        assert_eq!(bp.ghr.read(), 0);
        for ctr in bp.choice.iter() {
            assert_eq!(ctr.read(), 3);
        }
        let (outcome, record) = bp.predict(0x5);
        assert_eq!(outcome, Outcome::T);
        assert_eq!(record.provider(), YagsProvider::Choice);
        bp.resolve(0x5, Outcome::T, Some(record), false);
    }
}

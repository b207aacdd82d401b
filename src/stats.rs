//! Helpers for collecting statistics.

use std::cmp::Reverse;
use std::collections::*;

use bitvec::prelude::*;
use itertools::Itertools;

use crate::branch::Outcome;

/// Container for recording simple statistics while evaluating a
/// predictor.
pub struct BranchStats {
    /// Per-branch statistics (indexed by program counter value).
    pub data: BTreeMap<usize, BranchData>,

    /// Number of correct predictions
    pub global_hits: usize,

    /// Number of times any branch instruction was executed
    pub global_brns: usize,
}
impl BranchStats {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            global_hits: 0,
            global_brns: 0,
        }
    }

    /// Record one resolved prediction.
    pub fn update(&mut self, pc: usize, prediction: Outcome, outcome: Outcome) {
        let hit = prediction == outcome;
        self.global_brns += 1;
        if hit {
            self.global_hits += 1;
        }

        let data = self.get_mut(pc);
        data.occ += 1;
        data.pat.push(outcome.into());
        if hit {
            data.hits += 1;
        }
    }

    /// Return the global hit rate.
    pub fn hit_rate(&self) -> f64 {
        self.global_hits as f64 / self.global_brns as f64
    }

    /// Return the global miss count.
    pub fn global_miss(&self) -> usize {
        self.global_brns - self.global_hits
    }

    /// Returns a reference to data collected for a particular branch.
    pub fn get(&self, pc: usize) -> Option<&BranchData> {
        self.data.get(&pc)
    }

    /// Returns a mutable reference to data collected for a particular
    /// branch. Creates a new entry if one doesn't already exist.
    pub fn get_mut(&mut self, pc: usize) -> &mut BranchData {
        self.data.entry(pc).or_insert_with(BranchData::new)
    }

    /// Returns the number of unique observed branch instructions.
    pub fn num_unique_branches(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of branches that were always taken.
    pub fn num_always_taken(&self) -> usize {
        self.data.values().filter(|d| d.is_always_taken()).count()
    }

    /// Returns the number of branches that were never taken.
    pub fn num_never_taken(&self) -> usize {
        self.data.values().filter(|d| d.is_never_taken()).count()
    }

    /// Return the 'n' most frequently executed branches.
    pub fn most_common(&self, n: usize) -> Vec<(usize, &BranchData)> {
        self.data
            .iter()
            .sorted_by_key(|(_, d)| Reverse(d.occ))
            .take(n)
            .map(|(pc, d)| (*pc, d))
            .collect()
    }

    /// Return the 'n' most frequently executed branches whose hit rate
    /// was the worst.
    pub fn worst_predicted(&self, n: usize) -> Vec<(usize, &BranchData)> {
        self.data
            .iter()
            .sorted_by(|x, y| {
                x.1.hit_rate().partial_cmp(&y.1.hit_rate()).unwrap()
            })
            .take(n)
            .map(|(pc, d)| (*pc, d))
            .collect()
    }
}

/// Container for per-branch statistics.
pub struct BranchData {
    /// Number of times this branch was encountered.
    pub occ: usize,

    /// Number of correct predictions for this branch.
    pub hits: usize,

    /// Record of all observed outcomes for this branch.
    pub pat: BitVec,
}
impl BranchData {
    pub fn new() -> Self {
        Self {
            occ: 0,
            hits: 0,
            pat: BitVec::new(),
        }
    }

    /// Return the hit rate for this branch.
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.occ as f64
    }

    pub fn is_always_taken(&self) -> bool {
        self.pat.count_ones() == self.pat.len()
    }

    pub fn is_never_taken(&self) -> bool {
        self.pat.count_zeros() == self.pat.len()
    }

    pub fn times_taken(&self) -> usize {
        self.pat.count_ones()
    }
}

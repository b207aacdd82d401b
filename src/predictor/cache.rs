//! A tagged, set-associative cache of direction counters.

use crate::branch::Outcome;
use crate::predictor::counter::{taken_threshold, SaturatingCounter};

/// One way of a cache set: a tag plus the counter it guards.
#[derive(Clone, Debug)]
struct CacheWay {
    tag: u64,
    ctr: SaturatingCounter,
}

/// One set of the cache.
///
/// `rank` holds a recency value per way and is always a permutation of
/// `0..assoc`; rank 0 is least recently used. `lru` mirrors the way
/// currently holding rank 0 so victim selection is a single read.
#[derive(Clone, Debug)]
struct CacheSet {
    ways: Vec<CacheWay>,
    rank: Vec<usize>,
    lru: usize,
}
impl CacheSet {
    fn new(assoc: usize, ctr_bits: u32) -> Self {
        Self {
            ways: vec![
                CacheWay {
                    tag: 0,
                    ctr: SaturatingCounter::new(ctr_bits)
                };
                assoc
            ],
            rank: (0..assoc).collect(),
            lru: 0,
        }
    }

    /// Mark a way most recently used and rebalance the other ranks.
    fn touch(&mut self, way: usize) {
        let old = self.rank[way];
        self.rank[way] = self.ways.len() - 1;
        for w in 0..self.ways.len() {
            if w != way && self.rank[w] > old {
                self.rank[w] -= 1;
            }
            if self.rank[w] == 0 {
                self.lru = w;
            }
        }
    }
}

/// A set-associative cache of (tag, counter) entries with LRU
/// replacement.
///
/// Each entry overrides a choice predictor's bias for one specific
/// address/history context. Tags are zero-initialized, so a fresh set
/// answers probes for tag 0 with its initial counters.
pub struct DirectionCache {
    sets: Vec<CacheSet>,
    assoc: usize,
    ctr_bits: u32,
    threshold: u32,
}
impl DirectionCache {
    pub fn new(num_sets: usize, assoc: usize, ctr_bits: u32) -> Self {
        Self {
            sets: vec![CacheSet::new(assoc, ctr_bits); num_sets],
            assoc,
            ctr_bits,
            threshold: taken_threshold(ctr_bits),
        }
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Probe a set for a tag. A hit promotes the matching way to most
    /// recently used and returns that counter's direction.
    pub fn lookup(&mut self, idx: usize, tag: u64) -> Option<Outcome> {
        debug_assert!(idx < self.sets.len());
        let line = &mut self.sets[idx];
        for way in 0..line.ways.len() {
            if line.ways[way].tag == tag {
                line.touch(way);
                return Some(Outcome::from(line.ways[way].ctr.read() > self.threshold));
            }
        }
        None
    }

    /// Refresh the entry for a tag, allocating on a miss.
    ///
    /// A hit promotes the way and steps its counter. A miss evicts the
    /// set's LRU way: the tag is overwritten, the counter restarts from
    /// its fresh all-ones state, and the way becomes most recently used
    /// before the counter takes its first step toward the outcome.
    pub fn update(&mut self, idx: usize, tag: u64, outcome: Outcome) {
        debug_assert!(idx < self.sets.len());
        let line = &mut self.sets[idx];
        for way in 0..line.ways.len() {
            if line.ways[way].tag == tag {
                line.touch(way);
                line.ways[way].ctr.update(outcome);
                return;
            }
        }

        let victim = line.lru;
        line.ways[victim].tag = tag;
        line.ways[victim].ctr.set_bits(self.ctr_bits);
        line.touch(victim);
        line.ways[victim].ctr.update(outcome);
    }

    /// Reinitialize every set: tags to zero, counters to all ones, and
    /// recency state back to insertion order.
    pub fn reset(&mut self) {
        for line in self.sets.iter_mut() {
            *line = CacheSet::new(self.assoc, self.ctr_bits);
        }
    }
}

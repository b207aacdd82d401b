//! Implementations of different branch predictors.

pub mod cache;
pub mod counter;
pub mod gshare;
pub mod yags;

pub use cache::*;
pub use counter::*;
pub use gshare::*;
pub use yags::*;

use crate::branch::Outcome;

/// Interface to a predictor driven speculatively by an instruction
/// pipeline.
///
/// Each prediction produces a [`Self::Record`] capturing whatever the
/// predictor needs to reconcile the guess later. The caller owns the
/// record while the branch is in flight and surrenders it back through
/// exactly one of [`Self::resolve`] or [`Self::squash`]. Records are
/// move-only, so double consumption is rejected at compile time; a caller
/// that legitimately dropped its record passes `None`, which is a no-op.
///
/// Branches resolve out of program order, so any number of records may be
/// outstanding at once, each holding an independent history snapshot.
pub trait BranchPredictor {
    /// Per-prediction state handed to the caller and returned with the
    /// resolved outcome.
    type Record;

    fn name(&self) -> &'static str;

    /// Predict the direction of the conditional branch at `addr`.
    /// Speculatively shifts the prediction into the global history.
    fn predict(&mut self, addr: usize) -> (Outcome, Self::Record);

    /// Account for an unconditional (always-taken) branch. No table is
    /// consulted, but the history still advances and the caller still
    /// receives a record to surrender later.
    fn predict_unconditional(&mut self) -> Self::Record;

    /// Note a branch-target-buffer miss for an in-flight prediction.
    /// Clears the most recent outcome from the live history register.
    fn on_target_miss(&mut self, addr: usize, record: &mut Self::Record);

    /// Reconcile a prediction against the resolved outcome, consuming the
    /// record. When `squashed` is set the branch was mispredicted and the
    /// speculative history accumulated since the prediction is rolled
    /// back; otherwise the history advanced at predict time stands.
    fn resolve(
        &mut self,
        addr: usize,
        outcome: Outcome,
        record: Option<Self::Record>,
        squashed: bool,
    );

    /// Cancel an in-flight prediction outright, reverting the history
    /// register to the snapshot in the record.
    fn squash(&mut self, record: Option<Self::Record>);

    /// Reinitialize every counter, cache, and history bit to the
    /// construction-time state.
    fn reset(&mut self);
}

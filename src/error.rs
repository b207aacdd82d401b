//! Construction-time validation errors.

use thiserror::Error;

/// Reasons a predictor configuration can fail to build.
///
/// Table geometry is checked up front so that index arithmetic can rely on
/// masking alone; a bad size is refused here rather than silently wrapped
/// with modulo indexing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("predictor table size {0} is not a power of two")]
    TableSize(usize),

    #[error("choice predictor size {0} is not a power of two")]
    ChoiceSize(usize),

    #[error("direction cache associativity {0} is not a nonzero power of two")]
    Associativity(usize),

    #[error("counter width {0} is out of range (expected 1..=32)")]
    CounterWidth(u32),

    #[error("tag length {0} is out of range (expected 1..=32)")]
    TagLength(u32),
}

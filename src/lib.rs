//! Models of speculative hardware branch predictors.

pub mod branch;
pub mod error;
pub mod history;
pub mod predictor;
pub mod stats;

pub use branch::*;
pub use error::*;
pub use history::*;
pub use predictor::*;
pub use stats::*;

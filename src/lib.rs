//!
//! Trellis decoding of Hidden Markov Models over digitized sequences.
//!
//! * Viterbi (most probable path) and Nth-best Viterbi
//! * Forward / Backward (total sequence probability) and Posterior
//! * Stochastic traceback (paths sampled in proportion to their probability)
//!
//! The engine (`trellis::Trellis`) consumes a read-only model graph
//! (`model::HmmModel`) and a digitized `model::Sequence`.
//!
pub mod bitset;
pub mod error;
pub mod model;
pub mod params;
pub mod path;
pub mod prob;
pub mod table;
pub mod trellis;

pub use error::{Result, TrellisError};
pub use model::{HmmModel, Sequence, StateId};
pub use params::TrellisParams;
pub use path::{MultiTraceback, TracebackPath};
pub use prob::{lp, p, Prob};
pub use trellis::Trellis;

#[cfg(test)]
#[macro_use]
extern crate approx;

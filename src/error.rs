//!
//! Error types of the trellis engine and its bit-level containers.
//!
use crate::model::StateId;
use thiserror::Error;

/// Errors of `BitSet` and `SparseArray` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitSetError {
    /// Access beyond the logical size of the bitset.
    #[error("bit position {pos} out of range (len={len})")]
    OutOfRange { pos: usize, len: usize },

    /// Bitwise operation between bitsets of different sizes.
    #[error("bitset size mismatch: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    /// Only `'0'` and `'1'` are allowed when parsing a bitset.
    #[error("invalid character {0:?} in bitset string")]
    InvalidChar(char),
}

/// Errors reported by the decoding algorithms.
///
/// All of them are recoverable by the caller: `EmptySequence`, `NoPath` and
/// `Unreachable` are valid negative results (see `is_no_path`), the others
/// are precondition failures at the call site or model inconsistencies.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("sequence has length 0")]
    EmptySequence,

    /// The active-state set became empty at this position.
    #[error("no valid path: no state is reachable at position {position}")]
    NoPath { position: usize },

    /// The ending cell has probability zero.
    #[error("no valid path: END state is unreachable")]
    Unreachable,

    #[error("traceback table is corrupt at position {position} (state {state})")]
    TracebackCorrupt { position: usize, state: StateId },

    #[error("forward ({forward}) and backward ({backward}) total probabilities disagree")]
    ForwardBackwardMismatch { forward: f64, backward: f64 },

    #[error("rank {requested} requested but only {available} paths are available")]
    InvalidRank { requested: usize, available: usize },

    /// A traceback or a derived algorithm was called before the table it
    /// reads was computed.
    #[error("{0} table has not been computed")]
    TableMissing(&'static str),

    #[error("stochastic table is not finalized")]
    NotFinalized,

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("symbol {0:?} is not in the alphabet")]
    InvalidSymbol(u8),

    #[error(transparent)]
    BitSet(#[from] BitSetError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrellisError {
    ///
    /// `true` for the cases that mean "the sequence has no valid path",
    /// which is a legitimate decoding outcome rather than a misuse.
    ///
    pub fn is_no_path(&self) -> bool {
        matches!(
            self,
            TrellisError::EmptySequence | TrellisError::NoPath { .. } | TrellisError::Unreachable
        )
    }
}

/// Result type of the crate.
pub type Result<T> = std::result::Result<T, TrellisError>;

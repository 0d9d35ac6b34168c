//!
//! Model boundary of the trellis engine
//!
//! * `HmmModel`: read-only state graph the engine decodes against
//! * `GraphModel`: petgraph-backed implementation with explicit-duration
//!   transitions
//! * `Sequence`: digitized symbols with optional external definitions
//!
pub mod common;
pub mod graph;
pub mod mocks;
pub mod sequence;
pub mod transition;

pub use common::{HmmModel, StateId};
pub use graph::{GraphModel, GraphModelBuilder, StateNode};
pub use sequence::{Alphabet, ExDef, ExDefs, Sequence};
pub use transition::{DurationRule, SegmentFn, SegmentFunctions, Transition};

//!
//! Decoding many sequences against one model in parallel
//!
//! One `Trellis` per sequence; the model is shared read-only between the
//! rayon workers.
//!
use super::Trellis;
use crate::error::Result;
use crate::model::{HmmModel, Sequence};
use crate::params::TrellisParams;
use crate::path::{MultiTraceback, TracebackPath};
use crate::prob::Prob;
use rayon::prelude::*;

///
/// Viterbi path of each sequence
///
pub fn viterbi_parallel<M>(
    model: &M,
    seqs: &[Sequence],
    params: &TrellisParams,
) -> Vec<Result<TracebackPath>>
where
    M: HmmModel + Sync,
{
    seqs.par_iter()
        .map(|seq| {
            let mut t = Trellis::new(model, seq, params.clone());
            t.viterbi()?;
            t.traceback()
        })
        .collect()
}

///
/// Forward probability of each sequence
///
pub fn forward_parallel<M>(model: &M, seqs: &[Sequence], params: &TrellisParams) -> Vec<Result<Prob>>
where
    M: HmmModel + Sync,
{
    seqs.par_iter()
        .map(|seq| Trellis::new(model, seq, params.clone()).forward())
        .collect()
}

///
/// Full probability `P(x_1, ..., x_k)` of independent sequences, the
/// product of the Forward probabilities. Fails if any sequence fails.
///
pub fn full_prob_parallel<M>(model: &M, seqs: &[Sequence], params: &TrellisParams) -> Result<Prob>
where
    M: HmmModel + Sync,
{
    seqs.par_iter()
        .map(|seq| Trellis::new(model, seq, params.clone()).forward())
        .try_reduce(Prob::one, |a, b| Ok(a * b))
}

///
/// `n_best` ranked paths of each sequence
///
pub fn nth_viterbi_parallel<M>(
    model: &M,
    seqs: &[Sequence],
    params: &TrellisParams,
) -> Vec<Result<Vec<TracebackPath>>>
where
    M: HmmModel + Sync,
{
    seqs.par_iter()
        .map(|seq| {
            let mut t = Trellis::new(model, seq, params.clone());
            t.nth_viterbi(params.n_best)?;
            t.nth_tracebacks()
        })
        .collect()
}

///
/// `n_samples` paths of each sequence sampled from the Forward table
///
pub fn sample_parallel<M>(
    model: &M,
    seqs: &[Sequence],
    params: &TrellisParams,
) -> Vec<Result<MultiTraceback>>
where
    M: HmmModel + Sync,
{
    seqs.par_iter()
        .map(|seq| {
            let mut t = Trellis::new(model, seq, params.clone());
            t.stochastic_forward()?;
            t.sample_paths()
        })
        .collect()
}

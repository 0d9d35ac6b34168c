//!
//! Stochastic traceback
//!
//! Sample paths from the `StochTable` filled by `stochastic_viterbi` or
//! `stochastic_forward`, or position by position from the posterior table.
//!
use super::Trellis;
use crate::error::{Result, TrellisError};
use crate::model::{HmmModel, StateId};
use crate::prob::Prob;
use crate::path::{MultiTraceback, TracebackPath};
use log::info;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Sample a single path. Requires `stochastic_viterbi` or
    /// `stochastic_forward`.
    ///
    pub fn stochastic_traceback<R: Rng>(&self, rng: &mut R) -> Result<TracebackPath> {
        self.check_sequence()?;
        let stoch = self
            .stoch_table
            .as_ref()
            .ok_or(TrellisError::TableMissing("stochastic"))?;
        let states = stoch.traceback(rng)?;
        let score = self.path_score(&states);
        Ok(TracebackPath::new(states, score))
    }
    ///
    /// Sample `n` paths with a seeded rng and count the unique ones.
    ///
    pub fn stochastic_tracebacks(&self, n: usize, seed: u64) -> Result<MultiTraceback> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut paths = MultiTraceback::new();
        for _ in 0..n {
            paths.push(self.stochastic_traceback(&mut rng)?);
        }
        paths.finalize();
        info!(
            "stochastic tracebacks n={} unique={}",
            paths.n_samples(),
            paths.n_unique()
        );
        Ok(paths)
    }
    ///
    /// `stochastic_tracebacks` with `n_samples` and `seed` of the params
    ///
    pub fn sample_paths(&self) -> Result<MultiTraceback> {
        self.stochastic_tracebacks(self.params.n_samples, self.params.seed)
    }
    ///
    /// Sample one state per position from the posterior probabilities,
    /// independently of the neighboring positions. Requires `posterior`.
    ///
    /// As with `posterior_path`, the sampled path may use transitions the
    /// model does not have; its score is then zero.
    ///
    pub fn stochastic_posterior_traceback<R: Rng>(&self, rng: &mut R) -> Result<TracebackPath> {
        self.check_sequence()?;
        let post = self
            .posterior_score
            .as_ref()
            .ok_or(TrellisError::TableMissing("posterior"))?;
        let states = (0..self.seq.len())
            .map(|position| {
                let choices: Vec<(StateId, Prob)> = post
                    .row(position)
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, p)| !p.is_zero())
                    .collect();
                choices
                    .choose_weighted(&mut *rng, |(_, p)| p.to_value())
                    .map(|&(s, _)| s)
                    .map_err(|_| TrellisError::NoPath { position })
            })
            .collect::<Result<Vec<StateId>>>()?;
        let score = self.path_score(&states);
        Ok(TracebackPath::new(states, score))
    }
    ///
    /// `n` posterior samples with a seeded rng
    ///
    pub fn stochastic_posterior_tracebacks(&self, n: usize, seed: u64) -> Result<MultiTraceback> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut paths = MultiTraceback::new();
        for _ in 0..n {
            paths.push(self.stochastic_posterior_traceback(&mut rng)?);
        }
        paths.finalize();
        info!(
            "stochastic posterior tracebacks n={} unique={}",
            paths.n_samples(),
            paths.n_unique()
        );
        Ok(paths)
    }
}

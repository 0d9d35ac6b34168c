//!
//! Decoded state paths
//!
//! * `TracebackPath`: a single path with its joint log probability
//! * `MultiTraceback`: counts of unique paths among many sampled paths
//!
use crate::model::{HmmModel, StateId};
use crate::prob::Prob;
use fnv::FnvHashMap;
use itertools::Itertools;

///
/// State path, oldest (position 0) first.
///
#[derive(Debug, Clone, PartialEq)]
pub struct TracebackPath {
    states: Vec<StateId>,
    score: Prob,
}

impl TracebackPath {
    pub fn new(states: Vec<StateId>, score: Prob) -> TracebackPath {
        TracebackPath { states, score }
    }
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
    pub fn states(&self) -> &[StateId] {
        &self.states
    }
    /// joint log probability of the path and the sequence
    pub fn score(&self) -> Prob {
        self.score
    }
    pub fn names<'m, M: HmmModel>(&self, model: &'m M) -> Vec<&'m str> {
        self.states.iter().map(|&s| model.state_name(s)).collect()
    }
    pub fn labels<'m, M: HmmModel>(&self, model: &'m M) -> Vec<&'m str> {
        self.states.iter().map(|&s| model.state_label(s)).collect()
    }
    ///
    /// Number of consecutive positions ending at `i` that stay in the state
    /// of position `i`.
    ///
    pub fn run_length_at(&self, i: usize) -> usize {
        let s = self.states[i];
        self.states[..=i]
            .iter()
            .rev()
            .take_while(|&&x| x == s)
            .count()
    }
    ///
    /// `(state, start, length)` of each run of identical states
    ///
    pub fn runs(&self) -> Vec<(StateId, usize, usize)> {
        let mut start = 0;
        self.states
            .iter()
            .group_by(|&&s| s)
            .into_iter()
            .map(|(s, group)| {
                let len = group.count();
                let run = (s, start, len);
                start += len;
                run
            })
            .collect()
    }
}

impl std::fmt::Display for TracebackPath {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} [{}]", self.score, self.states.iter().join(" "))
    }
}

///
/// Unique paths and their counts among sampled paths
///
#[derive(Debug, Clone, Default)]
pub struct MultiTraceback {
    counts: FnvHashMap<Vec<StateId>, (Prob, usize)>,
    sorted: Vec<(TracebackPath, usize)>,
    n_samples: usize,
}

impl MultiTraceback {
    pub fn new() -> MultiTraceback {
        MultiTraceback::default()
    }
    pub fn push(&mut self, path: TracebackPath) {
        self.n_samples += 1;
        let score = path.score;
        self.counts.entry(path.states).or_insert((score, 0)).1 += 1;
    }
    /// number of paths pushed
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }
    /// number of distinct paths
    pub fn n_unique(&self) -> usize {
        self.counts.len()
    }
    /// count of the path
    pub fn count(&self, states: &[StateId]) -> usize {
        self.counts.get(states).map(|&(_, c)| c).unwrap_or(0)
    }
    ///
    /// Sort the unique paths by count (descending), then by states.
    ///
    pub fn finalize(&mut self) {
        self.sorted = self
            .counts
            .iter()
            .map(|(states, &(score, count))| (TracebackPath::new(states.clone(), score), count))
            .sorted_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.states.cmp(&b.states)))
            .collect();
    }
    ///
    /// Unique paths with counts, available after `finalize`
    ///
    pub fn paths(&self) -> &[(TracebackPath, usize)] {
        &self.sorted
    }
    ///
    /// `heat[position][state]` = the number of sampled paths that were in
    /// `state` at `position`.
    ///
    pub fn heat_table(&self, n_positions: usize, n_states: usize) -> Vec<Vec<usize>> {
        let mut heat = vec![vec![0; n_states]; n_positions];
        for (states, &(_, count)) in self.counts.iter() {
            for (position, &s) in states.iter().enumerate().take(n_positions) {
                if s < n_states {
                    heat[position][s] += count;
                }
            }
        }
        heat
    }
}

impl std::fmt::Display for MultiTraceback {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (path, count) in self.sorted.iter() {
            writeln!(f, "{}\t{}", count, path)?;
        }
        Ok(())
    }
}

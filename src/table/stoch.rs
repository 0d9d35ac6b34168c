//!
//! StochTable: sparse table of predecessor distributions
//!
//! Filled during a Viterbi or Forward sweep with one entry per contributing
//! transition `prev -> state`, grouped by position (segment) then by state.
//! Segment `p` (`1 <= p < n_positions`) holds transitions into position
//! `p`, and the last segment `n_positions` holds transitions into END.
//!
//! `finalize` converts every `(segment, state)` group into a probability
//! distribution over the predecessors, and links each entry to the group of
//! its predecessor in the previous segment (`prev_cell`), so that sampling
//! a path never searches.
//!
use crate::error::{Result, TrellisError};
use crate::model::StateId;
use crate::prob::{log_sum_exp, Prob};
use rand::Rng;
use std::ops::Range;

///
/// Entry of `StochTable`
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochEntry {
    /// state at this position, `None` for END
    pub state: Option<StateId>,
    /// predecessor state at the previous position
    pub prev: StateId,
    /// index of the first entry of the predecessor's group, `None` when the
    /// predecessor is at position 0
    pub prev_cell: Option<usize>,
    /// log score before `finalize`, linear probability after
    pub prob: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochTable {
    n_positions: usize,
    entries: Vec<StochEntry>,
    /// `starts[q]` is the index of the first entry of segment `q`
    starts: Vec<usize>,
    /// segment being filled
    current: usize,
    finalized: bool,
}

impl StochTable {
    ///
    /// Empty table for a sequence of `n_positions`
    ///
    pub fn new(n_positions: usize) -> StochTable {
        StochTable {
            n_positions,
            entries: Vec::new(),
            starts: vec![0; n_positions + 2],
            current: 0,
            finalized: false,
        }
    }
    pub fn n_positions(&self) -> usize {
        self.n_positions
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
    pub fn entries(&self) -> &[StochEntry] {
        &self.entries
    }
    fn open_segment(&mut self, segment: usize) {
        debug_assert!(segment >= self.current);
        while self.current < segment {
            self.current += 1;
            self.starts[self.current] = self.entries.len();
        }
    }
    ///
    /// Append the transition `prev` (at `position - 1`) -> `state` (at
    /// `position`) with its log score. Entries must be pushed in
    /// increasing position, and contiguously per state.
    ///
    pub fn push(&mut self, position: usize, state: StateId, prev: StateId, score: Prob) {
        self.open_segment(position);
        self.entries.push(StochEntry {
            state: Some(state),
            prev,
            prev_cell: None,
            prob: score.to_log_value(),
        });
    }
    ///
    /// Append the transition from `prev` at the last position into END.
    ///
    pub fn push_end(&mut self, prev: StateId, score: Prob) {
        self.open_segment(self.n_positions);
        self.entries.push(StochEntry {
            state: None,
            prev,
            prev_cell: None,
            prob: score.to_log_value(),
        });
    }
    /// Entry range of segment `q`
    pub fn segment(&self, q: usize) -> Range<usize> {
        self.starts[q]..self.starts[q + 1]
    }
    ///
    /// Ranges of the contiguous same-state groups of segment `q`
    ///
    pub fn groups(&self, q: usize) -> Vec<Range<usize>> {
        let seg = self.segment(q);
        let mut groups = Vec::new();
        let mut start = seg.start;
        for i in seg.clone() {
            if i + 1 == seg.end || self.entries[i + 1].state != self.entries[start].state {
                groups.push(start..i + 1);
                start = i + 1;
            }
        }
        groups
    }
    ///
    /// Normalize every group into a distribution and link the entries to
    /// their predecessor groups. Calling twice is a no-op.
    ///
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.open_segment(self.n_positions + 1);

        for q in 1..=self.n_positions {
            for g in self.groups(q) {
                let scores: Vec<f64> = self.entries[g.clone()].iter().map(|e| e.prob).collect();
                let total = log_sum_exp(&scores);
                for e in self.entries[g].iter_mut() {
                    e.prob = (e.prob - total).exp();
                }
            }
            if q >= 2 {
                // group heads of the previous segment, found by linear scan
                let heads: Vec<(Option<StateId>, usize)> = self
                    .groups(q - 1)
                    .into_iter()
                    .map(|g| (self.entries[g.start].state, g.start))
                    .collect();
                for i in self.segment(q) {
                    let prev = Some(self.entries[i].prev);
                    self.entries[i].prev_cell = heads
                        .iter()
                        .find(|(state, _)| *state == prev)
                        .map(|&(_, head)| head);
                }
            }
        }
        self.finalized = true;
    }
    ///
    /// Pick an entry of the group starting at `head`, with probability
    /// proportional to `prob`. When rounding leaves the cumulative sum
    /// below the draw, the last entry of the group is picked.
    ///
    fn pick<R: Rng>(&self, head: usize, end: usize, rng: &mut R) -> usize {
        let state = self.entries[head].state;
        let u: f64 = rng.gen();
        let mut acc = 0.0;
        let mut last = head;
        for i in head..end {
            if self.entries[i].state != state {
                break;
            }
            acc += self.entries[i].prob;
            last = i;
            if acc > u {
                return i;
            }
        }
        last
    }
    ///
    /// Sample a path from END back to position 0.
    /// Returns the states oldest-first.
    ///
    pub fn traceback<R: Rng>(&self, rng: &mut R) -> Result<Vec<StateId>> {
        if !self.finalized {
            return Err(TrellisError::NotFinalized);
        }
        if self.n_positions == 0 {
            return Err(TrellisError::EmptySequence);
        }
        let end = self.segment(self.n_positions);
        if end.is_empty() {
            return Err(TrellisError::Unreachable);
        }

        let mut path = Vec::with_capacity(self.n_positions);
        let mut i = self.pick(end.start, end.end, rng);
        path.push(self.entries[i].prev);
        let mut q = self.n_positions;
        while q > 1 {
            let head = self.entries[i]
                .prev_cell
                .ok_or(TrellisError::TracebackCorrupt {
                    position: q - 1,
                    state: self.entries[i].prev,
                })?;
            q -= 1;
            i = self.pick(head, self.segment(q).end, rng);
            path.push(self.entries[i].prev);
        }
        path.reverse();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256PlusPlus;

    /// three positions, two states
    fn small_table() -> StochTable {
        let mut t = StochTable::new(3);
        // position 1
        t.push(1, 0, 0, p(0.1));
        t.push(1, 0, 1, p(0.3));
        t.push(1, 1, 1, p(0.2));
        // position 2
        t.push(2, 0, 1, p(0.05));
        t.push(2, 1, 0, p(0.01));
        t.push(2, 1, 1, p(0.03));
        // END
        t.push_end(0, p(0.5));
        t.push_end(1, p(0.5));
        t
    }

    #[test]
    fn finalize_normalizes_groups() {
        let mut t = small_table();
        assert!(!t.is_finalized());
        t.finalize();
        t.finalize();
        assert_eq!(t.segment(1), 0..3);
        assert_eq!(t.segment(2), 3..6);
        assert_eq!(t.segment(3), 6..8);
        assert_eq!(t.groups(2), vec![3..4, 4..6]);
        for q in 1..=3 {
            for g in t.groups(q) {
                let s: f64 = t.entries()[g].iter().map(|e| e.prob).sum();
                assert_abs_diff_eq!(s, 1.0, epsilon = 1e-6);
            }
        }
        let e = t.entries();
        assert_abs_diff_eq!(e[0].prob, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(e[1].prob, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(e[2].prob, 1.0, epsilon = 1e-12);
        // position 1 entries have predecessors at position 0
        assert_eq!(e[0].prev_cell, None);
        // (2, state 0) <- 1 : group of state 1 at position 1 starts at 2
        assert_eq!(e[3].prev_cell, Some(2));
        assert_eq!(e[4].prev_cell, Some(0));
        // END <- 1 : group of state 1 at position 2 starts at 4
        assert_eq!(e[7].prev_cell, Some(4));
        assert_eq!(e[6].prev_cell, Some(3));
    }

    #[test]
    fn traceback_requires_finalize() {
        let t = small_table();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert!(matches!(t.traceback(&mut rng), Err(TrellisError::NotFinalized)));
    }

    #[test]
    fn traceback_is_consistent_with_entries() {
        let mut t = small_table();
        t.finalize();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut counts = [0usize; 2];
        for _ in 0..2000 {
            let path = t.traceback(&mut rng).unwrap();
            assert_eq!(path.len(), 3);
            // (state at 2) == 0 must have come from 1
            if path[2] == 0 {
                assert_eq!(path[1], 1);
            }
            if path[1] == 1 && path[2] == 0 {
                counts[path[0]] += 1;
            }
        }
        // state 0 at position 1 is entered from 0 or 1 with 0.25 : 0.75,
        // but path[1] == 1 here, whose only predecessor is 1
        assert_eq!(counts[0], 0);
        assert!(counts[1] > 0);
    }

    #[test]
    fn unreachable_end() {
        let mut t = StochTable::new(2);
        t.push(1, 0, 0, p(0.5));
        t.finalize();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert!(matches!(t.traceback(&mut rng), Err(TrellisError::Unreachable)));
    }
}

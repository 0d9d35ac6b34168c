//!
//! Path reconstruction from the Viterbi, Nth-best and Posterior tables
//!
//! Paths are returned oldest-first. A traceback that meets an unset cell
//! before reaching position 0 is rejected as a whole.
//!
use super::duration::held_on_path;
use super::Trellis;
use crate::error::{Result, TrellisError};
use crate::model::{HmmModel, StateId};
use crate::path::TracebackPath;
use crate::prob::Prob;

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Most probable path. Requires `viterbi`.
    ///
    pub fn traceback(&self) -> Result<TracebackPath> {
        self.check_sequence()?;
        let tb = self
            .traceback_table
            .as_ref()
            .ok_or(TrellisError::TableMissing("viterbi"))?;
        let (score, last_state) = self.ending_viterbi.ok_or(TrellisError::Unreachable)?;

        let len = self.seq.len();
        let mut states = Vec::with_capacity(len);
        let mut state = last_state;
        states.push(state);
        for position in (1..len).rev() {
            state = tb
                .get(position, state)
                .ok_or(TrellisError::TracebackCorrupt { position, state })?;
            states.push(state);
        }
        states.reverse();
        Ok(TracebackPath::new(states, score))
    }
    ///
    /// Path of rank `rank` (0 = best). Requires `nth_viterbi`.
    ///
    pub fn nth_traceback(&self, rank: usize) -> Result<TracebackPath> {
        self.check_sequence()?;
        let table = self
            .nbest_table
            .as_ref()
            .ok_or(TrellisError::TableMissing("nth-best"))?;
        let ending = table.ending();
        let top = ending.get(rank).ok_or(TrellisError::InvalidRank {
            requested: rank,
            available: ending.len(),
        })?;

        let len = self.seq.len();
        let mut states = Vec::with_capacity(len);
        let mut state = top
            .prev_state
            .ok_or(TrellisError::TracebackCorrupt {
                position: len - 1,
                state: 0,
            })?;
        let mut r = top.prev_rank;
        states.push(state);
        for position in (1..len).rev() {
            let c = table
                .get(position, state)
                .get(r)
                .ok_or(TrellisError::TracebackCorrupt { position, state })?;
            state = c
                .prev_state
                .ok_or(TrellisError::TracebackCorrupt { position, state })?;
            r = c.prev_rank;
            states.push(state);
        }
        states.reverse();
        Ok(TracebackPath::new(states, top.score))
    }
    ///
    /// All ranked paths, best first. Requires `nth_viterbi`.
    ///
    pub fn nth_tracebacks(&self) -> Result<Vec<TracebackPath>> {
        let n = self
            .nbest_table
            .as_ref()
            .ok_or(TrellisError::TableMissing("nth-best"))?
            .ending()
            .len();
        (0..n).map(|rank| self.nth_traceback(rank)).collect()
    }
    ///
    /// Path of the most probable state at each position (posterior
    /// decoding), scored with `path_score`. Requires `posterior`.
    ///
    /// The path may contain transitions that the model does not allow, in
    /// which case its score is zero.
    ///
    pub fn posterior_path(&self) -> Result<TracebackPath> {
        self.check_sequence()?;
        let post = self
            .posterior_score
            .as_ref()
            .ok_or(TrellisError::TableMissing("posterior"))?;
        let states = (0..self.seq.len())
            .map(|position| {
                post.argmax(position)
                    .map(|(s, _)| s)
                    .ok_or(TrellisError::NoPath { position })
            })
            .collect::<Result<Vec<StateId>>>()?;
        let score = self.path_score(&states);
        Ok(TracebackPath::new(states, score))
    }
    ///
    /// Joint probability of the sequence and the given state path
    /// (oldest-first), INIT and END transitions included.
    ///
    pub fn path_score(&self, states: &[StateId]) -> Prob {
        if states.is_empty() || states.len() != self.seq.len() {
            return Prob::zero();
        }
        let first = states[0];
        let mut score = self.model.init_transition(first) * self.emission_at(first, 0);
        for position in 1..states.len() {
            let (from, to) = (states[position - 1], states[position]);
            let held = match self.model.duration_rule(from, to) {
                Some(rule) => held_on_path(self.model, states, position - 1, rule),
                None => 1,
            };
            score *= self.model.transition(from, to, self.seq, position, held)
                * self.emission_at(to, position);
        }
        let last = states[states.len() - 1];
        score * self.model.end_transition(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::mock_coin;
    use crate::params::TrellisParams;

    #[test]
    fn traceback_before_viterbi_is_an_error() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HHT").unwrap();
        let t = Trellis::new(&m, &seq, TrellisParams::default());
        assert!(matches!(t.traceback(), Err(TrellisError::TableMissing(_))));
        assert!(matches!(t.nth_traceback(0), Err(TrellisError::TableMissing(_))));
        assert!(matches!(t.posterior_path(), Err(TrellisError::TableMissing(_))));
    }

    #[test]
    fn traceback_score_is_path_score() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HHTTHTHHHT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        let ending = t.viterbi().unwrap();
        let path = t.traceback().unwrap();
        assert_eq!(path.len(), seq.len());
        assert_abs_diff_eq!(path.score(), ending, epsilon = 1e-12);
        assert_abs_diff_eq!(t.path_score(path.states()), ending, epsilon = 1e-9);
        assert!(t.path_score(&[0, 1]).is_zero());
    }

    #[test]
    fn corrupt_traceback_is_rejected() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HHT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        t.viterbi().unwrap();
        // overwrite with an empty table: every cell is unset
        t.traceback_table = Some(crate::table::TracebackTable::new(3, 2));
        assert!(matches!(
            t.traceback(),
            Err(TrellisError::TracebackCorrupt { position: 2, .. })
        ));
    }

    #[test]
    fn nth_rank_out_of_range() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        t.nth_viterbi(10).unwrap();
        // 2 states, 2 positions: 4 paths
        assert_eq!(t.nth_tracebacks().unwrap().len(), 4);
        match t.nth_traceback(4) {
            Err(TrellisError::InvalidRank {
                requested,
                available,
            }) => {
                assert_eq!(requested, 4);
                assert_eq!(available, 4);
            }
            r => panic!("unexpected {:?}", r),
        }
        assert!(t.nth_viterbi(0).is_err());
    }
}

//!
//! Nth-best Viterbi
//!
//! Each cell keeps the `n` best `(score, prev_state, prev_rank)`, taken
//! from the cross product of the incoming transitions and the ranked lists
//! of the predecessors.
//!
use super::Trellis;
use crate::bitset::BitSet;
use crate::error::{Result, TrellisError};
use crate::model::HmmModel;
use crate::prob::Prob;
use crate::table::{NBestTable, NthScore};
use log::{debug, info, warn};

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Run Nth-best Viterbi keeping `n` paths per cell. Returns the score
    /// of the best path.
    ///
    /// Duration-dependent transitions use the held lengths of the Viterbi
    /// path.
    ///
    pub fn nth_viterbi(&mut self, n: usize) -> Result<Prob> {
        self.check_sequence()?;
        if n == 0 {
            return Err(TrellisError::InvalidRank {
                requested: 0,
                available: 0,
            });
        }
        self.ensure_viterbi_for_durations()?;
        info!(
            "nth viterbi n={} n_states={} length={}",
            n,
            self.model.n_states(),
            self.seq.len()
        );
        let table = self.nth_sweep(n)?;
        let best = table.ending()[0].score;
        info!("nth viterbi best={} n_paths={}", best, table.ending().len());
        self.nbest_table = Some(table);
        Ok(best)
    }
    fn nth_sweep(&self, n: usize) -> Result<NBestTable> {
        let n_states = self.model.n_states();
        let len = self.seq.len();
        let durations = self.duration_tables();
        let mut table = NBestTable::new(len, n_states, n);

        // position 0
        let mut reachable = BitSet::new(n_states);
        let mut n_active = 0;
        for s in self.candidates(self.model.init_to()) {
            let v = self.model.init_transition(s) * self.emission_at(s, 0);
            if !v.is_zero() {
                table.set(0, s, vec![NthScore::new(v, None, 0)]);
                n_active += 1;
                reachable.union_with(self.model.to_states(s))?;
            }
        }
        if n_active == 0 {
            return Err(TrellisError::NoPath { position: 0 });
        }

        for position in 1..len {
            let mut next_reachable = BitSet::new(n_states);
            let mut n_active = 0;
            for s in self.candidates(&reachable) {
                let e = self.emission_at(s, position);
                if e.is_zero() {
                    continue;
                }
                let mut candidates = Vec::new();
                for prev in self.model.from_states(s).ones() {
                    let list = table.get(position - 1, prev);
                    if list.is_empty() {
                        continue;
                    }
                    let t = self.transition_at(prev, s, position, durations);
                    if t.is_zero() {
                        continue;
                    }
                    candidates.extend(
                        list.iter()
                            .enumerate()
                            .map(|(rank, c)| NthScore::new(c.score * t * e, Some(prev), rank)),
                    );
                }
                if !candidates.is_empty() {
                    table.set(position, s, candidates);
                    n_active += 1;
                    next_reachable.union_with(self.model.to_states(s))?;
                }
            }
            debug!("nth viterbi position={} active={}", position, n_active);
            if n_active == 0 {
                warn!("nth viterbi no state at position {}", position);
                return Err(TrellisError::NoPath { position });
            }
            reachable = next_reachable;
        }

        // END
        let last = len - 1;
        let mut candidates = Vec::new();
        for s in self.model.end_from().ones() {
            let end = self.model.end_transition(s);
            if end.is_zero() {
                continue;
            }
            candidates.extend(
                table
                    .get(last, s)
                    .iter()
                    .enumerate()
                    .map(|(rank, c)| NthScore::new(c.score * end, Some(s), rank)),
            );
        }
        if candidates.is_empty() {
            warn!("nth viterbi END is unreachable");
            return Err(TrellisError::Unreachable);
        }
        table.set_ending(candidates);
        Ok(table)
    }
}

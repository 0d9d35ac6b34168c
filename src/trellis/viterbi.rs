//!
//! Viterbi algorithm
//!
//! ```text
//! v[0][s] = init(s) e(s,0)
//! v[p][s] = max_{s'} v[p-1][s'] t(s',s,p) e(s,p)
//! end     = max_{s}  v[N-1][s] end(s)
//! ```
//!
//! Score columns are computed into two buffers swapped at each position.
//!
use super::Trellis;
use crate::bitset::BitSet;
use crate::error::{Result, TrellisError};
use crate::model::{HmmModel, StateId};
use crate::prob::Prob;
use crate::table::{DurationTable, ScoreTable, StochTable, TracebackTable};
use log::{debug, info, warn};

/// Tables of a Viterbi sweep
pub(super) struct ViterbiSweep {
    pub scores: ScoreTable,
    pub traceback: TracebackTable,
    pub duration: Option<DurationTable>,
    pub active: Vec<BitSet>,
    pub ending: Prob,
    pub ending_state: StateId,
}

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Run Viterbi and return the score of the most probable path.
    ///
    /// For non-basic models the run length of each cell is tracked in the
    /// `DurationTable`, and duration-dependent transitions are evaluated
    /// with the held length of the predecessor.
    ///
    pub fn viterbi(&mut self) -> Result<Prob> {
        self.check_sequence()?;
        info!(
            "viterbi n_states={} length={} pruning={}",
            self.model.n_states(),
            self.seq.len(),
            self.params.pruning
        );
        let r = self.viterbi_sweep(None)?;
        self.store_viterbi(r);
        let (ending, _) = self.ending_viterbi.ok_or(TrellisError::Unreachable)?;
        info!("viterbi ending={}", ending);
        Ok(ending)
    }
    ///
    /// Run Viterbi, also recording every contributing transition into a
    /// `StochTable` for sampling paths proportional to the score of their
    /// best prefix.
    ///
    pub fn stochastic_viterbi(&mut self) -> Result<Prob> {
        self.check_sequence()?;
        info!(
            "stochastic viterbi n_states={} length={}",
            self.model.n_states(),
            self.seq.len()
        );
        let mut stoch = StochTable::new(self.seq.len());
        let r = self.viterbi_sweep(Some(&mut stoch))?;
        stoch.finalize();
        debug!("stoch table entries={}", stoch.len());
        let ending = r.ending;
        self.store_viterbi(r);
        self.stoch_table = Some(stoch);
        Ok(ending)
    }
    fn store_viterbi(&mut self, r: ViterbiSweep) {
        self.viterbi_score = Some(r.scores);
        self.traceback_table = Some(r.traceback);
        self.duration_table = r.duration;
        self.active_sets = Some(r.active);
        self.ending_viterbi = Some((r.ending, r.ending_state));
    }
    pub(super) fn viterbi_sweep(&self, mut stoch: Option<&mut StochTable>) -> Result<ViterbiSweep> {
        let n = self.model.n_states();
        let len = self.seq.len();
        let mut scores = ScoreTable::new(len, n);
        let mut traceback = TracebackTable::new(len, n);
        let mut duration = if self.model.is_basic() {
            None
        } else {
            Some(DurationTable::new(len, n))
        };
        let mut active_sets = Vec::with_capacity(len);

        let mut previous = vec![Prob::zero(); n];
        let mut current = vec![Prob::zero(); n];

        // position 0
        let mut reachable = BitSet::new(n);
        let mut active = BitSet::new(n);
        for s in self.candidates(self.model.init_to()) {
            let v = self.model.init_transition(s) * self.emission_at(s, 0);
            if !v.is_zero() {
                current[s] = v;
                active.set(s)?;
                reachable.union_with(self.model.to_states(s))?;
            }
        }
        if active.none() {
            warn!("viterbi no state at position 0");
            return Err(TrellisError::NoPath { position: 0 });
        }
        scores.row_mut(0).copy_from_slice(&current);
        active_sets.push(active);

        for position in 1..len {
            std::mem::swap(&mut previous, &mut current);
            for x in current.iter_mut() {
                *x = Prob::zero();
            }
            let mut next_reachable = BitSet::new(n);
            let mut active = BitSet::new(n);

            for s in self.candidates(&reachable) {
                let e = self.emission_at(s, position);
                if e.is_zero() {
                    continue;
                }
                let mut best = Prob::zero();
                let mut best_prev = None;
                for prev in self.model.from_states(s).ones() {
                    if previous[prev].is_zero() {
                        continue;
                    }
                    let ctx = duration.as_ref().map(|d| (&traceback, d));
                    let t = self.transition_at(prev, s, position, ctx);
                    if t.is_zero() {
                        continue;
                    }
                    let v = previous[prev] * t * e;
                    if let Some(st) = stoch.as_deref_mut() {
                        st.push(position, s, prev, v);
                    }
                    if v > best {
                        best = v;
                        best_prev = Some(prev);
                    }
                }
                if let Some(prev) = best_prev {
                    current[s] = best;
                    traceback.set(position, s, prev);
                    if let Some(d) = duration.as_mut() {
                        let run = if prev == s {
                            d.get(position - 1, s) + 1
                        } else {
                            0
                        };
                        d.set(position, s, run);
                    }
                    active.set(s)?;
                    next_reachable.union_with(self.model.to_states(s))?;
                }
            }

            debug!("viterbi position={} active={}", position, active.count());
            if active.none() {
                warn!("viterbi no state at position {}", position);
                return Err(TrellisError::NoPath { position });
            }
            scores.row_mut(position).copy_from_slice(&current);
            active_sets.push(active);
            reachable = next_reachable;
        }

        // END
        let mut ending = Prob::zero();
        let mut ending_state = None;
        for s in self.model.end_from().ones() {
            if current[s].is_zero() {
                continue;
            }
            let v = current[s] * self.model.end_transition(s);
            if v.is_zero() {
                continue;
            }
            if let Some(st) = stoch.as_deref_mut() {
                st.push_end(s, v);
            }
            if v > ending {
                ending = v;
                ending_state = Some(s);
            }
        }
        match ending_state {
            Some(ending_state) => Ok(ViterbiSweep {
                scores,
                traceback,
                duration,
                active: active_sets,
                ending,
                ending_state,
            }),
            None => {
                warn!("viterbi END is unreachable");
                Err(TrellisError::Unreachable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::{mock_coin, mock_disconnected};
    use crate::params::TrellisParams;

    #[test]
    fn viterbi_coin_first_column() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        let ending = t.viterbi().unwrap();
        let v = t.viterbi_table().unwrap();
        // Fair: 0.5 * 0.5, Biased: 0.5 * 0.9
        assert_abs_diff_eq!(v.get(0, 0).to_value(), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(v.get(0, 1).to_value(), 0.45, epsilon = 1e-12);
        // T from Biased: max(0.25 * 0.19, 0.45 * 0.8) * 0.1
        assert_abs_diff_eq!(v.get(1, 1).to_value(), 0.45 * 0.8 * 0.1, epsilon = 1e-12);
        // T from Fair: max(0.25 * 0.8, 0.45 * 0.19) * 0.5
        assert_abs_diff_eq!(v.get(1, 0).to_value(), 0.25 * 0.8 * 0.5, epsilon = 1e-12);
        assert_eq!(t.traceback_table().unwrap().get(1, 0), Some(0));
        assert_eq!(t.traceback_table().unwrap().get(1, 1), Some(1));
        assert_abs_diff_eq!(ending.to_value(), 0.1 * 0.01, epsilon = 1e-12);
        assert_eq!(t.ending_viterbi().unwrap().1, 0);
        assert!(t.duration_table().is_none());
    }

    #[test]
    fn viterbi_disconnected_state_is_never_active() {
        let (m, a) = mock_disconnected();
        let seq = a.digitize(b"0110100111010").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        t.viterbi().unwrap();
        let c = m.state_id("C").unwrap();
        for active in t.active_sets().unwrap() {
            assert!(!active.contains(c));
        }
        let tb = t.traceback_table().unwrap();
        let v = t.viterbi_table().unwrap();
        for position in 0..seq.len() {
            assert!(!tb.is_set(position, c));
            assert!(v.get(position, c).is_zero());
        }
    }

    #[test]
    fn viterbi_no_path_when_a_symbol_cannot_be_emitted() {
        let mut b = crate::model::GraphModelBuilder::new();
        let x = b.add_state("x", "X", &[1.0, 0.0], 1.0, 0.1);
        b.add_standard(x, x, 0.9).unwrap();
        let m = b.build().unwrap();
        let seq = crate::model::Sequence::new(vec![0, 0, 1, 0]);
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        match t.viterbi() {
            Err(TrellisError::NoPath { position }) => assert_eq!(position, 2),
            r => panic!("unexpected {:?}", r),
        }
        assert!(t.viterbi_table().is_none());
    }
}

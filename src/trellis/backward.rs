//!
//! Backward algorithm
//!
//! ```text
//! b[N-1][s] = end(s)
//! b[p][s]   = sum_{t} t(s,t,p+1) e(t,p+1) b[p+1][t]
//! P(x)      = sum_{s} init(s) e(s,0) b[0][s]
//! ```
//!
//! Sweeps positions in reverse, the active states of a position being the
//! sources (`from_states`) of the states with non-zero score at the next
//! position.
//!
use super::Trellis;
use crate::bitset::BitSet;
use crate::error::{Result, TrellisError};
use crate::model::HmmModel;
use crate::prob::Prob;
use crate::table::ScoreTable;
use log::{debug, info, warn};

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Run Backward and return the total probability of the sequence.
    ///
    /// If Forward was already computed, both totals are compared.
    ///
    pub fn backward(&mut self) -> Result<Prob> {
        self.check_sequence()?;
        self.ensure_viterbi_for_durations()?;
        info!(
            "backward n_states={} length={} pruning={}",
            self.model.n_states(),
            self.seq.len(),
            self.params.pruning
        );
        let (table, ending) = self.backward_sweep()?;
        info!("backward ending={}", ending);
        self.check_forward_backward(self.ending_forward, Some(ending))?;
        self.backward_score = Some(table);
        self.ending_backward = Some(ending);
        Ok(ending)
    }
    fn backward_sweep(&self) -> Result<(ScoreTable, Prob)> {
        let n = self.model.n_states();
        let len = self.seq.len();
        let durations = self.duration_tables();
        let mut table = ScoreTable::new(len, n);

        // position N-1
        let last = len - 1;
        let mut reachable = BitSet::new(n);
        for s in self.candidates(self.model.end_from()) {
            let v = self.model.end_transition(s);
            if !v.is_zero() {
                table.set(last, s, v);
                reachable.union_with(self.model.from_states(s))?;
            }
        }
        if table.row(last).iter().all(|v| v.is_zero()) {
            warn!("backward END is unreachable");
            return Err(TrellisError::Unreachable);
        }

        for position in (0..last).rev() {
            let mut next_reachable = BitSet::new(n);
            let mut n_active = 0;
            for s in self.candidates(&reachable) {
                let mut sum = Prob::zero();
                for next in self.model.to_states(s).ones() {
                    let b = table.get(position + 1, next);
                    if b.is_zero() {
                        continue;
                    }
                    let t = self.transition_at(s, next, position + 1, durations);
                    let e = self.emission_at(next, position + 1);
                    sum += t * e * b;
                }
                if !sum.is_zero() {
                    table.set(position, s, sum);
                    n_active += 1;
                    next_reachable.union_with(self.model.from_states(s))?;
                }
            }
            debug!("backward position={} active={}", position, n_active);
            if n_active == 0 {
                warn!("backward no state at position {}", position);
                return Err(TrellisError::NoPath { position });
            }
            reachable = next_reachable;
        }

        // INIT
        let mut ending = Prob::zero();
        for s in self.model.init_to().ones() {
            let b = table.get(0, s);
            if b.is_zero() {
                continue;
            }
            ending += self.model.init_transition(s) * self.emission_at(s, 0) * b;
        }
        if ending.is_zero() {
            warn!("backward INIT is unreachable");
            return Err(TrellisError::Unreachable);
        }
        Ok((table, ending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::mock_coin;
    use crate::params::TrellisParams;

    #[test]
    fn backward_coin_by_hand() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        let total = t.backward().unwrap();
        let b = t.backward_table().unwrap();
        assert_abs_diff_eq!(b.get(1, 0).to_value(), 0.01, epsilon = 1e-12);
        // Fair at 0: (0.8 * 0.5 + 0.19 * 0.1) * 0.01
        assert_abs_diff_eq!(
            b.get(0, 0).to_value(),
            (0.8 * 0.5 + 0.19 * 0.1) * 0.01,
            epsilon = 1e-12
        );
        let forward = t.forward().unwrap();
        assert_abs_diff_eq!(total, forward, epsilon = 1e-9);
    }
}

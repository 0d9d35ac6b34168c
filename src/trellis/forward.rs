//!
//! Forward algorithm
//!
//! ```text
//! f[0][s] = init(s) e(s,0)
//! f[p][s] = sum_{s'} f[p-1][s'] t(s',s,p) e(s,p)
//! P(x)    = sum_{s}  f[N-1][s] end(s)
//! ```
//!
use super::Trellis;
use crate::bitset::BitSet;
use crate::error::{Result, TrellisError};
use crate::model::HmmModel;
use crate::prob::Prob;
use crate::table::{ScoreTable, StochTable};
use log::{debug, info, warn};

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Run Forward and return the total probability of the sequence.
    ///
    /// If Backward was already computed, both totals are compared.
    ///
    pub fn forward(&mut self) -> Result<Prob> {
        self.check_sequence()?;
        self.ensure_viterbi_for_durations()?;
        info!(
            "forward n_states={} length={} pruning={}",
            self.model.n_states(),
            self.seq.len(),
            self.params.pruning
        );
        let (table, ending) = self.forward_sweep(None)?;
        info!("forward ending={}", ending);
        self.check_forward_backward(Some(ending), self.ending_backward)?;
        self.forward_score = Some(table);
        self.ending_forward = Some(ending);
        Ok(ending)
    }
    ///
    /// Run Forward, also recording every contributing transition into a
    /// `StochTable`. Paths sampled from it follow the posterior
    /// distribution of paths.
    ///
    pub fn stochastic_forward(&mut self) -> Result<Prob> {
        self.check_sequence()?;
        self.ensure_viterbi_for_durations()?;
        info!(
            "stochastic forward n_states={} length={}",
            self.model.n_states(),
            self.seq.len()
        );
        let mut stoch = StochTable::new(self.seq.len());
        let (table, ending) = self.forward_sweep(Some(&mut stoch))?;
        stoch.finalize();
        debug!("stoch table entries={}", stoch.len());
        self.check_forward_backward(Some(ending), self.ending_backward)?;
        self.forward_score = Some(table);
        self.ending_forward = Some(ending);
        self.stoch_table = Some(stoch);
        Ok(ending)
    }
    fn forward_sweep(&self, mut stoch: Option<&mut StochTable>) -> Result<(ScoreTable, Prob)> {
        let n = self.model.n_states();
        let len = self.seq.len();
        let durations = self.duration_tables();
        let mut table = ScoreTable::new(len, n);

        // position 0
        let mut reachable = BitSet::new(n);
        for s in self.candidates(self.model.init_to()) {
            let v = self.model.init_transition(s) * self.emission_at(s, 0);
            if !v.is_zero() {
                table.set(0, s, v);
                reachable.union_with(self.model.to_states(s))?;
            }
        }
        if table.row(0).iter().all(|v| v.is_zero()) {
            return Err(TrellisError::NoPath { position: 0 });
        }

        for position in 1..len {
            let mut next_reachable = BitSet::new(n);
            let mut n_active = 0;
            for s in self.candidates(&reachable) {
                let e = self.emission_at(s, position);
                if e.is_zero() {
                    continue;
                }
                let mut sum = Prob::zero();
                for prev in self.model.from_states(s).ones() {
                    let f = table.get(position - 1, prev);
                    if f.is_zero() {
                        continue;
                    }
                    let t = self.transition_at(prev, s, position, durations);
                    if t.is_zero() {
                        continue;
                    }
                    let v = f * t * e;
                    if let Some(st) = stoch.as_deref_mut() {
                        st.push(position, s, prev, v);
                    }
                    sum += v;
                }
                if !sum.is_zero() {
                    table.set(position, s, sum);
                    n_active += 1;
                    next_reachable.union_with(self.model.to_states(s))?;
                }
            }
            debug!("forward position={} active={}", position, n_active);
            if n_active == 0 {
                warn!("forward no state at position {}", position);
                return Err(TrellisError::NoPath { position });
            }
            reachable = next_reachable;
        }

        // END
        let last = len - 1;
        let mut ending = Prob::zero();
        for s in self.model.end_from().ones() {
            let f = table.get(last, s);
            if f.is_zero() {
                continue;
            }
            let v = f * self.model.end_transition(s);
            if v.is_zero() {
                continue;
            }
            if let Some(st) = stoch.as_deref_mut() {
                st.push_end(s, v);
            }
            ending += v;
        }
        if ending.is_zero() {
            warn!("forward END is unreachable");
            return Err(TrellisError::Unreachable);
        }
        Ok((table, ending))
    }
    ///
    /// Compare the totals of Forward and Backward, if both exist.
    ///
    pub(super) fn check_forward_backward(
        &self,
        forward: Option<Prob>,
        backward: Option<Prob>,
    ) -> Result<()> {
        if let (Some(f), Some(b)) = (forward, backward) {
            let diff = (f.to_log_value() - b.to_log_value()).abs();
            if diff > self.params.fb_tolerance {
                warn!(
                    "forward ({}) and backward ({}) disagree by {}",
                    f, b, diff
                );
                return Err(TrellisError::ForwardBackwardMismatch {
                    forward: f.to_log_value(),
                    backward: b.to_log_value(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::mock_coin;
    use crate::params::TrellisParams;

    #[test]
    fn forward_coin_by_hand() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        let total = t.forward().unwrap();
        let f0 = [0.25, 0.45];
        let f1 = [
            (f0[0] * 0.8 + f0[1] * 0.19) * 0.5,
            (f0[0] * 0.19 + f0[1] * 0.8) * 0.1,
        ];
        let f = t.forward_table().unwrap();
        assert_abs_diff_eq!(f.get(0, 0).to_value(), f0[0], epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(1, 0).to_value(), f1[0], epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(1, 1).to_value(), f1[1], epsilon = 1e-12);
        assert_abs_diff_eq!(
            total.to_value(),
            (f1[0] + f1[1]) * 0.01,
            epsilon = 1e-12
        );
    }
}

//!
//! Posterior probabilities
//!
//! `post[p][s] = f[p][s] b[p][s] / P(x)`
//!
use super::Trellis;
use crate::error::{Result, TrellisError};
use crate::model::HmmModel;
use crate::prob::Prob;
use crate::table::ScoreTable;
use log::info;

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Compute the posterior table, running Forward and Backward first if
    /// they are missing. Returns the total probability of the sequence.
    ///
    pub fn posterior(&mut self) -> Result<Prob> {
        self.check_sequence()?;
        if self.forward_score.is_none() {
            self.forward()?;
        }
        if self.backward_score.is_none() {
            self.backward()?;
        }
        self.check_forward_backward(self.ending_forward, self.ending_backward)?;

        let (f, b, total) = match (
            &self.forward_score,
            &self.backward_score,
            self.ending_forward,
        ) {
            (Some(f), Some(b), Some(total)) => (f, b, total),
            _ => return Err(TrellisError::TableMissing("forward/backward")),
        };
        let n = self.model.n_states();
        let len = self.seq.len();
        let mut post = ScoreTable::new(len, n);
        for position in 0..len {
            for (s, (&fs, &bs)) in f.row(position).iter().zip(b.row(position)).enumerate() {
                if !fs.is_zero() && !bs.is_zero() {
                    post.set(position, s, fs * bs / total);
                }
            }
        }
        info!("posterior total={}", total);
        self.posterior_score = Some(post);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::mock_coin;
    use crate::params::TrellisParams;

    #[test]
    fn posterior_runs_forward_and_backward() {
        let (m, a) = mock_coin();
        let seq = a.digitize(b"HHTHT").unwrap();
        let mut t = Trellis::new(&m, &seq, TrellisParams::default());
        let total = t.posterior().unwrap();
        assert!(t.forward_table().is_some());
        assert!(t.backward_table().is_some());
        assert_abs_diff_eq!(total, t.ending_backward().unwrap(), epsilon = 1e-9);
        let post = t.posterior_table().unwrap();
        for position in 0..seq.len() {
            let s: f64 = post.row(position).iter().map(|p| p.to_value()).sum();
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-9);
        }
    }
}

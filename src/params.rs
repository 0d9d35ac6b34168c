//!
//! TrellisParams: configuration of the decoding engine
//!
use crate::error::Result;
use serde::{Deserialize, Serialize};

///
/// Parameters of `Trellis`
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisParams {
    ///
    /// restrict each column to the states reachable from the previous
    /// column (`true`), or evaluate every state at every position (`false`)
    pub pruning: bool,
    ///
    /// maximum allowed difference (log-space) between the total probability
    /// of Forward and Backward
    pub fb_tolerance: f64,
    ///
    /// number of paths kept per cell in Nth-best Viterbi
    pub n_best: usize,
    ///
    /// number of stochastic tracebacks drawn by `stochastic_tracebacks`
    pub n_samples: usize,
    ///
    /// seed of the rng used for stochastic tracebacks
    pub seed: u64,
}

impl Default for TrellisParams {
    fn default() -> Self {
        TrellisParams {
            pruning: true,
            fb_tolerance: 1e-6,
            n_best: 1,
            n_samples: 100,
            seed: 0,
        }
    }
}

impl TrellisParams {
    ///
    /// Params without active-state pruning
    ///
    pub fn naive() -> TrellisParams {
        TrellisParams {
            pruning: false,
            ..TrellisParams::default()
        }
    }
    /// Parse params from a json string. Missing fields take default values.
    pub fn from_json_str(s: &str) -> Result<TrellisParams> {
        Ok(serde_json::from_str(s)?)
    }
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl std::fmt::Display for TrellisParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "pruning: {}", self.pruning)?;
        writeln!(f, "fb_tolerance: {}", self.fb_tolerance)?;
        writeln!(f, "n_best: {}", self.n_best)?;
        writeln!(f, "n_samples: {}", self.n_samples)?;
        writeln!(f, "seed: {}", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_json() {
        let p = TrellisParams {
            n_best: 5,
            seed: 11,
            ..TrellisParams::naive()
        };
        let s = p.to_json_string().unwrap();
        let q = TrellisParams::from_json_str(&s).unwrap();
        assert_eq!(p, q);

        let partial = TrellisParams::from_json_str(r#"{"n_best": 3}"#).unwrap();
        assert_eq!(partial.n_best, 3);
        assert!(partial.pruning);
        assert_eq!(partial.n_samples, 100);

        assert!(TrellisParams::from_json_str("{ not json").is_err());
    }

    #[test]
    fn params_display() {
        let s = TrellisParams::default().to_string();
        assert!(s.contains("pruning: true"));
        assert!(s.contains("n_best: 1"));
    }
}

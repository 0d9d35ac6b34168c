//!
//! Transition kinds of `GraphModel` edges
//!
use crate::prob::Prob;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// Where the traceback walk that measures a duration stops.
///
/// The held length of a state at position `p` is the number of positions
/// `p, p-1, ...` on the Viterbi path before the walk reaches a state
/// satisfying the stop condition.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationRule {
    /// until a state different from the starting one
    DiffState,
    /// until the beginning of the sequence
    StartInit,
    /// until a state with this name
    StateName(String),
    /// until a state with this label
    StateLabel(String),
}

///
/// Transition probability of an edge
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    /// constant probability
    Standard(Prob),
    ///
    /// Probability depends on how long the source state has been held.
    /// `probs[held - 1]`; the last value applies to all longer durations.
    Duration {
        probs: Vec<Prob>,
        rule: DurationRule,
    },
    ///
    /// Constant probability times the score of a registered function
    /// (`SegmentFunctions`) over the symbols emitted while the source
    /// state was held. `rule` decides how far back the segment starts.
    External {
        prob: Prob,
        function: String,
        rule: DurationRule,
    },
}

impl Transition {
    ///
    /// Probability of the transition after the source state was held for
    /// `held` positions.
    ///
    pub fn prob(&self, held: usize) -> Prob {
        match self {
            Transition::Standard(p) => *p,
            Transition::External { prob, .. } => *prob,
            Transition::Duration { probs, .. } => {
                let i = held.max(1) - 1;
                probs
                    .get(i)
                    .or_else(|| probs.last())
                    .copied()
                    .unwrap_or_else(Prob::zero)
            }
        }
    }
    pub fn rule(&self) -> Option<&DurationRule> {
        match self {
            Transition::Standard(_) => None,
            Transition::Duration { rule, .. } => Some(rule),
            Transition::External { rule, .. } => Some(rule),
        }
    }
    pub fn is_duration(&self) -> bool {
        matches!(self, Transition::Duration { .. })
    }
    /// name of the registered function of an `External` transition
    pub fn function(&self) -> Option<&str> {
        match self {
            Transition::External { function, .. } => Some(function),
            _ => None,
        }
    }
    ///
    /// `false` if the value can be zero for every held length
    ///
    pub fn is_possible(&self) -> bool {
        match self {
            Transition::Standard(p) => !p.is_zero(),
            Transition::Duration { probs, .. } => probs.iter().any(|p| !p.is_zero()),
            Transition::External { prob, .. } => !prob.is_zero(),
        }
    }
}

/// Score of the digitized segment held by the source state
pub type SegmentFn = Arc<dyn Fn(&[u8]) -> Prob + Send + Sync>;

///
/// Named functions referred to by `Transition::External`
///
#[derive(Clone, Default)]
pub struct SegmentFunctions {
    functions: FnvHashMap<String, SegmentFn>,
}

impl SegmentFunctions {
    pub fn new() -> Self {
        SegmentFunctions::default()
    }
    /// register `f` as `name`, replacing any function of the same name
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[u8]) -> Prob + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Arc::new(f));
    }
    pub fn get(&self, name: &str) -> Option<&SegmentFn> {
        self.functions.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.functions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for SegmentFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("SegmentFunctions")
            .field("names", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;

    #[test]
    fn duration_prob_extends_last() {
        let t = Transition::Duration {
            probs: vec![p(0.9), p(0.5), p(0.1)],
            rule: DurationRule::DiffState,
        };
        assert_eq!(t.prob(1), p(0.9));
        assert_eq!(t.prob(2), p(0.5));
        assert_eq!(t.prob(3), p(0.1));
        assert_eq!(t.prob(10), p(0.1));
        assert_eq!(t.rule(), Some(&DurationRule::DiffState));
        assert!(t.is_duration());

        let s = Transition::Standard(p(0.3));
        assert_eq!(s.prob(1), p(0.3));
        assert_eq!(s.prob(100), p(0.3));
        assert_eq!(s.rule(), None);

        let empty = Transition::Duration {
            probs: vec![],
            rule: DurationRule::StartInit,
        };
        assert!(empty.prob(1).is_zero());
        assert!(!empty.is_possible());
    }

    #[test]
    fn external_uses_base_prob_and_rule() {
        let t = Transition::External {
            prob: p(0.4),
            function: "count_b".to_string(),
            rule: DurationRule::StateLabel("L".to_string()),
        };
        assert_eq!(t.prob(1), p(0.4));
        assert_eq!(t.prob(7), p(0.4));
        assert_eq!(t.function(), Some("count_b"));
        assert_eq!(t.rule(), Some(&DurationRule::StateLabel("L".to_string())));
        assert!(!t.is_duration());
        assert!(t.is_possible());

        let mut fs = SegmentFunctions::new();
        assert!(fs.is_empty());
        fs.register("count_b", |segment| {
            p(0.5f64.powi(segment.iter().filter(|&&c| c == 1).count() as i32))
        });
        assert!(fs.contains("count_b"));
        assert_eq!(fs.len(), 1);
        let f = fs.get("count_b").unwrap();
        assert_abs_diff_eq!(f(&[0, 1, 1]), p(0.25), epsilon = 1e-12);
        assert!(format!("{:?}", fs).contains("count_b"));
    }
}

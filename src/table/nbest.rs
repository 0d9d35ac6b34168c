//!
//! NBestTable for Nth-best Viterbi
//!
//! Each cell keeps up to `n` ranked candidates. A candidate points to a
//! `(state, rank)` of the previous position, so the ranked alternatives
//! form a DAG that a traceback of any rank can follow.
//!
use crate::model::StateId;
use crate::prob::Prob;

///
/// Ranked candidate of a cell
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NthScore {
    pub score: Prob,
    /// predecessor state, `None` at position 0 (INIT)
    pub prev_state: Option<StateId>,
    /// index into the predecessor cell's list
    pub prev_rank: usize,
}

impl NthScore {
    pub fn new(score: Prob, prev_state: Option<StateId>, prev_rank: usize) -> NthScore {
        NthScore {
            score,
            prev_state,
            prev_rank,
        }
    }
}

///
/// Sort descending by score and keep the best `n`.
///
/// The sort is stable, so equal scores keep their insertion order.
///
pub fn top_n(mut candidates: Vec<NthScore>, n: usize) -> Vec<NthScore> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(n);
    candidates
}

///
/// `[position][state]` lists of the `n` best candidates, and the ending
/// list folded through END transitions.
///
#[derive(Debug, Clone, PartialEq)]
pub struct NBestTable {
    n: usize,
    n_states: usize,
    cells: Vec<Vec<NthScore>>,
    ending: Vec<NthScore>,
}

impl NBestTable {
    pub fn new(n_positions: usize, n_states: usize, n: usize) -> NBestTable {
        NBestTable {
            n,
            n_states,
            cells: vec![Vec::new(); n_positions * n_states],
            ending: Vec::new(),
        }
    }
    /// Maximum number of candidates per cell
    pub fn n(&self) -> usize {
        self.n
    }
    pub fn get(&self, position: usize, state: StateId) -> &[NthScore] {
        &self.cells[position * self.n_states + state]
    }
    ///
    /// Store the best `n` of `candidates` into the cell
    ///
    pub fn set(&mut self, position: usize, state: StateId, candidates: Vec<NthScore>) {
        let n = self.n;
        self.cells[position * self.n_states + state] = top_n(candidates, n);
    }
    ///
    /// Ranked candidates of the ending cell. `prev_state` is the state at
    /// the last position.
    ///
    pub fn ending(&self) -> &[NthScore] {
        &self.ending
    }
    pub fn set_ending(&mut self, candidates: Vec<NthScore>) {
        let n = self.n;
        self.ending = top_n(candidates, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;

    #[test]
    fn top_n_is_stable_and_truncated() {
        let c = vec![
            NthScore::new(p(0.1), Some(0), 0),
            NthScore::new(p(0.5), Some(1), 0),
            NthScore::new(p(0.5), Some(0), 1),
            NthScore::new(p(0.3), Some(2), 0),
        ];
        let top = top_n(c.clone(), 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0], NthScore::new(p(0.5), Some(1), 0));
        assert_eq!(top[1], NthScore::new(p(0.5), Some(0), 1));
        assert_eq!(top[2].score, p(0.3));
        assert_eq!(top_n(c, 10).len(), 4);
    }

    #[test]
    fn cells_are_independent() {
        let mut t = NBestTable::new(2, 2, 2);
        assert_eq!(t.n(), 2);
        t.set(
            1,
            1,
            vec![
                NthScore::new(p(0.2), Some(0), 0),
                NthScore::new(p(0.4), Some(1), 0),
                NthScore::new(p(0.3), Some(1), 1),
            ],
        );
        assert!(t.get(1, 0).is_empty());
        let cell = t.get(1, 1);
        assert_eq!(cell.len(), 2);
        assert!(cell[0].score > cell[1].score);
        t.set_ending(vec![NthScore::new(p(0.1), Some(1), 0)]);
        assert_eq!(t.ending().len(), 1);
    }
}

//!
//! Table definitions
//!
//! ## ScoreTable
//!
//! `score[position][state]` in log-space, `Prob::zero()` = unreachable.
//! Used for Viterbi, Forward, Backward and Posterior.
//!
//! ## TracebackTable
//!
//! `prev_state[position][state]`, the best predecessor of each reachable
//! cell. Unreachable cells keep the unset sentinel.
//!
//! ## DurationTable
//!
//! `run[position][state]`, the number of positions before `position` that
//! the Viterbi path into the cell stayed in `state`.
//!
pub mod nbest;
pub mod stoch;

pub use nbest::{NBestTable, NthScore};
pub use stoch::{StochEntry, StochTable};

use crate::model::StateId;
use crate::prob::Prob;

///
/// Dense `[position][state]` table of log probabilities
///
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    n_states: usize,
    cells: Vec<Prob>,
}

impl ScoreTable {
    ///
    /// Create a table filled with `Prob::zero()`
    ///
    pub fn new(n_positions: usize, n_states: usize) -> ScoreTable {
        ScoreTable {
            n_states,
            cells: vec![Prob::zero(); n_positions * n_states],
        }
    }
    pub fn n_positions(&self) -> usize {
        if self.n_states == 0 {
            0
        } else {
            self.cells.len() / self.n_states
        }
    }
    pub fn n_states(&self) -> usize {
        self.n_states
    }
    #[inline]
    pub fn get(&self, position: usize, state: StateId) -> Prob {
        self.cells[position * self.n_states + state]
    }
    #[inline]
    pub fn set(&mut self, position: usize, state: StateId, value: Prob) {
        self.cells[position * self.n_states + state] = value;
    }
    /// Scores of all states at `position`
    pub fn row(&self, position: usize) -> &[Prob] {
        let i = position * self.n_states;
        &self.cells[i..i + self.n_states]
    }
    pub fn row_mut(&mut self, position: usize) -> &mut [Prob] {
        let i = position * self.n_states;
        &mut self.cells[i..i + self.n_states]
    }
    ///
    /// State with the highest score at `position`, `None` if all are zero.
    /// Ties are broken toward the smaller state id.
    ///
    pub fn argmax(&self, position: usize) -> Option<(StateId, Prob)> {
        self.row(position)
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_zero())
            .fold(None, |best: Option<(StateId, Prob)>, (s, &p)| match best {
                Some((_, q)) if q >= p => best,
                _ => Some((s, p)),
            })
    }
}

impl std::fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for position in 0..self.n_positions() {
            write!(f, "{}", position)?;
            for p in self.row(position) {
                write!(f, "\t{:.4}", p.to_log_value())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Sentinel of a traceback cell without predecessor
const UNSET: u32 = u32::MAX;

/// Largest number of states a `TracebackTable` can index; ids must stay
/// below the unset sentinel.
pub const MAX_STATES: usize = UNSET as usize;

///
/// Dense `[position][state]` table of predecessor states
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackTable {
    n_states: usize,
    cells: Vec<u32>,
}

impl TracebackTable {
    pub fn new(n_positions: usize, n_states: usize) -> TracebackTable {
        TracebackTable {
            n_states,
            cells: vec![UNSET; n_positions * n_states],
        }
    }
    pub fn n_states(&self) -> usize {
        self.n_states
    }
    ///
    /// Predecessor of the cell, `None` if never set
    ///
    #[inline]
    pub fn get(&self, position: usize, state: StateId) -> Option<StateId> {
        match self.cells[position * self.n_states + state] {
            UNSET => None,
            prev => Some(prev as StateId),
        }
    }
    ///
    /// `prev` must be below `MAX_STATES`, which `GraphModelBuilder::build`
    /// guarantees for its models.
    ///
    #[inline]
    pub fn set(&mut self, position: usize, state: StateId, prev: StateId) {
        debug_assert!(prev < MAX_STATES, "state id {} does not fit", prev);
        self.cells[position * self.n_states + state] = u32::try_from(prev).unwrap_or(UNSET);
    }
    pub fn is_set(&self, position: usize, state: StateId) -> bool {
        self.get(position, state).is_some()
    }
}

///
/// Dense `[position][state]` table of Viterbi run lengths
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationTable {
    n_states: usize,
    cells: Vec<u32>,
}

impl DurationTable {
    pub fn new(n_positions: usize, n_states: usize) -> DurationTable {
        DurationTable {
            n_states,
            cells: vec![0; n_positions * n_states],
        }
    }
    #[inline]
    pub fn get(&self, position: usize, state: StateId) -> usize {
        self.cells[position * self.n_states + state] as usize
    }
    #[inline]
    pub fn set(&mut self, position: usize, state: StateId, run: usize) {
        self.cells[position * self.n_states + state] = u32::try_from(run).unwrap_or(u32::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;

    #[test]
    fn score_table_rows() {
        let mut t = ScoreTable::new(3, 4);
        assert_eq!(t.n_positions(), 3);
        assert_eq!(t.n_states(), 4);
        assert!(t.row(2).iter().all(|x| x.is_zero()));
        assert_eq!(t.argmax(0), None);
        t.set(1, 2, p(0.3));
        t.set(1, 3, p(0.3));
        t.set(1, 0, p(0.1));
        assert_eq!(t.get(1, 2), p(0.3));
        assert_eq!(t.argmax(1), Some((2, p(0.3))));
        t.row_mut(2)[1] = p(0.5);
        assert_eq!(t.get(2, 1), p(0.5));
        assert_eq!(t.to_string().lines().count(), 3);
    }

    #[test]
    fn traceback_table_sentinel() {
        let mut t = TracebackTable::new(2, 3);
        assert_eq!(t.get(1, 0), None);
        t.set(1, 0, 0);
        assert_eq!(t.get(1, 0), Some(0));
        assert!(t.is_set(1, 0));
        assert!(!t.is_set(1, 1));

        let mut d = DurationTable::new(2, 3);
        d.set(1, 2, 5);
        assert_eq!(d.get(1, 2), 5);
        assert_eq!(d.get(0, 2), 0);
    }

    #[test]
    fn traceback_table_keeps_largest_state_id() {
        let mut t = TracebackTable::new(1, 2);
        t.set(0, 1, MAX_STATES - 1);
        assert_eq!(t.get(0, 1), Some(MAX_STATES - 1));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn traceback_table_rejects_sentinel_id() {
        let mut t = TracebackTable::new(1, 2);
        t.set(0, 1, MAX_STATES);
    }
}

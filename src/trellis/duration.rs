//!
//! Explicit duration: how long a state has been held
//!
//! The held length of `state` at `position` counts the positions
//! `position, position - 1, ...` of the path into that cell, going back
//! until the previous state satisfies the stop condition of the
//! `DurationRule`.
//!
use super::Trellis;
use crate::error::{Result, TrellisError};
use crate::model::{DurationRule, HmmModel, StateId};
use crate::table::{DurationTable, TracebackTable};

fn is_stop<M: HmmModel>(model: &M, rule: &DurationRule, origin: StateId, s: StateId) -> bool {
    match rule {
        DurationRule::DiffState => s != origin,
        DurationRule::StartInit => false,
        DurationRule::StateName(name) => model.state_name(s) == name,
        DurationRule::StateLabel(label) => model.state_label(s) == label,
    }
}

///
/// Walk the traceback table from `(position, state)`.
///
fn walk_traceback<M: HmmModel>(
    model: &M,
    tb: &TracebackTable,
    position: usize,
    state: StateId,
    rule: &DurationRule,
) -> usize {
    let mut length = 1;
    let mut current = state;
    for q in (1..=position).rev() {
        match tb.get(q, current) {
            Some(prev) if !is_stop(model, rule, state, prev) => {
                length += 1;
                current = prev;
            }
            _ => break,
        }
    }
    length
}

///
/// Held length of `state` at `position` on the Viterbi path into the cell.
///
/// `DiffState` is read from the run-length counters, the other rules walk
/// the traceback table.
///
pub fn held_length<M: HmmModel>(
    model: &M,
    tb: &TracebackTable,
    dur: &DurationTable,
    position: usize,
    state: StateId,
    rule: &DurationRule,
) -> usize {
    match rule {
        DurationRule::DiffState => dur.get(position, state) + 1,
        _ => walk_traceback(model, tb, position, state, rule),
    }
}

///
/// Held length of `states[position]` at `position` along a given path.
///
pub fn held_on_path<M: HmmModel>(
    model: &M,
    states: &[StateId],
    position: usize,
    rule: &DurationRule,
) -> usize {
    let origin = states[position];
    1 + states[..position]
        .iter()
        .rev()
        .take_while(|&&s| !is_stop(model, rule, origin, s))
        .count()
}

impl<'a, M: HmmModel> Trellis<'a, M> {
    ///
    /// Held length of `state` at `position` on the Viterbi path into that
    /// cell, measured with `rule`.
    ///
    /// Requires `viterbi`; the cell must be reachable.
    ///
    pub fn traceback_duration(
        &self,
        position: usize,
        state: StateId,
        rule: &DurationRule,
    ) -> Result<usize> {
        let tb = self
            .traceback_table
            .as_ref()
            .ok_or(TrellisError::TableMissing("viterbi"))?;
        let scores = self
            .viterbi_score
            .as_ref()
            .ok_or(TrellisError::TableMissing("viterbi"))?;
        if position >= self.seq.len()
            || state >= self.model.n_states()
            || scores.get(position, state).is_zero()
        {
            return Err(TrellisError::TracebackCorrupt { position, state });
        }
        Ok(walk_traceback(self.model, tb, position, state, rule))
    }
}

//!
//! Trellis decoding engine
//!
//! `Trellis` borrows a model and a sequence, and owns every table it
//! computes. Each algorithm allocates its tables on first use; `reset`
//! drops them all.
//!
//! * `viterbi`: most probable path (`traceback`)
//! * `forward`, `backward`: total probability of the sequence
//! * `posterior`: per-position state probabilities (`posterior_path`)
//! * `nth_viterbi`: `n` most probable paths (`nth_traceback`)
//! * `stochastic_viterbi`, `stochastic_forward`: sampled paths
//!   (`stochastic_traceback`)
//!
//! ## Active states
//!
//! At each position only the states reachable from a state with a non-zero
//! score at the previous position are evaluated. `TrellisParams::pruning`
//! turns this off (every state is evaluated), which gives the same tables.
//!
pub mod backward;
pub mod duration;
pub mod forward;
pub mod nth_best;
pub mod parallel;
pub mod posterior;
pub mod stochastic;
pub mod traceback;
pub mod viterbi;


use crate::bitset::BitSet;
use crate::error::{Result, TrellisError};
use crate::model::{HmmModel, Sequence, StateId};
use crate::params::TrellisParams;
use crate::prob::Prob;
use crate::table::{DurationTable, NBestTable, ScoreTable, StochTable, TracebackTable};

///
/// Decoding engine for a (model, sequence) pair
///
pub struct Trellis<'a, M: HmmModel> {
    model: &'a M,
    seq: &'a Sequence,
    params: TrellisParams,
    // viterbi
    viterbi_score: Option<ScoreTable>,
    traceback_table: Option<TracebackTable>,
    duration_table: Option<DurationTable>,
    active_sets: Option<Vec<BitSet>>,
    ending_viterbi: Option<(Prob, StateId)>,
    // forward/backward
    forward_score: Option<ScoreTable>,
    ending_forward: Option<Prob>,
    backward_score: Option<ScoreTable>,
    ending_backward: Option<Prob>,
    posterior_score: Option<ScoreTable>,
    // nth-best
    nbest_table: Option<NBestTable>,
    // stochastic
    stoch_table: Option<StochTable>,
}

impl<'a, M: HmmModel> Trellis<'a, M> {
    pub fn new(model: &'a M, seq: &'a Sequence, params: TrellisParams) -> Self {
        Trellis {
            model,
            seq,
            params,
            viterbi_score: None,
            traceback_table: None,
            duration_table: None,
            active_sets: None,
            ending_viterbi: None,
            forward_score: None,
            ending_forward: None,
            backward_score: None,
            ending_backward: None,
            posterior_score: None,
            nbest_table: None,
            stoch_table: None,
        }
    }
    ///
    /// Drop all tables. The engine can be used again afterwards.
    ///
    pub fn reset(&mut self) {
        self.viterbi_score = None;
        self.traceback_table = None;
        self.duration_table = None;
        self.active_sets = None;
        self.ending_viterbi = None;
        self.forward_score = None;
        self.ending_forward = None;
        self.backward_score = None;
        self.ending_backward = None;
        self.posterior_score = None;
        self.nbest_table = None;
        self.stoch_table = None;
    }
    pub fn model(&self) -> &'a M {
        self.model
    }
    pub fn sequence(&self) -> &'a Sequence {
        self.seq
    }
    pub fn params(&self) -> &TrellisParams {
        &self.params
    }
}

//
// accessors of tables
//
impl<'a, M: HmmModel> Trellis<'a, M> {
    pub fn viterbi_table(&self) -> Option<&ScoreTable> {
        self.viterbi_score.as_ref()
    }
    pub fn traceback_table(&self) -> Option<&TracebackTable> {
        self.traceback_table.as_ref()
    }
    /// run lengths of the Viterbi cells, only for non-basic models
    pub fn duration_table(&self) -> Option<&DurationTable> {
        self.duration_table.as_ref()
    }
    ///
    /// States with a non-zero Viterbi score at each position
    ///
    pub fn active_sets(&self) -> Option<&[BitSet]> {
        self.active_sets.as_deref()
    }
    /// ending score and the last state of the Viterbi path
    pub fn ending_viterbi(&self) -> Option<(Prob, StateId)> {
        self.ending_viterbi
    }
    pub fn forward_table(&self) -> Option<&ScoreTable> {
        self.forward_score.as_ref()
    }
    pub fn ending_forward(&self) -> Option<Prob> {
        self.ending_forward
    }
    pub fn backward_table(&self) -> Option<&ScoreTable> {
        self.backward_score.as_ref()
    }
    pub fn ending_backward(&self) -> Option<Prob> {
        self.ending_backward
    }
    pub fn posterior_table(&self) -> Option<&ScoreTable> {
        self.posterior_score.as_ref()
    }
    pub fn nbest_table(&self) -> Option<&NBestTable> {
        self.nbest_table.as_ref()
    }
    pub fn stoch_table(&self) -> Option<&StochTable> {
        self.stoch_table.as_ref()
    }
}

//
// shared building blocks of the sweeps
//
impl<'a, M: HmmModel> Trellis<'a, M> {
    fn check_sequence(&self) -> Result<()> {
        if self.seq.is_empty() {
            Err(TrellisError::EmptySequence)
        } else {
            Ok(())
        }
    }
    ///
    /// Emission of `s` at `position` including the external weight
    ///
    fn emission_at(&self, s: StateId, position: usize) -> Prob {
        let e = self.model.emission(s, self.seq, position);
        if self.seq.ex_defined_at(position) {
            e * self.seq.weight(position, s)
        } else {
            e
        }
    }
    ///
    /// States to evaluate, given the set of states reachable from the
    /// previous position.
    ///
    fn candidates(&self, reachable: &BitSet) -> Vec<StateId> {
        if self.params.pruning {
            reachable.ones().collect()
        } else {
            (0..self.model.n_states()).collect()
        }
    }
    ///
    /// Transition `from` (at `position - 1`) -> `to` (at `position`).
    ///
    /// When the transition depends on the duration, the held length of
    /// `from` is measured on the given Viterbi tables.
    ///
    fn transition_at(
        &self,
        from: StateId,
        to: StateId,
        position: usize,
        viterbi: Option<(&TracebackTable, &DurationTable)>,
    ) -> Prob {
        let held = match (self.model.duration_rule(from, to), viterbi) {
            (Some(rule), Some((tb, dur))) => {
                duration::held_length(self.model, tb, dur, position - 1, from, rule)
            }
            _ => 1,
        };
        self.model.transition(from, to, self.seq, position, held)
    }
    ///
    /// Run Viterbi if the model has duration-dependent transitions and the
    /// tables to measure them on are missing.
    ///
    fn ensure_viterbi_for_durations(&mut self) -> Result<()> {
        if !self.model.is_basic() && self.traceback_table.is_none() {
            self.viterbi()?;
        }
        Ok(())
    }
    fn duration_tables(&self) -> Option<(&TracebackTable, &DurationTable)> {
        match (&self.traceback_table, &self.duration_table) {
            (Some(tb), Some(dur)) => Some((tb, dur)),
            _ => None,
        }
    }
}

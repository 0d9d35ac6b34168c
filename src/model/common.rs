//!
//! Definition of the model graph the engine consumes
//!
use super::sequence::Sequence;
use super::transition::DurationRule;
use crate::bitset::BitSet;
use crate::prob::Prob;

/// Dense id of a state in `[0, n_states)`
pub type StateId = usize;

///
/// Read-only HMM state graph.
///
/// States are dense ids. INIT and END are pseudo-states that are not
/// counted in `n_states`; their adjacency is given by `init_to` and
/// `end_from`.
///
/// All probabilities are in log-space (`Prob`), `Prob::zero()` meaning
/// "no transition" or "cannot emit".
///
pub trait HmmModel {
    ///
    /// Number of states (INIT and END excluded)
    fn n_states(&self) -> usize;
    fn state_name(&self, s: StateId) -> &str;
    fn state_label(&self, s: StateId) -> &str;
    ///
    /// States with a transition from INIT
    fn init_to(&self) -> &BitSet;
    ///
    /// States with a transition into END
    fn end_from(&self) -> &BitSet;
    ///
    /// Targets of the outgoing transitions of `s`
    fn to_states(&self, s: StateId) -> &BitSet;
    ///
    /// Sources of the incoming transitions of `s`
    fn from_states(&self, s: StateId) -> &BitSet;
    ///
    /// Probability of `s` emitting the symbol of `seq` at `position`.
    /// External definitions of the sequence are not included.
    fn emission(&self, s: StateId, seq: &Sequence, position: usize) -> Prob;
    ///
    /// INIT -> `s`
    fn init_transition(&self, s: StateId) -> Prob;
    ///
    /// `s` -> END
    fn end_transition(&self, s: StateId) -> Prob;
    ///
    /// Transition `from` -> `to` into sequence `position`, where `from` has
    /// been occupied for `held` (>= 1) consecutive positions up to
    /// `position - 1`. Only explicit-duration and external-function
    /// transitions depend on `held`; the latter also read the held segment
    /// `seq[position - held..position]`.
    ///
    fn transition(
        &self,
        from: StateId,
        to: StateId,
        seq: &Sequence,
        position: usize,
        held: usize,
    ) -> Prob;
    ///
    /// How `held` of the transition `from` -> `to` is measured, `None` for
    /// transitions that do not depend on it.
    fn duration_rule(&self, from: StateId, to: StateId) -> Option<&DurationRule>;
    ///
    /// `true` if no transition depends on the duration, which lets the
    /// engine skip run-length bookkeeping.
    fn is_basic(&self) -> bool;
}

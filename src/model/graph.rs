//!
//! `GraphModel`: HMM state graph on `petgraph::DiGraph`
//!
//! Node is a state (`StateNode`), edge is a transition (`Transition`).
//! INIT/END transitions are stored in the node. Adjacency bitsets and an
//! edge lookup table are precomputed by `GraphModelBuilder::build`.
//!
use super::common::{HmmModel, StateId};
use super::sequence::Sequence;
use super::transition::{DurationRule, SegmentFunctions, Transition};
use crate::bitset::BitSet;
use crate::error::{Result, TrellisError};
use crate::prob::Prob;
use crate::table::MAX_STATES;
use derive_new::new;
use fnv::FnvHashMap;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

///
/// State of the model
///
#[derive(Debug, Clone, PartialEq, new)]
pub struct StateNode {
    pub name: String,
    pub label: String,
    /// emission probability of each digit
    pub emissions: Vec<Prob>,
    /// INIT -> this state
    pub init: Prob,
    /// this state -> END
    pub end: Prob,
}

impl std::fmt::Display for StateNode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.label)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Transition::Standard(p) => write!(f, "{}", p),
            Transition::Duration { probs, rule } => {
                write!(f, "duration({:?}, n={})", rule, probs.len())
            }
            Transition::External {
                prob,
                function,
                rule,
            } => write!(f, "{}*{}({:?})", prob, function, rule),
        }
    }
}

///
/// Model backed by a petgraph `DiGraph`
///
#[derive(Debug, Clone)]
pub struct GraphModel {
    graph: DiGraph<StateNode, Transition>,
    edges: FnvHashMap<(StateId, StateId), EdgeIndex>,
    to: Vec<BitSet>,
    from: Vec<BitSet>,
    init_to: BitSet,
    end_from: BitSet,
    basic: bool,
    functions: SegmentFunctions,
}

impl GraphModel {
    pub fn graph(&self) -> &DiGraph<StateNode, Transition> {
        &self.graph
    }
    pub fn state(&self, s: StateId) -> &StateNode {
        &self.graph[NodeIndex::new(s)]
    }
    ///
    /// Find a state by its name
    ///
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.graph
            .node_indices()
            .find(|&v| self.graph[v].name == name)
            .map(|v| v.index())
    }
    /// Transition `from` -> `to`, if exists
    pub fn edge(&self, from: StateId, to: StateId) -> Option<&Transition> {
        self.edges.get(&(from, to)).map(|&e| &self.graph[e])
    }
    pub fn n_transitions(&self) -> usize {
        self.graph.edge_count()
    }
    pub fn functions(&self) -> &SegmentFunctions {
        &self.functions
    }
    ///
    /// Graphviz representation of the state graph
    ///
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}

impl HmmModel for GraphModel {
    fn n_states(&self) -> usize {
        self.graph.node_count()
    }
    fn state_name(&self, s: StateId) -> &str {
        &self.state(s).name
    }
    fn state_label(&self, s: StateId) -> &str {
        &self.state(s).label
    }
    fn init_to(&self) -> &BitSet {
        &self.init_to
    }
    fn end_from(&self) -> &BitSet {
        &self.end_from
    }
    fn to_states(&self, s: StateId) -> &BitSet {
        &self.to[s]
    }
    fn from_states(&self, s: StateId) -> &BitSet {
        &self.from[s]
    }
    fn emission(&self, s: StateId, seq: &Sequence, position: usize) -> Prob {
        let digit = seq.symbol(position) as usize;
        self.state(s)
            .emissions
            .get(digit)
            .copied()
            .unwrap_or_else(Prob::zero)
    }
    fn init_transition(&self, s: StateId) -> Prob {
        self.state(s).init
    }
    fn end_transition(&self, s: StateId) -> Prob {
        self.state(s).end
    }
    fn transition(
        &self,
        from: StateId,
        to: StateId,
        seq: &Sequence,
        position: usize,
        held: usize,
    ) -> Prob {
        let t = match self.edge(from, to) {
            Some(t) => t,
            None => return Prob::zero(),
        };
        match t.function() {
            Some(name) => {
                let segment = &seq.symbols()[position.saturating_sub(held)..position];
                match self.functions.get(name) {
                    Some(f) => t.prob(held) * f(segment),
                    None => Prob::zero(),
                }
            }
            None => t.prob(held),
        }
    }
    fn duration_rule(&self, from: StateId, to: StateId) -> Option<&DurationRule> {
        self.edge(from, to).and_then(|t| t.rule())
    }
    fn is_basic(&self) -> bool {
        self.basic
    }
}

///
/// Builder of `GraphModel`
///
/// ```text
/// let mut b = GraphModelBuilder::new();
/// let x = b.add_state("x", "X", &[0.5, 0.5], 1.0, 0.1);
/// b.add_transition(x, x, Transition::Standard(p(0.9)))?;
/// let model = b.build()?;
/// ```
///
#[derive(Debug, Clone, Default)]
pub struct GraphModelBuilder {
    graph: DiGraph<StateNode, Transition>,
    functions: SegmentFunctions,
}

impl GraphModelBuilder {
    pub fn new() -> Self {
        GraphModelBuilder::default()
    }
    ///
    /// Add a state with emission probabilities (linear scale, indexed by
    /// digit) and INIT/END probabilities.
    ///
    pub fn add_state(
        &mut self,
        name: &str,
        label: &str,
        emissions: &[f64],
        init: f64,
        end: f64,
    ) -> StateId {
        let node = StateNode::new(
            name.to_string(),
            label.to_string(),
            emissions.iter().map(|&e| Prob::from_prob(e)).collect(),
            Prob::from_prob(init),
            Prob::from_prob(end),
        );
        self.add_state_node(node)
    }
    pub fn add_state_node(&mut self, node: StateNode) -> StateId {
        self.graph.add_node(node).index()
    }
    fn check_state(&self, s: StateId) -> Result<NodeIndex> {
        if s < self.graph.node_count() {
            Ok(NodeIndex::new(s))
        } else {
            Err(TrellisError::InvalidModel(format!(
                "state {} does not exist (n_states={})",
                s,
                self.graph.node_count()
            )))
        }
    }
    ///
    /// Add transition `from` -> `to`. A second transition between the same
    /// pair of states is an error.
    ///
    pub fn add_transition(&mut self, from: StateId, to: StateId, t: Transition) -> Result<()> {
        let a = self.check_state(from)?;
        let b = self.check_state(to)?;
        if self.graph.find_edge(a, b).is_some() {
            return Err(TrellisError::InvalidModel(format!(
                "duplicated transition {} -> {}",
                from, to
            )));
        }
        if let Transition::Duration { probs, .. } = &t {
            if probs.is_empty() {
                return Err(TrellisError::InvalidModel(format!(
                    "duration transition {} -> {} has no probabilities",
                    from, to
                )));
            }
        }
        self.graph.add_edge(a, b, t);
        Ok(())
    }
    ///
    /// Register a function for `Transition::External` edges naming it.
    ///
    pub fn register_function<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[u8]) -> Prob + Send + Sync + 'static,
    {
        self.functions.register(name, f);
    }
    ///
    /// Add a constant transition (linear scale probability)
    ///
    pub fn add_standard(&mut self, from: StateId, to: StateId, prob: f64) -> Result<()> {
        self.add_transition(from, to, Transition::Standard(Prob::from_prob(prob)))
    }
    ///
    /// Validate and precompute adjacency.
    ///
    /// * all states share one emission alphabet size
    /// * transitions with zero probability are kept in the graph but are
    ///   not part of the adjacency
    /// * functions of external transitions are registered
    ///
    pub fn build(self) -> Result<GraphModel> {
        let graph = self.graph;
        let functions = self.functions;
        let n = graph.node_count();
        if n == 0 {
            return Err(TrellisError::InvalidModel("model has no state".to_string()));
        }
        if n > MAX_STATES {
            return Err(TrellisError::InvalidModel(format!(
                "{} states, at most {} are supported",
                n, MAX_STATES
            )));
        }
        let n_symbols = graph[NodeIndex::new(0)].emissions.len();
        if let Some(v) = graph
            .node_indices()
            .find(|&v| graph[v].emissions.len() != n_symbols)
        {
            return Err(TrellisError::InvalidModel(format!(
                "state {} has {} emissions, expected {}",
                graph[v].name,
                graph[v].emissions.len(),
                n_symbols
            )));
        }

        let mut to = vec![BitSet::new(n); n];
        let mut from = vec![BitSet::new(n); n];
        let mut edges = FnvHashMap::default();
        let mut basic = true;
        for e in graph.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            edges.insert((a, b), e.id());
            if e.weight().rule().is_some() {
                basic = false;
            }
            if let Some(name) = e.weight().function() {
                if !functions.contains(name) {
                    return Err(TrellisError::InvalidModel(format!(
                        "transition {} -> {} refers to unknown function {}",
                        a, b, name
                    )));
                }
            }
            if e.weight().is_possible() {
                to[a].set(b)?;
                from[b].set(a)?;
            }
        }

        let mut init_to = BitSet::new(n);
        let mut end_from = BitSet::new(n);
        for v in graph.node_indices() {
            if !graph[v].init.is_zero() {
                init_to.set(v.index())?;
            }
            if !graph[v].end.is_zero() {
                end_from.set(v.index())?;
            }
        }
        if init_to.none() {
            return Err(TrellisError::InvalidModel(
                "no transition from INIT".to_string(),
            ));
        }

        Ok(GraphModel {
            graph,
            edges,
            to,
            from,
            init_to,
            end_from,
            basic,
            functions,
        })
    }
}

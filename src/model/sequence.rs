//!
//! Digitized sequences and their external definitions
//!
//! ## ExDefs
//!
//! Optional per-position information supplied from outside the model.
//! Most positions have none, so they are stored in a `SparseArray`.
//!
//! * `ExDef::Weighted`: additive log weights for some states
//! * `ExDef::Absolute`: the position must be emitted by this state
//!
use super::common::StateId;
use crate::bitset::SparseArray;
use crate::error::{Result, TrellisError};
use crate::prob::Prob;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// Ordered set of symbols. A symbol is digitized into its index.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
}

impl Alphabet {
    pub fn new(symbols: &[u8]) -> Alphabet {
        Alphabet {
            symbols: symbols.to_vec(),
        }
    }
    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    /// Digit of `symbol`
    pub fn index(&self, symbol: u8) -> Option<u8> {
        self.symbols
            .iter()
            .position(|&s| s == symbol)
            .map(|i| i as u8)
    }
    /// Symbol of digit `digit`
    pub fn symbol(&self, digit: u8) -> Option<u8> {
        self.symbols.get(digit as usize).copied()
    }
    ///
    /// Convert text into a `Sequence` without external definitions.
    ///
    pub fn digitize(&self, text: &[u8]) -> Result<Sequence> {
        let symbols = text
            .iter()
            .map(|&c| self.index(c).ok_or(TrellisError::InvalidSymbol(c)))
            .collect::<Result<Vec<u8>>>()?;
        Ok(Sequence::new(symbols))
    }
    ///
    /// Convert back a digitized sequence into text
    ///
    pub fn undigitize(&self, seq: &Sequence) -> Vec<u8> {
        seq.symbols()
            .iter()
            .map(|&d| self.symbol(d).unwrap_or(b'?'))
            .collect()
    }
}

///
/// External definition of a position
///
#[derive(Debug, Clone, PartialEq)]
pub enum ExDef {
    /// additive log weights of the listed states
    Weighted(Vec<(StateId, Prob)>),
    /// every state other than this one is impossible
    Absolute(StateId),
}

impl ExDef {
    ///
    /// Weight added to the emission of `state`
    ///
    pub fn weight(&self, state: StateId) -> Prob {
        match self {
            ExDef::Weighted(ws) => ws
                .iter()
                .find(|(s, _)| *s == state)
                .map(|(_, w)| *w)
                .unwrap_or_else(Prob::one),
            ExDef::Absolute(s) => {
                if *s == state {
                    Prob::one()
                } else {
                    Prob::zero()
                }
            }
        }
    }
}

/// Per-position external definitions of a sequence
pub type ExDefs = SparseArray<ExDef>;

///
/// Digitized sequence
///
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    symbols: Vec<u8>,
    ex_defs: Option<ExDefs>,
}

impl Sequence {
    pub fn new(symbols: Vec<u8>) -> Sequence {
        Sequence {
            symbols,
            ex_defs: None,
        }
    }
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }
    /// Digit at `position`
    pub fn symbol(&self, position: usize) -> u8 {
        self.symbols[position]
    }
    ///
    /// Attach an external definition to `position`. Replaces an existing
    /// definition at the same position.
    ///
    pub fn define(&mut self, position: usize, def: ExDef) -> Result<()> {
        let len = self.len();
        let ex_defs = self.ex_defs.get_or_insert_with(|| ExDefs::new(len));
        ex_defs.insert(position, def)?;
        Ok(())
    }
    pub fn ex_defs(&self) -> Option<&ExDefs> {
        self.ex_defs.as_ref()
    }
    /// `true` if any position has an external definition
    pub fn ex_defined(&self) -> bool {
        self.ex_defs
            .as_ref()
            .map(|d| d.n_defined() > 0)
            .unwrap_or(false)
    }
    pub fn ex_defined_at(&self, position: usize) -> bool {
        self.ex_defs
            .as_ref()
            .map(|d| d.defined(position))
            .unwrap_or(false)
    }
    ///
    /// Additive log weight of `state` at `position` (`Prob::one()` when
    /// nothing is defined there).
    ///
    pub fn weight(&self, position: usize, state: StateId) -> Prob {
        match self.ex_defs.as_ref().and_then(|d| d.get(position)) {
            Some(def) => def.weight(state),
            None => Prob::one(),
        }
    }
}

///
/// Random digitized sequence of uniform symbols
///
pub fn random_sequence(length: usize, n_symbols: usize, seed: u64) -> Sequence {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let symbols = (0..length)
        .map(|_| rng.gen_range(0..n_symbols) as u8)
        .collect();
    Sequence::new(symbols)
}

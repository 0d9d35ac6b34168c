//!
//! Mock models for testing
//!
use super::graph::{GraphModel, GraphModelBuilder};
use super::sequence::Alphabet;
use super::transition::{DurationRule, Transition};
use crate::prob::p;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// Occasionally dishonest casino with two coins
///
/// ```text
///     Fair   H: 0.5 T: 0.5
///     Biased H: 0.9 T: 0.1
///
///     stay 0.8, switch 0.19, end 0.01
/// ```
///
pub fn mock_coin() -> (GraphModel, Alphabet) {
    let mut b = GraphModelBuilder::new();
    let fair = b.add_state("Fair", "F", &[0.5, 0.5], 0.5, 0.01);
    let biased = b.add_state("Biased", "B", &[0.9, 0.1], 0.5, 0.01);
    for &(x, y, prob) in &[
        (fair, fair, 0.8),
        (fair, biased, 0.19),
        (biased, biased, 0.8),
        (biased, fair, 0.19),
    ] {
        b.add_standard(x, y, prob).unwrap();
    }
    (b.build().unwrap(), Alphabet::new(b"HT"))
}

///
/// Three states, where `C` has no incoming transition
///
/// ```text
///     A <-> B
///     ^
///     C
/// ```
///
pub fn mock_disconnected() -> (GraphModel, Alphabet) {
    let mut b = GraphModelBuilder::new();
    let a = b.add_state("A", "A", &[0.7, 0.3], 0.6, 0.05);
    let bb = b.add_state("B", "B", &[0.2, 0.8], 0.4, 0.05);
    let c = b.add_state("C", "C", &[0.5, 0.5], 0.0, 0.05);
    for &(x, y, prob) in &[
        (a, a, 0.6),
        (a, bb, 0.35),
        (bb, bb, 0.6),
        (bb, a, 0.35),
        (c, a, 0.95),
    ] {
        b.add_standard(x, y, prob).unwrap();
    }
    (b.build().unwrap(), Alphabet::new(b"01"))
}

///
/// Two states where the self-transition of `X` gets unlikely after it was
/// held for three positions.
///
/// ```text
///     X  a: 0.8 b: 0.2   X->X duration [0.9, 0.9, 0.5, 0.1]
///     Y  a: 0.3 b: 0.7   Y->Y 0.7, Y->X 0.29
/// ```
///
pub fn mock_duration() -> (GraphModel, Alphabet) {
    let mut b = GraphModelBuilder::new();
    let x = b.add_state("X", "X", &[0.8, 0.2], 0.5, 0.01);
    let y = b.add_state("Y", "Y", &[0.3, 0.7], 0.5, 0.01);
    b.add_transition(
        x,
        x,
        Transition::Duration {
            probs: vec![p(0.9), p(0.9), p(0.5), p(0.1)],
            rule: DurationRule::DiffState,
        },
    )
    .unwrap();
    b.add_transition(
        x,
        y,
        Transition::Duration {
            probs: vec![p(0.09), p(0.09), p(0.49), p(0.89)],
            rule: DurationRule::DiffState,
        },
    )
    .unwrap();
    b.add_standard(y, y, 0.7).unwrap();
    b.add_standard(y, x, 0.29).unwrap();
    (b.build().unwrap(), Alphabet::new(b"ab"))
}

///
/// Sea and Island, where leaving Island is scored by the fraction of `b`
/// emitted during the stay (function `island_exit`).
///
/// ```text
///     Sea     a: 0.7 b: 0.3   Sea->Sea 0.9, Sea->Island 0.09
///     Island  a: 0.3 b: 0.7   Island->Island 0.8
///                             Island->Sea 0.2 * max(frac_b, 0.05)
/// ```
///
pub fn mock_external() -> (GraphModel, Alphabet) {
    let mut b = GraphModelBuilder::new();
    let sea = b.add_state("Sea", "S", &[0.7, 0.3], 0.5, 0.01);
    let island = b.add_state("Island", "I", &[0.3, 0.7], 0.5, 0.01);
    b.register_function("island_exit", |segment| {
        if segment.is_empty() {
            return p(0.05);
        }
        let n_b = segment.iter().filter(|&&c| c == 1).count();
        p((n_b as f64 / segment.len() as f64).max(0.05))
    });
    b.add_standard(sea, sea, 0.9).unwrap();
    b.add_standard(sea, island, 0.09).unwrap();
    b.add_standard(island, island, 0.8).unwrap();
    b.add_transition(
        island,
        sea,
        Transition::External {
            prob: p(0.2),
            function: "island_exit".to_string(),
            rule: DurationRule::DiffState,
        },
    )
    .unwrap();
    (b.build().unwrap(), Alphabet::new(b"ab"))
}

///
/// Random model of `n_states` states emitting `n_symbols` symbols.
///
/// Each state has transitions to a random subset of states (each included
/// with probability `p_edge`, at least one) and a small END probability.
/// About half of the states are reachable from INIT.
///
pub fn mock_random(n_states: usize, n_symbols: usize, p_edge: f64, seed: u64) -> GraphModel {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut b = GraphModelBuilder::new();

    let inits: Vec<f64> = (0..n_states)
        .map(|i| {
            if i == 0 || rng.gen_bool(0.5) {
                rng.gen_range(0.1..1.0)
            } else {
                0.0
            }
        })
        .collect();
    let total_init: f64 = inits.iter().sum();

    for (i, init) in inits.iter().enumerate() {
        let emissions: Vec<f64> = (0..n_symbols).map(|_| rng.gen_range(0.05..1.0)).collect();
        let total: f64 = emissions.iter().sum();
        let emissions: Vec<f64> = emissions.iter().map(|e| e / total).collect();
        let end = if rng.gen_bool(0.7) { 0.05 } else { 0.0 };
        b.add_state(
            &format!("s{}", i),
            &format!("L{}", i % 3),
            &emissions,
            init / total_init,
            end,
        );
    }

    for i in 0..n_states {
        let mut targets: Vec<(usize, f64)> = (0..n_states)
            .filter_map(|j| {
                if rng.gen_bool(p_edge) {
                    Some((j, rng.gen_range(0.1..1.0)))
                } else {
                    None
                }
            })
            .collect();
        if targets.is_empty() {
            targets.push((rng.gen_range(0..n_states), 1.0));
        }
        let total: f64 = targets.iter().map(|(_, w)| w).sum();
        for (j, w) in targets {
            b.add_standard(i, j, 0.95 * w / total).unwrap();
        }
    }
    b.build().unwrap()
}

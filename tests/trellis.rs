//!
//! test of the trellis engine through the public api
//!
#[macro_use]
extern crate approx;

use stochtrellis::model::mocks::{mock_coin, mock_duration, mock_random};
use stochtrellis::model::sequence::random_sequence;
use stochtrellis::model::{
    Alphabet, DurationRule, GraphModel, GraphModelBuilder, HmmModel, Transition,
};
use stochtrellis::trellis::parallel::{full_prob_parallel, nth_viterbi_parallel, sample_parallel};
use stochtrellis::{p, Prob, Sequence, Trellis, TrellisError, TrellisParams};
use test_case::test_case;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// fair and loaded dice
fn casino() -> (GraphModel, Alphabet) {
    let mut b = GraphModelBuilder::new();
    let fair = b.add_state("Fair", "F", &[1.0 / 6.0; 6], 0.5, 0.001);
    let loaded = b.add_state(
        "Loaded",
        "L",
        &[0.1, 0.1, 0.1, 0.1, 0.1, 0.5],
        0.5,
        0.001,
    );
    b.add_standard(fair, fair, 0.949).unwrap();
    b.add_standard(fair, loaded, 0.05).unwrap();
    b.add_standard(loaded, loaded, 0.899).unwrap();
    b.add_standard(loaded, fair, 0.1).unwrap();
    (b.build().unwrap(), Alphabet::new(b"123456"))
}

#[test]
fn casino_finds_loaded_region() {
    init_logger();
    let (m, a) = casino();
    let rolls = b"3152643125413526666666566666631524135264125";
    let seq = a.digitize(rolls).unwrap();
    let mut t = Trellis::new(&m, &seq, TrellisParams::default());
    t.viterbi().unwrap();
    let path = t.traceback().unwrap();
    let labels = path.labels(&m);
    assert_eq!(labels[0], "F");
    assert_eq!(labels[20], "L");
    assert_eq!(labels[rolls.len() - 1], "F");

    t.posterior().unwrap();
    let post = t.posterior_table().unwrap();
    let loaded = m.state_id("Loaded").unwrap();
    assert!(post.get(20, loaded).to_value() > 0.5);
    assert!(post.get(2, loaded).to_value() < 0.5);
}

#[test]
fn params_from_json_drive_the_engine() {
    init_logger();
    let params = TrellisParams::from_json_str(r#"{"n_best": 4, "n_samples": 30, "seed": 11}"#)
        .unwrap();
    assert!(params.pruning);
    let (m, a) = mock_coin();
    let seqs = vec![
        a.digitize(b"HHTHTTTHHH").unwrap(),
        a.digitize(b"TTTTHHTTTT").unwrap(),
    ];
    let ranked = nth_viterbi_parallel(&m, &seqs, &params);
    for paths in ranked {
        let paths = paths.unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths[0].score() >= paths[3].score());
    }
    let samples = sample_parallel(&m, &seqs, &params);
    for (seq, s) in seqs.iter().zip(samples) {
        let s = s.unwrap();
        assert_eq!(s.n_samples(), 30);
        let heat = s.heat_table(seq.len(), m.n_states());
        for row in heat {
            assert_eq!(row.iter().sum::<usize>(), 30);
        }
    }
}

#[test_case(0 ; "seed 0")]
#[test_case(1 ; "seed 1")]
#[test_case(2 ; "seed 2")]
fn full_prob_is_product_of_forward(seed: u64) {
    init_logger();
    let m = mock_random(6, 4, 0.5, seed);
    let seqs: Vec<Sequence> = (0..4).map(|i| random_sequence(20, 4, seed * 10 + i)).collect();
    let params = TrellisParams::default();
    let full = match full_prob_parallel(&m, &seqs, &params) {
        Ok(full) => full,
        Err(e) => {
            assert!(e.is_no_path());
            return;
        }
    };
    let mut product = Prob::one();
    for seq in seqs.iter() {
        let mut t = Trellis::new(&m, seq, params.clone());
        let f = t.forward().unwrap();
        let b = t.backward().unwrap();
        assert_abs_diff_eq!(f, b, epsilon = 1e-6);
        let v = t.viterbi().unwrap();
        assert!(v <= f);
        product *= f;
    }
    assert_abs_diff_eq!(full, product, epsilon = 1e-6);
}

#[test]
fn duration_transition_limits_run_length() {
    init_logger();
    // Long stays in Short are cut off by its duration-dependent self loop.
    let mut b = GraphModelBuilder::new();
    let short = b.add_state("Short", "S", &[1.0, 0.0], 1.0, 0.1);
    let other = b.add_state("Other", "O", &[0.5, 0.5], 0.0, 0.1);
    b.add_transition(
        short,
        short,
        Transition::Duration {
            probs: vec![p(0.9), p(0.9), Prob::zero()],
            rule: DurationRule::DiffState,
        },
    )
    .unwrap();
    b.add_standard(short, other, 0.5).unwrap();
    b.add_standard(other, other, 0.5).unwrap();
    b.add_standard(other, short, 0.4).unwrap();
    let m = b.build().unwrap();
    assert!(!m.is_basic());

    let a = Alphabet::new(b"ab");
    let seq = a.digitize(b"aaaaaaaaa").unwrap();
    let mut t = Trellis::new(&m, &seq, TrellisParams::default());
    t.viterbi().unwrap();
    let path = t.traceback().unwrap();
    for (s, _, len) in path.runs() {
        if s == short {
            assert!(len <= 3);
        }
    }
    assert_abs_diff_eq!(t.path_score(path.states()), path.score(), epsilon = 1e-9);
}

#[test]
fn duration_model_agrees_across_algorithms() {
    init_logger();
    let (m, a) = mock_duration();
    let seq = a.digitize(b"aaabbbbaaaaaabbb").unwrap();
    let mut t = Trellis::new(&m, &seq, TrellisParams::default());
    let total = t.posterior().unwrap();
    let best = t.viterbi().unwrap();
    assert!(best <= total);
    t.nth_viterbi(3).unwrap();
    assert_eq!(
        t.nth_traceback(0).unwrap().states(),
        t.traceback().unwrap().states()
    );
    t.stochastic_viterbi().unwrap();
    let samples = t.stochastic_tracebacks(50, 1).unwrap();
    assert_eq!(samples.n_samples(), 50);
    assert!(samples.n_unique() >= 1);
}

#[test]
fn invalid_symbol_is_rejected() {
    let (_, a) = mock_coin();
    match a.digitize(b"HHX") {
        Err(TrellisError::InvalidSymbol(c)) => assert_eq!(c, b'X'),
        r => panic!("unexpected {:?}", r),
    }
}

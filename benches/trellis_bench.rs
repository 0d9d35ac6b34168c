use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
extern crate stochtrellis;
use stochtrellis::model::mocks::mock_random;
use stochtrellis::model::sequence::random_sequence;
use stochtrellis::{Trellis, TrellisParams};

fn criterion_benchmark(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let m = mock_random(20, 4, 0.2, 0);

    let mut group = c.benchmark_group("pruning vs naive");
    group.plot_config(plot_config);
    for len in [100, 1_000, 10_000].iter() {
        let seq = random_sequence(*len, 4, 1);
        group.bench_with_input(BenchmarkId::new("viterbi", len), len, |b, _| {
            b.iter(|| {
                let mut t = Trellis::new(&m, &seq, TrellisParams::default());
                black_box(t.viterbi().ok());
            });
        });
        group.bench_with_input(BenchmarkId::new("viterbi_naive", len), len, |b, _| {
            b.iter(|| {
                let mut t = Trellis::new(&m, &seq, TrellisParams::naive());
                black_box(t.viterbi().ok());
            });
        });
        group.bench_with_input(BenchmarkId::new("forward", len), len, |b, _| {
            b.iter(|| {
                let mut t = Trellis::new(&m, &seq, TrellisParams::default());
                black_box(t.forward().ok());
            });
        });
    }
    group.finish();

    let seq = random_sequence(1_000, 4, 2);
    c.bench_function("nth viterbi n=5", |b| {
        b.iter(|| {
            let mut t = Trellis::new(&m, &seq, TrellisParams::default());
            black_box(t.nth_viterbi(5).ok());
        })
    });
    c.bench_function("stochastic forward 100 samples", |b| {
        b.iter(|| {
            let mut t = Trellis::new(&m, &seq, TrellisParams::default());
            t.stochastic_forward().ok();
            black_box(t.stochastic_tracebacks(100, 0).ok());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

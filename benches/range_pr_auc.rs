//! Range-based PR AUC throughput over series length and threshold sampling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tsad_bench::metrics::{Metric, NumericArray, RangePrAuc, RocAuc};

/// Periodic anomaly windows with a noisy score that peaks inside them.
#[allow(clippy::cast_precision_loss)]
fn series(len: usize) -> (Vec<f64>, Vec<f64>) {
    let labels: Vec<f64> = (0..len)
        .map(|i| if i % 500 >= 480 { 1.0 } else { 0.0 })
        .collect();
    let scores = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let noise = ((i * 7919) % 1000) as f64 / 1000.0;
            0.6f64.mul_add(*label, 0.4 * noise)
        })
        .collect();
    (labels, scores)
}

fn bench_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_pr_auc_curve");
    for len in [1_000, 10_000, 50_000] {
        let (labels, scores) = series(len);
        let metric = RangePrAuc::new();
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| metric.curve(black_box(&labels), black_box(&scores)));
        });
    }
    group.finish();
}

fn bench_max_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_pr_auc_samples");
    let (labels, scores) = series(10_000);
    let y_true = NumericArray::integers(labels.iter().map(|&v| v as i64).collect());
    let y_score = NumericArray::floats(scores);
    for samples in [10, 50, 200] {
        let metric = RangePrAuc::new().with_max_samples(samples);
        group.bench_with_input(BenchmarkId::from_parameter(samples), &samples, |b, _| {
            b.iter(|| metric.evaluate(black_box(&y_true), black_box(&y_score)));
        });
    }
    group.finish();
}

fn bench_vs_roc(c: &mut Criterion) {
    let (labels, scores) = series(10_000);
    let y_true = NumericArray::integers(labels.iter().map(|&v| v as i64).collect());
    let y_score = NumericArray::floats(scores);
    c.bench_function("roc_auc_10000", |b| {
        b.iter(|| RocAuc.evaluate(black_box(&y_true), black_box(&y_score)));
    });
}

criterion_group!(benches, bench_curve, bench_max_samples, bench_vs_roc);
criterion_main!(benches);

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use classeval::{Labels, ZeroDivision, classification_report};

const SAMPLES: usize = 100_000;
const CLASSES: usize = 10;

fn random_indices(seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..SAMPLES).map(|_| rng.gen_range(0..CLASSES)).collect()
}

fn report_bench(c: &mut Criterion) {
    let y_true = random_indices(0);
    let y_pred = random_indices(1);

    c.bench_function("classification_report_100k_10", |b| {
        b.iter(|| {
            let report = classification_report(
                black_box(&y_true),
                black_box(&y_pred),
                None,
                ZeroDivision::Zero,
            )
            .unwrap();
            black_box(report);
        })
    });
}

fn canonicalize_bench(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let probs: Vec<f32> = (0..SAMPLES * CLASSES).map(|_| rng.r#gen::<f32>()).collect();
    let labels = Labels::one_hot(probs, CLASSES).unwrap();

    c.bench_function("canonicalize_one_hot_100k_10", |b| {
        b.iter(|| black_box(labels.canonicalize()))
    });
}

criterion_group!(benches, report_bench, canonicalize_bench);
criterion_main!(benches);

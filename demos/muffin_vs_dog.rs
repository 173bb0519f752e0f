use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use classeval::{
    Dataset, EvalConfig, EvalData, Evaluator, History, Inputs, LabelKind, Labels, Scores, Shuffle,
    model,
};

fn main() -> classeval::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classeval=info".into()),
        )
        .init();

    // Two noisy 1D blobs: muffins around 0.3, dogs around 0.7.
    let mut rng = StdRng::seed_from_u64(0);
    let mut split = |n: usize| -> classeval::Result<Dataset> {
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % 2;
            let center = if class == 0 { 0.3 } else { 0.7 };
            xs.push(center + rng.gen_range(-0.25..0.25));
            ys.push(class);
        }
        Dataset::new(Inputs::from_flat(xs, 1)?, Labels::class_indices(ys))
    };
    let train = split(200)?;
    let test = split(64)?;

    // Stand-in for a trained model: feature 0 is the dog probability.
    let clf = model::from_fn(LabelKind::BinaryScore, |x: &Inputs| {
        Scores::from_flat(x.rows().map(|r| r[0].clamp(0.0, 1.0)).collect(), 1)
    });

    let mut history = History::new();
    for epoch in 0..12 {
        let t = epoch as f32 / 11.0;
        history.push_epoch(&[
            ("loss", 0.7 - 0.4 * t),
            ("accuracy", 0.55 + 0.35 * t),
            ("val_loss", 0.72 - 0.35 * t),
            ("val_accuracy", 0.5 + 0.33 * t),
        ]);
    }

    let cfg = EvalConfig {
        return_reports: true,
        ..EvalConfig::default().with_class_names(["muffin", "dog"])
    };
    let reports = Evaluator::new(cfg)?.evaluate(
        &clf,
        Some(EvalData::from(train)),
        Some(EvalData::streaming(test.batches(16, Shuffle::Seeded(0))?)),
        Some(&history),
        &mut std::io::stdout(),
    )?;

    if let Some(test) = reports.and_then(|r| r.test) {
        println!("test accuracy={:.3}", test.report.accuracy());
    }
    Ok(())
}

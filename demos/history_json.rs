#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example history_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> classeval::Result<()> {
    use classeval::{EvalConfig, Evaluator, History, Labels};

    let json = r#"{
        "loss": [0.69, 0.52, 0.41, 0.35],
        "accuracy": [0.51, 0.68, 0.77, 0.82],
        "val_loss": [0.70, 0.58, 0.49, 0.47],
        "val_accuracy": [0.50, 0.63, 0.71, 0.74]
    }"#;
    let history = History::from_json_str(json)?;

    let cfg = EvalConfig::from_json_str(
        r#"{"class_names":["muffin","dog"],"normalize":"pred","digits":3,"render":{"shading":"ascii"}}"#,
    )?;
    let eval = Evaluator::new(cfg)?;
    let mut out = std::io::stdout();
    eval.plot_history(&history, &mut out)?;

    let split = eval.report(
        "Holdout",
        &Labels::class_indices(vec![0, 0, 0, 1, 1, 1]),
        &Labels::binary_scores(vec![0.1, 0.4, 0.55, 0.8, 0.5, 0.3])?,
        &mut out,
    )?;
    println!("{}", split.report.to_json_string_pretty()?);
    Ok(())
}

//! Evaluation reports for trained classifiers.
//!
//! `classeval` takes ground truth and model outputs in whatever form a training
//! pipeline produces them, canonicalizes both to class indices, and reports on
//! the result: a classification report (precision, recall, F1, support,
//! accuracy, macro and weighted averages), a raw-count confusion matrix and a
//! normalized one, plus per-epoch training curves. Everything renders to plain
//! text for terminals and logs.
//!
//! # Design goals
//!
//! - Explicit shapes: labels carry a [`LabelKind`] tag (class indices, one-hot /
//!   probabilities, or a binary score). Nothing is inferred from array shapes.
//! - Explicit sources: a split is either [`EvalData::Array`] or
//!   [`EvalData::Streaming`]; the caller picks.
//! - Explicit randomness: shuffled batching takes a seed ([`Shuffle::Seeded`]).
//! - No training: a model is anything implementing [`Classifier`].
//!
//! # Data layout and shapes
//!
//! - Inputs and scores are `f32`, stored row-major (`(len, dim)` as `len * dim`
//!   scalars), like [`Inputs`] and [`Scores`].
//! - Metrics are `f64`.
//! - Confusion matrices have true classes as rows and predicted classes as
//!   columns.
//! - A binary score of exactly `0.5` is class `1` (round half up).
//!
//! # Quick start
//!
//! ```rust
//! use classeval::{EvalConfig, Evaluator, Labels};
//!
//! # fn main() -> classeval::Result<()> {
//! let y_true = Labels::class_indices(vec![0, 0, 1, 1]);
//! let y_pred = Labels::binary_scores(vec![0.2, 0.7, 0.5, 0.9])?;
//!
//! let eval = Evaluator::new(EvalConfig::default().with_class_names(["muffin", "dog"]))?;
//! let split = eval.report("Test", &y_true, &y_pred, &mut std::io::stdout())?;
//!
//! assert_eq!(split.confusion.to_rows(), vec![vec![1, 1], vec![0, 2]]);
//! assert!((split.report.class("dog").unwrap().recall - 1.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! # Evaluating a model
//!
//! ```rust
//! use classeval::{Dataset, EvalConfig, EvalData, Evaluator, History, Inputs, LabelKind, Labels,
//!     Scores, Shuffle, model};
//!
//! # fn main() -> classeval::Result<()> {
//! // A "model" that reads feature 0 as the probability of class 1.
//! let clf = model::from_fn(LabelKind::BinaryScore, |x: &Inputs| {
//!     Scores::from_flat(x.rows().map(|r| r[0]).collect(), 1)
//! });
//!
//! let test = Dataset::new(
//!     Inputs::from_flat(vec![0.1, 0.4, 0.6, 0.8, 0.3], 1)?,
//!     Labels::class_indices(vec![0, 0, 1, 1, 1]),
//! )?;
//! let history = History::new()
//!     .with("accuracy", vec![0.5, 0.6])
//!     .with("val_accuracy", vec![0.4, 0.55]);
//!
//! let cfg = EvalConfig { return_reports: true, ..EvalConfig::default() };
//! let reports = Evaluator::new(cfg)?.evaluate(
//!     &clf,
//!     None,
//!     Some(EvalData::streaming(test.batches(2, Shuffle::Seeded(0))?)),
//!     Some(&history),
//!     &mut std::io::sink(),
//! )?;
//!
//! let test_report = reports.and_then(|r| r.test).unwrap();
//! assert_eq!(test_report.report.support(), 5);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod confusion;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod history;
pub mod labels;
pub mod model;
pub mod plot;
pub mod report;

pub use config::EvalConfig;
pub use confusion::{ClassSet, ConfusionMatrix, Normalize, NormalizedConfusionMatrix};
pub use data::{Batch, Batches, Dataset, EvalData, Inputs, Scores, Shuffle};
pub use error::{Error, Result};
pub use evaluate::{EvalReports, Evaluator, SplitReport};
pub use extract::{Extracted, collect_from_model, collect_predictions};
pub use history::{History, MetricFamily};
pub use labels::{LabelKind, Labels};
pub use model::Classifier;
pub use plot::{Figure, RenderOptions, Shading};
pub use report::{ClassMetrics, ClassificationReport, ZeroDivision, classification_report};

/// Canonicalize both sides and build a classification report.
///
/// Thin wrapper around [`Labels::canonicalize`] and [`classification_report`].
pub fn report_labels(
    y_true: &Labels,
    y_pred: &Labels,
    names: Option<&[String]>,
) -> Result<ClassificationReport> {
    classification_report(
        &y_true.canonicalize(),
        &y_pred.canonicalize(),
        names,
        ZeroDivision::default(),
    )
}

//! End-to-end evaluation over train/test splits.
//!
//! [`Evaluator::evaluate`] draws the training history (if any), then for each
//! supplied split scores the data with the model, canonicalizes both sides,
//! and prints a classification report followed by the raw and normalized
//! confusion matrices. Nothing is trained.

use std::io::Write;

use crate::extract::collect_from_model;
use crate::plot::{self, Figure};
use crate::{
    ClassSet, ClassificationReport, Classifier, ConfusionMatrix, Error, EvalConfig, EvalData,
    History, Labels, NormalizedConfusionMatrix, Result,
};

/// Everything computed for one split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitReport {
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub normalized: NormalizedConfusionMatrix,
}

/// Structured results, returned when [`EvalConfig::return_reports`] is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvalReports {
    pub train: Option<SplitReport>,
    pub test: Option<SplitReport>,
}

/// Prints reports and charts for a model's train/test splits.
///
/// Built from a validated [`EvalConfig`]; holds no other state, so one evaluator
/// can be reused across models.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    /// Validate `config` and build an evaluator from it.
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Canonicalize, compute and print a report plus confusion matrices.
    pub fn report<W: Write + ?Sized>(
        &self,
        title: &str,
        y_true: &Labels,
        y_pred: &Labels,
        out: &mut W,
    ) -> Result<SplitReport> {
        if y_true.len() != y_pred.len() {
            return Err(Error::LabelMismatch(format!(
                "{title}: y_true has {} rows, y_pred has {}",
                y_true.len(),
                y_pred.len()
            )));
        }
        let y_true = y_true.canonicalize();
        let y_pred = y_pred.canonicalize();
        self.report_indices(title, &y_true, &y_pred, out)
    }

    /// Same as [`Evaluator::report`] for labels that are already class indices.
    pub fn report_indices<W: Write + ?Sized>(
        &self,
        title: &str,
        y_true: &[usize],
        y_pred: &[usize],
        out: &mut W,
    ) -> Result<SplitReport> {
        let cfg = &self.config;
        let classes = ClassSet::resolve(y_true, y_pred, cfg.class_names.as_deref())?;
        if y_true.is_empty() {
            return Err(Error::InvalidData(format!("{title}: no samples to evaluate")));
        }

        let confusion = ConfusionMatrix::from_indices(y_true, y_pred, &classes)?;
        let normalized = confusion.normalize(cfg.normalize);
        let report = ClassificationReport::from_confusion(&confusion, cfg.zero_division);

        tracing::info!(
            split = title,
            samples = y_true.len(),
            accuracy = report.accuracy(),
            "evaluated split"
        );

        let digits = cfg.digits;
        writeln!(out, "{title}")?;
        writeln!(out)?;
        write!(out, "{report:.digits$}")?;
        writeln!(out)?;
        let figure = plot::confusion_figure(format!("{title} confusion"), &confusion, &normalized);
        write!(out, "{}", figure.render(&cfg.render))?;
        writeln!(out)?;

        Ok(SplitReport {
            report,
            confusion,
            normalized,
        })
    }

    /// Draw one chart per metric family of `history`.
    ///
    /// Non-finite values (a diverged epoch, say) are logged and left out of the
    /// curves rather than failing the evaluation.
    pub fn plot_history<W: Write + ?Sized>(
        &self,
        history: &History,
        out: &mut W,
    ) -> Result<Figure> {
        if let Err(err) = history.validate() {
            tracing::warn!(error = %err, "plotting history without its non-finite values");
        }
        let figure = plot::history_figure(history);
        write!(out, "{}", figure.render(&self.config.render))?;
        writeln!(out)?;
        Ok(figure)
    }

    /// Evaluate `model` on whichever splits are supplied.
    ///
    /// Array data is scored in one call; streaming data batch by batch. Returns
    /// the structured reports only when the config asks for them.
    pub fn evaluate<'d, C, W>(
        &self,
        model: &C,
        train: Option<EvalData<'d>>,
        test: Option<EvalData<'d>>,
        history: Option<&History>,
        out: &mut W,
    ) -> Result<Option<EvalReports>>
    where
        C: Classifier + ?Sized,
        W: Write + ?Sized,
    {
        if let Some(history) = history {
            self.plot_history(history, out)?;
        }

        let mut reports = EvalReports::default();
        for (title, data, slot) in [
            ("Train", train, &mut reports.train),
            ("Test", test, &mut reports.test),
        ] {
            let Some(data) = data else {
                continue;
            };
            let (y_true, y_pred) = predict_split(model, data)?;
            *slot = Some(self.report(title, &y_true, &y_pred, out)?);
        }

        Ok(self.config.return_reports.then_some(reports))
    }
}

/// Score a split and return `(y_true, y_pred)`.
fn predict_split<C>(model: &C, data: EvalData<'_>) -> Result<(Labels, Labels)>
where
    C: Classifier + ?Sized,
{
    match data {
        EvalData::Array(dataset) => {
            let (inputs, y_true) = dataset.into_parts();
            let scores = model.predict_batch(&inputs)?;
            if scores.len() != inputs.len() {
                return Err(Error::ShapeMismatch(format!(
                    "model returned {} rows for {} inputs",
                    scores.len(),
                    inputs.len()
                )));
            }
            Ok((y_true, scores.into_labels(model.output_kind())?))
        }
        EvalData::Streaming(source) => collect_from_model(model, source),
    }
}

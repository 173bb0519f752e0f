//! Pull labels and predictions out of a streaming source.
//!
//! A streaming source is any finite iterator of [`Batch`]es. Each batch is scored
//! once; true labels and scores are concatenated in the order the source
//! yields them (batch order first, then row order within a batch).

use crate::{Batch, Classifier, Error, Inputs, LabelKind, Labels, Result, Scores};

/// True labels and raw scores gathered from a source, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Ground truth, concatenated in source order.
    pub y_true: Labels,
    /// Raw model scores, one row per `y_true` row.
    pub y_score: Scores,
    /// Number of batches consumed, empty ones included.
    pub batches: usize,
}

impl Extracted {
    #[inline]
    pub fn len(&self) -> usize {
        self.y_true.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y_true.is_empty()
    }

    /// Read the scores as `kind` and return `(y_true, y_pred)`.
    pub fn into_labels(self, kind: LabelKind) -> Result<(Labels, Labels)> {
        let y_pred = self.y_score.into_labels(kind)?;
        Ok((self.y_true, y_pred))
    }
}

/// Iterate `source` to exhaustion, scoring every batch with `score`.
///
/// `score` is called once per non-empty batch and must return one row per
/// input; a batch that comes back with a different row count fails with
/// [`Error::ShapeMismatch`]. Empty batches are consumed without scoring. The
/// source must terminate and yield at least one row.
pub fn collect_predictions<I, F>(source: I, mut score: F) -> Result<Extracted>
where
    I: IntoIterator<Item = Batch>,
    F: FnMut(&Inputs) -> Result<Scores>,
{
    let mut y_true: Option<Labels> = None;
    let mut y_score: Option<Scores> = None;
    let mut batches = 0usize;

    for batch in source {
        batches += 1;
        if batch.is_empty() {
            tracing::debug!(batch = batches - 1, "skipped empty batch");
            continue;
        }
        let (inputs, labels) = batch.into_parts();
        let scores = score(&inputs)?;
        if scores.len() != inputs.len() {
            return Err(Error::ShapeMismatch(format!(
                "batch {}: scoring returned {} rows for {} inputs",
                batches - 1,
                scores.len(),
                inputs.len()
            )));
        }

        match y_true.as_mut() {
            Some(acc) => acc.append(labels)?,
            None => y_true = Some(labels),
        }
        match y_score.as_mut() {
            Some(acc) => acc.append(scores)?,
            None => y_score = Some(scores),
        }

        tracing::debug!(batch = batches - 1, rows = inputs.len(), "scored batch");
    }

    match (y_true, y_score) {
        (Some(y_true), Some(y_score)) => {
            tracing::debug!(batches, rows = y_true.len(), "source exhausted");
            Ok(Extracted {
                y_true,
                y_score,
                batches,
            })
        }
        _ => Err(Error::InvalidData(format!(
            "streaming source yielded no rows ({batches} batches)"
        ))),
    }
}

/// Score a streaming source with `model` and return `(y_true, y_pred)`.
///
/// Predictions are read using the model's declared output kind.
pub fn collect_from_model<C, I>(model: &C, source: I) -> Result<(Labels, Labels)>
where
    C: Classifier + ?Sized,
    I: IntoIterator<Item = Batch>,
{
    let extracted = collect_predictions(source, |x| model.predict_batch(x))?;
    extracted.into_labels(model.output_kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::from_fn;

    fn batch(start: usize, len: usize) -> Batch {
        let inputs = Inputs::from_flat((start..start + len).map(|i| i as f32).collect(), 1).unwrap();
        let labels = Labels::class_indices((start..start + len).map(|i| i % 2).collect());
        Batch::new(inputs, labels).unwrap()
    }

    /// Echoes each input as a two-class probability row, so row order is visible.
    fn echo(x: &Inputs) -> Result<Scores> {
        let rows: Vec<Vec<f32>> = x.rows().map(|r| vec![r[0], -r[0]]).collect();
        Scores::from_rows(&rows)
    }

    #[test]
    fn concatenates_in_source_order() {
        let source = vec![batch(0, 2), batch(2, 2), batch(4, 1)];
        let mut calls = 0;
        let out = collect_predictions(source, |x| {
            calls += 1;
            echo(x)
        })
        .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(out.batches, 3);
        assert_eq!(out.len(), 5);
        assert_eq!(out.y_score.len(), 5);
        let firsts: Vec<f32> = (0..5).map(|i| out.y_score.row(i)[0]).collect();
        assert_eq!(firsts, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.y_true.canonicalize(), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn short_batch_output_is_a_shape_mismatch() {
        let source = vec![batch(0, 2), batch(2, 3)];
        let err = collect_predictions(source, |x| {
            // Pretend the model only ever scores the first input.
            Scores::from_flat(vec![x.input(0)[0]], 1)
        })
        .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn width_change_between_batches_is_a_shape_mismatch() {
        let mut width = 1;
        let err = collect_predictions(vec![batch(0, 1), batch(1, 1)], |x| {
            width += 1;
            Scores::from_flat(vec![0.5; x.len() * width], width)
        })
        .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = collect_predictions(Vec::new(), echo).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        let err = collect_predictions(vec![batch(0, 0), batch(0, 0)], echo).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn empty_batches_are_skipped_without_scoring() {
        let source = vec![batch(0, 0), batch(0, 2), batch(2, 0), batch(2, 1)];
        let mut calls = 0;
        let out = collect_predictions(source, |x| {
            calls += 1;
            echo(x)
        })
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(out.batches, 4);
        assert_eq!(out.len(), 3);
        assert_eq!(out.y_score.output_dim(), 2);
        assert_eq!(out.y_true.canonicalize(), vec![0, 1, 0]);
    }

    #[test]
    fn model_helper_reads_scores_with_declared_kind() {
        let model = from_fn(LabelKind::OneHot { num_classes: 2 }, echo);
        let (y_true, y_pred) = collect_from_model(&model, vec![batch(1, 2)]).unwrap();
        assert_eq!(y_true.canonicalize(), vec![1, 0]);
        // [1, -1] -> 0, [2, -2] -> 0
        assert_eq!(y_pred.canonicalize(), vec![0, 0]);
    }
}

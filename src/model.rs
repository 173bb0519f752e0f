//! The model seam.
//!
//! Evaluation never trains anything. It only needs a way to score a batch of
//! inputs and to know how those scores should be read.

use crate::{Inputs, LabelKind, Result, Scores};

/// A trained classifier that can score batches of inputs.
pub trait Classifier {
    /// How the rows returned by [`Classifier::predict_batch`] are read.
    fn output_kind(&self) -> LabelKind;

    /// Score `inputs`, returning exactly one row per input.
    fn predict_batch(&self, inputs: &Inputs) -> Result<Scores>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn output_kind(&self) -> LabelKind {
        (**self).output_kind()
    }

    fn predict_batch(&self, inputs: &Inputs) -> Result<Scores> {
        (**self).predict_batch(inputs)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn output_kind(&self) -> LabelKind {
        (**self).output_kind()
    }

    fn predict_batch(&self, inputs: &Inputs) -> Result<Scores> {
        (**self).predict_batch(inputs)
    }
}

/// A [`Classifier`] backed by a closure.
///
/// ```rust
/// use classeval::{Classifier, LabelKind, Scores, model::from_fn};
///
/// # fn main() -> classeval::Result<()> {
/// let model = from_fn(LabelKind::BinaryScore, |x| {
///     Scores::from_flat(x.rows().map(|r| r[0]).collect(), 1)
/// });
/// let x = classeval::Inputs::from_flat(vec![0.2, 0.9], 1)?;
/// assert_eq!(model.predict_batch(&x)?.len(), 2);
/// # Ok(())
/// # }
/// ```
pub fn from_fn<F>(kind: LabelKind, score: F) -> FnClassifier<F>
where
    F: Fn(&Inputs) -> Result<Scores>,
{
    FnClassifier { kind, score }
}

/// Closure-backed [`Classifier`], built by [`from_fn`].
#[derive(Debug, Clone)]
pub struct FnClassifier<F> {
    kind: LabelKind,
    score: F,
}

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&Inputs) -> Result<Scores>,
{
    fn output_kind(&self) -> LabelKind {
        self.kind
    }

    fn predict_batch(&self, inputs: &Inputs) -> Result<Scores> {
        (self.score)(inputs)
    }
}

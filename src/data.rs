//! Contiguous input/score buffers and evaluation data sources.
//!
//! `Inputs` and `Scores` store row-major matrices. A `Dataset` pairs inputs with
//! [`Labels`] and can be cut into [`Batch`]es, optionally in a seeded random
//! order. [`EvalData`] is what callers hand to the evaluator: either a whole
//! dataset held in memory, or a finite stream of batches.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{Error, LabelKind, Labels, Result};

/// A collection of input samples (X).
///
/// Stored as a contiguous buffer with row-major layout:
/// - `inputs.len() == len * input_dim`
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    inputs: Vec<f32>,
    len: usize,
    input_dim: usize,
}

impl Inputs {
    /// Build inputs from a flat buffer with shape `(len, input_dim)`.
    pub fn from_flat(inputs: Vec<f32>, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if !inputs.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {}",
                inputs.len(),
                input_dim
            )));
        }

        let len = inputs.len() / input_dim;

        Ok(Self {
            inputs,
            len,
            input_dim,
        })
    }

    /// Build inputs from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f32>]) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }

        let input_dim = inputs[0].len();
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }

        let mut flat = Vec::with_capacity(inputs.len() * input_dim);
        for (i, row) in inputs.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }

        Ok(Self {
            inputs: flat,
            len: inputs.len(),
            input_dim,
        })
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-sample input dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the `idx`-th input row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f32] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    /// Iterate over input rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.inputs.chunks_exact(self.input_dim)
    }

    /// Gather the rows at `indices`, in that order.
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Inputs {
        let mut out = Vec::with_capacity(indices.len() * self.input_dim);
        for &i in indices {
            out.extend_from_slice(self.input(i));
        }
        Inputs {
            inputs: out,
            len: indices.len(),
            input_dim: self.input_dim,
        }
    }
}

/// Model outputs for a batch of inputs.
///
/// Stored row-major: `values.len() == len * output_dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    values: Vec<f32>,
    output_dim: usize,
}

impl Scores {
    /// Build scores from a flat buffer with shape `(len, output_dim)`.
    pub fn from_flat(values: Vec<f32>, output_dim: usize) -> Result<Self> {
        if output_dim == 0 {
            return Err(Error::InvalidData("output_dim must be > 0".to_owned()));
        }
        if !values.len().is_multiple_of(output_dim) {
            return Err(Error::ShapeMismatch(format!(
                "scores length {} is not divisible by output_dim {}",
                values.len(),
                output_dim
            )));
        }
        Ok(Self { values, output_dim })
    }

    /// Build scores from per-sample rows.
    ///
    /// The width is taken from the first row, so `rows` must not be empty; use
    /// [`Scores::from_flat`] with an explicit `output_dim` for zero rows.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::InvalidData(
                "cannot infer output_dim from zero score rows".to_owned(),
            ));
        };
        let output_dim = first.len();
        let mut flat = Vec::with_capacity(rows.len() * output_dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != output_dim {
                return Err(Error::ShapeMismatch(format!(
                    "score row {i} has len {}, expected {output_dim}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }
        Self::from_flat(flat, output_dim)
    }

    #[inline]
    /// Returns the number of scored samples.
    pub fn len(&self) -> usize {
        self.values.len() / self.output_dim
    }

    #[inline]
    /// Returns true if there are no scored samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    /// Returns the per-sample output dimension.
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    #[inline]
    /// Returns the `idx`-th score row.
    ///
    /// Panics if `idx >= len`.
    pub fn row(&self, idx: usize) -> &[f32] {
        let start = idx * self.output_dim;
        &self.values[start..start + self.output_dim]
    }

    /// Append another score buffer with the same width.
    pub fn append(&mut self, other: Scores) -> Result<()> {
        if other.output_dim != self.output_dim {
            return Err(Error::ShapeMismatch(format!(
                "score width changed from {} to {}",
                self.output_dim, other.output_dim
            )));
        }
        self.values.extend(other.values);
        Ok(())
    }

    /// Read the scores as labels of `kind`.
    pub fn into_labels(self, kind: LabelKind) -> Result<Labels> {
        if kind.width() != self.output_dim {
            return Err(Error::ShapeMismatch(format!(
                "scores have width {}, but {kind:?} expects width {}",
                self.output_dim,
                kind.width()
            )));
        }
        Labels::from_flat(kind, self.values)
    }
}

/// One `(inputs, labels)` pair yielded by a streaming source.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    inputs: Inputs,
    labels: Labels,
}

impl Batch {
    /// Pair a batch of inputs with its labels; row counts must match.
    pub fn new(inputs: Inputs, labels: Labels) -> Result<Self> {
        if inputs.len() != labels.len() {
            return Err(Error::ShapeMismatch(format!(
                "batch has {} inputs but {} labels",
                inputs.len(),
                labels.len()
            )));
        }
        Ok(Self { inputs, labels })
    }

    #[inline]
    /// Returns the number of rows in the batch.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    /// Returns true if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Split into `(inputs, labels)`.
    pub fn into_parts(self) -> (Inputs, Labels) {
        (self.inputs, self.labels)
    }
}

/// Row order used when cutting a dataset into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shuffle {
    /// Keep the stored order.
    #[default]
    None,
    /// Permute rows with a generator seeded from this value.
    Seeded(u64),
}

/// An in-memory evaluation set: inputs (X) and labels (Y).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Inputs,
    labels: Labels,
}

impl Dataset {
    /// Pair inputs with labels; both must have the same number of rows.
    pub fn new(inputs: Inputs, labels: Labels) -> Result<Self> {
        if inputs.len() != labels.len() {
            return Err(Error::ShapeMismatch(format!(
                "inputs/labels length mismatch: {} vs {}",
                inputs.len(),
                labels.len()
            )));
        }
        Ok(Self { inputs, labels })
    }

    /// Build a dataset from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f32>], labels: &[Vec<f32>], kind: LabelKind) -> Result<Self> {
        let inputs = Inputs::from_rows(inputs)?;
        let labels = Labels::from_rows(kind, labels)?;
        Self::new(inputs, labels)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn into_parts(self) -> (Inputs, Labels) {
        (self.inputs, self.labels)
    }

    /// Cut the dataset into batches of at most `batch_size` rows.
    ///
    /// The last batch holds the remainder. With [`Shuffle::Seeded`] the same seed
    /// always produces the same order, and every row appears exactly once.
    pub fn batches(&self, batch_size: usize, shuffle: Shuffle) -> Result<Batches<'_>> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        if let Shuffle::Seeded(seed) = shuffle {
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }

        Ok(Batches {
            data: self,
            order,
            batch_size,
            cursor: 0,
        })
    }
}

/// Iterator over the batches of a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    data: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let idx = &self.order[self.cursor..end];
        self.cursor = end;

        Some(Batch {
            inputs: self.data.inputs.select(idx),
            labels: self.data.labels.select(idx),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

/// Evaluation data for one split.
///
/// The caller chooses the variant; the evaluator never inspects its input to find
/// out which one it got.
pub enum EvalData<'a> {
    /// The whole split in memory, scored in a single call.
    Array(Dataset),
    /// A finite stream of batches, scored batch by batch.
    Streaming(Box<dyn Iterator<Item = Batch> + 'a>),
}

impl<'a> EvalData<'a> {
    /// An in-memory split; fails if `inputs` and `labels` differ in length.
    pub fn array(inputs: Inputs, labels: Labels) -> Result<Self> {
        Ok(EvalData::Array(Dataset::new(inputs, labels)?))
    }

    /// A split read batch by batch from `source`, which must terminate.
    pub fn streaming<I>(source: I) -> Self
    where
        I: IntoIterator<Item = Batch>,
        I::IntoIter: 'a,
    {
        EvalData::Streaming(Box::new(source.into_iter()))
    }
}

impl From<Dataset> for EvalData<'_> {
    fn from(data: Dataset) -> Self {
        EvalData::Array(data)
    }
}

impl std::fmt::Debug for EvalData<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalData::Array(data) => f.debug_tuple("Array").field(&data.len()).finish(),
            EvalData::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_dataset(len: usize) -> Dataset {
        let inputs = Inputs::from_flat((0..len).map(|i| i as f32).collect(), 1).unwrap();
        let labels = Labels::class_indices((0..len).map(|i| i % 2).collect());
        Dataset::new(inputs, labels).unwrap()
    }

    #[test]
    fn inputs_from_flat_validates_shapes() {
        assert!(Inputs::from_flat(vec![0.0, 1.0, 2.0, 3.0], 2).is_ok());
        assert!(Inputs::from_flat(vec![0.0, 1.0, 2.0], 2).is_err());
        assert!(Inputs::from_flat(vec![], 0).is_err());
    }

    #[test]
    fn length_mismatch_is_a_shape_mismatch_everywhere() {
        let inputs = Inputs::from_flat(vec![0.0, 1.0, 2.0], 1).unwrap();
        let labels = Labels::class_indices(vec![0, 1]);
        assert!(matches!(
            Batch::new(inputs.clone(), labels.clone()),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            Dataset::new(inputs.clone(), labels.clone()),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            EvalData::array(inputs, labels),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn scores_from_zero_rows_is_rejected() {
        assert!(matches!(Scores::from_rows(&[]), Err(Error::InvalidData(_))));
        let empty = Scores::from_flat(Vec::new(), 2).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.output_dim(), 2);
    }

    #[test]
    fn batches_keep_order_without_shuffle() {
        let data = toy_dataset(5);
        let batches: Vec<_> = data.batches(2, Shuffle::None).unwrap().collect();
        assert_eq!(
            batches.iter().map(Batch::len).collect::<Vec<_>>(),
            vec![2, 2, 1]
        );

        let seen: Vec<f32> = batches
            .iter()
            .flat_map(|b| b.inputs().rows().map(|r| r[0]).collect::<Vec<_>>())
            .collect();
        assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn seeded_shuffle_is_reproducible_permutation() {
        let data = toy_dataset(32);
        let order = |seed| -> Vec<f32> {
            data.batches(5, Shuffle::Seeded(seed))
                .unwrap()
                .flat_map(|b| b.inputs().rows().map(|r| r[0]).collect::<Vec<_>>())
                .collect()
        };

        let a = order(7);
        assert_eq!(a, order(7));

        let mut sorted = a.clone();
        sorted.sort_by(f32::total_cmp);
        assert_eq!(sorted, (0..32).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn batches_carry_matching_labels() {
        let data = toy_dataset(6);
        for batch in data.batches(4, Shuffle::Seeded(3)).unwrap() {
            let labels = batch.labels().canonicalize();
            for (row, label) in batch.inputs().rows().zip(labels) {
                assert_eq!(row[0] as usize % 2, label);
            }
        }
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let data = toy_dataset(3);
        assert!(matches!(
            data.batches(0, Shuffle::None),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn scores_convert_to_labels_of_matching_width() {
        let scores = Scores::from_rows(&[vec![0.2, 0.8], vec![0.6, 0.4]]).unwrap();
        assert_eq!(scores.len(), 2);
        let labels = scores
            .clone()
            .into_labels(LabelKind::OneHot { num_classes: 2 })
            .unwrap();
        assert_eq!(labels.canonicalize(), vec![1, 0]);

        assert!(matches!(
            scores.into_labels(LabelKind::BinaryScore),
            Err(Error::ShapeMismatch(_))
        ));
    }
}

//! Label and prediction representations.
//!
//! Ground truth and model outputs arrive in one of three shapes:
//!
//! - class indices, one per sample;
//! - one-hot rows (or per-class probabilities) of width `num_classes > 1`;
//! - a single binary score per sample (probability of class `1`).
//!
//! The shape is always carried by an explicit [`LabelKind`] tag. Nothing here
//! inspects a buffer to guess what it holds.
//!
//! [`Labels::canonicalize`] maps every representation to class indices:
//!
//! - class indices are returned unchanged;
//! - one-hot rows map to the index of their maximum (first maximum on ties);
//! - binary scores are thresholded round-half-up: `score >= 0.5` is class `1`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scores at or above this value canonicalize to class `1`.
pub const BINARY_THRESHOLD: f32 = 0.5;

/// How a label/prediction buffer should be read.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// One integer class index per sample.
    ClassIndices,
    /// `num_classes` values per sample; the largest wins.
    OneHot { num_classes: usize },
    /// One score per sample, thresholded at [`BINARY_THRESHOLD`].
    BinaryScore,
}

impl LabelKind {
    /// Pick a kind from a float row width.
    ///
    /// Width `1` is read as a binary score and any wider row as one-hot. A single
    /// column can't be told apart from a regression output, so prefer passing the
    /// kind explicitly when it is known.
    pub fn from_width(width: usize) -> Result<Self> {
        match width {
            0 => Err(Error::InvalidData("label width must be > 0".to_owned())),
            1 => Ok(LabelKind::BinaryScore),
            n => Ok(LabelKind::OneHot { num_classes: n }),
        }
    }

    /// Number of values stored per sample.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            LabelKind::ClassIndices | LabelKind::BinaryScore => 1,
            LabelKind::OneHot { num_classes } => num_classes,
        }
    }

    fn validate(self) -> Result<()> {
        if let LabelKind::OneHot { num_classes } = self {
            if num_classes < 2 {
                return Err(Error::InvalidData(format!(
                    "one-hot labels need at least 2 classes, got {num_classes}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Repr {
    ClassIndices(Vec<usize>),
    OneHot { values: Vec<f32>, num_classes: usize },
    BinaryScore(Vec<f32>),
}

/// A validated sequence of labels or predictions.
///
/// One-hot values are stored row-major: `values.len() == len * num_classes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    repr: Repr,
}

impl Labels {
    /// Wrap class indices.
    pub fn class_indices(indices: Vec<usize>) -> Self {
        Self {
            repr: Repr::ClassIndices(indices),
        }
    }

    /// Wrap a flat row-major one-hot/probability buffer.
    pub fn one_hot(values: Vec<f32>, num_classes: usize) -> Result<Self> {
        Self::from_flat(LabelKind::OneHot { num_classes }, values)
    }

    /// Wrap one binary score per sample.
    pub fn binary_scores(scores: Vec<f32>) -> Result<Self> {
        Self::from_flat(LabelKind::BinaryScore, scores)
    }

    /// Build labels of `kind` from a flat float buffer.
    ///
    /// For [`LabelKind::ClassIndices`] every value must be a non-negative integer.
    pub fn from_flat(kind: LabelKind, values: Vec<f32>) -> Result<Self> {
        kind.validate()?;
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidData(format!(
                "label value at position {pos} is not finite"
            )));
        }

        let repr = match kind {
            LabelKind::ClassIndices => {
                let mut indices = Vec::with_capacity(values.len());
                for (i, v) in values.into_iter().enumerate() {
                    if v < 0.0 || v.fract() != 0.0 {
                        return Err(Error::InvalidData(format!(
                            "class index at row {i} must be a non-negative integer, got {v}"
                        )));
                    }
                    indices.push(v as usize);
                }
                Repr::ClassIndices(indices)
            }
            LabelKind::OneHot { num_classes } => {
                if !values.len().is_multiple_of(num_classes) {
                    return Err(Error::ShapeMismatch(format!(
                        "label buffer length {} is not divisible by num_classes {}",
                        values.len(),
                        num_classes
                    )));
                }
                Repr::OneHot {
                    values,
                    num_classes,
                }
            }
            LabelKind::BinaryScore => Repr::BinaryScore(values),
        };

        Ok(Self { repr })
    }

    /// Build labels of `kind` from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(kind: LabelKind, rows: &[Vec<f32>]) -> Result<Self> {
        let width = kind.width();
        let mut flat = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(Error::ShapeMismatch(format!(
                    "label row {i} has len {}, expected {width}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }
        Self::from_flat(kind, flat)
    }

    /// The representation tag.
    pub fn kind(&self) -> LabelKind {
        match &self.repr {
            Repr::ClassIndices(_) => LabelKind::ClassIndices,
            Repr::OneHot { num_classes, .. } => LabelKind::OneHot {
                num_classes: *num_classes,
            },
            Repr::BinaryScore(_) => LabelKind::BinaryScore,
        }
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::ClassIndices(v) => v.len(),
            Repr::OneHot {
                values,
                num_classes,
            } => values.len() / num_classes,
            Repr::BinaryScore(v) => v.len(),
        }
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `other` to the end of `self`.
    ///
    /// Both sides must share the same kind (and one-hot width).
    pub fn append(&mut self, other: Labels) -> Result<()> {
        let (ours, theirs) = (self.kind(), other.kind());
        if ours != theirs {
            return Err(Error::ShapeMismatch(format!(
                "cannot append {theirs:?} labels to {ours:?} labels"
            )));
        }

        match (&mut self.repr, other.repr) {
            (Repr::ClassIndices(a), Repr::ClassIndices(b)) => a.extend(b),
            (Repr::OneHot { values: a, .. }, Repr::OneHot { values: b, .. }) => a.extend(b),
            (Repr::BinaryScore(a), Repr::BinaryScore(b)) => a.extend(b),
            _ => unreachable!("kinds compared equal above"),
        }
        Ok(())
    }

    /// Gather the rows at `indices`, in that order.
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Labels {
        let repr = match &self.repr {
            Repr::ClassIndices(v) => Repr::ClassIndices(indices.iter().map(|&i| v[i]).collect()),
            Repr::OneHot {
                values,
                num_classes,
            } => {
                let n = *num_classes;
                let mut out = Vec::with_capacity(indices.len() * n);
                for &i in indices {
                    out.extend_from_slice(&values[i * n..(i + 1) * n]);
                }
                Repr::OneHot {
                    values: out,
                    num_classes: n,
                }
            }
            Repr::BinaryScore(v) => Repr::BinaryScore(indices.iter().map(|&i| v[i]).collect()),
        };
        Labels { repr }
    }

    /// Convert to one class index per sample.
    ///
    /// Pure and deterministic. Already-canonical input is returned as-is, so the
    /// operation is idempotent.
    pub fn canonicalize(&self) -> Vec<usize> {
        match &self.repr {
            Repr::ClassIndices(v) => v.clone(),
            Repr::OneHot {
                values,
                num_classes,
            } => values.chunks_exact(*num_classes).map(argmax).collect(),
            Repr::BinaryScore(v) => v.iter().map(|&s| threshold(s)).collect(),
        }
    }
}

impl From<Vec<usize>> for Labels {
    fn from(indices: Vec<usize>) -> Self {
        Labels::class_indices(indices)
    }
}

/// Index of the first maximum in `row`.
#[inline]
pub(crate) fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate().skip(1) {
        if v > row[best] {
            best = i;
        }
    }
    best
}

#[inline]
fn threshold(score: f32) -> usize {
    usize::from(score >= BINARY_THRESHOLD)
}

//! Confusion matrices.
//!
//! Rows are true classes and columns are predicted classes, both in the order of
//! the [`ClassSet`] the matrix was built over.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The ordered classes a report or matrix is computed over.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSet {
    indices: Vec<usize>,
    names: Vec<String>,
}

impl ClassSet {
    /// Resolve the class set for a pair of canonical label sequences.
    ///
    /// Without names, the classes are the sorted union of the values in `y_true`
    /// and `y_pred`, named by index. With `names`, that union must be exactly
    /// `0..names.len()`: an index past the last name, or a name no sample
    /// uses, is a [`Error::LabelMismatch`]. Use [`ClassSet::new`] to report on
    /// classes that may be absent.
    pub fn resolve(y_true: &[usize], y_pred: &[usize], names: Option<&[String]>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::LabelMismatch(format!(
                "y_true has {} rows, y_pred has {}",
                y_true.len(),
                y_pred.len()
            )));
        }

        match names {
            Some(names) => {
                let n = names.len();
                let check = |side: &str, values: &[usize]| -> Result<()> {
                    match values.iter().find(|&&v| v >= n) {
                        Some(v) => Err(Error::LabelMismatch(format!(
                            "{side} references class {v}, but only {n} class names were given"
                        ))),
                        None => Ok(()),
                    }
                };
                check("y_true", y_true)?;
                check("y_pred", y_pred)?;

                let mut seen = vec![false; n];
                for &v in y_true.iter().chain(y_pred) {
                    seen[v] = true;
                }
                let unused: Vec<&str> = names
                    .iter()
                    .zip(&seen)
                    .filter(|(_, seen)| !**seen)
                    .map(|(name, _)| name.as_str())
                    .collect();
                if !unused.is_empty() {
                    return Err(Error::LabelMismatch(format!(
                        "{n} class names given but the labels use {} distinct classes; \
                         no samples for {unused:?}",
                        n - unused.len()
                    )));
                }

                Ok(Self {
                    indices: (0..n).collect(),
                    names: names.to_vec(),
                })
            }
            None => {
                let mut indices: Vec<usize> = y_true.iter().chain(y_pred).copied().collect();
                indices.sort_unstable();
                indices.dedup();
                let names = indices.iter().map(usize::to_string).collect();
                Ok(Self { indices, names })
            }
        }
    }

    /// Build a class set from explicit indices and display names.
    pub fn new(indices: Vec<usize>, names: Vec<String>) -> Result<Self> {
        if indices.len() != names.len() {
            return Err(Error::LabelMismatch(format!(
                "{} classes but {} names",
                indices.len(),
                names.len()
            )));
        }
        let mut seen = indices.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != indices.len() {
            return Err(Error::LabelMismatch(
                "class indices must be distinct".to_owned(),
            ));
        }
        Ok(Self { indices, names })
    }

    #[inline]
    /// Returns the number of classes.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    /// Returns true if there are no classes.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    /// Class indices, in matrix order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    /// Display names, parallel to [`ClassSet::indices`].
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// How the second confusion matrix is normalized.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalize {
    /// Each row (true class) sums to 1.
    #[default]
    True,
    /// Each column (predicted class) sums to 1.
    Pred,
    /// The whole matrix sums to 1.
    All,
    /// Raw counts.
    None,
}

impl fmt::Display for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Normalize::True => "true",
            Normalize::Pred => "pred",
            Normalize::All => "all",
            Normalize::None => "none",
        })
    }
}

impl FromStr for Normalize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "true" => Ok(Normalize::True),
            "pred" => Ok(Normalize::Pred),
            "all" => Ok(Normalize::All),
            "none" => Ok(Normalize::None),
            other => Err(Error::InvalidConfig(format!(
                "unknown normalization {other:?}; expected true, pred, all or none"
            ))),
        }
    }
}

/// Raw-count confusion matrix.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    classes: ClassSet,
    /// Row-major `(n, n)`.
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    /// Count `(true, predicted)` pairs over `classes`.
    pub fn from_indices(y_true: &[usize], y_pred: &[usize], classes: &ClassSet) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::LabelMismatch(format!(
                "y_true has {} rows, y_pred has {}",
                y_true.len(),
                y_pred.len()
            )));
        }

        let position: HashMap<usize, usize> = classes
            .indices()
            .iter()
            .enumerate()
            .map(|(pos, &class)| (class, pos))
            .collect();
        let lookup = |side: &str, class: usize| -> Result<usize> {
            position.get(&class).copied().ok_or_else(|| {
                Error::LabelMismatch(format!("{side} class {class} is not in the class set"))
            })
        };

        let n = classes.len();
        let mut counts = vec![0usize; n * n];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            let row = lookup("true", t)?;
            let col = lookup("predicted", p)?;
            counts[row * n + col] += 1;
        }

        Ok(Self {
            classes: classes.clone(),
            counts,
        })
    }

    #[inline]
    /// The classes labelling rows and columns.
    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Count of samples with true class position `t` predicted as position `p`.
    ///
    /// Panics if either position is out of bounds.
    #[inline]
    pub fn count(&self, t: usize, p: usize) -> usize {
        let n = self.num_classes();
        assert!(t < n && p < n, "position ({t}, {p}) out of bounds for {n} classes");
        self.counts[t * n + p]
    }

    /// Row `t` (true class position) of the matrix.
    pub fn row(&self, t: usize) -> &[usize] {
        let n = self.num_classes();
        &self.counts[t * n..(t + 1) * n]
    }

    /// The matrix as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        (0..self.num_classes()).map(|t| self.row(t).to_vec()).collect()
    }

    /// Number of samples whose true class is at position `t`.
    pub fn support(&self, t: usize) -> usize {
        self.row(t).iter().sum()
    }

    /// Number of samples predicted as the class at position `p`.
    pub fn predicted(&self, p: usize) -> usize {
        (0..self.num_classes()).map(|t| self.count(t, p)).sum()
    }

    /// Correct predictions (the diagonal).
    pub fn trace(&self) -> usize {
        (0..self.num_classes()).map(|k| self.count(k, k)).sum()
    }

    /// Number of samples counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// A normalized copy. Rows or columns with no samples normalize to 0.
    pub fn normalize(&self, mode: Normalize) -> NormalizedConfusionMatrix {
        let n = self.num_classes();
        let total = self.total();
        let row_sums: Vec<usize> = (0..n).map(|t| self.support(t)).collect();
        let col_sums: Vec<usize> = (0..n).map(|p| self.predicted(p)).collect();

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

        let mut values = Vec::with_capacity(n * n);
        for t in 0..n {
            for p in 0..n {
                let c = self.count(t, p);
                values.push(match mode {
                    Normalize::True => ratio(c, row_sums[t]),
                    Normalize::Pred => ratio(c, col_sums[p]),
                    Normalize::All => ratio(c, total),
                    Normalize::None => c as f64,
                });
            }
        }

        NormalizedConfusionMatrix {
            classes: self.classes.clone(),
            mode,
            values,
        }
    }
}

/// A confusion matrix after normalization.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfusionMatrix {
    classes: ClassSet,
    mode: Normalize,
    values: Vec<f64>,
}

impl NormalizedConfusionMatrix {
    #[inline]
    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    #[inline]
    /// The normalization this matrix was built with.
    pub fn mode(&self) -> Normalize {
        self.mode
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Panics if either position is out of bounds.
    #[inline]
    pub fn get(&self, t: usize, p: usize) -> f64 {
        let n = self.num_classes();
        assert!(t < n && p < n, "position ({t}, {p}) out of bounds for {n} classes");
        self.values[t * n + p]
    }

    pub fn row(&self, t: usize) -> &[f64] {
        let n = self.num_classes();
        &self.values[t * n..(t + 1) * n]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.num_classes()).map(|t| self.row(t).to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary() -> ConfusionMatrix {
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 1, 1, 1];
        let classes = ClassSet::resolve(&y_true, &y_pred, None).unwrap();
        ConfusionMatrix::from_indices(&y_true, &y_pred, &classes).unwrap()
    }

    #[test]
    fn rows_are_true_columns_are_predicted() {
        let cm = binary();
        assert_eq!(cm.to_rows(), vec![vec![1, 1], vec![0, 2]]);
        assert_eq!(cm.support(0), 2);
        assert_eq!(cm.predicted(1), 3);
        assert_eq!(cm.trace(), 3);
        assert_eq!(cm.total(), 4);
    }

    #[test]
    fn normalize_modes() {
        let cm = binary();

        let t = cm.normalize(Normalize::True);
        assert_eq!(t.to_rows(), vec![vec![0.5, 0.5], vec![0.0, 1.0]]);

        let p = cm.normalize(Normalize::Pred);
        assert!((p.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((p.get(0, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((p.get(1, 1) - 2.0 / 3.0).abs() < 1e-12);

        let a = cm.normalize(Normalize::All);
        assert_eq!(a.to_rows(), vec![vec![0.25, 0.25], vec![0.0, 0.5]]);

        let n = cm.normalize(Normalize::None);
        assert_eq!(n.to_rows(), vec![vec![1.0, 1.0], vec![0.0, 2.0]]);
    }

    #[test]
    fn empty_rows_normalize_to_zero() {
        let names = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let y_true = [0, 1];
        let y_pred = [0, 1];
        let classes = ClassSet::new(vec![0, 1, 2], names).unwrap();
        let cm = ConfusionMatrix::from_indices(&y_true, &y_pred, &classes).unwrap();
        let t = cm.normalize(Normalize::True);
        assert_eq!(t.row(2), &[0.0, 0.0, 0.0]);
        assert_eq!(t.row(0), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn inferred_classes_are_sorted_union() {
        let classes = ClassSet::resolve(&[3, 1, 3], &[1, 7, 3], None).unwrap();
        assert_eq!(classes.indices(), &[1, 3, 7]);
        assert_eq!(classes.names(), &["1", "3", "7"]);
    }

    #[test]
    fn named_classes_reject_out_of_range_predictions() {
        let names = vec!["muffin".to_owned(), "dog".to_owned()];
        let err = ClassSet::resolve(&[0, 1], &[0, 2], Some(&names[..])).unwrap_err();
        assert!(matches!(err, Error::LabelMismatch(_)));
        assert!(format!("{err}").contains("y_pred references class 2"));
    }

    #[test]
    fn surplus_class_names_are_label_mismatch() {
        let names = vec!["cat".to_owned(), "dog".to_owned(), "muffin".to_owned()];
        let err = ClassSet::resolve(&[0, 1, 0, 1], &[0, 1, 0, 1], Some(&names[..])).unwrap_err();
        assert!(matches!(err, Error::LabelMismatch(_)));
        assert!(format!("{err}").contains("\"muffin\""));
    }

    #[test]
    fn class_seen_only_in_predictions_counts_as_used() {
        let names = vec!["muffin".to_owned(), "dog".to_owned()];
        let classes = ClassSet::resolve(&[0, 0], &[0, 1], Some(&names[..])).unwrap();
        assert_eq!(classes.indices(), &[0, 1]);
    }

    #[test]
    fn unknown_class_in_matrix_is_label_mismatch() {
        let classes = ClassSet::new(vec![0, 1], vec!["a".into(), "b".into()]).unwrap();
        let err = ConfusionMatrix::from_indices(&[0, 5], &[0, 1], &classes).unwrap_err();
        assert!(matches!(err, Error::LabelMismatch(_)));
    }

    #[test]
    fn normalize_parses_from_str() {
        assert_eq!("pred".parse::<Normalize>().unwrap(), Normalize::Pred);
        assert_eq!(Normalize::All.to_string(), "all");
        assert!("rows".parse::<Normalize>().is_err());
    }
}

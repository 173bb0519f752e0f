//! Classification reports.
//!
//! Per-class precision, recall, F1 and support, plus accuracy and macro/weighted
//! averages, all derived from a [`ConfusionMatrix`].
//!
//! `Display` prints the usual text table. The precision flag of the formatter
//! selects the number of decimals (`format!("{report:.4}")`); the default is 2.
//! With the `serde` feature the report serializes to a map keyed by class name
//! plus `"accuracy"`, `"macro avg"` and `"weighted avg"`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::{ClassSet, ConfusionMatrix, Error, Result};

/// Decimals printed when the formatter does not ask for a precision.
pub const DEFAULT_DIGITS: usize = 2;

/// Value used for a ratio whose denominator is zero.
#[cfg_attr(feature = "serde", derive(serde::Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDivision {
    #[default]
    Zero,
    One,
}

impl ZeroDivision {
    #[inline]
    fn value(self) -> f64 {
        match self {
            ZeroDivision::Zero => 0.0,
            ZeroDivision::One => 1.0,
        }
    }
}

/// Metrics for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of samples whose true label is this class.
    pub support: usize,
}

/// An averaged row of the report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl AverageMetrics {
    fn scale(&mut self, by: f64) {
        self.precision *= by;
        self.recall *= by;
        self.f1_score *= by;
    }
}

/// Precision/recall/F1/support per class plus summary rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    classes: Vec<ClassMetrics>,
    accuracy: f64,
    macro_avg: AverageMetrics,
    weighted_avg: AverageMetrics,
}

/// Build a report for canonical labels.
///
/// The classes are the sorted union of observed indices. With `names` that union
/// must be exactly `0..names.len()`. Fails with [`Error::LabelMismatch`] if the
/// sequences differ in length, reference a class past the last name, or leave a
/// named class unused, and with [`Error::InvalidData`] if they are empty.
pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    names: Option<&[String]>,
    zero_division: ZeroDivision,
) -> Result<ClassificationReport> {
    let classes = ClassSet::resolve(y_true, y_pred, names)?;
    if y_true.is_empty() {
        return Err(Error::InvalidData(
            "cannot report on an empty label sequence".to_owned(),
        ));
    }
    let cm = ConfusionMatrix::from_indices(y_true, y_pred, &classes)?;
    Ok(ClassificationReport::from_confusion(&cm, zero_division))
}

impl ClassificationReport {
    /// Derive a report from a raw-count confusion matrix.
    pub fn from_confusion(cm: &ConfusionMatrix, zero_division: ZeroDivision) -> Self {
        let n = cm.num_classes();
        let names = cm.classes().names();
        let ratio = |what: &str, name: &str, num: usize, den: usize| -> f64 {
            if den == 0 {
                tracing::warn!(
                    class = name,
                    metric = what,
                    "metric is ill-defined; using {:?}",
                    zero_division
                );
                zero_division.value()
            } else {
                num as f64 / den as f64
            }
        };

        let mut classes = Vec::with_capacity(n);
        for k in 0..n {
            let tp = cm.count(k, k);
            let support = cm.support(k);
            let predicted = cm.predicted(k);
            let name = names[k].as_str();

            let precision = ratio("precision", name, tp, predicted);
            let recall = ratio("recall", name, tp, support);
            // 2PR/(P+R) == 2TP/(2TP+FP+FN); only undefined when the class never occurs.
            let f1_score = ratio("f1-score", name, 2 * tp, predicted + support);

            classes.push(ClassMetrics {
                name: name.to_owned(),
                precision,
                recall,
                f1_score,
                support,
            });
        }

        let total = cm.total();
        let accuracy = if total == 0 {
            0.0
        } else {
            cm.trace() as f64 / total as f64
        };

        let mut macro_avg = AverageMetrics {
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            support: total,
        };
        let mut weighted_avg = macro_avg;
        for c in &classes {
            macro_avg.precision += c.precision;
            macro_avg.recall += c.recall;
            macro_avg.f1_score += c.f1_score;

            let w = c.support as f64;
            weighted_avg.precision += c.precision * w;
            weighted_avg.recall += c.recall * w;
            weighted_avg.f1_score += c.f1_score * w;
        }
        if n > 0 {
            macro_avg.scale(1.0 / n as f64);
        }
        if total > 0 {
            weighted_avg.scale(1.0 / total as f64);
        }

        Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
        }
    }

    /// Per-class rows in class-set order.
    #[inline]
    pub fn classes(&self) -> &[ClassMetrics] {
        &self.classes
    }

    /// Look up a class row by display name.
    pub fn class(&self, name: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.name == name)
    }

    #[inline]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[inline]
    pub fn macro_avg(&self) -> &AverageMetrics {
        &self.macro_avg
    }

    #[inline]
    pub fn weighted_avg(&self) -> &AverageMetrics {
        &self.weighted_avg
    }

    /// Total number of samples.
    #[inline]
    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

const HEADERS: [&str; 4] = ["precision", "recall", "f1-score", "support"];

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = f.precision().unwrap_or(DEFAULT_DIGITS);
        let width = self
            .classes
            .iter()
            .map(|c| c.name.chars().count())
            .chain(["weighted avg".len(), digits])
            .max()
            .unwrap_or(0);

        write!(f, "{:>width$} ", "")?;
        for h in HEADERS {
            write!(f, " {h:>9}")?;
        }
        writeln!(f)?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>,
                   name: &str,
                   p: f64,
                   r: f64,
                   f1: f64,
                   support: usize|
         -> fmt::Result {
            writeln!(
                f,
                "{name:>width$}  {p:>9.digits$} {r:>9.digits$} {f1:>9.digits$} {support:>9}"
            )
        };

        for c in &self.classes {
            row(f, &c.name, c.precision, c.recall, c.f1_score, c.support)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        for (label, avg) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            row(f, label, avg.precision, avg.recall, avg.f1_score, avg.support)?;
        }
        Ok(())
    }
}

/// One row of the structured report; `f1_score` is keyed as `"f1-score"`.
#[cfg(feature = "serde")]
struct MetricsRow {
    precision: f64,
    recall: f64,
    f1_score: f64,
    support: usize,
}

#[cfg(feature = "serde")]
impl MetricsRow {
    fn new(precision: f64, recall: f64, f1_score: f64, support: usize) -> Self {
        Self {
            precision,
            recall,
            f1_score,
            support,
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for MetricsRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Metrics", 4)?;
        s.serialize_field("precision", &self.precision)?;
        s.serialize_field("recall", &self.recall)?;
        s.serialize_field("f1-score", &self.f1_score)?;
        s.serialize_field("support", &self.support)?;
        s.end()
    }
}

#[cfg(feature = "serde")]
impl Serialize for ClassificationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len() + 3))?;
        for c in &self.classes {
            map.serialize_entry(
                &c.name,
                &MetricsRow::new(c.precision, c.recall, c.f1_score, c.support),
            )?;
        }
        map.serialize_entry("accuracy", &self.accuracy)?;
        for (label, avg) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            map.serialize_entry(
                label,
                &MetricsRow::new(avg.precision, avg.recall, avg.f1_score, avg.support),
            )?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl ClassificationReport {
    /// The report as a JSON value keyed by class name.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize report: {e}")))
    }

    /// The report as a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize report: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["muffin".to_owned(), "dog".to_owned()]
    }

    #[test]
    fn binary_metrics_match_hand_computation() {
        let report =
            classification_report(&[0, 0, 1, 1], &[0, 1, 1, 1], None, ZeroDivision::Zero).unwrap();

        let c1 = report.class("1").unwrap();
        assert!((c1.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((c1.recall - 1.0).abs() < 1e-12);
        assert!((c1.f1_score - 0.8).abs() < 1e-12);
        assert_eq!(c1.support, 2);

        let c0 = report.class("0").unwrap();
        assert!((c0.precision - 1.0).abs() < 1e-12);
        assert!((c0.recall - 0.5).abs() < 1e-12);

        assert!((report.accuracy() - 0.75).abs() < 1e-12);
        assert!((report.macro_avg().recall - 0.75).abs() < 1e-12);
        assert_eq!(report.support(), 4);
    }

    #[test]
    fn weighted_average_uses_support() {
        // class 0: 3 samples all correct; class 1: 1 sample, missed.
        let report =
            classification_report(&[0, 0, 0, 1], &[0, 0, 0, 0], None, ZeroDivision::Zero).unwrap();
        let w = report.weighted_avg();
        // recall: (1.0 * 3 + 0.0 * 1) / 4
        assert!((w.recall - 0.75).abs() < 1e-12);
        // precision of class 1 is undefined -> 0
        assert_eq!(report.class("1").unwrap().precision, 0.0);
        assert!((report.macro_avg().precision - 0.375).abs() < 1e-12);
    }

    #[test]
    fn zero_division_one_fills_undefined_ratios() {
        let report =
            classification_report(&[0, 0, 1], &[0, 0, 0], None, ZeroDivision::One).unwrap();
        assert_eq!(report.class("1").unwrap().precision, 1.0);
        assert_eq!(report.class("1").unwrap().recall, 0.0);
    }

    #[test]
    fn length_mismatch_is_label_mismatch() {
        let err = classification_report(&[0, 1, 0, 1, 1], &[0, 1, 0, 1], None, ZeroDivision::Zero)
            .unwrap_err();
        assert!(matches!(err, Error::LabelMismatch(_)));
    }

    #[test]
    fn empty_input_is_invalid() {
        let err = classification_report(&[], &[], None, ZeroDivision::Zero).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn surplus_class_names_are_rejected() {
        let names = vec!["cat".to_owned(), "dog".to_owned(), "muffin".to_owned()];
        let err = classification_report(
            &[0, 1, 0, 1],
            &[0, 1, 0, 1],
            Some(&names[..]),
            ZeroDivision::Zero,
        )
        .unwrap_err();
        assert!(matches!(err, Error::LabelMismatch(_)));
    }

    #[test]
    fn explicit_class_set_keeps_absent_classes() {
        let names = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let classes = ClassSet::new(vec![0, 1, 2], names).unwrap();
        let cm = ConfusionMatrix::from_indices(&[0, 1], &[0, 1], &classes).unwrap();
        let report = ClassificationReport::from_confusion(&cm, ZeroDivision::Zero);
        assert_eq!(report.classes().len(), 3);
        assert_eq!(report.class("c").unwrap().support, 0);
        assert!((report.weighted_avg().f1_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn text_report_matches_golden() {
        let names = names();
        let report =
            classification_report(&[0, 0, 1, 1], &[0, 1, 1, 1], Some(&names[..]), ZeroDivision::Zero)
                .unwrap();
        let golden = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/golden/report_binary.txt"
        ));
        assert_eq!(report.to_string(), golden);
    }

    #[test]
    fn precision_flag_controls_digits() {
        let report =
            classification_report(&[0, 0, 1, 1], &[0, 1, 1, 1], None, ZeroDivision::Zero).unwrap();
        let text = format!("{report:.4}");
        assert!(text.contains("0.6667"));
        assert!(text.contains("0.8000"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_is_keyed_by_class_name() {
        let names = names();
        let report =
            classification_report(&[0, 0, 1, 1], &[0, 1, 1, 1], Some(&names[..]), ZeroDivision::Zero)
                .unwrap();
        let v = report.to_json_value().unwrap();
        assert_eq!(v["dog"]["support"], 2);
        assert_eq!(v["muffin"]["recall"], 0.5);
        assert_eq!(v["accuracy"], 0.75);
        assert!(v["macro avg"]["f1-score"].as_f64().is_some());
        assert!(v["weighted avg"].is_object());
    }
}

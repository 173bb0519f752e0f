//! Training history.
//!
//! An ordered list of `(metric name, per-epoch values)`. Metrics named
//! `val_<name>` are the validation counterpart of `<name>`; a metric and its
//! counterpart form a [`MetricFamily`].

#[cfg(feature = "serde")]
use std::fmt;
#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Error, Result};

/// Prefix marking a validation metric.
pub const VALIDATION_PREFIX: &str = "val_";

/// Per-epoch metric values recorded during training, in insertion order.
///
/// Names are unique; inserting an existing name replaces its series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    series: Vec<(String, Vec<f32>)>,
}

/// A training metric and, when recorded, its validation counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricFamily<'a> {
    /// Training metric name, without the validation prefix.
    pub name: &'a str,
    pub train: &'a [f32],
    /// The matching `val_<name>` series, if recorded.
    pub validation: Option<&'a [f32]>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values of `name`, replacing any previous series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f32>) {
        let name = name.into();
        match self.series.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = values,
            None => self.series.push((name, values)),
        }
    }

    /// Builder-style [`History::insert`].
    pub fn with(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.insert(name, values);
        self
    }

    /// Append one epoch worth of metric values.
    ///
    /// Metrics not seen before start a new series.
    pub fn push_epoch(&mut self, metrics: &[(&str, f32)]) {
        for &(name, value) in metrics {
            match self.series.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => v.push(value),
                None => self.series.push((name.to_owned(), vec![value])),
            }
        }
    }

    /// The series recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Metric names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(n, _)| n.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Length of the longest series.
    pub fn epochs(&self) -> usize {
        self.series.iter().map(|(_, v)| v.len()).max().unwrap_or(0)
    }

    /// One family per training metric, in insertion order.
    ///
    /// `val_*` series without a training counterpart are skipped.
    pub fn families(&self) -> Vec<MetricFamily<'_>> {
        let mut out = Vec::new();
        for (name, values) in &self.series {
            match name.strip_prefix(VALIDATION_PREFIX) {
                Some(base) => {
                    if self.get(base).is_none() {
                        tracing::debug!(metric = %name, "validation metric has no training counterpart");
                    }
                }
                None => out.push(MetricFamily {
                    name,
                    train: values,
                    validation: self.get(&format!("{VALIDATION_PREFIX}{name}")),
                }),
            }
        }
        out
    }

    /// Check that every series is finite.
    pub fn validate(&self) -> Result<()> {
        for (name, values) in &self.series {
            if let Some(epoch) = values.iter().position(|v| !v.is_finite()) {
                return Err(Error::InvalidData(format!(
                    "history metric {name:?} is not finite at epoch {epoch}"
                )));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<f32>)> for History {
    fn from_iter<I: IntoIterator<Item = (S, Vec<f32>)>>(iter: I) -> Self {
        let mut history = History::new();
        for (name, values) in iter {
            history.insert(name, values);
        }
        history
    }
}

#[cfg(feature = "serde")]
impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for (name, values) in &self.series {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for History {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct HistoryVisitor;

        impl<'de> Visitor<'de> for HistoryVisitor {
            type Value = History;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from metric name to per-epoch values")
            }

            fn visit_map<M: MapAccess<'de>>(
                self,
                mut access: M,
            ) -> std::result::Result<History, M::Error> {
                // Keep document order; metric order decides subplot order.
                let mut history = History::new();
                while let Some((name, values)) = access.next_entry::<String, Vec<f32>>()? {
                    history.insert(name, values);
                }
                Ok(history)
            }
        }

        deserializer.deserialize_map(HistoryVisitor)
    }
}

#[cfg(feature = "serde")]
impl History {
    /// Parse a history from a JSON object of metric arrays.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let history: History = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse history json: {e}")))?;
        history.validate()?;
        Ok(history)
    }

    /// Load a history from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize history: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_pair_training_and_validation_series() {
        let history = History::new()
            .with("loss", vec![0.9, 0.5])
            .with("accuracy", vec![0.5, 0.6])
            .with("val_loss", vec![1.0, 0.7])
            .with("val_accuracy", vec![0.4, 0.55]);

        let families = history.families();
        assert_eq!(families.len(), 2);
        assert_eq!(families[0].name, "loss");
        assert_eq!(families[0].validation, Some(&[1.0_f32, 0.7][..]));
        assert_eq!(families[1].name, "accuracy");
        assert_eq!(families[1].train, &[0.5_f32, 0.6]);
    }

    #[test]
    fn orphan_validation_series_are_skipped() {
        let history = History::new()
            .with("accuracy", vec![0.5])
            .with("val_precision", vec![0.3]);
        let families = history.families();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].validation, None);
    }

    #[test]
    fn push_epoch_appends_in_order() {
        let mut history = History::new();
        history.push_epoch(&[("loss", 1.0), ("val_loss", 1.2)]);
        history.push_epoch(&[("loss", 0.8), ("val_loss", 1.1)]);
        assert_eq!(history.get("loss"), Some(&[1.0_f32, 0.8][..]));
        assert_eq!(history.epochs(), 2);
        assert_eq!(history.names().collect::<Vec<_>>(), vec!["loss", "val_loss"]);
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        let history = History::new().with("loss", vec![0.5, f32::NAN]);
        assert!(matches!(history.validate(), Err(Error::InvalidData(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_keeps_document_order() {
        let json = r#"{"val_accuracy":[0.4,0.55],"accuracy":[0.5,0.6],"loss":[1.0,0.5]}"#;
        let history = History::from_json_str(json).unwrap();
        assert_eq!(
            history.names().collect::<Vec<_>>(),
            vec!["val_accuracy", "accuracy", "loss"]
        );
        let families = history.families();
        assert_eq!(families[0].name, "accuracy");
        assert!(families[0].validation.is_some());

        let back = History::from_json_str(&history.to_json_string().unwrap()).unwrap();
        assert_eq!(back, history);
    }
}

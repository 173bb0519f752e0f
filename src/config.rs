//! Evaluation configuration.
//!
//! `EvalConfig` is a plain struct with a `Default`. Call [`EvalConfig::validate`]
//! (the evaluator does) before use. With the `serde` feature it can be loaded
//! from JSON; missing fields take their default and unknown fields are rejected.

#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Normalize, RenderOptions, Result, ZeroDivision};

/// Largest accepted number of report decimals.
pub const MAX_DIGITS: usize = 10;

/// Smallest accepted line chart width, in columns.
pub const MIN_CHART_WIDTH: usize = 16;
/// Smallest accepted line chart height, in pixel rows.
pub const MIN_CHART_HEIGHT: usize = 4;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// Display names; the labels must use exactly the classes `0..class_names.len()`.
    pub class_names: Option<Vec<String>>,
    /// Normalization of the second confusion matrix.
    pub normalize: Normalize,
    pub zero_division: ZeroDivision,
    /// Decimals in the printed report.
    pub digits: usize,
    pub render: RenderOptions,
    /// Hand the structured reports back to the caller.
    pub return_reports: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            class_names: None,
            normalize: Normalize::True,
            zero_division: ZeroDivision::Zero,
            digits: crate::report::DEFAULT_DIGITS,
            render: RenderOptions::default(),
            return_reports: false,
        }
    }
}

impl EvalConfig {
    /// Builder-style setter for class names.
    pub fn with_class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(names) = &self.class_names {
            if names.is_empty() {
                return Err(Error::InvalidConfig(
                    "class_names must not be empty".to_owned(),
                ));
            }
            for (i, name) in names.iter().enumerate() {
                if names[..i].contains(name) {
                    return Err(Error::InvalidConfig(format!(
                        "class name {name:?} appears more than once"
                    )));
                }
            }
        }
        if self.digits > MAX_DIGITS {
            return Err(Error::InvalidConfig(format!(
                "digits must be <= {MAX_DIGITS}, got {}",
                self.digits
            )));
        }
        if self.render.digits > MAX_DIGITS {
            return Err(Error::InvalidConfig(format!(
                "render.digits must be <= {MAX_DIGITS}, got {}",
                self.render.digits
            )));
        }
        if self.render.width < MIN_CHART_WIDTH || self.render.height < MIN_CHART_HEIGHT {
            return Err(Error::InvalidConfig(format!(
                "chart area must be at least {MIN_CHART_WIDTH}x{MIN_CHART_HEIGHT}, got {}x{}",
                self.render.width, self.render.height
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl EvalConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: EvalConfig = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a config from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {e}")))
    }
}

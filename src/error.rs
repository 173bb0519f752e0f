use std::io;

/// Errors returned by the evaluation APIs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Row counts or widths disagree: model output vs inputs, inputs vs labels,
    /// or one batch vs the next.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// True and predicted labels do not line up, or reference unknown classes.
    #[error("label mismatch: {0}")]
    LabelMismatch(String),
    /// Non-finite values, malformed buffers, or nothing to evaluate.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

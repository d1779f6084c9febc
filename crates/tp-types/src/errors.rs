use thiserror::Error;

/// Main error type for optimizer runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Evaluation failed for point {index} {point:?}: {message}")]
    Evaluation {
        index: usize,
        point: Vec<f64>,
        message: String,
    },
}

impl OptimizerError {
    /// Index of the point that triggered the error, when one is known.
    pub fn point_index(&self) -> Option<usize> {
        match self {
            Self::Domain(err) => err.point,
            Self::Evaluation { index, .. } => Some(*index),
            Self::InvalidConfiguration { .. } => None,
        }
    }
}

/// A log-space transform was applied to a non-positive value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot take log10 of {value} (point {}, dimension {dimension})", point_label(.point))]
pub struct DomainError {
    /// Offending point, `None` when transforming a single vector.
    pub point: Option<usize>,
    pub dimension: usize,
    pub value: f64,
}

impl DomainError {
    pub fn new(dimension: usize, value: f64) -> Self {
        Self {
            point: None,
            dimension,
            value,
        }
    }

    pub fn at_point(mut self, point: usize) -> Self {
        self.point = Some(point);
        self
    }
}

fn point_label(point: &Option<usize>) -> String {
    match point {
        Some(p) => p.to_string(),
        None => "-".to_string(),
    }
}

/// Time-series errors raised by cost-shaping helpers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Series is empty")]
    Empty,

    #[error("Length mismatch: {left} samples vs {right} samples")]
    LengthMismatch { left: usize, right: usize },

    #[error("Time axis decreases at sample {index}")]
    NonMonotonicTime { index: usize },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },
}

/// Result type alias for optimizer operations
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! invalid_config {
    ($($arg:tt)*) => {
        $crate::errors::OptimizerError::InvalidConfiguration {
            message: format!($($arg)*),
        }
    };
}

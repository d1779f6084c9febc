//! Parameter definitions shared by the optimizer and the harness.

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, OptimizerResult};
use crate::invalid_config;

/// How a parameter is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterScale {
    /// Searched directly in its own units.
    #[default]
    Linear,
    /// Searched on its base-10 logarithm; both bounds must be positive.
    Log10,
}

/// A single tunable parameter: name, inclusive bounds and search scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Name the harness uses to apply the value (e.g. "stiffness").
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub scale: ParameterScale,
}

impl ParameterDef {
    pub fn linear(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            scale: ParameterScale::Linear,
        }
    }

    pub fn log10(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            scale: ParameterScale::Log10,
        }
    }

    pub fn is_log_scaled(&self) -> bool {
        self.scale == ParameterScale::Log10
    }

    /// Whether `value` lies inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check the bounds of dimension `dimension`.
    pub fn validate(&self, dimension: usize) -> OptimizerResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid_config!(
                "parameter '{}' (dimension {}) has non-finite bounds [{}, {}]",
                self.name,
                dimension,
                self.min,
                self.max
            ));
        }
        if self.min > self.max {
            return Err(invalid_config!(
                "parameter '{}' (dimension {}) has min {} > max {}",
                self.name,
                dimension,
                self.min,
                self.max
            ));
        }
        if self.is_log_scaled() && self.min <= 0.0 {
            return Err(DomainError::new(dimension, self.min).into());
        }
        Ok(())
    }
}

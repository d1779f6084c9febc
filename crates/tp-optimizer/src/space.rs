//! Parameter space: bounds and log/linear transforms per dimension.
//!
//! The optimizer works in *search coordinates*: linear dimensions are used
//! as-is, [`ParameterScale::Log10`] dimensions are held as their base-10
//! logarithm. Evaluators always receive physical (linear) values.

use tp_types::{DomainError, OptimizerResult, ParameterDef, ParameterScale};

use tp_types::invalid_config;

/// Element-wise `log10`. Fails on the first value that is not strictly positive.
pub fn to_log_space(values: &[f64]) -> Result<Vec<f64>, DomainError> {
    values
        .iter()
        .enumerate()
        .map(|(dimension, &value)| {
            if value > 0.0 {
                Ok(value.log10())
            } else {
                Err(DomainError::new(dimension, value))
            }
        })
        .collect()
}

/// Element-wise `10^x`.
pub fn to_linear_space(values: &[f64]) -> Vec<f64> {
    values.iter().map(|&v| 10f64.powf(v)).collect()
}

/// [`to_log_space`] over every coordinate of every point; the error names the
/// offending point and dimension.
pub fn points_to_log_space(points: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, DomainError> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| to_log_space(point).map_err(|err| err.at_point(index)))
        .collect()
}

/// [`to_linear_space`] over every coordinate of every point.
pub fn points_to_linear_space(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    points.iter().map(|point| to_linear_space(point)).collect()
}

/// Bounds of one dimension in search coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBounds {
    pub min: f64,
    pub max: f64,
    pub scale: ParameterScale,
}

impl SearchBounds {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Validated parameter definitions plus their bounds in search coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    parameters: Vec<ParameterDef>,
    bounds: Vec<SearchBounds>,
}

impl ParameterSpace {
    pub fn new(parameters: Vec<ParameterDef>) -> OptimizerResult<Self> {
        if parameters.is_empty() {
            return Err(invalid_config!("parameter space has no dimensions"));
        }

        let mut bounds = Vec::with_capacity(parameters.len());
        for (dimension, param) in parameters.iter().enumerate() {
            param.validate(dimension)?;
            let (min, max) = match param.scale {
                ParameterScale::Linear => (param.min, param.max),
                ParameterScale::Log10 => (param.min.log10(), param.max.log10()),
            };
            bounds.push(SearchBounds {
                min,
                max,
                scale: param.scale,
            });
        }

        Ok(Self { parameters, bounds })
    }

    pub fn dimensions(&self) -> usize {
        self.bounds.len()
    }

    pub fn parameters(&self) -> &[ParameterDef] {
        &self.parameters
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn bounds(&self) -> &[SearchBounds] {
        &self.bounds
    }

    pub fn bound(&self, dimension: usize) -> &SearchBounds {
        &self.bounds[dimension]
    }

    /// Clamp every coordinate of a search-space point into its box.
    pub fn clamp_point(&self, point: &mut [f64]) {
        for (value, bound) in point.iter_mut().zip(&self.bounds) {
            *value = bound.clamp(*value);
        }
    }

    /// Whether a search-space point lies inside the box.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.bounds.len()
            && point
                .iter()
                .zip(&self.bounds)
                .all(|(v, b)| *v >= b.min && *v <= b.max)
    }

    /// Physical values → search coordinates (log10 on log-scaled dimensions).
    pub fn to_search(&self, physical: &[f64]) -> Result<Vec<f64>, DomainError> {
        physical
            .iter()
            .zip(&self.bounds)
            .enumerate()
            .map(|(dimension, (&value, bound))| match bound.scale {
                ParameterScale::Linear => Ok(value),
                ParameterScale::Log10 if value > 0.0 => Ok(value.log10()),
                ParameterScale::Log10 => Err(DomainError::new(dimension, value)),
            })
            .collect()
    }

    /// Search coordinates → physical values. Log-scaled values are held inside
    /// the declared physical bounds, which `10^x` can overshoot by an ulp.
    pub fn to_physical(&self, search: &[f64]) -> Vec<f64> {
        search
            .iter()
            .zip(&self.bounds)
            .zip(&self.parameters)
            .map(|((&value, bound), param)| match bound.scale {
                ParameterScale::Linear => value,
                ParameterScale::Log10 => 10f64.powf(value).max(param.min).min(param.max),
            })
            .collect()
    }
}

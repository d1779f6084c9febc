//! Run configuration for the optimization driver.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tp_types::{invalid_config, OptimizerResult, ParameterDef};

use crate::policy::StepPolicyKind;
use crate::sampling::{check_seeds, SamplingMethod};
use crate::space::ParameterSpace;

/// Optional early-stopping predicates. A run converges when any configured
/// tolerance is met.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConvergenceCriteria {
    /// Stop when `max(objective) − min(objective)` falls below this value.
    pub objective_tolerance: Option<f64>,
    /// Stop when the widest per-dimension spread of the population, relative
    /// to the bound width, falls below this value.
    pub parameter_tolerance: Option<f64>,
}

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub name: String,

    /// Parameter dimensions, in the order the evaluator expects them.
    pub parameters: Vec<ParameterDef>,

    /// Population size; `None` picks `max(2k, k + 1)` for `k` dimensions.
    #[serde(default)]
    pub num_points: Option<usize>,

    /// Maximum number of steps before the run is reported as exhausted.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Reflection coefficient.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Random perturbation coefficient.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Also halve beta on a stagnant step.
    #[serde(default)]
    pub halve_beta_on_stagnation: bool,

    /// Number of worst points replaced per step.
    #[serde(default = "default_worst_count")]
    pub worst_count: usize,

    #[serde(default)]
    pub policy: StepPolicyKind,

    #[serde(default)]
    pub sampling: SamplingMethod,

    /// Seed for the random source; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub convergence: ConvergenceCriteria,

    /// Wall-clock limit per evaluation in milliseconds.
    #[serde(default)]
    pub evaluation_timeout_ms: Option<u64>,
}

fn default_max_iterations() -> usize {
    100
}

fn default_alpha() -> f64 {
    1.3
}

fn default_beta() -> f64 {
    0.3
}

fn default_worst_count() -> usize {
    1
}

impl OptimizerConfig {
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterDef>) -> Self {
        Self {
            name: name.into(),
            parameters,
            num_points: None,
            max_iterations: default_max_iterations(),
            alpha: default_alpha(),
            beta: default_beta(),
            halve_beta_on_stagnation: false,
            worst_count: default_worst_count(),
            policy: StepPolicyKind::default(),
            sampling: SamplingMethod::default(),
            seed: None,
            convergence: ConvergenceCriteria::default(),
            evaluation_timeout_ms: None,
        }
    }

    pub fn with_num_points(mut self, n: usize) -> Self {
        self.num_points = Some(n);
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_coefficients(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_halved_beta_on_stagnation(mut self, enabled: bool) -> Self {
        self.halve_beta_on_stagnation = enabled;
        self
    }

    pub fn with_worst_count(mut self, n: usize) -> Self {
        self.worst_count = n;
        self
    }

    pub fn with_policy(mut self, policy: StepPolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingMethod) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_convergence(mut self, convergence: ConvergenceCriteria) -> Self {
        self.convergence = convergence;
        self
    }

    /// Set the per-evaluation limit, rounded up to whole milliseconds.
    pub fn with_evaluation_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.evaluation_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn dimensions(&self) -> usize {
        self.parameters.len()
    }

    /// Resolved population size.
    pub fn population_size(&self) -> usize {
        let k = self.dimensions();
        self.num_points.unwrap_or_else(|| (2 * k).max(k + 1))
    }

    pub fn evaluation_timeout(&self) -> Option<Duration> {
        self.evaluation_timeout_ms.map(Duration::from_millis)
    }

    /// Check the whole configuration and build its parameter space.
    pub fn validate(&self) -> OptimizerResult<ParameterSpace> {
        let space = ParameterSpace::new(self.parameters.clone())?;
        let n = self.population_size();

        if n < 2 {
            return Err(invalid_config!("num_points must be at least 2, got {}", n));
        }
        if self.worst_count == 0 {
            return Err(invalid_config!("worst_count must be at least 1"));
        }
        if self.worst_count >= n {
            return Err(invalid_config!(
                "worst_count {} leaves no points for the centroid of a population of {}",
                self.worst_count,
                n
            ));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(invalid_config!("alpha must be positive and finite, got {}", self.alpha));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(invalid_config!("beta must be non-negative and finite, got {}", self.beta));
        }
        for (label, tolerance) in [
            ("objective_tolerance", self.convergence.objective_tolerance),
            ("parameter_tolerance", self.convergence.parameter_tolerance),
        ] {
            if let Some(tol) = tolerance {
                if !tol.is_finite() || tol < 0.0 {
                    return Err(invalid_config!("{} must be non-negative, got {}", label, tol));
                }
            }
        }
        if self.evaluation_timeout_ms == Some(0) {
            return Err(invalid_config!("evaluation_timeout_ms must be positive"));
        }
        if let SamplingMethod::Seeds(seeds) = &self.sampling {
            check_seeds(&space, n, seeds)?;
        }

        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_types::OptimizerError;

    fn sample_config() -> OptimizerConfig {
        OptimizerConfig::new(
            "plant_tuning",
            vec![
                ParameterDef::linear("gain", 0.0, 10.0),
                ParameterDef::log10("stiffness", 1.0, 1e4),
            ],
        )
    }

    #[test]
    fn defaults() {
        let config = sample_config();
        assert_eq!(config.population_size(), 4);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.alpha, 1.3);
        assert_eq!(config.worst_count, 1);
        assert_eq!(config.policy, StepPolicyKind::Reflect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sub_millisecond_timeout_rounds_up() {
        let config = sample_config().with_evaluation_timeout(Duration::from_micros(300));
        assert_eq!(config.evaluation_timeout_ms, Some(1));
        assert!(config.validate().is_ok());

        let config = sample_config().with_evaluation_timeout(Duration::from_micros(1500));
        assert_eq!(config.evaluation_timeout(), Some(Duration::from_millis(2)));
    }

    #[test]
    fn single_dimension_gets_two_points() {
        let config = OptimizerConfig::new("x", vec![ParameterDef::linear("x", 0.0, 1.0)]);
        assert_eq!(config.population_size(), 2);
    }

    #[test]
    fn builder_chain() {
        let config = sample_config()
            .with_num_points(8)
            .with_max_iterations(20)
            .with_coefficients(1.1, 0.2)
            .with_worst_count(2)
            .with_policy(StepPolicyKind::ReflectThenContract)
            .with_seed(42)
            .with_evaluation_timeout(Duration::from_secs(3));
        assert_eq!(config.population_size(), 8);
        assert_eq!(config.evaluation_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn worst_count_must_leave_a_centroid() {
        let config = sample_config().with_num_points(4).with_worst_count(4);
        match config.validate() {
            Err(OptimizerError::InvalidConfiguration { message }) => {
                assert!(message.contains("worst_count 4"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_coefficients() {
        assert!(sample_config().with_coefficients(0.0, 0.1).validate().is_err());
        assert!(sample_config().with_coefficients(1.0, -0.1).validate().is_err());
        assert!(sample_config()
            .with_coefficients(f64::NAN, 0.1)
            .validate()
            .is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let config = OptimizerConfig::new("bad", vec![ParameterDef::linear("x", 1.0, 0.0)]);
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn rejects_bad_seeds() {
        let config = sample_config()
            .with_num_points(2)
            .with_sampling(SamplingMethod::Seeds(vec![vec![1.0, 10.0], vec![1.0]]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_uses_defaults_for_missing_fields() {
        let json = r#"{
            "name": "from_file",
            "parameters": [
                {"name": "x", "min": -1.0, "max": 1.0},
                {"name": "k", "min": 0.1, "max": 10.0, "scale": "Log10"}
            ],
            "policy": "ReflectThenContract",
            "sampling": "LatinHypercube",
            "seed": 7
        }"#;
        let config: OptimizerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.alpha, 1.3);
        assert_eq!(config.beta, 0.3);
        assert_eq!(config.policy, StepPolicyKind::ReflectThenContract);
        assert_eq!(config.sampling, SamplingMethod::LatinHypercube);
        assert!(config.validate().is_ok());

        let back: OptimizerConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(config, back);
    }
}

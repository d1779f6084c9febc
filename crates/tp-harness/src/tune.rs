//! End-to-end tuning session for the demo oscillator.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use tp_optimizer::{OptimizationDriver, OptimizerConfig, RunReport, SamplingMethod};
use tp_types::{OwnedSeries, ParameterDef};

use crate::cost::{first_time_at_threshold, mean_abs_diff, overshoot_above};
use crate::oscillator::{Oscillator, OscillatorSettings};
use crate::simulation::{ParameterBinding, Simulation, SimulationEvaluator};

/// Weights of the terms combined into the step-response cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    pub overshoot: f64,
    pub rise_time: f64,
    pub tracking: f64,
    /// Fraction of the reference that counts as "risen".
    pub rise_fraction: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            overshoot: 10.0,
            rise_time: 1.0,
            tracking: 5.0,
            rise_fraction: 0.9,
        }
    }
}

impl CostWeights {
    /// Score the position response of a finished simulation.
    pub fn score(&self, sim: &Oscillator) -> anyhow::Result<f64> {
        let settings = sim.settings();
        let position = sim.series("position")?;
        let reference = sim.data_vector("reference")?;

        let overshoot = overshoot_above(&position, settings.reference);
        // Never rising costs as much as rising at the very end.
        let rise = first_time_at_threshold(&position, settings.reference * self.rise_fraction)
            .map(|t| t - settings.step_time)
            .unwrap_or(settings.duration);
        let tracking = mean_abs_diff(position.values(), reference)?;

        Ok(self.overshoot * overshoot + self.rise_time * rise + self.tracking * tracking)
    }
}

/// A complete tuning session, as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneConfig {
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub model: OscillatorSettings,
    #[serde(default)]
    pub cost: CostWeights,
}

impl Default for TuneConfig {
    fn default() -> Self {
        let optimizer = OptimizerConfig::new(
            "oscillator_step_response",
            vec![
                ParameterDef::log10("stiffness", 1.0, 1000.0),
                ParameterDef::linear("damping", 0.0, 50.0),
            ],
        )
        .with_num_points(6)
        .with_max_iterations(150)
        .with_sampling(SamplingMethod::LatinHypercube)
        .with_seed(1);

        Self {
            optimizer,
            model: OscillatorSettings::default(),
            cost: CostWeights::default(),
        }
    }
}

impl TuneConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.optimizer.validate()?;
        Ok(config)
    }
}

/// Run report plus the simulated response at the best point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneOutcome {
    pub report: RunReport,
    pub best_response: OwnedSeries,
}

pub fn run(config: TuneConfig) -> anyhow::Result<TuneOutcome> {
    let TuneConfig {
        optimizer,
        model,
        cost,
    } = config;
    let names: Vec<String> = optimizer.parameters.iter().map(|p| p.name.clone()).collect();

    let evaluator = SimulationEvaluator::new(
        Oscillator::new(model),
        names.iter().map(String::as_str),
        move |sim: &Oscillator| cost.score(sim),
    )?;
    let mut driver = OptimizationDriver::from_config(optimizer, evaluator)?;
    let report = driver.run()?;

    // Re-simulate the winner to keep its trajectory.
    let mut sim = Oscillator::new(model);
    let binding = ParameterBinding::new(names.iter().map(String::as_str), &sim.parameter_names())?;
    binding.apply(&mut sim, &report.best_point)?;
    sim.simulate()?;
    let best_response = OwnedSeries {
        name: "position".to_string(),
        time: sim.time_vector().to_vec(),
        values: sim.data_vector("position")?.to_vec(),
    };

    info!(
        "Best parameters {:?} (damping ratio {:.3}), cost {}",
        report.best_point,
        sim.damping_ratio(),
        report.best_objective
    );

    Ok(TuneOutcome {
        report,
        best_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tp_optimizer::RunState;

    fn quick_config() -> TuneConfig {
        let mut config = TuneConfig::default();
        config.model.duration = 4.0;
        config.model.time_step = 5e-3;
        config.optimizer = config.optimizer.with_max_iterations(40);
        config
    }

    #[test]
    fn score_prefers_well_damped_response() {
        let weights = CostWeights::default();
        let simulate = |k: f64, c: f64| {
            let mut osc = Oscillator::new(OscillatorSettings::default());
            osc.set_parameter(0, k).unwrap();
            osc.set_parameter(1, c).unwrap();
            osc.simulate().unwrap();
            weights.score(&osc).unwrap()
        };
        let ringing = simulate(25.0, 0.5);
        let damped = simulate(25.0, 8.0);
        assert!(damped < ringing, "{damped} >= {ringing}");
    }

    #[test]
    fn tuning_improves_on_initial_population() {
        let outcome = run(quick_config()).unwrap();
        let report = &outcome.report;

        assert_eq!(report.state, RunState::Exhausted);
        assert!(report.best_objective <= report.initial_best_objective());
        assert!(report.best_point[0] >= 1.0 - 1e-9);
        assert!(report.best_point[0] <= 1000.0 * (1.0 + 1e-9));
        assert!((0.0..=50.0).contains(&report.best_point[1]));
        assert_eq!(outcome.best_response.time.len(), outcome.best_response.values.len());
    }

    #[test]
    fn unknown_parameter_name_fails_before_running() {
        let mut config = quick_config();
        config.optimizer.parameters[1].name = "friction".into();
        let err = run(config).unwrap_err();
        assert!(err.to_string().contains("'friction'"));
    }

    #[test]
    fn load_from_file() {
        let json = r#"{
            "optimizer": {
                "name": "from_file",
                "parameters": [
                    {"name": "stiffness", "min": 1.0, "max": 100.0, "scale": "Log10"},
                    {"name": "damping", "min": 0.0, "max": 20.0}
                ],
                "max_iterations": 10,
                "seed": 3
            },
            "cost": {"overshoot": 1.0, "rise_time": 1.0, "tracking": 1.0, "rise_fraction": 0.5}
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = TuneConfig::load(file.path()).unwrap();
        assert_eq!(config.optimizer.max_iterations, 10);
        assert_eq!(config.model, OscillatorSettings::default());
        assert_eq!(config.cost.rise_fraction, 0.5);
    }

    #[test]
    fn load_rejects_invalid_optimizer_config() {
        let json = r#"{"optimizer": {"name": "bad", "parameters": [
            {"name": "stiffness", "min": 0.0, "max": 10.0, "scale": "Log10"}
        ]}}"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        assert!(TuneConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TuneConfig::load("/nonexistent/tuneplex.json").unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}

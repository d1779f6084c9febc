//! Adapting an external simulation into an optimizer [`Evaluator`].

use anyhow::Context;
use parking_lot::Mutex;
use tracing::debug;

use tp_optimizer::Evaluator;
use tp_types::{invalid_config, OptimizerResult, SeriesError, TimeSeries};

/// The primitives a simulation exposes to the harness.
pub trait Simulation: Send {
    /// Every parameter the model accepts, in slot order.
    fn parameter_names(&self) -> Vec<String>;

    fn set_parameter(&mut self, slot: usize, value: f64) -> anyhow::Result<()>;

    /// Run the model to completion with the current parameters.
    fn simulate(&mut self) -> anyhow::Result<()>;

    fn time_vector(&self) -> &[f64];

    fn data_vector(&self, variable: &str) -> Result<&[f64], SeriesError>;

    /// A logged variable paired with the time axis.
    fn series(&self, variable: &str) -> Result<TimeSeries<'_>, SeriesError> {
        TimeSeries::new(self.time_vector(), self.data_vector(variable)?)
    }
}

/// Static mapping from optimizer dimensions to simulation parameter slots,
/// resolved once by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    names: Vec<String>,
    slots: Vec<usize>,
}

impl ParameterBinding {
    pub fn new<'a>(
        names: impl IntoIterator<Item = &'a str>,
        capabilities: &[String],
    ) -> OptimizerResult<Self> {
        let mut bound_names = Vec::new();
        let mut slots = Vec::new();
        for (dimension, name) in names.into_iter().enumerate() {
            let slot = capabilities
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| {
                    invalid_config!(
                        "dimension {} names unknown parameter '{}' (available: {})",
                        dimension,
                        name,
                        capabilities.join(", ")
                    )
                })?;
            bound_names.push(name.to_string());
            slots.push(slot);
        }
        Ok(Self {
            names: bound_names,
            slots,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, dimension: usize) -> usize {
        self.slots[dimension]
    }

    /// Push one parameter vector into the simulation.
    pub fn apply<S: Simulation + ?Sized>(&self, sim: &mut S, point: &[f64]) -> anyhow::Result<()> {
        anyhow::ensure!(
            point.len() == self.slots.len(),
            "point has {} values but {} parameters are bound",
            point.len(),
            self.slots.len()
        );
        for ((name, &slot), &value) in self.names.iter().zip(&self.slots).zip(point) {
            sim.set_parameter(slot, value)
                .with_context(|| format!("setting parameter '{name}' to {value}"))?;
        }
        Ok(())
    }
}

/// Evaluates a point by applying it to a simulation, running it, and scoring
/// the result with `cost`.
pub struct SimulationEvaluator<S, C> {
    sim: Mutex<S>,
    binding: ParameterBinding,
    cost: C,
}

impl<S, C> SimulationEvaluator<S, C>
where
    S: Simulation,
    C: Fn(&S) -> anyhow::Result<f64> + Send + Sync,
{
    pub fn new<'a>(
        sim: S,
        names: impl IntoIterator<Item = &'a str>,
        cost: C,
    ) -> OptimizerResult<Self> {
        let binding = ParameterBinding::new(names, &sim.parameter_names())?;
        Ok(Self {
            sim: Mutex::new(sim),
            binding,
            cost,
        })
    }

    pub fn binding(&self) -> &ParameterBinding {
        &self.binding
    }

    pub fn into_inner(self) -> S {
        self.sim.into_inner()
    }
}

impl<S, C> Evaluator for SimulationEvaluator<S, C>
where
    S: Simulation,
    C: Fn(&S) -> anyhow::Result<f64> + Send + Sync,
{
    fn evaluate(&self, point: &[f64]) -> anyhow::Result<f64> {
        let mut sim = self.sim.lock();
        self.binding.apply(&mut *sim, point)?;
        sim.simulate().context("simulation failed")?;
        let cost = (self.cost)(&*sim)?;
        debug!("Simulated {:?} -> cost {}", point, cost);
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_types::OptimizerError;

    /// y(t) = a * t + b over t = 0..=4
    struct Line {
        params: [f64; 2],
        time: Vec<f64>,
        y: Vec<f64>,
        runs: usize,
    }

    impl Line {
        fn new() -> Self {
            Self {
                params: [0.0; 2],
                time: Vec::new(),
                y: Vec::new(),
                runs: 0,
            }
        }
    }

    impl Simulation for Line {
        fn parameter_names(&self) -> Vec<String> {
            vec!["slope".into(), "offset".into()]
        }

        fn set_parameter(&mut self, slot: usize, value: f64) -> anyhow::Result<()> {
            anyhow::ensure!(slot < 2, "no slot {slot}");
            self.params[slot] = value;
            Ok(())
        }

        fn simulate(&mut self) -> anyhow::Result<()> {
            self.time = (0..5).map(f64::from).collect();
            self.y = self.time.iter().map(|t| self.params[0] * t + self.params[1]).collect();
            self.runs += 1;
            Ok(())
        }

        fn time_vector(&self) -> &[f64] {
            &self.time
        }

        fn data_vector(&self, variable: &str) -> Result<&[f64], SeriesError> {
            match variable {
                "y" => Ok(&self.y),
                other => Err(SeriesError::UnknownVariable { name: other.into() }),
            }
        }
    }

    #[test]
    fn binding_resolves_names_to_slots() {
        let caps = Line::new().parameter_names();
        let binding = ParameterBinding::new(["offset", "slope"], &caps).unwrap();
        assert_eq!(binding.len(), 2);
        assert_eq!(binding.slot(0), 1);
        assert_eq!(binding.slot(1), 0);
    }

    #[test]
    fn binding_rejects_unknown_name() {
        let caps = Line::new().parameter_names();
        match ParameterBinding::new(["slope", "gain"], &caps) {
            Err(OptimizerError::InvalidConfiguration { message }) => {
                assert!(message.contains("dimension 1"));
                assert!(message.contains("'gain'"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn evaluator_applies_runs_and_scores() {
        let evaluator = SimulationEvaluator::new(Line::new(), ["offset", "slope"], |sim: &Line| {
            let series = sim.series("y")?;
            Ok(series.values().last().copied().unwrap_or_default())
        })
        .unwrap();

        // offset 1, slope 2: y(4) = 9
        assert_eq!(evaluator.evaluate(&[1.0, 2.0]).unwrap(), 9.0);
        assert_eq!(evaluator.into_inner().runs, 1);
    }

    #[test]
    fn evaluator_rejects_wrong_length() {
        let evaluator =
            SimulationEvaluator::new(Line::new(), ["slope"], |_: &Line| Ok(0.0)).unwrap();
        let err = evaluator.evaluate(&[1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("1 parameters are bound"));
    }

    #[test]
    fn cost_errors_propagate() {
        let evaluator = SimulationEvaluator::new(Line::new(), ["slope"], |sim: &Line| {
            let series = sim.series("missing")?;
            Ok(series.len() as f64)
        })
        .unwrap();
        let err = evaluator.evaluate(&[1.0]).unwrap_err();
        assert!(err.to_string().contains("Unknown variable"));
    }
}

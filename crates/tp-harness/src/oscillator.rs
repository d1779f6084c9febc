//! Demo plant: a position servo modelled as a mass-spring-damper.
//!
//! `m·x'' = k·(r − x) − c·x'` driven by a unit step in the reference `r`,
//! integrated with semi-implicit Euler.

use serde::{Deserialize, Serialize};
use tp_types::SeriesError;

use crate::simulation::Simulation;

const PARAMETERS: [&str; 3] = ["stiffness", "damping", "mass"];

/// Fixed settings of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSettings {
    pub mass: f64,
    /// Reference level after the step.
    pub reference: f64,
    /// Time of the reference step.
    pub step_time: f64,
    pub duration: f64,
    pub time_step: f64,
}

impl Default for OscillatorSettings {
    fn default() -> Self {
        Self {
            mass: 1.0,
            reference: 1.0,
            step_time: 0.1,
            duration: 10.0,
            time_step: 1e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    settings: OscillatorSettings,
    stiffness: f64,
    damping: f64,
    mass: f64,
    time: Vec<f64>,
    position: Vec<f64>,
    velocity: Vec<f64>,
    reference: Vec<f64>,
}

impl Oscillator {
    pub fn new(settings: OscillatorSettings) -> Self {
        Self {
            settings,
            stiffness: 1.0,
            damping: 1.0,
            mass: settings.mass,
            time: Vec::new(),
            position: Vec::new(),
            velocity: Vec::new(),
            reference: Vec::new(),
        }
    }

    pub fn settings(&self) -> &OscillatorSettings {
        &self.settings
    }

    /// `c / (2·sqrt(k·m))`
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

impl Simulation for Oscillator {
    fn parameter_names(&self) -> Vec<String> {
        PARAMETERS.iter().map(|s| s.to_string()).collect()
    }

    fn set_parameter(&mut self, slot: usize, value: f64) -> anyhow::Result<()> {
        anyhow::ensure!(value.is_finite(), "non-finite value {value}");
        match slot {
            0 => {
                anyhow::ensure!(value > 0.0, "stiffness must be positive, got {value}");
                self.stiffness = value;
            }
            1 => {
                anyhow::ensure!(value >= 0.0, "damping must be non-negative, got {value}");
                self.damping = value;
            }
            2 => {
                anyhow::ensure!(value > 0.0, "mass must be positive, got {value}");
                self.mass = value;
            }
            _ => anyhow::bail!("oscillator has no parameter slot {slot}"),
        }
        Ok(())
    }

    fn simulate(&mut self) -> anyhow::Result<()> {
        let s = self.settings;
        anyhow::ensure!(
            s.time_step > 0.0 && s.duration > 0.0,
            "time_step and duration must be positive"
        );

        let steps = (s.duration / s.time_step).round() as usize;
        self.time.clear();
        self.position.clear();
        self.velocity.clear();
        self.reference.clear();

        let (mut x, mut v) = (0.0_f64, 0.0_f64);
        for i in 0..=steps {
            let t = i as f64 * s.time_step;
            let r = if t >= s.step_time { s.reference } else { 0.0 };

            self.time.push(t);
            self.position.push(x);
            self.velocity.push(v);
            self.reference.push(r);

            let a = (self.stiffness * (r - x) - self.damping * v) / self.mass;
            v += a * s.time_step;
            x += v * s.time_step;
        }

        anyhow::ensure!(x.is_finite(), "integration diverged");
        Ok(())
    }

    fn time_vector(&self) -> &[f64] {
        &self.time
    }

    fn data_vector(&self, variable: &str) -> Result<&[f64], SeriesError> {
        match variable {
            "position" => Ok(&self.position),
            "velocity" => Ok(&self.velocity),
            "reference" => Ok(&self.reference),
            other => Err(SeriesError::UnknownVariable {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{overshoot_above, value_at};

    fn run(stiffness: f64, damping: f64) -> Oscillator {
        let mut osc = Oscillator::new(OscillatorSettings::default());
        osc.set_parameter(0, stiffness).unwrap();
        osc.set_parameter(1, damping).unwrap();
        osc.simulate().unwrap();
        osc
    }

    #[test]
    fn settles_at_reference() {
        let osc = run(25.0, 10.0);
        let position = osc.series("position").unwrap();
        assert!((value_at(&position, 10.0) - 1.0).abs() < 0.01);
        assert_eq!(position.len(), 10_001);
    }

    #[test]
    fn light_damping_overshoots() {
        let light = run(25.0, 1.0);
        let heavy = run(25.0, 12.0);
        let light_os = overshoot_above(&light.series("position").unwrap(), 1.0);
        let heavy_os = overshoot_above(&heavy.series("position").unwrap(), 1.0);
        assert!(light.damping_ratio() < 0.2);
        assert!(light_os > 0.5);
        assert!(heavy_os < 1e-3);
    }

    #[test]
    fn reference_steps_at_step_time() {
        let osc = run(10.0, 5.0);
        let reference = osc.series("reference").unwrap();
        assert_eq!(value_at(&reference, 0.05), 0.0);
        assert_eq!(value_at(&reference, 0.2), 1.0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut osc = Oscillator::new(OscillatorSettings::default());
        assert!(osc.set_parameter(0, -1.0).is_err());
        assert!(osc.set_parameter(2, 0.0).is_err());
        assert!(osc.set_parameter(7, 1.0).is_err());
        assert!(osc.data_vector("pressure").is_err());
    }
}

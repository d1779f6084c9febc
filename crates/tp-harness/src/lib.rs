//! Simulation harness for tuneplex.
//!
//! Provides:
//! - The [`Simulation`] capability trait and a name→slot [`ParameterBinding`]
//! - [`SimulationEvaluator`], which turns a simulation plus a cost closure into
//!   an optimizer evaluator
//! - Cost-shaping helpers over time series
//! - A demo mass-spring-damper model and the tuning session behind `tp-tune`

pub mod cost;
pub mod oscillator;
pub mod simulation;
pub mod tune;

pub use cost::{abs_diff_at_time, first_time_at_threshold, mean_abs_diff, overshoot_above, value_at};
pub use oscillator::{Oscillator, OscillatorSettings};
pub use simulation::{ParameterBinding, Simulation, SimulationEvaluator};
pub use tune::{CostWeights, TuneConfig, TuneOutcome};

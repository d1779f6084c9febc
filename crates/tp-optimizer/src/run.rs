//! Run lifecycle, step history and the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::StepKind;

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// Driver state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Initializing,
    Evaluating,
    Selecting,
    Stepping,
    /// A convergence predicate was satisfied.
    Converged,
    /// The iteration budget ran out.
    Exhausted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted)
    }
}

/// The previous iteration's worst indices, used to detect stagnation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorstHistory {
    previous: Option<Vec<usize>>,
}

impl WorstHistory {
    /// A step is stagnant when the worst index repeats from the last iteration.
    pub fn is_stagnant(&self, worst: &[usize]) -> bool {
        match (&self.previous, worst.first()) {
            (Some(previous), Some(current)) => previous.first() == Some(current),
            _ => false,
        }
    }

    pub fn record(&mut self, worst: Vec<usize>) {
        self.previous = Some(worst);
    }

    pub fn previous(&self) -> Option<&[usize]> {
        self.previous.as_deref()
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// What happened in one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step number.
    pub iteration: usize,
    pub worst: Vec<usize>,
    /// Worst objective before the step.
    pub worst_objective: f64,
    pub stagnant: bool,
    /// Effective coefficients used by this step.
    pub alpha: f64,
    pub beta: f64,
    pub kind: StepKind,
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizationEvent {
    Started {
        run_id: RunId,
        name: String,
        num_points: usize,
        dimensions: usize,
    },
    Evaluated {
        iteration: usize,
        best_index: usize,
        best_objective: f64,
        worst_objective: f64,
    },
    Stepped(StepRecord),
    Finished {
        run_id: RunId,
        state: RunState,
        iterations: usize,
        best_objective: f64,
    },
}

/// Final population and history of a finished run.
///
/// `points` and `objectives` always belong together: the population is
/// re-evaluated after the last step before the run stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub name: String,
    pub state: RunState,
    /// Number of steps taken.
    pub iterations: usize,
    /// Number of evaluator calls.
    pub evaluations: usize,
    /// Final population in physical units.
    pub points: Vec<Vec<f64>>,
    pub objectives: Vec<f64>,
    pub best_index: usize,
    pub best_point: Vec<f64>,
    pub best_objective: f64,
    pub initial_points: Vec<Vec<f64>>,
    pub initial_objectives: Vec<f64>,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn initial_best_objective(&self) -> f64 {
        self.initial_objectives
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// Number of steps flagged as stagnant.
    pub fn stagnant_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.stagnant).count()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

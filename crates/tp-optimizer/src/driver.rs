//! The optimization loop: evaluate, select, step, repeat.

use chrono::Utc;
use crossbeam_channel::Sender;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tp_types::{OptimizerError, OptimizerResult};

use crate::config::OptimizerConfig;
use crate::evaluator::{Evaluator, TimeoutEvaluator};
use crate::points::PointSet;
use crate::policy::{StepContext, StepPolicy};
use crate::run::{OptimizationEvent, RunReport, RunState, StepRecord, WorstHistory};
use crate::sampling::initial_points;
use crate::select::{index_of_max, index_of_max_n, index_of_min};
use crate::space::ParameterSpace;

/// Drives one Complex-method run against an external evaluator.
///
/// The driver owns the population, the objective vector and the worst
/// history for the duration of [`OptimizationDriver::run`]; evaluations are
/// strictly sequential in index order.
pub struct OptimizationDriver<E> {
    config: OptimizerConfig,
    space: ParameterSpace,
    evaluator: E,
    policy: Box<dyn StepPolicy>,
    rng: ChaCha8Rng,
    events: Option<Sender<OptimizationEvent>>,
    state: RunState,
}

impl OptimizationDriver<Box<dyn Evaluator>> {
    /// Build a driver that applies `evaluation_timeout_ms` from the config, if set.
    pub fn from_config<E: Evaluator + 'static>(
        config: OptimizerConfig,
        evaluator: E,
    ) -> OptimizerResult<Self> {
        let evaluator: Box<dyn Evaluator> = match config.evaluation_timeout() {
            Some(timeout) => Box::new(TimeoutEvaluator::new(evaluator, timeout)),
            None => Box::new(evaluator),
        };
        OptimizationDriver::new(config, evaluator)
    }
}

impl<E: Evaluator> OptimizationDriver<E> {
    /// Validate `config` and prepare a run. The step policy and the random
    /// source come from the configuration.
    pub fn new(config: OptimizerConfig, evaluator: E) -> OptimizerResult<Self> {
        let space = config.validate()?;
        let policy = config.policy.build();
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        Ok(Self {
            config,
            space,
            evaluator,
            policy,
            rng,
            events: None,
            state: RunState::Initializing,
        })
    }

    /// Replace the configured step policy.
    pub fn with_policy(mut self, policy: Box<dyn StepPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Emit progress events on `tx`. Sending is best-effort.
    pub fn with_events(mut self, tx: Sender<OptimizationEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run until the iteration budget is exhausted or a convergence predicate
    /// holds. Any error aborts the run immediately; nothing is retried.
    pub fn run(&mut self) -> OptimizerResult<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let n = self.config.population_size();

        self.state = RunState::Initializing;
        info!(
            "Starting optimization '{}' ({} points, {} dimensions, policy {})",
            self.config.name,
            n,
            self.space.dimensions(),
            self.policy.name()
        );

        let mut points = initial_points(&self.config.sampling, &self.space, n, &mut self.rng)?;
        let mut history = WorstHistory::default();
        let mut steps: Vec<StepRecord> = Vec::new();
        let mut evaluations = 0;
        let mut initial: Option<(Vec<Vec<f64>>, Vec<f64>)> = None;

        self.emit(OptimizationEvent::Started {
            run_id,
            name: self.config.name.clone(),
            num_points: n,
            dimensions: self.space.dimensions(),
        });

        let mut iteration = 0;
        let mut stagnant_streak = 0;
        let objectives = loop {
            self.state = RunState::Evaluating;
            let objectives = self.evaluate_all(&points)?;
            evaluations += objectives.len();
            if initial.is_none() {
                initial = Some((self.physical_points(&points), objectives.clone()));
            }

            self.state = RunState::Selecting;
            let worst = self.select_worst(&objectives)?;
            let best = index_of_min(&objectives)?;
            let worst_objective = objectives[worst[0]];
            self.emit(OptimizationEvent::Evaluated {
                iteration,
                best_index: best,
                best_objective: objectives[best],
                worst_objective,
            });

            if self.converged(&points, &objectives) {
                self.state = RunState::Converged;
                break objectives;
            }
            if iteration >= self.config.max_iterations {
                self.state = RunState::Exhausted;
                break objectives;
            }

            self.state = RunState::Stepping;
            let stagnant = history.is_stagnant(&worst);
            let prior_stagnant_steps = if stagnant { stagnant_streak } else { 0 };
            stagnant_streak = if stagnant { stagnant_streak + 1 } else { 0 };
            let (alpha, beta) = self.effective_coefficients(stagnant);
            if stagnant {
                debug!(
                    "Point {} is worst again; stepping with alpha {} beta {}",
                    worst[0], alpha, beta
                );
            }

            let ctx = StepContext {
                space: &self.space,
                alpha,
                beta,
                stagnant,
                best,
                prior_stagnant_steps,
            };
            let kind = self.policy.step(&ctx, &mut points, &worst, &mut self.rng)?;
            iteration += 1;

            let record = StepRecord {
                iteration,
                worst: worst.clone(),
                worst_objective,
                stagnant,
                alpha,
                beta,
                kind,
            };
            debug!("Step {}: {:?} on {:?}", iteration, kind, worst);
            self.emit(OptimizationEvent::Stepped(record.clone()));
            steps.push(record);
            history.record(worst);
        };

        let best_index = index_of_min(&objectives)?;
        let final_points = self.physical_points(&points);
        let (start_points, start_objectives) = initial.unwrap_or_default();

        let report = RunReport {
            run_id,
            name: self.config.name.clone(),
            state: self.state,
            iterations: iteration,
            evaluations,
            best_point: final_points[best_index].clone(),
            best_objective: objectives[best_index],
            best_index,
            points: final_points,
            objectives,
            initial_points: start_points,
            initial_objectives: start_objectives,
            steps,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Optimization '{}' finished {:?} after {} steps ({} evaluations); best objective {}",
            report.name, report.state, report.iterations, report.evaluations, report.best_objective
        );
        self.emit(OptimizationEvent::Finished {
            run_id,
            state: report.state,
            iterations: report.iterations,
            best_objective: report.best_objective,
        });

        Ok(report)
    }

    /// Evaluate every point in index order. The first failure aborts.
    fn evaluate_all(&self, points: &PointSet) -> OptimizerResult<Vec<f64>> {
        let mut objectives = Vec::with_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            let physical = self.space.to_physical(point);
            let outcome = self.evaluator.evaluate(&physical);
            let value = match outcome {
                Ok(value) if value.is_finite() => value,
                Ok(value) => {
                    warn!("Evaluator returned {} for point {}", value, index);
                    return Err(OptimizerError::Evaluation {
                        index,
                        point: physical,
                        message: format!("non-finite objective {value}"),
                    });
                }
                Err(err) => {
                    warn!("Evaluation of point {} failed: {:#}", index, err);
                    return Err(OptimizerError::Evaluation {
                        index,
                        point: physical,
                        message: format!("{err:#}"),
                    });
                }
            };
            debug!("Point {} {:?} -> {}", index, physical, value);
            objectives.push(value);
        }
        Ok(objectives)
    }

    fn select_worst(&self, objectives: &[f64]) -> OptimizerResult<Vec<usize>> {
        if self.config.worst_count == 1 {
            Ok(vec![index_of_max(objectives)?])
        } else {
            index_of_max_n(objectives, self.config.worst_count)
        }
    }

    /// Coefficients for this step only; stagnation never compounds.
    fn effective_coefficients(&self, stagnant: bool) -> (f64, f64) {
        let alpha = self.config.alpha;
        let beta = self.config.beta;
        if !stagnant {
            return (alpha, beta);
        }
        let beta = if self.config.halve_beta_on_stagnation {
            beta / 2.0
        } else {
            beta
        };
        (alpha / 2.0, beta)
    }

    fn converged(&self, points: &PointSet, objectives: &[f64]) -> bool {
        let criteria = &self.config.convergence;

        if let Some(tol) = criteria.objective_tolerance {
            let max = objectives.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = objectives.iter().copied().fold(f64::INFINITY, f64::min);
            if max - min < tol {
                info!("Converged in objective values (spread {} < {})", max - min, tol);
                return true;
            }
        }

        if let Some(tol) = criteria.parameter_tolerance {
            let spread = points.max_relative_spread(&self.space);
            if spread < tol {
                info!("Converged in parameter values (spread {} < {})", spread, tol);
                return true;
            }
        }

        false
    }

    fn physical_points(&self, points: &PointSet) -> Vec<Vec<f64>> {
        points.iter().map(|p| self.space.to_physical(p)).collect()
    }

    fn emit(&self, event: OptimizationEvent) {
        if let Some(tx) = &self.events {
            // Best-effort send; a dropped receiver never fails the run.
            let _ = tx.try_send(event);
        }
    }
}

//! # tp-optimizer
//!
//! Derivative-free Complex-method optimizer for tuning simulation-model
//! parameters against an expensive black-box evaluator.
//!
//! Provides the parameter space (bounds and log10 scaling), the point
//! population with centroid queries, worst-point selection, reflection and
//! contraction engines behind a swappable step policy, initial sampling, and
//! the driver loop with stagnation handling, convergence checks, per-evaluation
//! timeouts and progress events.

mod config;
mod contract;
mod driver;
mod evaluator;
mod points;
mod policy;
mod reflect;
mod run;
mod sampling;
mod select;
mod space;

pub use config::{ConvergenceCriteria, OptimizerConfig};
pub use contract::{contract, retract, CONTRACTION_FACTOR, RETRACTION_DECAY};
pub use driver::OptimizationDriver;
pub use evaluator::{from_fn, Evaluator, FnEvaluator, TimeoutEvaluator};
pub use points::PointSet;
pub use policy::{
    ContractionPolicy, ReflectThenContractPolicy, ReflectThenRetractPolicy, ReflectionPolicy,
    StepContext, StepKind, StepPolicy, StepPolicyKind,
};
pub use reflect::{reflect_worst, reflect_worst_n};
pub use run::{OptimizationEvent, RunId, RunReport, RunState, StepRecord, WorstHistory};
pub use sampling::{initial_points, latin_hypercube, uniform, SamplingMethod};
pub use select::{index_of_max, index_of_max_n, index_of_min};
pub use space::{
    points_to_linear_space, points_to_log_space, to_linear_space, to_log_space, ParameterSpace,
    SearchBounds,
};

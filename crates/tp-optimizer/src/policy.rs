//! Step policies: how the driver replaces the worst point(s) each iteration.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tp_types::OptimizerResult;

use crate::contract::{contract, retract};
use crate::points::PointSet;
use crate::reflect::reflect_worst_n;
use crate::space::ParameterSpace;

/// Which kind of step was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Reflection,
    Contraction,
    Retraction,
}

/// Selects a built-in [`StepPolicy`] from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepPolicyKind {
    /// Always reflect; stagnation only shrinks the coefficients.
    #[default]
    Reflect,
    /// Always contract toward the centroid of the non-worst points.
    Contract,
    /// Reflect, but contract when the previous reflection left the same point worst.
    ReflectThenContract,
    /// Reflect, but retract toward the best point, harder with every
    /// consecutive failure, while the same point stays worst.
    ReflectThenRetract,
}

impl StepPolicyKind {
    pub fn build(self) -> Box<dyn StepPolicy> {
        match self {
            Self::Reflect => Box::new(ReflectionPolicy),
            Self::Contract => Box::new(ContractionPolicy),
            Self::ReflectThenContract => Box::new(ReflectThenContractPolicy),
            Self::ReflectThenRetract => Box::new(ReflectThenRetractPolicy),
        }
    }
}

/// Per-step inputs computed by the driver.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub space: &'a ParameterSpace,
    /// Effective reflection coefficient for this step (already halved on stagnation).
    pub alpha: f64,
    /// Effective perturbation coefficient for this step.
    pub beta: f64,
    /// The worst index repeated from the previous iteration.
    pub stagnant: bool,
    /// Index of the lowest objective in the current population.
    pub best: usize,
    /// Stagnant steps in a row before this one; 0 on the first stagnant step.
    pub prior_stagnant_steps: usize,
}

/// Replaces the worst points of a population with new candidates.
pub trait StepPolicy: Send {
    /// Mutate `points` at the `worst` indices and report the step applied.
    fn step(
        &mut self,
        ctx: &StepContext<'_>,
        points: &mut PointSet,
        worst: &[usize],
        rng: &mut dyn RngCore,
    ) -> OptimizerResult<StepKind>;

    /// Human-readable policy name.
    fn name(&self) -> &str;
}

/// Reflection through the shared centroid of the non-worst points.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectionPolicy;

impl StepPolicy for ReflectionPolicy {
    fn step(
        &mut self,
        ctx: &StepContext<'_>,
        points: &mut PointSet,
        worst: &[usize],
        rng: &mut dyn RngCore,
    ) -> OptimizerResult<StepKind> {
        reflect_worst_n(points, worst, ctx.alpha, ctx.space, ctx.beta, rng)?;
        Ok(StepKind::Reflection)
    }

    fn name(&self) -> &str {
        "reflect"
    }
}

/// Contraction of every worst point toward the centroid of the others.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractionPolicy;

impl StepPolicy for ContractionPolicy {
    fn step(
        &mut self,
        ctx: &StepContext<'_>,
        points: &mut PointSet,
        worst: &[usize],
        _rng: &mut dyn RngCore,
    ) -> OptimizerResult<StepKind> {
        for &index in worst {
            contract(points, index, worst, ctx.space)?;
        }
        Ok(StepKind::Contraction)
    }

    fn name(&self) -> &str {
        "contract"
    }
}

/// Classic Complex behaviour: a failed reflection is followed by a contraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectThenContractPolicy;

impl StepPolicy for ReflectThenContractPolicy {
    fn step(
        &mut self,
        ctx: &StepContext<'_>,
        points: &mut PointSet,
        worst: &[usize],
        rng: &mut dyn RngCore,
    ) -> OptimizerResult<StepKind> {
        if ctx.stagnant {
            ContractionPolicy.step(ctx, points, worst, rng)
        } else {
            ReflectionPolicy.step(ctx, points, worst, rng)
        }
    }

    fn name(&self) -> &str {
        "reflect-then-contract"
    }
}

/// Complex-RF escape: a point that stays worst after reflection is pulled
/// back toward a blend of the centroid and the best point.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectThenRetractPolicy;

impl StepPolicy for ReflectThenRetractPolicy {
    fn step(
        &mut self,
        ctx: &StepContext<'_>,
        points: &mut PointSet,
        worst: &[usize],
        rng: &mut dyn RngCore,
    ) -> OptimizerResult<StepKind> {
        if !ctx.stagnant {
            return ReflectionPolicy.step(ctx, points, worst, rng);
        }
        for &index in worst {
            retract(
                points,
                index,
                ctx.best,
                worst,
                ctx.prior_stagnant_steps,
                ctx.space,
                ctx.beta,
                rng,
            )?;
        }
        Ok(StepKind::Retraction)
    }

    fn name(&self) -> &str {
        "reflect-then-retract"
    }
}

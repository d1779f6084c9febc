//! Reflection of the worst point(s) through the centroid of the rest.

use rand::Rng;
use tp_types::{invalid_config, OptimizerResult};

use crate::points::PointSet;
use crate::space::ParameterSpace;

/// Reflect `points[worst]` through the centroid of the other points.
///
/// Per dimension `i` the candidate is
/// `c_i + alpha·(c_i − w_i) + beta·spread_i·(U(0,1) − 0.5)`, clamped to the
/// bounds, where `spread_i` is taken over the whole set including the worst
/// point. The candidate replaces the worst point and is returned.
pub fn reflect_worst<R: Rng + ?Sized>(
    points: &mut PointSet,
    worst: usize,
    alpha: f64,
    space: &ParameterSpace,
    beta: f64,
    rng: &mut R,
) -> OptimizerResult<Vec<f64>> {
    let mut candidates = reflect_worst_n(points, &[worst], alpha, space, beta, rng)?;
    candidates
        .pop()
        .ok_or_else(|| invalid_config!("reflection produced no candidate"))
}

/// Reflect every index in `worst` through one shared centroid that excludes
/// all of them.
///
/// The centroid and the per-dimension spreads are computed once, before any
/// point is replaced, so each worst point moves independently of the others.
/// Candidates are returned in the order of `worst`, which must not repeat an
/// index.
pub fn reflect_worst_n<R: Rng + ?Sized>(
    points: &mut PointSet,
    worst: &[usize],
    alpha: f64,
    space: &ParameterSpace,
    beta: f64,
    rng: &mut R,
) -> OptimizerResult<Vec<Vec<f64>>> {
    check_dimensions(points, space)?;
    for (position, index) in worst.iter().enumerate() {
        if worst[..position].contains(index) {
            return Err(invalid_config!("worst index {} is listed twice", index));
        }
    }

    let centroid = points.centroid(worst)?;
    let spreads: Vec<f64> = (0..points.dimensions()).map(|d| points.spread(d)).collect();

    let mut candidates = Vec::with_capacity(worst.len());
    for &index in worst {
        let current = points.point(index);
        let candidate: Vec<f64> = centroid
            .iter()
            .zip(current)
            .zip(&spreads)
            .zip(space.bounds())
            .map(|(((&c, &w), &spread), bound)| {
                let jitter = beta * spread * (rng.random::<f64>() - 0.5);
                bound.clamp(c + alpha * (c - w) + jitter)
            })
            .collect();

        points.replace(index, candidate.clone());
        candidates.push(candidate);
    }

    Ok(candidates)
}

pub(crate) fn check_dimensions(points: &PointSet, space: &ParameterSpace) -> OptimizerResult<()> {
    if points.dimensions() != space.dimensions() {
        return Err(invalid_config!(
            "points have {} dimensions but the parameter space has {}",
            points.dimensions(),
            space.dimensions()
        ));
    }
    Ok(())
}

//! Conservative steps for a point that reflection failed to improve:
//! contraction toward the centroid and retraction toward the best point.

use rand::Rng;
use tp_types::{invalid_config, OptimizerResult};

use crate::points::PointSet;
use crate::reflect::check_dimensions;
use crate::space::ParameterSpace;

/// Coefficient applied to `(centroid − point)` by [`contract`].
pub const CONTRACTION_FACTOR: f64 = 0.5;

/// Number of consecutive failures over which [`retract`] shifts its anchor
/// from the centroid to the best point (`1 − e^{-1}` of the way after this many).
pub const RETRACTION_DECAY: f64 = 5.0;

/// Replace `points[index]` with `c + 0.5·(c − p)` clamped to the bounds,
/// where `c` is the centroid of the points not in `excluding`.
///
/// No random perturbation is applied.
pub fn contract(
    points: &mut PointSet,
    index: usize,
    excluding: &[usize],
    space: &ParameterSpace,
) -> OptimizerResult<Vec<f64>> {
    check_dimensions(points, space)?;
    check_index(points, index)?;
    let centroid = points.centroid(excluding)?;

    let candidate: Vec<f64> = centroid
        .iter()
        .zip(points.point(index))
        .zip(space.bounds())
        .map(|((&c, &p), bound)| bound.clamp(c + CONTRACTION_FACTOR * (c - p)))
        .collect();

    points.replace(index, candidate.clone());
    Ok(candidate)
}

/// Pull `points[index]` back toward an anchor that slides from the centroid
/// of the points not in `excluding` to `points[best]` as `failures` grows.
///
/// Per dimension `i`, with `a = 1 − exp(−failures / 5)`:
/// `(c_i·(1 − a) + b_i·a + p_i) / 2 + beta·spread_i·(U(0,1) − 0.5)`, clamped.
/// `failures` counts the retractions already applied to this point in a row,
/// so the first retraction lands halfway between the point and the centroid.
#[allow(clippy::too_many_arguments)]
pub fn retract<R: Rng + ?Sized>(
    points: &mut PointSet,
    index: usize,
    best: usize,
    excluding: &[usize],
    failures: usize,
    space: &ParameterSpace,
    beta: f64,
    rng: &mut R,
) -> OptimizerResult<Vec<f64>> {
    check_dimensions(points, space)?;
    check_index(points, index)?;
    check_index(points, best)?;
    let centroid = points.centroid(excluding)?;

    let pull = 1.0 - (-(failures as f64) / RETRACTION_DECAY).exp();
    let candidate: Vec<f64> = (0..points.dimensions())
        .map(|d| {
            let anchor = centroid[d] * (1.0 - pull) + points.point(best)[d] * pull;
            let jitter = beta * points.spread(d) * (rng.random::<f64>() - 0.5);
            space
                .bound(d)
                .clamp((anchor + points.point(index)[d]) / 2.0 + jitter)
        })
        .collect();

    points.replace(index, candidate.clone());
    Ok(candidate)
}

fn check_index(points: &PointSet, index: usize) -> OptimizerResult<()> {
    if index >= points.len() {
        return Err(invalid_config!(
            "index {} is out of range for {} points",
            index,
            points.len()
        ));
    }
    Ok(())
}

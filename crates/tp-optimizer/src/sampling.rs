//! Initial population sampling.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tp_types::{invalid_config, OptimizerResult};

use crate::points::PointSet;
use crate::space::ParameterSpace;

/// How the initial population is produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SamplingMethod {
    /// Independent uniform draws inside the bounds.
    #[default]
    Uniform,
    /// One sample per stratum in every dimension.
    LatinHypercube,
    /// Externally supplied starting points, in physical units.
    Seeds(Vec<Vec<f64>>),
}

/// Build the initial [`PointSet`] in search coordinates.
pub fn initial_points<R: Rng + ?Sized>(
    method: &SamplingMethod,
    space: &ParameterSpace,
    num_points: usize,
    rng: &mut R,
) -> OptimizerResult<PointSet> {
    let points = match method {
        SamplingMethod::Uniform => uniform(space, num_points, rng),
        SamplingMethod::LatinHypercube => latin_hypercube(space, num_points, rng),
        SamplingMethod::Seeds(seeds) => check_seeds(space, num_points, seeds)?,
    };
    PointSet::new(points)
}

/// `num_points` independent uniform samples.
pub fn uniform<R: Rng + ?Sized>(
    space: &ParameterSpace,
    num_points: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    (0..num_points)
        .map(|_| {
            space
                .bounds()
                .iter()
                .map(|b| b.min + rng.random::<f64>() * b.width())
                .collect()
        })
        .collect()
}

/// Latin hypercube: each dimension is split into `num_points` equal strata and
/// every stratum is used exactly once, with strata shuffled per dimension.
pub fn latin_hypercube<R: Rng + ?Sized>(
    space: &ParameterSpace,
    num_points: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut points = vec![Vec::with_capacity(space.dimensions()); num_points];
    let strata = num_points as f64;

    for bound in space.bounds() {
        let mut order: Vec<usize> = (0..num_points).collect();
        order.shuffle(rng);
        for (point, stratum) in points.iter_mut().zip(order) {
            let t = (stratum as f64 + rng.random::<f64>()) / strata;
            point.push(bound.clamp(bound.min + t * bound.width()));
        }
    }

    points
}

/// Validate physical seed points and convert them to search coordinates.
pub(crate) fn check_seeds(
    space: &ParameterSpace,
    num_points: usize,
    seeds: &[Vec<f64>],
) -> OptimizerResult<Vec<Vec<f64>>> {
    if seeds.len() != num_points {
        return Err(invalid_config!(
            "expected {} seed points, got {}",
            num_points,
            seeds.len()
        ));
    }

    let mut points = Vec::with_capacity(seeds.len());
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() != space.dimensions() {
            return Err(invalid_config!(
                "seed point {} has {} dimensions, expected {}",
                index,
                seed.len(),
                space.dimensions()
            ));
        }
        for (dimension, (value, param)) in seed.iter().zip(space.parameters()).enumerate() {
            if !param.contains(*value) {
                return Err(invalid_config!(
                    "seed point {} dimension {} ('{}') = {} lies outside [{}, {}]",
                    index,
                    dimension,
                    param.name,
                    value,
                    param.min,
                    param.max
                ));
            }
        }
        let search = space.to_search(seed).map_err(|err| err.at_point(index))?;
        points.push(search);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tp_types::ParameterDef;

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            ParameterDef::linear("x", -2.0, 2.0),
            ParameterDef::log10("k", 0.1, 1000.0),
        ])
        .unwrap()
    }

    #[test]
    fn uniform_samples_stay_in_bounds() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let set = initial_points(&SamplingMethod::Uniform, &space, 50, &mut rng).unwrap();
        assert_eq!(set.len(), 50);
        assert!(set.iter().all(|p| space.contains(p)));
    }

    #[test]
    fn latin_hypercube_hits_every_stratum_once() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let n = 8;
        let points = latin_hypercube(&space, n, &mut rng);

        for (d, bound) in space.bounds().iter().enumerate() {
            let mut strata: Vec<usize> = points
                .iter()
                .map(|p| {
                    let t = (p[d] - bound.min) / bound.width();
                    ((t * n as f64).floor() as usize).min(n - 1)
                })
                .collect();
            strata.sort_unstable();
            assert_eq!(strata, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn seeds_are_converted_to_search_coordinates() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let method = SamplingMethod::Seeds(vec![vec![1.0, 10.0], vec![-1.0, 100.0]]);
        let set = initial_points(&method, &space, 2, &mut rng).unwrap();
        assert_eq!(set.point(0)[0], 1.0);
        assert!((set.point(1)[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn seeds_outside_bounds_name_point_and_dimension() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let method = SamplingMethod::Seeds(vec![vec![1.0, 10.0], vec![5.0, 100.0]]);
        let err = initial_points(&method, &space, 2, &mut rng).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("seed point 1 dimension 0"), "{text}");
    }

    #[test]
    fn seed_count_must_match_population() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let method = SamplingMethod::Seeds(vec![vec![1.0, 10.0]]);
        assert!(initial_points(&method, &space, 3, &mut rng).is_err());
    }
}

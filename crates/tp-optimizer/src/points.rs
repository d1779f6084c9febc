//! Population of candidate points and the per-dimension queries on it.

use std::collections::BTreeSet;

use tp_types::{invalid_config, OptimizerResult};

use crate::space::ParameterSpace;

/// An ordered, fixed-size collection of points in search coordinates.
///
/// The set never changes size after construction; the driver mutates it
/// only through [`PointSet::replace`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    points: Vec<Vec<f64>>,
    dimensions: usize,
}

impl PointSet {
    pub fn new(points: Vec<Vec<f64>>) -> OptimizerResult<Self> {
        let dimensions = match points.first() {
            Some(first) if !first.is_empty() => first.len(),
            Some(_) => return Err(invalid_config!("points must have at least one dimension")),
            None => return Err(invalid_config!("point set is empty")),
        };
        if let Some(index) = points.iter().position(|p| p.len() != dimensions) {
            return Err(invalid_config!(
                "point {} has {} dimensions, expected {}",
                index,
                points[index].len(),
                dimensions
            ));
        }
        Ok(Self { points, dimensions })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn point(&self, index: usize) -> &[f64] {
        &self.points[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.points.iter().map(Vec::as_slice)
    }

    pub fn as_slice(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn into_inner(self) -> Vec<Vec<f64>> {
        self.points
    }

    /// Sum of coordinate `dimension` over every point not in `excluding`.
    pub fn sum(&self, dimension: usize, excluding: &[usize]) -> f64 {
        self.points
            .iter()
            .enumerate()
            .filter(|(index, _)| !excluding.contains(index))
            .map(|(_, point)| point[dimension])
            .sum()
    }

    pub fn min(&self, dimension: usize) -> f64 {
        self.points
            .iter()
            .map(|p| p[dimension])
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self, dimension: usize) -> f64 {
        self.points
            .iter()
            .map(|p| p[dimension])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// `max - min` of coordinate `dimension` over the whole set.
    pub fn spread(&self, dimension: usize) -> f64 {
        self.max(dimension) - self.min(dimension)
    }

    /// Coordinate-wise mean of the points not in `excluding`.
    ///
    /// Duplicate indices in `excluding` count once. Fails when no point would
    /// remain or an excluded index is out of range.
    pub fn centroid(&self, excluding: &[usize]) -> OptimizerResult<Vec<f64>> {
        let n = self.points.len();
        let excluded: BTreeSet<usize> = excluding.iter().copied().collect();
        if let Some(&bad) = excluded.iter().find(|&&i| i >= n) {
            return Err(invalid_config!(
                "excluded index {} is out of range for {} points",
                bad,
                n
            ));
        }

        let remaining = n - excluded.len();
        if remaining == 0 {
            return Err(invalid_config!(
                "cannot compute a centroid: all {} points are excluded",
                n
            ));
        }

        let count = remaining as f64;
        Ok((0..self.dimensions)
            .map(|d| self.sum(d, excluding) / count)
            .collect())
    }

    /// Overwrite one point in place.
    ///
    /// The caller guarantees `point` already satisfies the bounds.
    pub fn replace(&mut self, index: usize, point: Vec<f64>) {
        debug_assert_eq!(point.len(), self.dimensions);
        self.points[index] = point;
    }

    /// Largest per-dimension spread relative to the bound width; dimensions
    /// with a zero-width box are skipped. Returns 0 when every dimension is
    /// degenerate.
    pub fn max_relative_spread(&self, space: &ParameterSpace) -> f64 {
        (0..self.dimensions)
            .filter(|&d| space.bound(d).width() > 0.0)
            .map(|d| self.spread(d) / space.bound(d).width())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_types::{OptimizerError, ParameterDef};

    fn square() -> PointSet {
        PointSet::new(vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![2.0, 2.0],
            vec![0.0, 2.0],
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_points() {
        let err = PointSet::new(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("point 1"));
    }

    #[test]
    fn rejects_empty_set() {
        assert!(PointSet::new(vec![]).is_err());
        assert!(PointSet::new(vec![vec![]]).is_err());
    }

    #[test]
    fn sum_min_max() {
        let set = square();
        assert_eq!(set.sum(0, &[]), 4.0);
        assert_eq!(set.sum(0, &[1, 2]), 0.0);
        assert_eq!(set.min(1), 0.0);
        assert_eq!(set.max(1), 2.0);
        assert_eq!(set.spread(0), 2.0);
    }

    #[test]
    fn centroid_of_full_set() {
        assert_eq!(square().centroid(&[]).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn centroid_ignores_excluded_outlier() {
        let mut set = square();
        let before = set.centroid(&[2]).unwrap();
        set.replace(2, vec![1e12, -1e12]);
        let after = set.centroid(&[2]).unwrap();
        assert_eq!(before, after);
        assert!((after[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((after[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_counts_duplicate_exclusions_once() {
        let set = square();
        assert_eq!(set.centroid(&[0, 0]).unwrap(), set.centroid(&[0]).unwrap());
    }

    #[test]
    fn degenerate_centroid_fails() {
        let set = PointSet::new(vec![vec![1.0], vec![3.0]]).unwrap();
        match set.centroid(&[0, 1]) {
            Err(OptimizerError::InvalidConfiguration { message }) => {
                assert!(message.contains("all 2 points"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn centroid_rejects_out_of_range_exclusion() {
        assert!(square().centroid(&[9]).is_err());
    }

    #[test]
    fn relative_spread_uses_bound_width() {
        let space = ParameterSpace::new(vec![
            ParameterDef::linear("x", 0.0, 4.0),
            ParameterDef::linear("y", 0.0, 10.0),
        ])
        .unwrap();
        assert_eq!(square().max_relative_spread(&space), 0.5);
    }
}

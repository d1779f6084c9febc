//! Worst/best point selection over an objective vector.
//!
//! Lower objective is better, so the "worst" point has the largest value.
//! Ties always resolve to the lowest index: only a strictly greater (or
//! lesser) value replaces the running extremum.

use tp_types::{invalid_config, OptimizerResult};

/// First index attaining the maximum objective.
pub fn index_of_max(objectives: &[f64]) -> OptimizerResult<usize> {
    extremum(objectives, |candidate, current| candidate > current)
}

/// First index attaining the minimum objective.
pub fn index_of_min(objectives: &[f64]) -> OptimizerResult<usize> {
    extremum(objectives, |candidate, current| candidate < current)
}

fn extremum(objectives: &[f64], better: impl Fn(f64, f64) -> bool) -> OptimizerResult<usize> {
    let (&first, rest) = objectives
        .split_first()
        .ok_or_else(|| invalid_config!("cannot select from an empty objective vector"))?;

    let mut best_index = 0;
    let mut best_value = first;
    for (offset, &value) in rest.iter().enumerate() {
        if better(value, best_value) {
            best_value = value;
            best_index = offset + 1;
        }
    }
    Ok(best_index)
}

/// Indices of the `count` largest objectives, largest first, without
/// duplicates.
///
/// Each pass scans for the maximum among indices not yet chosen, so the cost
/// is O(n·count); both are small next to a single simulation run.
pub fn index_of_max_n(objectives: &[f64], count: usize) -> OptimizerResult<Vec<usize>> {
    if count > objectives.len() {
        return Err(invalid_config!(
            "requested {} worst points but the population has {}",
            count,
            objectives.len()
        ));
    }

    let mut chosen: Vec<usize> = Vec::with_capacity(count);
    for _ in 0..count {
        let mut pick: Option<usize> = None;
        for (index, &value) in objectives.iter().enumerate() {
            if chosen.contains(&index) {
                continue;
            }
            match pick {
                Some(current) if value <= objectives[current] => {}
                _ => pick = Some(index),
            }
        }
        // count <= len guarantees an unchosen index remains
        if let Some(index) = pick {
            chosen.push(index);
        }
    }
    Ok(chosen)
}

//! Cost-shaping helpers over simulated time series.
//!
//! These are the building blocks a harness combines into a scalar objective;
//! the optimizer never calls them directly.

use tp_types::{SeriesError, TimeSeries};

/// Time at which the series first reaches `threshold`, linearly interpolated
/// between the samples that straddle it. `None` if it never gets there.
pub fn first_time_at_threshold(series: &TimeSeries<'_>, threshold: f64) -> Option<f64> {
    let time = series.time();
    let values = series.values();

    if values[0] >= threshold {
        return Some(time[0]);
    }
    let i = values.iter().position(|&v| v >= threshold)?;
    let (t0, t1) = (time[i - 1], time[i]);
    let (v0, v1) = (values[i - 1], values[i]);
    Some(t0 + (threshold - v0) / (v1 - v0) * (t1 - t0))
}

/// How far the series peaks above `limit`; zero if it never exceeds it.
pub fn overshoot_above(series: &TimeSeries<'_>, limit: f64) -> f64 {
    let peak = series
        .values()
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    (peak - limit).max(0.0)
}

/// Series value at time `t`, linearly interpolated and held constant beyond
/// either end.
pub fn value_at(series: &TimeSeries<'_>, t: f64) -> f64 {
    let time = series.time();
    let values = series.values();
    let last = time.len() - 1;

    if t <= time[0] {
        return values[0];
    }
    if t >= time[last] {
        return values[last];
    }

    let i = time.partition_point(|&x| x < t);
    let (t0, t1) = (time[i - 1], time[i]);
    if t1 == t0 {
        return values[i];
    }
    values[i - 1] + (t - t0) / (t1 - t0) * (values[i] - values[i - 1])
}

/// `|series(t) − target|`.
pub fn abs_diff_at_time(series: &TimeSeries<'_>, t: f64, target: f64) -> f64 {
    (value_at(series, t) - target).abs()
}

/// Mean of `|a_i − b_i|` over two equally sampled series.
pub fn mean_abs_diff(a: &[f64], b: &[f64]) -> Result<f64, SeriesError> {
    if a.len() != b.len() {
        return Err(SeriesError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SeriesError::Empty);
    }
    let total: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
    Ok(total / a.len() as f64)
}

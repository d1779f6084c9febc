//! Sampled time series produced by a simulation run.

use serde::{Deserialize, Serialize};

use crate::errors::SeriesError;

/// A borrowed view of one logged variable against its time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeries<'a> {
    time: &'a [f64],
    values: &'a [f64],
}

impl<'a> TimeSeries<'a> {
    /// Pair a time axis with data, checking lengths and monotonic time.
    pub fn new(time: &'a [f64], values: &'a [f64]) -> Result<Self, SeriesError> {
        if time.is_empty() {
            return Err(SeriesError::Empty);
        }
        if time.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                left: time.len(),
                right: values.len(),
            });
        }
        if let Some(index) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(SeriesError::NonMonotonicTime { index: index + 1 });
        }
        Ok(Self { time, values })
    }

    pub fn time(&self) -> &'a [f64] {
        self.time
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Iterate `(time, value)` samples.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.time.iter().copied().zip(self.values.iter().copied())
    }
}

/// Owned copy of a logged variable, for persisting results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedSeries {
    pub name: String,
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl OwnedSeries {
    pub fn view(&self) -> Result<TimeSeries<'_>, SeriesError> {
        TimeSeries::new(&self.time, &self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_series() {
        assert_eq!(TimeSeries::new(&[], &[]), Err(SeriesError::Empty));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = TimeSeries::new(&[0.0, 1.0], &[1.0]).unwrap_err();
        assert_eq!(err, SeriesError::LengthMismatch { left: 2, right: 1 });
    }

    #[test]
    fn rejects_decreasing_time() {
        let err = TimeSeries::new(&[0.0, 1.0, 0.5], &[0.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(err, SeriesError::NonMonotonicTime { index: 2 });
    }

    #[test]
    fn samples_pair_time_and_values() {
        let series = TimeSeries::new(&[0.0, 0.1], &[5.0, 6.0]).unwrap();
        let collected: Vec<(f64, f64)> = series.samples().collect();
        assert_eq!(collected, vec![(0.0, 5.0), (0.1, 6.0)]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn owned_series_round_trips_through_json() {
        let owned = OwnedSeries {
            name: "position".into(),
            time: vec![0.0, 1.0],
            values: vec![0.0, 0.9],
        };
        let json = serde_json::to_string(&owned).unwrap();
        let back: OwnedSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(owned, back);
        assert!(back.view().is_ok());
    }
}

//! The one external capability the optimizer consumes: parameters → cost.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use crossbeam_channel::RecvTimeoutError;

/// Maps a parameter vector (physical units, in parameter-space order) to a
/// scalar cost. Lower is better.
///
/// Implementations are typically expensive: each call applies the parameters
/// to an external simulation and runs it to completion.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, point: &[f64]) -> anyhow::Result<f64>;
}

impl<E: Evaluator + ?Sized> Evaluator for Arc<E> {
    fn evaluate(&self, point: &[f64]) -> anyhow::Result<f64> {
        (**self).evaluate(point)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, point: &[f64]) -> anyhow::Result<f64> {
        (**self).evaluate(point)
    }
}

/// Adapts a closure into an [`Evaluator`].
pub struct FnEvaluator<F> {
    f: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&[f64]) -> anyhow::Result<f64> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&[f64]) -> anyhow::Result<f64> + Send + Sync,
{
    fn evaluate(&self, point: &[f64]) -> anyhow::Result<f64> {
        (self.f)(point)
    }
}

/// Shorthand for [`FnEvaluator::new`].
pub fn from_fn<F>(f: F) -> FnEvaluator<F>
where
    F: Fn(&[f64]) -> anyhow::Result<f64> + Send + Sync,
{
    FnEvaluator::new(f)
}

/// Bounds the wall-clock time of every evaluation.
///
/// Each call runs on its own worker thread; the caller waits on a channel
/// with a deadline. A timed-out evaluation is abandoned and keeps running in
/// the background until it returns on its own. A panicking evaluation is
/// reported as a failure.
pub struct TimeoutEvaluator<E> {
    inner: Arc<E>,
    timeout: Duration,
}

impl<E: Evaluator + 'static> TimeoutEvaluator<E> {
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(inner), timeout)
    }

    pub fn from_arc(inner: Arc<E>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<E: Evaluator + 'static> Evaluator for TimeoutEvaluator<E> {
    fn evaluate(&self, point: &[f64]) -> anyhow::Result<f64> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let point = point.to_vec();

        thread::Builder::new()
            .name("tp-evaluation".to_string())
            .spawn(move || {
                // Receiver may already have given up.
                let _ = tx.send(inner.evaluate(&point));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                Err(anyhow!("evaluation timed out after {:?}", self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(anyhow!("evaluation thread exited without a result"))
            }
        }
    }
}

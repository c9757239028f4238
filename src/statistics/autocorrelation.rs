//! Autocovariance and autocorrelation at a fixed lag
//!
//! A lag buffer holds the last `lag` raw values. Once it is full, every new
//! value `xₜ` is paired with `xₜ₋lag` and the pair is pushed into a
//! two-variable engine, so the lagged statistics are ordinary joint sums over
//! those pairs. The lag buffer and the engine are updated under the engine's
//! write lock, so readers never observe one without the other.

use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{correlation, require, Subscription};
use crate::error::{MomentError, QueueError, Result};
use crate::joint::{Core, CoreConfig, RingQueue, Tuple};
use crate::traits::Metric;

/// Lag buffer plus engine binding shared by both lagged statistics
#[derive(Debug)]
struct Lagged {
    lag: usize,
    window: usize,
    values: Mutex<RingQueue<f64>>,
    sub: Subscription,
}

impl Lagged {
    fn new(lag: usize, window: usize) -> Self {
        Self {
            lag,
            window,
            values: Mutex::new(RingQueue::with_capacity(lag)),
            sub: Subscription::default(),
        }
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        let x = match values {
            [x] => *x,
            _ => {
                return Err(MomentError::Dimension {
                    expected: 1,
                    found: values.len(),
                })
            }
        };

        // Checked before buffering, or the value would fail every later pair
        if !x.is_finite() {
            return Err(MomentError::NonFinite { index: 0, value: x });
        }

        let mut state = self.sub.core()?.write();
        if self.lag == 0 {
            return state.push(&[x, x]);
        }

        let mut lagged = self.values.lock();
        if lagged.is_closed() {
            return Err(lag_failure("lag_push", QueueError::Closed));
        }
        if lagged.is_full() {
            if let Some(&oldest) = lagged.front() {
                state.push(&[x, oldest])?;
            }
            lagged.pop().map_err(|source| lag_failure("lag_pop", source))?;
        }
        lagged.push(x).map_err(|source| lag_failure("lag_push", source))
    }

    fn clear(&self) {
        let mut state = self.sub.core().ok().map(Core::write);
        if let Some(state) = state.as_mut() {
            state.clear();
        }
        self.values.lock().reset();
    }
}

/// Lag-buffer failures carry `lag_*` labels, distinct from the engine's
/// eviction queue
fn lag_failure(op: &'static str, source: QueueError) -> MomentError {
    MomentError::Window { op, source }
}

/// Sample autocovariance at a fixed lag
///
/// Values are pushed one at a time.
///
/// # Example
///
/// ```
/// use flowmoments::statistics::Autocovariance;
/// use flowmoments::traits::Metric;
///
/// let mut acov = Autocovariance::new(1, 0);
/// acov.init().unwrap();
/// for value in [1.0, 2.0, 3.0, 4.0] {
///     acov.push(&[value]).unwrap();
/// }
/// // Pairs (2, 1), (3, 2), (4, 3)
/// assert!((acov.value().unwrap() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Autocovariance {
    inner: Lagged,
}

impl Autocovariance {
    /// Autocovariance at `lag` over the last `window` pairs (0 for unbounded)
    pub fn new(lag: usize, window: usize) -> Self {
        Self {
            inner: Lagged::new(lag, window),
        }
    }
}

impl fmt::Display for Autocovariance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "autocovariance_{{lag:{},window:{}}}",
            self.inner.lag, self.inner.window
        )
    }
}

impl Metric for Autocovariance {
    fn config(&self) -> CoreConfig {
        CoreConfig::new([[1, 1]]).with_window(self.inner.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.inner.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.inner.push(values)
    }

    fn value(&self) -> Result<f64> {
        let state = self.inner.sub.core()?.read();
        let n = require(&state, 2)?;
        Ok(state.sum(&Tuple::from([1, 1]))? / (n - 1.0))
    }

    fn clear(&self) {
        self.inner.clear();
    }
}

/// Autocorrelation at a fixed lag
#[derive(Debug)]
pub struct Autocorrelation {
    inner: Lagged,
}

impl Autocorrelation {
    /// Autocorrelation at `lag` over the last `window` pairs (0 for unbounded)
    pub fn new(lag: usize, window: usize) -> Self {
        Self {
            inner: Lagged::new(lag, window),
        }
    }
}

impl fmt::Display for Autocorrelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "autocorrelation_{{lag:{},window:{}}}",
            self.inner.lag, self.inner.window
        )
    }
}

impl Metric for Autocorrelation {
    fn config(&self) -> CoreConfig {
        CoreConfig::new([[1, 1], [2, 0], [0, 2]]).with_window(self.inner.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.inner.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.inner.push(values)
    }

    fn value(&self) -> Result<f64> {
        correlation(&self.inner.sub.core()?.read())
    }

    fn clear(&self) {
        self.inner.clear();
    }
}

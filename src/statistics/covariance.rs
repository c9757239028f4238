//! Covariance and correlation of two jointly observed variables

use core::fmt;
use std::sync::Arc;

use super::{correlation, require, Subscription};
use crate::error::Result;
use crate::joint::{Core, CoreConfig, Tuple};
use crate::traits::Metric;

/// Sample covariance of `(x, y)` pairs
///
/// # Example
///
/// ```
/// use flowmoments::statistics::Covariance;
/// use flowmoments::traits::Metric;
///
/// let mut cov = Covariance::new(0);
/// cov.init().unwrap();
/// for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)] {
///     cov.push(&[x, y]).unwrap();
/// }
/// assert!((cov.value().unwrap() - 2.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct Covariance {
    window: usize,
    sub: Subscription,
}

impl Covariance {
    /// Sample covariance over the last `window` pairs (0 for unbounded)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Covariance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "covariance_{{window:{}}}", self.window)
    }
}

impl Metric for Covariance {
    fn config(&self) -> CoreConfig {
        CoreConfig::new([[1, 1]]).with_window(self.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.sub.core()?.push(values)
    }

    fn value(&self) -> Result<f64> {
        let state = self.sub.core()?.read();
        let n = require(&state, 2)?;
        Ok(state.sum(&Tuple::from([1, 1]))? / (n - 1.0))
    }

    fn clear(&self) {
        self.sub.clear();
    }
}

/// Pearson correlation of `(x, y)` pairs
#[derive(Clone, Debug)]
pub struct Correlation {
    window: usize,
    sub: Subscription,
}

impl Correlation {
    /// Pearson correlation over the last `window` pairs (0 for unbounded)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "correlation_{{window:{}}}", self.window)
    }
}

impl Metric for Correlation {
    fn config(&self) -> CoreConfig {
        CoreConfig::new([[1, 1], [2, 0], [0, 2]]).with_window(self.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.sub.core()?.push(values)
    }

    fn value(&self) -> Result<f64> {
        correlation(&self.sub.core()?.read())
    }

    fn clear(&self) {
        self.sub.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MomentError;
    use crate::traits::init_shared;

    #[test]
    fn test_covariance_window() {
        let mut cov = Covariance::new(3);
        cov.init().unwrap();
        for (x, y) in [(1.0, 1.0), (2.0, 4.0), (3.0, 9.0), (4.0, 16.0), (8.0, 64.0)] {
            cov.push(&[x, y]).unwrap();
        }
        // Last three pairs: s(1,1) = 158
        assert!((cov.value().unwrap() - 79.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_perfect() {
        let mut corr = Correlation::new(0);
        corr.init().unwrap();
        for i in 0..50 {
            let x = i as f64;
            corr.push(&[x, -2.0 * x + 7.0]).unwrap();
        }
        assert!((corr.value().unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_needs_two_samples() {
        let mut corr = Correlation::new(0);
        corr.init().unwrap();
        assert_eq!(corr.value(), Err(MomentError::NoValues));
        corr.push(&[1.0, 2.0]).unwrap();
        assert_eq!(
            corr.value(),
            Err(MomentError::InsufficientData { needed: 2, seen: 1 })
        );
    }

    #[test]
    fn test_shared_core() {
        let mut cov = Covariance::new(10);
        let mut corr = Correlation::new(10);
        let core = init_shared(&mut [&mut cov, &mut corr]).unwrap();

        // (1,1), (2,0) and (0,2) only; nothing is dominated
        assert_eq!(core.config().tuples.len(), 3);

        for (x, y) in [(1.0, 3.0), (2.0, 1.0), (4.0, 5.0), (3.0, 2.0)] {
            core.push(&[x, y]).unwrap();
        }
        let cov_value = cov.value().unwrap();
        let sxx = core.sum(&Tuple::from([2, 0])).unwrap() / 3.0;
        let syy = core.sum(&Tuple::from([0, 2])).unwrap() / 3.0;
        assert!((corr.value().unwrap() - cov_value / (sxx * syy).sqrt()).abs() < 1e-12);

        cov.clear();
        assert_eq!(corr.value(), Err(MomentError::NoValues));
    }

    #[test]
    fn test_dimension_error() {
        let mut cov = Covariance::new(0);
        cov.init().unwrap();
        assert_eq!(
            cov.push(&[1.0, 2.0, 3.0]),
            Err(MomentError::Dimension {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_incompatible_windows_do_not_share() {
        let mut a = Covariance::new(5);
        let mut b = Correlation::new(6);
        assert!(matches!(
            init_shared(&mut [&mut a, &mut b]),
            Err(MomentError::Config(_))
        ));
    }
}

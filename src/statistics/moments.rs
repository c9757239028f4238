//! Univariate running statistics (mean, variance, higher moments)
//!
//! All of these read a one-variable engine. The engine keeps centered power
//! sums updated with a Welford-style recurrence, so the results stay stable
//! for large offsets and can be restricted to a sliding window.

use core::fmt;
use std::sync::Arc;

use super::{require, Subscription};
use crate::error::Result;
use crate::joint::{Core, CoreConfig, Tuple};
use crate::traits::Metric;

fn univariate(order: u32, window: usize) -> CoreConfig {
    CoreConfig::new([[order]]).with_window(window)
}

/// Running mean
///
/// # Example
///
/// ```
/// use flowmoments::statistics::Mean;
/// use flowmoments::traits::Metric;
///
/// let mut mean = Mean::new(0);
/// mean.init().unwrap();
/// for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     mean.push(&[value]).unwrap();
/// }
/// assert!((mean.value().unwrap() - 5.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct Mean {
    window: usize,
    sub: Subscription,
}

impl Mean {
    /// Mean over the last `window` values, or all values when `window` is 0
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Mean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mean_{{window:{}}}", self.window)
    }
}

impl Metric for Mean {
    fn config(&self) -> CoreConfig {
        univariate(1, self.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.sub.core()?.push(values)
    }

    fn value(&self) -> Result<f64> {
        self.sub.core()?.mean(0)
    }

    fn clear(&self) {
        self.sub.clear();
    }
}

/// Sample variance (Bessel-corrected)
#[derive(Clone, Debug)]
pub struct Variance {
    window: usize,
    sub: Subscription,
}

impl Variance {
    /// Sample variance over the last `window` values (0 for unbounded)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variance_{{window:{}}}", self.window)
    }
}

impl Metric for Variance {
    fn config(&self) -> CoreConfig {
        univariate(2, self.window)
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
        Ok(state.sum(&Tuple::from([2]))? / (n - 1.0))
    }

    fn clear(&self) {
        self.sub.clear();
    }
}

/// Sample standard deviation
#[derive(Clone, Debug)]
pub struct Std {
    variance: Variance,
}

impl Std {
    /// Sample standard deviation over the last `window` values (0 for unbounded)
    pub fn new(window: usize) -> Self {
        Self {
            variance: Variance::new(window),
        }
    }
}

impl fmt::Display for Std {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "std_{{window:{}}}", self.variance.window)
    }
}

impl Metric for Std {
    fn config(&self) -> CoreConfig {
        self.variance.config()
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.variance.subscribe(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.variance.push(values)
    }

    fn value(&self) -> Result<f64> {
        self.variance.value().map(f64::sqrt)
    }

    fn clear(&self) {
        self.variance.clear();
    }
}

/// `k`-th central moment, normalized by the sample count
#[derive(Clone, Debug)]
pub struct Moment {
    k: u32,
    window: usize,
    sub: Subscription,
}

impl Moment {
    /// `k` must be positive; `k = 0` is rejected when the engine is built
    pub fn new(k: u32, window: usize) -> Self {
        Self {
            k,
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moment_{{k:{},window:{}}}", self.k, self.window)
    }
}

impl Metric for Moment {
    fn config(&self) -> CoreConfig {
        univariate(self.k, self.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.sub.core()?.push(values)
    }

    fn value(&self) -> Result<f64> {
        let state = self.sub.core()?.read();
        let n = require(&state, 1)?;
        Ok(state.sum(&Tuple::from([self.k]))? / n)
    }

    fn clear(&self) {
        self.sub.clear();
    }
}

/// Adjusted Fisher-Pearson skewness
#[derive(Clone, Debug)]
pub struct Skewness {
    window: usize,
    sub: Subscription,
}

impl Skewness {
    /// Adjusted skewness over the last `window` values (0 for unbounded)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Skewness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skewness_{{window:{}}}", self.window)
    }
}

impl Metric for Skewness {
    fn config(&self) -> CoreConfig {
        univariate(3, self.window)
    }

    fn subscribe(&mut self, core: Arc<Core>) {
        self.sub.set(core);
    }

    fn push(&self, values: &[f64]) -> Result<()> {
        self.sub.core()?.push(values)
    }

    fn value(&self) -> Result<f64> {
        let state = self.sub.core()?.read();
        let n = require(&state, 3)?;
        let m2 = state.sum(&Tuple::from([2]))? / n;
        let m3 = state.sum(&Tuple::from([3]))? / n;
        let g1 = m3 / m2.powf(1.5);
        Ok(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
    }

    fn clear(&self) {
        self.sub.clear();
    }
}

/// Excess kurtosis, `m4 / m2² - 3`
#[derive(Clone, Debug)]
pub struct Kurtosis {
    window: usize,
    sub: Subscription,
}

impl Kurtosis {
    /// Excess kurtosis over the last `window` values (0 for unbounded)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sub: Subscription::default(),
        }
    }
}

impl fmt::Display for Kurtosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kurtosis_{{window:{}}}", self.window)
    }
}

impl Metric for Kurtosis {
    fn config(&self) -> CoreConfig {
        univariate(4, self.window)
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
        let m2 = state.sum(&Tuple::from([2]))? / n;
        let m4 = state.sum(&Tuple::from([4]))? / n;
        Ok(m4 / (m2 * m2) - 3.0)
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

    const DATA: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    fn feed(metric: &dyn Metric, values: &[f64]) {
        for &v in values {
            metric.push(&[v]).unwrap();
        }
    }

    #[test]
    fn test_basic() {
        let mut mean = Mean::new(0);
        let mut variance = Variance::new(0);
        let mut std = Std::new(0);
        let mut moment = Moment::new(2, 0);
        let core = init_shared(&mut [&mut mean, &mut variance, &mut std, &mut moment]).unwrap();
        for v in DATA {
            core.push(&[v]).unwrap();
        }

        assert_eq!(core.count(), 8);
        assert!((mean.value().unwrap() - 5.0).abs() < 1e-12);
        // Population variance 4, sample variance 32/7
        assert!((moment.value().unwrap() - 4.0).abs() < 1e-12);
        assert!((variance.value().unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert!((std.value().unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_value() {
        let mut mean = Mean::new(0);
        mean.init().unwrap();
        mean.push(&[42.0]).unwrap();
        assert_eq!(mean.value(), Ok(42.0));

        let mut variance = Variance::new(0);
        variance.init().unwrap();
        variance.push(&[42.0]).unwrap();
        assert_eq!(
            variance.value(),
            Err(MomentError::InsufficientData { needed: 2, seen: 1 })
        );
    }

    #[test]
    fn test_empty() {
        let mut mean = Mean::new(0);
        assert_eq!(mean.value(), Err(MomentError::NotSubscribed));
        assert_eq!(mean.push(&[1.0]), Err(MomentError::NotSubscribed));

        mean.init().unwrap();
        assert_eq!(mean.value(), Err(MomentError::NoValues));
    }

    #[test]
    fn test_skewness() {
        let mut skew = Skewness::new(0);
        skew.init().unwrap();
        feed(&skew, &[1.0, 2.0]);
        assert_eq!(
            skew.value(),
            Err(MomentError::InsufficientData { needed: 3, seen: 2 })
        );

        skew.clear();
        feed(&skew, &DATA);
        // g1 = 5.25 / 4^1.5, adjusted by sqrt(n(n-1)) / (n-2)
        let expected = 5.25 / 8.0 * 56.0f64.sqrt() / 6.0;
        assert!((skew.value().unwrap() - expected).abs() < 1e-12);

        skew.clear();
        feed(&skew, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(skew.value().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_kurtosis() {
        let mut kurt = Kurtosis::new(0);
        kurt.init().unwrap();
        feed(&kurt, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        // m2 = 2, m4 = 6.8
        assert!((kurt.value().unwrap() - (6.8 / 4.0 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_windowed_variance() {
        let mut variance = Variance::new(3);
        variance.init().unwrap();
        feed(&variance, &[1000.0, -50.0, 1.0, 2.0, 3.0]);
        assert!((variance.value().unwrap() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_moment_zero_rejected() {
        let mut moment = Moment::new(0, 0);
        assert!(matches!(moment.init(), Err(MomentError::Config(_))));
    }

    #[test]
    fn test_numerical_stability() {
        let mut mean = Mean::new(0);
        let mut variance = Variance::new(0);
        let core = init_shared(&mut [&mut mean, &mut variance]).unwrap();

        let base = 1e12;
        for i in 0..1000 {
            core.push(&[base + i as f64]).unwrap();
        }

        let expected_mean = base + 499.5;
        assert!(
            (mean.value().unwrap() - expected_mean).abs() < 1.0,
            "Mean: {} expected: {}",
            mean.value().unwrap(),
            expected_mean
        );
        // Variance of 0..1000 is 1000 * 1001 / 12
        let expected_var = 1000.0 * 1001.0 / 12.0;
        assert!((variance.value().unwrap() - expected_var).abs() / expected_var < 1e-5);
    }

    #[test]
    fn test_names() {
        assert_eq!(Mean::new(0).name(), "mean_{window:0}");
        assert_eq!(Std::new(5).to_string(), "std_{window:5}");
        assert_eq!(Moment::new(3, 10).name(), "moment_{k:3,window:10}");
        assert_ne!(Variance::new(1).name(), Variance::new(2).name());
    }
}

//! Core trait for statistics backed by a moment engine
//!
//! Every statistic implements [`Metric`]: it declares the engine
//! configuration it needs, gets bound to a [`Core`], forwards samples to it
//! and computes its value from the sums the engine keeps.
//!
//! A statistic used alone builds its own engine with [`Metric::init`].
//! Several statistics can share one engine through [`init_shared`], which
//! merges their configurations; samples are then pushed once, through any
//! one of them or through the returned engine.

use core::fmt::{Debug, Display};
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::joint::{Core, CoreConfig};

/// A statistic computed from a shared moment engine
pub trait Metric: Display + Debug + Send + Sync {
    /// Tuples, window and decay this statistic reads
    fn config(&self) -> CoreConfig;

    /// Bind to an engine built from a configuration covering [`config`](Self::config)
    fn subscribe(&mut self, core: Arc<Core>);

    /// Forward one sample to the engine
    fn push(&self, values: &[f64]) -> Result<()>;

    /// Current value of the statistic
    fn value(&self) -> Result<f64>;

    /// Reset the engine and any auxiliary state
    fn clear(&self);

    /// Parameter-qualified identifier, stable across runs
    ///
    /// Distinguishes instances of the same statistic with different
    /// parameters, e.g. `covariance_{window:10}`.
    fn name(&self) -> String {
        self.to_string()
    }

    /// Build a private engine from this statistic's configuration and subscribe to it
    fn init(&mut self) -> Result<Arc<Core>> {
        let core = Arc::new(Core::new(self.config())?);
        self.subscribe(Arc::clone(&core));
        Ok(core)
    }
}

/// Build one engine for several statistics and subscribe each of them
///
/// # Example
///
/// ```
/// use flowmoments::statistics::{Correlation, Covariance};
/// use flowmoments::traits::{init_shared, Metric};
///
/// let mut cov = Covariance::new(0);
/// let mut corr = Correlation::new(0);
/// let core = init_shared(&mut [&mut cov, &mut corr]).unwrap();
///
/// for (x, y) in [(1.0, 2.0), (2.0, 3.0), (4.0, 9.0)] {
///     core.push(&[x, y]).unwrap();
/// }
/// assert!(cov.value().unwrap() > 0.0);
/// assert!(corr.value().unwrap() <= 1.0);
/// ```
pub fn init_shared(metrics: &mut [&mut dyn Metric]) -> Result<Arc<Core>> {
    if metrics.is_empty() {
        return Err(ConfigError::NothingToMerge.into());
    }
    let configs: Vec<CoreConfig> = metrics.iter().map(|m| m.config()).collect();
    let core = Arc::new(Core::new(CoreConfig::merge(&configs)?)?);
    for metric in metrics.iter_mut() {
        metric.subscribe(Arc::clone(&core));
    }
    Ok(core)
}

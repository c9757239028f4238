//! Statistics over streaming data
//!
//! Each statistic is a thin read-only view over the sums kept by a
//! [`Core`](crate::joint::Core). Univariate statistics use a one-variable
//! engine; joint ones use a two-variable engine.
//!
//! # Example
//!
//! ```
//! use flowmoments::statistics::Variance;
//! use flowmoments::traits::Metric;
//!
//! let mut variance = Variance::new(4);
//! variance.init().unwrap();
//!
//! for value in [100.0, 1.0, 2.0, 3.0, 4.0] {
//!     variance.push(&[value]).unwrap();
//! }
//!
//! // Only the last four values remain in the window
//! assert!((variance.value().unwrap() - 5.0 / 3.0).abs() < 1e-12);
//! ```

mod autocorrelation;
mod covariance;
mod moments;

use std::sync::Arc;

pub use autocorrelation::{Autocorrelation, Autocovariance};
pub use covariance::{Correlation, Covariance};
pub use moments::{Kurtosis, Mean, Moment, Skewness, Std, Variance};

use crate::error::{MomentError, Result};
use crate::joint::{Core, CoreState};

/// Engine binding shared by every statistic
#[derive(Clone, Debug, Default)]
pub(crate) struct Subscription(Option<Arc<Core>>);

impl Subscription {
    pub(crate) fn set(&mut self, core: Arc<Core>) {
        self.0 = Some(core);
    }

    pub(crate) fn core(&self) -> Result<&Core> {
        self.0.as_deref().ok_or(MomentError::NotSubscribed)
    }

    pub(crate) fn clear(&self) {
        if let Some(core) = &self.0 {
            core.clear();
        }
    }
}

/// Retained sample count, failing when fewer than `needed` are retained
pub(crate) fn require(state: &CoreState, needed: u64) -> Result<f64> {
    match state.count() {
        0 => Err(MomentError::NoValues),
        seen if seen < needed => Err(MomentError::InsufficientData { needed, seen }),
        seen => Ok(seen as f64),
    }
}

/// Correlation of the two engine variables
pub(crate) fn correlation(state: &CoreState) -> Result<f64> {
    use crate::joint::Tuple;

    require(state, 2)?;
    let sxy = state.sum(&Tuple::from([1, 1]))?;
    let sxx = state.sum(&Tuple::from([2, 0]))?;
    let syy = state.sum(&Tuple::from([0, 2]))?;
    Ok(sxy / (sxx * syy).sqrt())
}

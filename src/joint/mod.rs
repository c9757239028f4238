//! Multivariate online centralized moments
//!
//! The [`Core`] engine tracks joint centralized power sums over several
//! simultaneously observed variables, either over the whole stream or over a
//! sliding window of the most recent samples. Covariance, correlation and the
//! other joint statistics are read-only views over these sums.
//!
//! # Example
//!
//! ```
//! use flowmoments::joint::{Core, CoreConfig, Tuple};
//!
//! // Track everything needed for correlation over the last 100 samples
//! let config = CoreConfig::new([[1, 1], [2, 0], [0, 2]]).with_window(100);
//! let core = Core::new(config).unwrap();
//!
//! for i in 0..500 {
//!     let x = i as f64;
//!     core.push(&[x, 3.0 * x + 1.0]).unwrap();
//! }
//!
//! let sxy = core.sum(&Tuple::from([1, 1])).unwrap();
//! let sxx = core.sum(&Tuple::from([2, 0])).unwrap();
//! let syy = core.sum(&Tuple::from([0, 2])).unwrap();
//! assert!((sxy / (sxx * syy).sqrt() - 1.0).abs() < 1e-9);
//! ```

mod config;
mod engine;
mod queue;
mod tuple;

pub use self::config::CoreConfig;
pub use self::engine::{Core, CoreState};
pub use self::queue::RingQueue;
pub use self::tuple::{Closure, Order, Tuple};

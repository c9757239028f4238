//! # Flowmoments
//!
//! Exact streaming moments for Rust.
//!
//! Flowmoments maintains running or windowed statistical aggregates over an
//! unbounded stream of numeric observations without keeping the stream
//! around: means, joint centralized power sums, covariance, correlation,
//! autocorrelation, skewness and kurtosis. Results are exact up to
//! floating-point error.
//!
//! ## Features
//!
//! - **Joint moment engine**: [`Core`](joint::Core) tracks any set of joint
//!   centralized sums over several variables with a numerically stable recurrence
//! - **Sliding windows**: the oldest observation is un-applied exactly when
//!   the window is full
//! - **Shared state**: statistics with compatible requirements share one
//!   engine, fed once per sample
//! - **Thread-safe**: one reader/writer lock per engine, with guard-level
//!   access for compound updates
//!
//! ## Quick Start
//!
//! ```rust
//! use flowmoments::prelude::*;
//!
//! // Covariance over the last 3 pairs
//! let mut cov = Covariance::new(3);
//! cov.init().unwrap();
//! for (x, y) in [(1.0, 1.0), (2.0, 4.0), (3.0, 9.0), (4.0, 16.0), (8.0, 64.0)] {
//!     cov.push(&[x, y]).unwrap();
//! }
//! assert!((cov.value().unwrap() - 79.0).abs() < 1e-9);
//! ```
//!
//! ## Using the engine directly
//!
//! ```rust
//! use flowmoments::joint::{Core, CoreConfig, Tuple};
//!
//! let core = Core::new(CoreConfig::new([[2, 2]]).with_window(3)).unwrap();
//! for (x, y) in [(1.0, 1.0), (2.0, 4.0), (3.0, 9.0), (4.0, 16.0), (8.0, 64.0)] {
//!     core.push(&[x, y]).unwrap();
//! }
//! let s22 = core.sum(&Tuple::from([2, 2])).unwrap();
//! assert!((s22 - 112538.0 / 9.0).abs() < 1e-6);
//! ```
//!
//! ## Feature Flags
//!
//! - `statistics` (default): statistic adapters built on the engine
//! - `serde`: serialization of [`Tuple`](joint::Tuple) and
//!   [`CoreConfig`](joint::CoreConfig)
//! - `full`: Enable everything

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod joint;
pub mod math;
pub mod traits;

#[cfg(feature = "statistics")]
#[cfg_attr(docsrs, doc(cfg(feature = "statistics")))]
pub mod statistics;

pub mod prelude {
    pub use crate::error::{MomentError, Result};
    pub use crate::joint::{Core, CoreConfig, Tuple};
    pub use crate::traits::*;

    #[cfg(feature = "statistics")]
    pub use crate::statistics::{
        Autocorrelation, Autocovariance, Correlation, Covariance, Kurtosis, Mean, Moment,
        Skewness, Std, Variance,
    };
}

pub use error::{MomentError, Result};
pub use joint::{Core, CoreConfig, Tuple};

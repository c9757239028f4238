//! Engine configuration: validation and merging
//!
//! Each statistic declares the tuples it reads, the window it runs over, and
//! optionally a decay factor. Statistics that share one [`Core`](super::Core)
//! have their configurations merged into a single one first.

use crate::error::ConfigError;
use crate::joint::Tuple;

/// What a [`Core`](super::Core) tracks
///
/// # Example
///
/// ```
/// use flowmoments::joint::CoreConfig;
///
/// let config = CoreConfig::new([[2, 2]]).with_window(3).validate().unwrap();
/// assert_eq!(config.dim, Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Highest tuples to track; their downward closures are tracked too
    pub tuples: Vec<Tuple>,
    /// Number of most recent samples retained, 0 for unbounded
    pub window: usize,
    /// Exponential decay factor in (0, 1); exclusive with a bounded window
    pub decay: Option<f64>,
    /// Number of variables; inferred from the tuples when unset
    pub dim: Option<usize>,
}

impl CoreConfig {
    /// Most recurrence terms a single tracked tuple may need
    ///
    /// Tracking `a` keeps one term per pair `b ≤ c ≤ a`, so the count grows
    /// with the square of the closure size.
    pub const MAX_UPDATE_TERMS: u128 = 1 << 20;

    /// Unbounded configuration tracking `tuples`
    pub fn new<I, T>(tuples: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tuple>,
    {
        Self {
            tuples: tuples.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Retain only the most recent `window` samples
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set an exponential decay factor
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = Some(decay);
        self
    }

    /// Fix the variable count instead of inferring it
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }

    /// Check the configuration and return it with `dim` filled in
    pub fn validate(&self) -> Result<CoreConfig, ConfigError> {
        let first = self.tuples.first().ok_or(ConfigError::NoTuples)?;
        let dim = self.dim.unwrap_or(first.len());

        for tuple in &self.tuples {
            if tuple.is_empty() {
                return Err(ConfigError::EmptyTuple);
            }
            if tuple.len() != dim {
                return Err(ConfigError::TupleLength {
                    tuple: tuple.clone(),
                    expected: dim,
                    found: tuple.len(),
                });
            }
            if tuple.is_zero() {
                return Err(ConfigError::ZeroTuple(tuple.clone()));
            }
            let terms = update_terms(tuple);
            if terms > Self::MAX_UPDATE_TERMS {
                return Err(ConfigError::ClosureTooLarge {
                    tuple: tuple.clone(),
                    terms,
                    limit: Self::MAX_UPDATE_TERMS,
                });
            }
        }

        if let Some(decay) = self.decay {
            // Also rejects NaN
            if !(decay > 0.0 && decay < 1.0) {
                return Err(ConfigError::DecayOutOfRange(decay));
            }
            if self.window != 0 {
                return Err(ConfigError::DecayWithWindow {
                    window: self.window,
                });
            }
        }

        Ok(CoreConfig {
            tuples: self.tuples.clone(),
            window: self.window,
            decay: self.decay,
            dim: Some(dim),
        })
    }

    /// Combine the configurations of statistics that will share one engine
    ///
    /// Tuple sets are unioned and any tuple dominated by another is dropped,
    /// since its closure is already tracked. Window, variable count and decay
    /// must agree exactly.
    pub fn merge(configs: &[CoreConfig]) -> Result<CoreConfig, ConfigError> {
        let (first, rest) = configs.split_first().ok_or(ConfigError::NothingToMerge)?;
        let base = first.validate()?;
        let mut tuples = base.tuples.clone();

        for config in rest {
            let config = config.validate()?;
            if config.window != base.window {
                return Err(incompatible("window", base.window, config.window));
            }
            if config.dim != base.dim {
                return Err(incompatible("dim", base.dim, config.dim));
            }
            if config.decay != base.decay {
                return Err(incompatible("decay", base.decay, config.decay));
            }
            tuples.extend(config.tuples);
        }

        Ok(CoreConfig {
            tuples: prune_dominated(tuples),
            ..base
        })
    }
}

fn incompatible<T: core::fmt::Debug>(field: &'static str, left: T, right: T) -> ConfigError {
    ConfigError::Incompatible {
        field,
        left: format!("{:?}", left),
        right: format!("{:?}", right),
    }
}

/// Π (aᵢ + 1)(aᵢ + 2) / 2, saturating
fn update_terms(tuple: &Tuple) -> u128 {
    tuple.components().iter().fold(1u128, |acc, &c| {
        let c = u128::from(c);
        acc.saturating_mul((c + 1) * (c + 2) / 2)
    })
}

/// Sorted, deduplicated tuples none of which is below another
fn prune_dominated(mut tuples: Vec<Tuple>) -> Vec<Tuple> {
    tuples.sort();
    tuples.dedup();
    tuples
        .iter()
        .filter(|t| !tuples.iter().any(|u| u != *t && u.dominates(t)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_infers_dim() {
        let config = CoreConfig::new([[1, 1], [2, 0]]).validate().unwrap();
        assert_eq!(config.dim, Some(2));
        assert_eq!(config.window, 0);
        assert_eq!(config.decay, None);
    }

    #[test]
    fn test_validate_rejects_bad_tuples() {
        assert_eq!(
            CoreConfig::new(Vec::<Tuple>::new()).validate(),
            Err(ConfigError::NoTuples)
        );
        assert_eq!(
            CoreConfig::new([Tuple::default()]).validate(),
            Err(ConfigError::EmptyTuple)
        );
        assert_eq!(
            CoreConfig::new([[0, 0]]).validate(),
            Err(ConfigError::ZeroTuple(Tuple::from([0, 0])))
        );
        assert!(matches!(
            CoreConfig::new([[1, 1]]).with_dim(3).validate(),
            Err(ConfigError::TupleLength {
                expected: 3,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            CoreConfig::new(vec![vec![1, 1], vec![2]]).validate(),
            Err(ConfigError::TupleLength { .. })
        ));
    }

    #[test]
    fn test_validate_decay() {
        assert!(CoreConfig::new([[2]]).with_decay(0.3).validate().is_ok());
        for bad in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                CoreConfig::new([[2]]).with_decay(bad).validate(),
                Err(ConfigError::DecayOutOfRange(_))
            ));
        }
        assert_eq!(
            CoreConfig::new([[2]]).with_decay(0.5).with_window(4).validate(),
            Err(ConfigError::DecayWithWindow { window: 4 })
        );
    }

    #[test]
    fn test_validate_bounds_closure() {
        assert_eq!(update_terms(&Tuple::from([1, 2])), 3 * 6);
        assert!(CoreConfig::new([[4, 4, 4]]).validate().is_ok());

        let err = CoreConfig::new([[100_000, 100_000]]).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ClosureTooLarge {
                tuple: Tuple::from([100_000, 100_000]),
                terms: 5_000_150_001u128 * 5_000_150_001,
                limit: CoreConfig::MAX_UPDATE_TERMS,
            }
        );

        // Saturates instead of overflowing
        let huge = Tuple::from(vec![u32::MAX; 8]);
        assert!(matches!(
            CoreConfig::new([huge]).validate(),
            Err(ConfigError::ClosureTooLarge { terms: u128::MAX, .. })
        ));
    }

    #[test]
    fn test_merge_drops_dominated() {
        let merged = CoreConfig::merge(&[
            CoreConfig::new([[1, 1]]).with_window(5),
            CoreConfig::new([[2, 0], [0, 2]]).with_window(5),
            CoreConfig::new([[2, 2], [1, 1]]).with_window(5),
            CoreConfig::new([[3, 0]]).with_window(5),
        ])
        .unwrap();

        assert_eq!(merged.tuples, vec![Tuple::from([2, 2]), Tuple::from([3, 0])]);
        assert_eq!(merged.window, 5);
        assert_eq!(merged.dim, Some(2));
    }

    #[test]
    fn test_merge_requires_agreement() {
        let err = CoreConfig::merge(&[
            CoreConfig::new([[1, 1]]).with_window(5),
            CoreConfig::new([[1, 1]]).with_window(6),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Incompatible { field: "window", .. }));

        let err = CoreConfig::merge(&[CoreConfig::new([[1, 1]]), CoreConfig::new([[1, 1, 1]])])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Incompatible { field: "dim", .. }));

        let err = CoreConfig::merge(&[
            CoreConfig::new([[2]]).with_decay(0.1),
            CoreConfig::new([[3]]).with_decay(0.2),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Incompatible { field: "decay", .. }));

        assert_eq!(CoreConfig::merge(&[]), Err(ConfigError::NothingToMerge));
    }

    #[test]
    fn test_merge_propagates_validation() {
        let err = CoreConfig::merge(&[CoreConfig::new([[1]]), CoreConfig::new([[0]])]).unwrap_err();
        assert_eq!(err, ConfigError::ZeroTuple(Tuple::from([0])));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let config = CoreConfig::new([[2, 1]]).with_window(8);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"tuples":[[2,1]],"window":8,"decay":null,"dim":null}"#);

        let parsed: CoreConfig = serde_json::from_str(r#"{"tuples":[[1,1]]}"#).unwrap();
        assert_eq!(parsed, CoreConfig::new([[1, 1]]));
    }
}

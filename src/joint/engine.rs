//! Online joint centralized-moment engine
//!
//! Maintains, for every tuple in the downward closure of the configured
//! tuples, the unnormalized joint sum `Σ Π (xᵢ - x̄ᵢ)^tᵢ` over the retained
//! samples. New samples are folded in with a numerically stable recurrence;
//! when a window is configured the oldest sample is first unfolded by the
//! inverse recurrence.

use std::collections::{BTreeSet, HashMap};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use crate::error::{MomentError, QueueError, Result};
use crate::joint::{CoreConfig, Order, RingQueue, Tuple};
use crate::math::{parity_sign, powu};

/// Shared moment engine
///
/// Every entry point takes the internal reader/writer lock for the duration
/// of the call. Callers that must combine several engine calls with their own
/// state atomically hold the guard from [`read`](Self::read) or
/// [`write`](Self::write) and call the [`CoreState`] methods directly.
///
/// # Example
///
/// ```
/// use flowmoments::joint::{Core, CoreConfig, Tuple};
///
/// let core = Core::new(CoreConfig::new([[1, 1]])).unwrap();
/// for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)] {
///     core.push(&[x, y]).unwrap();
/// }
///
/// let cov = core.sum(&Tuple::from([1, 1])).unwrap() / (core.count() - 1) as f64;
/// assert!((cov - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Core {
    config: CoreConfig,
    state: RwLock<CoreState>,
}

impl Core {
    /// Validate `config` and allocate the tracked sums
    pub fn new(config: CoreConfig) -> Result<Self> {
        let config = config.validate()?;
        let state = CoreState::new(&config)?;
        debug!(
            dim = state.dim(),
            window = config.window,
            tracked = state.keys.len(),
            "moment core created"
        );
        Ok(Self {
            config,
            state: RwLock::new(state),
        })
    }

    /// Validated configuration this engine was built from
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Window length, 0 when unbounded
    pub fn window(&self) -> usize {
        self.config.window
    }

    /// Configured decay factor, if any
    pub fn decay(&self) -> Option<f64> {
        self.config.decay
    }

    /// Number of variables per sample
    pub fn dim(&self) -> usize {
        self.config.dim.unwrap_or_default()
    }

    /// Acquire shared access for a sequence of reads
    pub fn read(&self) -> RwLockReadGuard<'_, CoreState> {
        self.state.read()
    }

    /// Acquire exclusive access for a compound update
    pub fn write(&self) -> RwLockWriteGuard<'_, CoreState> {
        self.state.write()
    }

    /// Add one sample, evicting the oldest when the window is full
    pub fn push(&self, values: &[f64]) -> Result<()> {
        self.state.write().push(values)
    }

    /// Reset to the just-constructed state, keeping the configuration
    pub fn clear(&self) {
        self.state.write().clear();
    }

    /// Invalidate the eviction queue; windowed pushes fail afterwards
    pub fn invalidate_window(&self) {
        self.state.write().invalidate_window();
    }

    /// Number of samples currently contributing
    pub fn count(&self) -> u64 {
        self.state.read().count()
    }

    /// Running mean of variable `index`
    pub fn mean(&self, index: usize) -> Result<f64> {
        self.state.read().mean(index)
    }

    /// Running means of every variable
    pub fn means(&self) -> Result<Vec<f64>> {
        self.state.read().means().map(<[f64]>::to_vec)
    }

    /// Centralized joint sum for a tracked tuple
    pub fn sum(&self, tuple: &Tuple) -> Result<f64> {
        self.state.read().sum(tuple)
    }

    /// Every tracked tuple, sorted ascending
    pub fn tracked(&self) -> Vec<Tuple> {
        self.state.read().tracked().to_vec()
    }
}

/// One sub-tuple contribution to a tracked sum
#[derive(Clone, Debug)]
struct Term {
    /// Sub-tuple `b`, strictly between zero and the tracked tuple
    exponent: Tuple,
    order: u32,
    multinomial: f64,
    /// Index of the complement `a - b`
    rest: usize,
}

/// Recurrence for one tracked tuple `a`
#[derive(Clone, Debug)]
struct Plan {
    tuple: Tuple,
    order: u32,
    /// Proper nonzero sub-tuples in descending closure order
    terms: Vec<Term>,
}

/// Engine state behind the lock
///
/// The methods here assume the caller already holds the appropriate guard
/// from [`Core::read`] or [`Core::write`].
#[derive(Debug)]
pub struct CoreState {
    count: u64,
    means: Vec<f64>,
    /// Tracked closure, sorted ascending; position is the storage index
    keys: Vec<Tuple>,
    index: HashMap<Tuple, usize>,
    plans: Vec<Plan>,
    sums: Vec<f64>,
    /// Working copy built during an update, then committed to `sums`
    new_sums: Vec<f64>,
    deltas: Vec<f64>,
    queue: RingQueue<Vec<f64>>,
    window: usize,
}

impl CoreState {
    fn new(config: &CoreConfig) -> Result<Self> {
        // Set by validate
        let dim = config.dim.unwrap_or_default();

        let keys: Vec<Tuple> = config
            .tuples
            .iter()
            .flat_map(|t| t.closure(Order::Ascending))
            .filter(|t| !t.is_zero())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<Tuple, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut plans = Vec::with_capacity(keys.len());
        for tuple in &keys {
            let mut terms = Vec::new();
            for sub in tuple.closure(Order::Descending) {
                if sub.is_zero() || &sub == tuple {
                    continue;
                }
                let rest = tuple.checked_sub(&sub)?;
                let rest = index
                    .get(&rest)
                    .copied()
                    .ok_or(MomentError::UntrackedTuple(rest))?;
                terms.push(Term {
                    order: sub.order(),
                    multinomial: tuple.multinomial(&sub)?,
                    exponent: sub,
                    rest,
                });
            }
            plans.push(Plan {
                tuple: tuple.clone(),
                order: tuple.order(),
                terms,
            });
        }

        Ok(Self {
            count: 0,
            means: vec![0.0; dim],
            sums: vec![0.0; keys.len()],
            new_sums: vec![0.0; keys.len()],
            deltas: vec![0.0; dim],
            keys,
            index,
            plans,
            queue: RingQueue::with_capacity(config.window),
            window: config.window,
        })
    }

    /// Number of variables per sample
    pub fn dim(&self) -> usize {
        self.means.len()
    }

    /// Number of samples currently contributing
    pub fn count(&self) -> u64 {
        self.count
    }

    /// True until the first sample arrives, and again after a clear
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Window length, 0 when unbounded
    pub fn window(&self) -> usize {
        self.window
    }

    /// Tracked closure, sorted ascending
    pub fn tracked(&self) -> &[Tuple] {
        &self.keys
    }

    /// Retained samples from oldest to newest; empty when unbounded
    pub fn retained(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.queue.iter().map(Vec::as_slice)
    }

    /// Running mean of variable `index`
    pub fn mean(&self, index: usize) -> Result<f64> {
        let mean = self
            .means
            .get(index)
            .copied()
            .ok_or(MomentError::VariableOutOfRange {
                index,
                dim: self.dim(),
            })?;
        if self.count == 0 {
            return Err(MomentError::NoValues);
        }
        Ok(mean)
    }

    /// Running means of every variable
    pub fn means(&self) -> Result<&[f64]> {
        if self.count == 0 {
            return Err(MomentError::NoValues);
        }
        Ok(&self.means)
    }

    /// Centralized joint sum for a tracked tuple
    pub fn sum(&self, tuple: &Tuple) -> Result<f64> {
        if self.count == 0 {
            return Err(MomentError::NoValues);
        }
        self.index
            .get(tuple)
            .map(|&i| self.sums[i])
            .ok_or_else(|| MomentError::UntrackedTuple(tuple.clone()))
    }

    /// Add one sample, evicting the oldest when the window is full
    pub fn push(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.dim() {
            return Err(MomentError::Dimension {
                expected: self.dim(),
                found: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(MomentError::NonFinite {
                index,
                value: values[index],
            });
        }

        if self.window > 0 {
            if self.queue.is_full() {
                let evicted = self
                    .queue
                    .pop()
                    .map_err(|source| window_failure("pop", source))?;
                trace!(count = self.count, "evicting oldest sample");
                self.remove(&evicted)?;
            }
            self.queue
                .push(values.to_vec())
                .map_err(|source| window_failure("push", source))?;
        }

        self.add(values)
    }

    /// Zero every mean and sum and empty the window
    pub fn clear(&mut self) {
        self.count = 0;
        self.means.fill(0.0);
        self.sums.fill(0.0);
        self.new_sums.fill(0.0);
        self.queue.reset();
        debug!(window = self.window, "moment core cleared");
    }

    /// Close the eviction queue so later windowed pushes fail
    pub fn invalidate_window(&mut self) {
        self.queue.close();
    }

    fn add(&mut self, x: &[f64]) -> Result<()> {
        self.count += 1;
        let n = self.count as f64;

        for ((mean, delta), &xi) in self.means.iter_mut().zip(&mut self.deltas).zip(x) {
            *delta = xi - *mean;
            *mean += *delta / n;
        }

        // Reads only the committed sums, so term order is irrelevant.
        for (i, plan) in self.plans.iter().enumerate() {
            let p = plan.order;
            let coeff = (n - 1.0) / powu(n, p) * (powu(n - 1.0, p - 1) + parity_sign(p));
            let mut acc = self.sums[i] + coeff * plan.tuple.pow(&self.deltas)?;
            for term in &plan.terms {
                acc += term.multinomial * parity_sign(term.order) / powu(n, term.order)
                    * term.exponent.pow(&self.deltas)?
                    * self.sums[term.rest];
            }
            self.new_sums[i] = acc;
        }

        self.sums.copy_from_slice(&self.new_sums);
        Ok(())
    }

    fn remove(&mut self, x: &[f64]) -> Result<()> {
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.means.fill(0.0);
            self.sums.fill(0.0);
            self.new_sums.fill(0.0);
            return Ok(());
        }

        let n = self.count as f64;
        let n1 = n + 1.0;

        // Delta against the post-removal mean
        for ((mean, delta), &xi) in self.means.iter_mut().zip(&mut self.deltas).zip(x) {
            *mean -= (xi - *mean) / n;
            *delta = xi - *mean;
        }

        // Ascending: every complement a - b precedes a and is already final
        // in new_sums.
        for (i, plan) in self.plans.iter().enumerate() {
            let p = plan.order;
            let coeff = n / powu(n1, p) * (powu(n, p - 1) + parity_sign(p));
            let mut acc = self.sums[i] - coeff * plan.tuple.pow(&self.deltas)?;
            for term in plan.terms.iter().rev() {
                acc -= term.multinomial * parity_sign(term.order) / powu(n1, term.order)
                    * term.exponent.pow(&self.deltas)?
                    * self.new_sums[term.rest];
            }
            self.new_sums[i] = acc;
        }

        self.sums.copy_from_slice(&self.new_sums);
        Ok(())
    }
}

fn window_failure(op: &'static str, source: QueueError) -> MomentError {
    warn!(op, error = %source, "window queue rejected operation");
    MomentError::Window { op, source }
}

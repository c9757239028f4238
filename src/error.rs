//! Error types for the moment engine and its adapters
//!
//! Every failure is reported through [`MomentError`]. Configuration, tuple
//! algebra and eviction-queue failures have their own enums so callers can
//! match on the precise cause.

use thiserror::Error;

use crate::joint::Tuple;

/// Crate result alias
pub type Result<T, E = MomentError> = std::result::Result<T, E>;

/// Failure of a multi-index operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleError {
    /// Operands have different numbers of components
    #[error("tuple length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    /// Componentwise difference would go negative
    #[error("tuple difference underflows at component {index}")]
    Underflow { index: usize },
}

/// Invalid or incompatible engine configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tracked tuple has no components at all
    #[error("tracked tuple is empty")]
    EmptyTuple,
    /// A tracked tuple is all zeros and carries no information
    #[error("tracked tuple {0} has no positive component")]
    ZeroTuple(Tuple),
    /// A tracked tuple does not match the variable count
    #[error("tracked tuple {tuple} has {found} components, expected {expected}")]
    TupleLength {
        tuple: Tuple,
        expected: usize,
        found: usize,
    },
    /// No tuples were configured
    #[error("configuration tracks no tuples")]
    NoTuples,
    /// Decay factor outside the open interval (0, 1)
    #[error("decay {0} must lie strictly between 0 and 1")]
    DecayOutOfRange(f64),
    /// Decay and a bounded window were both requested
    #[error("decay cannot be combined with window {window}")]
    DecayWithWindow { window: usize },
    /// Merged configurations disagree on a scalar parameter
    #[error("cannot merge configurations: {field} differs ({left} vs {right})")]
    Incompatible {
        field: &'static str,
        left: String,
        right: String,
    },
    /// A tracked tuple needs more recurrence terms than an engine will allocate
    #[error("tracked tuple {tuple} needs {terms} update terms, limit is {limit}")]
    ClosureTooLarge {
        tuple: Tuple,
        terms: u128,
        limit: u128,
    },
    /// Merge was asked to combine zero configurations
    #[error("no configurations to merge")]
    NothingToMerge,
}

/// Failure of the fixed-capacity eviction queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue has been invalidated and accepts no further operations
    #[error("queue is closed")]
    Closed,
    /// Put on a queue already holding `capacity` items
    #[error("queue is full (capacity {capacity})")]
    Full { capacity: usize },
    /// Get on an empty queue
    #[error("queue is empty")]
    Empty,
}

/// Any error produced by the engine or an adapter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MomentError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tuple(#[from] TupleError),
    /// Pushed sample has the wrong number of values
    #[error("expected {expected} values per sample, got {found}")]
    Dimension { expected: usize, found: usize },
    /// Pushed sample contains NaN or an infinity
    #[error("value {value} at index {index} is not finite")]
    NonFinite { index: usize, value: f64 },
    /// Mean or sum queried before any observation
    #[error("no values seen yet")]
    NoValues,
    /// Sum queried for a tuple outside the tracked closure
    #[error("tuple {0} is not tracked")]
    UntrackedTuple(Tuple),
    /// Mean queried for a variable the engine does not have
    #[error("variable {index} out of range for {dim} variables")]
    VariableOutOfRange { index: usize, dim: usize },
    /// A statistic needs more observations than are currently retained
    #[error("need at least {needed} values, have {seen}")]
    InsufficientData { needed: u64, seen: u64 },
    /// Adapter used before being bound to an engine
    #[error("metric is not subscribed to an engine")]
    NotSubscribed,
    /// The eviction queue rejected an operation during a push
    #[error("window queue {op} failed: {source}")]
    Window {
        op: &'static str,
        #[source]
        source: QueueError,
    },
}

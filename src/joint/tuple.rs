//! Multi-index algebra
//!
//! A [`Tuple`] is a vector of non-negative exponents, one per tracked
//! variable. Component `i` is the power applied to the centered value of
//! variable `i`, so `(2, 1)` names the joint sum `Σ (x - x̄)² (y - ȳ)`.

use core::fmt;
use core::iter::FusedIterator;

use crate::error::TupleError;
use crate::math;

/// Exponent multi-index identifying one centralized joint sum
///
/// Ordering is lexicographic over the components. Whenever `b` is
/// componentwise `<=` `a` and differs from it, `b < a`, so iterating tracked
/// tuples in ascending order visits every sub-tuple before its supersets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tuple(Vec<u32>);

/// Traversal direction of a [`Closure`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// From the all-zero tuple up to the bounding tuple
    Ascending,
    /// From the bounding tuple down to the all-zero tuple
    Descending,
}

impl Tuple {
    /// Create a tuple from its components
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// All-zero tuple of the given length
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the tuple has no components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Components as a slice
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Overall order of the centralized term (sum of components)
    pub fn order(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Check if every component is zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Positional base-31 encoding of the components
    ///
    /// Only collision-free while every component is below 31, so `None` is
    /// returned otherwise (or on overflow). Storage never relies on it.
    pub fn positional_key(&self) -> Option<u64> {
        self.0.iter().try_fold(0u64, |acc, &c| {
            if c >= 31 {
                return None;
            }
            acc.checked_mul(31)?.checked_add(u64::from(c))
        })
    }

    /// Componentwise difference `self - other`
    pub fn checked_sub(&self, other: &Tuple) -> Result<Tuple, TupleError> {
        self.same_len(other)?;
        self.0
            .iter()
            .zip(&other.0)
            .enumerate()
            .map(|(index, (&m, &n))| m.checked_sub(n).ok_or(TupleError::Underflow { index }))
            .collect::<Result<Vec<_>, _>>()
            .map(Tuple)
    }

    /// Multinomial coefficient `Π C(selfᵢ, otherᵢ)`
    pub fn multinomial(&self, other: &Tuple) -> Result<f64, TupleError> {
        self.same_len(other)?;
        Ok(self
            .0
            .iter()
            .zip(&other.0)
            .map(|(&m, &n)| math::binomial(m, n))
            .product())
    }

    /// Vector power `Π xᵢ^selfᵢ`
    pub fn pow(&self, x: &[f64]) -> Result<f64, TupleError> {
        if x.len() != self.len() {
            return Err(TupleError::LengthMismatch {
                left: self.len(),
                right: x.len(),
            });
        }
        Ok(x.iter()
            .zip(&self.0)
            .map(|(&v, &e)| math::powu(v, e))
            .product())
    }

    /// Check if `other` is componentwise `<=` this tuple
    ///
    /// Tuples of different lengths never dominate each other.
    pub fn dominates(&self, other: &Tuple) -> bool {
        self.len() == other.len() && self.0.iter().zip(&other.0).all(|(&m, &n)| n <= m)
    }

    /// Every tuple componentwise `<=` this one, the zero tuple and `self` included
    ///
    /// The last component varies fastest, so [`Order::Ascending`] yields the
    /// closure in sorted order.
    pub fn closure(&self, order: Order) -> Closure {
        Closure::new(self.0.clone(), order)
    }

    fn same_len(&self, other: &Tuple) -> Result<(), TupleError> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(TupleError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            })
        }
    }
}

impl From<Vec<u32>> for Tuple {
    fn from(components: Vec<u32>) -> Self {
        Self(components)
    }
}

impl From<&[u32]> for Tuple {
    fn from(components: &[u32]) -> Self {
        Self(components.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for Tuple {
    fn from(components: [u32; N]) -> Self {
        Self(components.to_vec())
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str(")")
    }
}

/// Odometer over the downward closure of a tuple
///
/// Produced by [`Tuple::closure`].
#[derive(Clone, Debug)]
pub struct Closure {
    bounds: Vec<u32>,
    current: Vec<u32>,
    order: Order,
    remaining: usize,
}

impl Closure {
    fn new(bounds: Vec<u32>, order: Order) -> Self {
        let remaining = bounds
            .iter()
            .fold(1usize, |acc, &b| acc.saturating_mul(b as usize + 1));
        let current = match order {
            Order::Ascending => vec![0; bounds.len()],
            Order::Descending => bounds.clone(),
        };
        Self {
            bounds,
            current,
            order,
            remaining,
        }
    }

    fn advance(&mut self) {
        match self.order {
            Order::Ascending => {
                for i in (0..self.current.len()).rev() {
                    if self.current[i] < self.bounds[i] {
                        self.current[i] += 1;
                        return;
                    }
                    self.current[i] = 0;
                }
            }
            Order::Descending => {
                for i in (0..self.current.len()).rev() {
                    if self.current[i] > 0 {
                        self.current[i] -= 1;
                        return;
                    }
                    self.current[i] = self.bounds[i];
                }
            }
        }
    }
}

impl Iterator for Closure {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let out = Tuple(self.current.clone());
        if self.remaining > 0 {
            self.advance();
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Closure {}

impl FusedIterator for Closure {}

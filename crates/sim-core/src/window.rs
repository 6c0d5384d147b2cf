//! Bounded, oldest-evicted histories.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A fixed-capacity history holding at most `N` entries.
///
/// Pushing into a full window evicts the oldest entry. The bound is part of
/// the type, so a `RollingWindow<f64, 3>` can never be observed with four
/// entries, including after deserialization (oversized input is rejected).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<T>", try_from = "Vec<T>")]
pub struct RollingWindow<T: Clone, const N: usize> {
    items: VecDeque<T>,
}

impl<T: Clone, const N: usize> RollingWindow<T, N> {
    /// Empty window.
    pub fn new() -> Self {
        Self {
            items: VecDeque::with_capacity(N),
        }
    }

    /// Maximum number of retained entries.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append `value`, returning the evicted oldest entry when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if N == 0 {
            return Some(value);
        }
        let evicted = if self.items.len() == N {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recently pushed entry.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<const N: usize> RollingWindow<f64, N> {
    /// Arithmetic mean of the retained entries, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.iter().sum::<f64>() / self.items.len() as f64)
    }
}

impl<T: Clone, const N: usize> Default for RollingWindow<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const N: usize> From<RollingWindow<T, N>> for Vec<T> {
    fn from(window: RollingWindow<T, N>) -> Self {
        window.items.into()
    }
}

impl<T: Clone, const N: usize> TryFrom<Vec<T>> for RollingWindow<T, N> {
    type Error = ValidationError;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        if items.len() > N {
            return Err(ValidationError::WindowOverflow {
                capacity: N,
                len: items.len(),
            });
        }
        Ok(Self {
            items: items.into(),
        })
    }
}

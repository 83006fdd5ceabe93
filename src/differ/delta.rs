//! Scalar and categorical delta rules.

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

use crate::bundle::{CategoryCounts, OrderedMap};

/// Direction of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `after > before`.
    Increase,
    /// `after < before`.
    Decrease,
    /// `after == before`.
    NoChange,
}

impl Direction {
    /// Classify from the sign of `change`.
    #[must_use]
    pub const fn from_change(change: i64) -> Self {
        if change > 0 {
            Self::Increase
        } else if change < 0 {
            Self::Decrease
        } else {
            Self::NoChange
        }
    }

    /// The direction seen when comparing in the opposite order.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Increase => Self::Decrease,
            Self::Decrease => Self::Increase,
            Self::NoChange => Self::NoChange,
        }
    }
}

/// Difference between two counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Value in the earlier snapshot.
    pub before: i64,
    /// Value in the later snapshot.
    pub after: i64,
    /// `after - before`.
    pub change: i64,
    /// Percentage change rounded to two decimals.
    ///
    /// `None` when the baseline is zero and the value is not, see
    /// [`Delta::new_metric`].
    pub change_percent: Option<f64>,
    /// Direction classified from `change`.
    pub direction: Direction,
    /// The baseline was zero, so no percentage exists.
    pub new_metric: bool,
}

impl Delta {
    /// Apply the scalar delta rule.
    ///
    /// ```
    /// use health_snapshots::differ::{Delta, Direction};
    ///
    /// let delta = Delta::between(100, 150);
    /// assert_eq!(delta.change, 50);
    /// assert_eq!(delta.change_percent, Some(50.0));
    /// assert_eq!(delta.direction, Direction::Increase);
    ///
    /// let fresh = Delta::between(0, 5);
    /// assert!(fresh.new_metric);
    /// assert_eq!(fresh.change_percent, None);
    /// ```
    #[must_use]
    pub fn between(before: i64, after: i64) -> Self {
        let change = after.saturating_sub(before);
        let (change_percent, new_metric) = match (before, after) {
            (0, 0) => (Some(0.0), false),
            (0, _) => (None, true),
            _ => (Some(round2(change as f64 / before as f64 * 100.0)), false),
        };
        Self {
            before,
            after,
            change,
            change_percent,
            direction: Direction::from_change(change),
            new_metric,
        }
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply the categorical delta rule.
///
/// Labels are the union of both sides: the earlier snapshot's labels in
/// order, then labels that only appear later. A missing label counts as 0.
#[must_use]
pub fn categorical_delta(before: &CategoryCounts, after: &CategoryCounts) -> OrderedMap<Delta> {
    let mut deltas = OrderedMap::new();
    for (label, &old) in before.iter() {
        let new = after.get(label).copied().unwrap_or(0);
        deltas.insert(label, Delta::between(old, new));
    }
    for (label, &new) in after.iter() {
        if !before.contains_key(label) {
            deltas.insert(label, Delta::between(0, new));
        }
    }
    deltas
}

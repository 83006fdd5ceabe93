//! Metrics bundle model.
//!
//! A [`MetricsBundle`] is the named collection of statistics captured in a
//! snapshot. Every metric is either a scalar count or one level of category
//! counts:
//!
//! ```text
//! {
//!   "total_patients": 500,
//!   "by_district": { "North": 300, "South": 200 }
//! }
//! ```
//!
//! Deeper nesting and non-integer values are rejected when decoding.
//!
//! # Example
//!
//! ```
//! use health_snapshots::bundle::{MetricValue, MetricsBundle};
//!
//! let bundle = MetricsBundle::new()
//!     .with_scalar("total_patients", 500)
//!     .with_categorical("by_district", [("North", 300), ("South", 200)]);
//!
//! assert_eq!(bundle.get("total_patients"), Some(&MetricValue::Scalar(500)));
//! assert_eq!(bundle.len(), 2);
//! ```

mod ordered;

pub use ordered::OrderedMap;

use serde::{Deserialize, Serialize};

/// Category label to count.
pub type CategoryCounts = OrderedMap<i64>;

/// A single metric value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A plain count.
    Scalar(i64),
    /// Counts broken down by category label.
    Categorical(CategoryCounts),
}

impl MetricValue {
    /// Shape name, used when reporting structural mismatches.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Categorical(_) => "categorical",
        }
    }

    /// Returns true if both values have the same shape.
    #[must_use]
    pub const fn same_shape(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Scalar(_), Self::Scalar(_)) | (Self::Categorical(_), Self::Categorical(_))
        )
    }
}

/// Ordered mapping from metric name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsBundle(OrderedMap<MetricValue>);

impl MetricsBundle {
    /// Create an empty bundle.
    #[must_use]
    pub const fn new() -> Self {
        Self(OrderedMap::new())
    }

    /// Add a scalar metric.
    #[must_use]
    pub fn with_scalar(mut self, name: impl Into<String>, value: i64) -> Self {
        self.insert(name, MetricValue::Scalar(value));
        self
    }

    /// Add a categorical metric.
    #[must_use]
    pub fn with_categorical<L, I>(mut self, name: impl Into<String>, counts: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = (L, i64)>,
    {
        self.insert(name, MetricValue::Categorical(counts.into_iter().collect()));
        self
    }

    /// Insert or replace a metric, keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) -> Option<MetricValue> {
        self.0.insert(name, value)
    }

    /// Look up a metric.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    /// Metric names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys()
    }

    /// Metrics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter()
    }

    /// Number of metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the bundle has no metrics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as the JSON text stored alongside a snapshot.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which cannot occur for well-formed bundles.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from stored JSON text.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, nesting deeper than one level, non-integer
    /// values, or duplicate keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

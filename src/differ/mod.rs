//! Snapshot comparison.
//!
//! Computes per-metric deltas between two stored snapshots:
//! - scalar metrics get one [`Delta`]
//! - categorical metrics get one [`Delta`] per label in the union of both sides
//!
//! Results follow the earlier bundle's metric order, so the same pair of
//! snapshots always serializes to the same bytes.

mod delta;

pub use delta::{categorical_delta, Delta, Direction};

use serde::{Deserialize, Serialize};

use crate::bundle::{MetricValue, OrderedMap};
use crate::error::ComparisonError;
use crate::storage::{Snapshot, SnapshotId, SnapshotMetadata};
use crate::traits::SnapshotRepository;

/// Comparison behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Compare only the shared metrics instead of failing on a structural
    /// mismatch.
    pub allow_structural_mismatch: bool,
}

/// Delta for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricDelta {
    /// Scalar metric delta.
    Scalar(Delta),
    /// Per-label deltas for a categorical metric.
    Categorical(OrderedMap<Delta>),
}

/// Why a metric was left out of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Present only in the earlier snapshot.
    OnlyInBefore,
    /// Present only in the later snapshot.
    OnlyInAfter,
    /// Scalar on one side, categorical on the other.
    KindMismatch,
}

/// A metric that was not compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMetric {
    /// Metric name.
    pub name: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Count of leaf deltas by direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Leaf deltas that increased.
    pub increased: usize,
    /// Leaf deltas that decreased.
    pub decreased: usize,
    /// Leaf deltas without change.
    pub unchanged: usize,
}

impl ComparisonSummary {
    fn record(&mut self, delta: &Delta) {
        match delta.direction {
            Direction::Increase => self.increased += 1,
            Direction::Decrease => self.decreased += 1,
            Direction::NoChange => self.unchanged += 1,
        }
    }
}

/// The result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Earlier snapshot.
    pub before: SnapshotMetadata,
    /// Later snapshot.
    pub after: SnapshotMetadata,
    /// Deltas by metric name.
    pub deltas: OrderedMap<MetricDelta>,
    /// Metrics that could not be compared.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedMetric>,
    /// Direction counts across all leaf deltas.
    pub summary: ComparisonSummary,
}

impl ComparisonResult {
    /// Delta of a scalar metric.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&Delta> {
        match self.deltas.get(name) {
            Some(MetricDelta::Scalar(delta)) => Some(delta),
            _ => None,
        }
    }

    /// Delta of one label of a categorical metric.
    #[must_use]
    pub fn category(&self, name: &str, label: &str) -> Option<&Delta> {
        match self.deltas.get(name) {
            Some(MetricDelta::Categorical(labels)) => labels.get(label),
            _ => None,
        }
    }
}

/// Load two snapshots and compare them.
///
/// # Errors
///
/// - [`ComparisonError::SameSnapshot`] if both ids are equal (checked before
///   any lookup)
/// - [`ComparisonError::Storage`] if either snapshot cannot be loaded
/// - [`ComparisonError::StructuralMismatch`] as for [`compare_snapshots`]
pub async fn compare<R: SnapshotRepository + ?Sized>(
    repository: &R,
    before_id: SnapshotId,
    after_id: SnapshotId,
    options: CompareOptions,
) -> Result<ComparisonResult, ComparisonError> {
    if before_id == after_id {
        return Err(ComparisonError::SameSnapshot {
            snapshot_id: before_id.get(),
        });
    }

    let before = repository.get(before_id).await?;
    let after = repository.get(after_id).await?;
    compare_snapshots(&before, &after, options)
}

/// Compare two loaded snapshots.
///
/// # Errors
///
/// Returns [`ComparisonError::StructuralMismatch`] when the metric names or
/// shapes differ and `options.allow_structural_mismatch` is false.
pub fn compare_snapshots(
    before: &Snapshot,
    after: &Snapshot,
    options: CompareOptions,
) -> Result<ComparisonResult, ComparisonError> {
    let mut skipped = Vec::new();
    let mut only_in_before = Vec::new();
    let mut kind_mismatch = Vec::new();

    for (name, value) in before.metrics.iter() {
        match after.metrics.get(name) {
            None => only_in_before.push(name.to_string()),
            Some(other) if !value.same_shape(other) => kind_mismatch.push(name.to_string()),
            Some(_) => {}
        }
    }
    let only_in_after: Vec<String> = after
        .metrics
        .names()
        .filter(|name| before.metrics.get(name).is_none())
        .map(str::to_string)
        .collect();

    let mismatched =
        !(only_in_before.is_empty() && only_in_after.is_empty() && kind_mismatch.is_empty());
    if mismatched {
        if !options.allow_structural_mismatch {
            tracing::warn!(
                before = %before.id(),
                after = %after.id(),
                ?only_in_before,
                ?only_in_after,
                ?kind_mismatch,
                "structural mismatch"
            );
            return Err(ComparisonError::StructuralMismatch {
                only_in_before,
                only_in_after,
                kind_mismatch,
            });
        }
        let tagged = [
            (only_in_before, SkipReason::OnlyInBefore),
            (kind_mismatch, SkipReason::KindMismatch),
            (only_in_after, SkipReason::OnlyInAfter),
        ];
        for (names, reason) in tagged {
            skipped.extend(names.into_iter().map(|name| SkippedMetric { name, reason }));
        }
    }

    let mut deltas = OrderedMap::new();
    let mut summary = ComparisonSummary::default();
    for (name, old) in before.metrics.iter() {
        let delta = match (old, after.metrics.get(name)) {
            (MetricValue::Scalar(a), Some(MetricValue::Scalar(b))) => {
                let delta = Delta::between(*a, *b);
                summary.record(&delta);
                MetricDelta::Scalar(delta)
            }
            (MetricValue::Categorical(a), Some(MetricValue::Categorical(b))) => {
                let labels = categorical_delta(a, b);
                for (_, delta) in labels.iter() {
                    summary.record(delta);
                }
                MetricDelta::Categorical(labels)
            }
            _ => continue,
        };
        deltas.insert(name, delta);
    }

    tracing::info!(
        before = %before.id(),
        after = %after.id(),
        metrics = deltas.len(),
        skipped = skipped.len(),
        "snapshots compared"
    );

    Ok(ComparisonResult {
        before: before.metadata.clone(),
        after: after.metadata.clone(),
        deltas,
        skipped,
        summary,
    })
}

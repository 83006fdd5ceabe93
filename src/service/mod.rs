//! Snapshot service.
//!
//! Wires the collector, repository, differ, schedule and access policy into
//! the operations exposed to clients. Every collector and repository await
//! is bounded by [`ServiceOptions::timeout`]; dropping a returned future
//! cancels the operation, and an interrupted save never becomes visible.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::bundle::MetricsBundle;
use crate::config::Config;
use crate::differ::{self, CompareOptions, ComparisonResult};
use crate::error::{AppError, CollectorError, StorageError};
use crate::policy::{authorize, Action, Actor};
use crate::schedule::{self, ScheduleStatus};
use crate::storage::{Snapshot, SnapshotFilter, SnapshotId, SnapshotKind, SnapshotMetadata};
use crate::traits::{
    AggregateCollector, RealTimeProvider, SharedTimeProvider, SnapshotRepository, TimeProvider,
};

/// Service tuning, usually derived from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Bound on each collector or repository call.
    pub timeout: Duration,
    /// Listing limit when the caller gives none.
    pub default_list_limit: u32,
    /// Listing limits above this are clamped.
    pub max_list_limit: u32,
    /// Comparison options when the caller gives none.
    pub compare: CompareOptions,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ServiceOptions {
    /// Derive options from configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout(),
            default_list_limit: config.default_list_limit,
            max_list_limit: config.max_list_limit,
            compare: CompareOptions {
                allow_structural_mismatch: config.compare_allow_mismatch,
            },
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// One page of listed snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPage {
    /// Snapshots, most recent first.
    pub snapshots: Vec<SnapshotMetadata>,
    /// The limit applied after clamping.
    pub limit: u32,
}

/// The snapshot service.
pub struct SnapshotService<R, C> {
    repository: R,
    collector: C,
    clock: SharedTimeProvider,
    options: ServiceOptions,
}

/// Service over trait objects, as used by the MCP server.
pub type DynSnapshotService =
    SnapshotService<Arc<dyn SnapshotRepository>, Arc<dyn AggregateCollector>>;

impl<R, C> std::fmt::Debug for SnapshotService<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotService")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: SnapshotRepository, C: AggregateCollector> SnapshotService<R, C> {
    /// Create a service.
    pub fn new(repository: R, collector: C, options: ServiceOptions) -> Self {
        Self {
            repository,
            collector,
            clock: Arc::new(RealTimeProvider),
            options,
        }
    }

    /// Replace the clock used for schedule decisions.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedTimeProvider) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The active options.
    #[must_use]
    pub const fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Clamp a requested listing limit to `[1, max_list_limit]`.
    ///
    /// `None` selects the configured default.
    fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        let limit = requested
            .unwrap_or(self.options.default_list_limit)
            .clamp(1, self.options.max_list_limit.max(1));
        if requested.is_some_and(|r| r != limit) {
            tracing::debug!(requested = ?requested, limit, "list limit clamped");
        }
        limit
    }

    async fn bounded<T, E, F>(
        &self,
        operation: &'static str,
        future: F,
        on_timeout: fn(u64) -> AppError,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, E>>,
        AppError: From<E>,
    {
        match tokio::time::timeout(self.options.timeout, future).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                let timeout_ms = self.options.timeout_ms();
                tracing::warn!(operation, timeout_ms, "operation timed out");
                Err(on_timeout(timeout_ms))
            }
        }
    }

    async fn storage<T, F>(&self, operation: &'static str, future: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        self.bounded(operation, future, |timeout_ms| {
            AppError::Storage(StorageError::Timeout { timeout_ms })
        })
        .await
    }

    async fn collect(&self) -> Result<MetricsBundle, AppError> {
        self.bounded("collect", self.collector.collect(), |timeout_ms| {
            AppError::Collector(CollectorError::Timeout { timeout_ms })
        })
        .await
    }

    /// Capture the live metrics and persist them as a new snapshot.
    ///
    /// # Errors
    ///
    /// - [`AppError::Policy`] if the actor may not generate
    /// - [`AppError::Collector`] if the data source is unavailable; nothing is saved
    /// - [`AppError::Storage`] if the store is unavailable or the call times out
    pub async fn generate(
        &self,
        actor: &Actor,
        kind: SnapshotKind,
        notes: Option<String>,
    ) -> Result<Snapshot, AppError> {
        authorize(actor, Action::Generate)?;

        let metrics = self.collect().await?;
        let metadata = self
            .storage(
                "save",
                self.repository
                    .insert(kind, notes, Some(actor.id.clone()), &metrics),
            )
            .await?;
        let snapshot = Snapshot { metadata, metrics };

        tracing::info!(
            snapshot_id = %snapshot.id(),
            kind = %kind,
            actor = %actor.id,
            "snapshot generated"
        );
        Ok(snapshot)
    }

    /// Generate only when `kind` is due in the current calendar period.
    ///
    /// Returns `Ok(None)` when a snapshot of this kind already exists in the
    /// period. Manual snapshots are always generated.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotService::generate`].
    pub async fn generate_if_due(
        &self,
        actor: &Actor,
        kind: SnapshotKind,
        notes: Option<String>,
    ) -> Result<Option<Snapshot>, AppError> {
        authorize(actor, Action::Generate)?;

        let now = self.clock.now();
        let existing = self.in_current_period(kind, now).await?;
        if !schedule::should_generate(&existing, kind, now) {
            tracing::info!(kind = %kind, "snapshot not due");
            return Ok(None);
        }
        self.generate(actor, kind, notes).await.map(Some)
    }

    /// Schedule state of each requested periodic kind at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if listing fails.
    pub async fn schedule(&self, kinds: &[SnapshotKind]) -> Result<Vec<ScheduleStatus>, AppError> {
        self.schedule_at(kinds, self.clock.now()).await
    }

    /// Schedule state of each requested periodic kind at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if listing fails.
    pub async fn schedule_at(
        &self,
        kinds: &[SnapshotKind],
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduleStatus>, AppError> {
        let mut existing = Vec::new();
        for &kind in kinds {
            existing.extend(self.in_current_period(kind, now).await?);
        }
        Ok(schedule::schedule_status(&existing, kinds, now))
    }

    async fn in_current_period(
        &self,
        kind: SnapshotKind,
        now: DateTime<Utc>,
    ) -> Result<Vec<SnapshotMetadata>, AppError> {
        let Some(start) = schedule::period_start(kind, now) else {
            return Ok(Vec::new());
        };
        let filter = SnapshotFilter::latest(1).with_kind(kind).since(start);
        self.storage("list", self.repository.list_filtered(&filter))
            .await
    }

    /// Most recent snapshots first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the store is unavailable.
    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<SnapshotMetadata>, AppError> {
        let limit = self.clamp_limit(limit);
        let listed = self.storage("list", self.repository.list(limit)).await?;
        tracing::debug!(limit, returned = listed.len(), "snapshots listed");
        Ok(listed)
    }

    /// Most recent snapshots first, filtered by kind and time range.
    ///
    /// The filter's limit is clamped like [`SnapshotService::list`], with 0
    /// selecting the default.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] if `since` is after `until`
    /// - [`AppError::Storage`] if the store is unavailable
    pub async fn list_filtered(
        &self,
        filter: SnapshotFilter,
    ) -> Result<Vec<SnapshotMetadata>, AppError> {
        self.list_page(filter).await.map(|page| page.snapshots)
    }

    /// Like [`SnapshotService::list_filtered`], also reporting the limit
    /// that was applied.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotService::list_filtered`].
    pub async fn list_page(&self, mut filter: SnapshotFilter) -> Result<SnapshotPage, AppError> {
        if let (Some(since), Some(until)) = (filter.since, filter.until) {
            if since > until {
                return Err(AppError::InvalidInput {
                    field: "since".into(),
                    reason: "must not be later than until".into(),
                });
            }
        }
        filter.limit = self.clamp_limit((filter.limit > 0).then_some(filter.limit));
        let listed = self
            .storage("list", self.repository.list_filtered(&filter))
            .await?;
        tracing::debug!(limit = filter.limit, returned = listed.len(), "snapshots listed");
        Ok(SnapshotPage {
            snapshots: listed,
            limit: filter.limit,
        })
    }

    /// Load one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] with `SnapshotNotFound` if absent.
    pub async fn get(&self, id: SnapshotId) -> Result<Snapshot, AppError> {
        let snapshot = self.storage("get", self.repository.get(id)).await?;
        tracing::debug!(snapshot_id = %id, "snapshot loaded");
        Ok(snapshot)
    }

    /// Permanently delete a snapshot.
    ///
    /// # Errors
    ///
    /// - [`AppError::Policy`] if the actor may not delete
    /// - [`AppError::Storage`] with `SnapshotNotFound` if absent
    pub async fn delete(&self, actor: &Actor, id: SnapshotId) -> Result<(), AppError> {
        authorize(actor, Action::Delete)?;
        self.storage("delete", self.repository.delete(id)).await?;
        tracing::info!(snapshot_id = %id, actor = %actor.id, "snapshot deleted");
        Ok(())
    }

    /// Compare two stored snapshots.
    ///
    /// `options` falls back to [`ServiceOptions::compare`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Comparison`] for the same id twice, a missing
    /// snapshot, or a structural mismatch.
    pub async fn compare(
        &self,
        before: SnapshotId,
        after: SnapshotId,
        options: Option<CompareOptions>,
    ) -> Result<ComparisonResult, AppError> {
        let options = options.unwrap_or(self.options.compare);
        self.bounded(
            "compare",
            differ::compare(&self.repository, before, after, options),
            |timeout_ms| AppError::Storage(StorageError::Timeout { timeout_ms }),
        )
        .await
    }
}

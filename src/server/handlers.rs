//! Tool handlers.
//!
//! Each handler validates its request, calls the [`SnapshotService`] and
//! builds the response. They are plain async functions so they can be
//! exercised without an MCP transport.

use crate::differ::{CompareOptions, ComparisonResult};
use crate::error::AppError;
use crate::schedule::ScheduleStatus;
use crate::service::SnapshotService;
use crate::storage::{Snapshot, SnapshotFilter, SnapshotKind};
use crate::traits::{AggregateCollector, SnapshotRepository};

use super::requests::{
    parse_actor, parse_id, parse_kind, parse_time, SnapshotCompareRequest, SnapshotDeleteRequest,
    SnapshotGenerateRequest, SnapshotGetRequest, SnapshotListRequest, SnapshotScheduleRequest,
};
use super::responses::{DeleteResponse, GenerateResponse, ListResponse, ScheduleResponse};

/// `snapshot_generate`.
pub async fn generate<R, C>(
    service: &SnapshotService<R, C>,
    req: SnapshotGenerateRequest,
) -> Result<GenerateResponse, AppError>
where
    R: SnapshotRepository,
    C: AggregateCollector,
{
    let kind = parse_kind("kind", &req.kind)?;
    let actor = parse_actor(&req.actor_id, &req.role)?;
    let notes = req.notes.filter(|n| !n.trim().is_empty());

    if req.only_if_due.unwrap_or(false) {
        let generated = service.generate_if_due(&actor, kind, notes).await?;
        return Ok(match generated {
            Some(snapshot) => created(snapshot),
            None => GenerateResponse {
                generated: false,
                snapshot: None,
                reason: Some(format!(
                    "a {kind} snapshot already exists for the current period"
                )),
            },
        });
    }

    service.generate(&actor, kind, notes).await.map(created)
}

fn created(snapshot: Snapshot) -> GenerateResponse {
    GenerateResponse {
        generated: true,
        snapshot: Some(snapshot),
        reason: None,
    }
}

/// `snapshot_list`.
pub async fn list<R, C>(
    service: &SnapshotService<R, C>,
    req: SnapshotListRequest,
) -> Result<ListResponse, AppError>
where
    R: SnapshotRepository,
    C: AggregateCollector,
{
    let mut filter = SnapshotFilter::latest(req.limit.unwrap_or(0));
    if let Some(kind) = req.kind.as_deref() {
        filter = filter.with_kind(parse_kind("kind", kind)?);
    }
    if let Some(since) = req.since.as_deref() {
        filter = filter.since(parse_time("since", since)?);
    }
    if let Some(until) = req.until.as_deref() {
        filter = filter.until(parse_time("until", until)?);
    }

    let page = service.list_page(filter).await?;
    Ok(ListResponse {
        count: page.snapshots.len(),
        snapshots: page.snapshots,
        limit: page.limit,
    })
}

/// `snapshot_get`.
pub async fn get<R, C>(
    service: &SnapshotService<R, C>,
    req: SnapshotGetRequest,
) -> Result<Snapshot, AppError>
where
    R: SnapshotRepository,
    C: AggregateCollector,
{
    let id = parse_id("snapshot_id", req.snapshot_id)?;
    service.get(id).await
}

/// `snapshot_delete`.
pub async fn delete<R, C>(
    service: &SnapshotService<R, C>,
    req: SnapshotDeleteRequest,
) -> Result<DeleteResponse, AppError>
where
    R: SnapshotRepository,
    C: AggregateCollector,
{
    let id = parse_id("snapshot_id", req.snapshot_id)?;
    let actor = parse_actor(&req.actor_id, &req.role)?;
    service.delete(&actor, id).await?;
    Ok(DeleteResponse {
        snapshot_id: id,
        deleted: true,
    })
}

/// `snapshot_compare`.
pub async fn compare<R, C>(
    service: &SnapshotService<R, C>,
    req: SnapshotCompareRequest,
) -> Result<ComparisonResult, AppError>
where
    R: SnapshotRepository,
    C: AggregateCollector,
{
    let before = parse_id("before_id", req.before_id)?;
    let after = parse_id("after_id", req.after_id)?;
    let options = req
        .allow_structural_mismatch
        .map(|allow_structural_mismatch| CompareOptions {
            allow_structural_mismatch,
        });
    service.compare(before, after, options).await
}

/// `snapshot_schedule`.
pub async fn schedule<R, C>(
    service: &SnapshotService<R, C>,
    req: SnapshotScheduleRequest,
) -> Result<ScheduleResponse, AppError>
where
    R: SnapshotRepository,
    C: AggregateCollector,
{
    let kinds = match req.kind.as_deref() {
        Some(value) => {
            let kind = parse_kind("kind", value)?;
            if !kind.is_periodic() {
                return Err(AppError::InvalidInput {
                    field: "kind".into(),
                    reason: "manual snapshots have no schedule".into(),
                });
            }
            vec![kind]
        }
        None => SnapshotKind::PERIODIC.to_vec(),
    };

    let as_of = service.now();
    let statuses: Vec<ScheduleStatus> = service.schedule_at(&kinds, as_of).await?;
    Ok(ScheduleResponse {
        as_of,
        due: statuses.iter().filter(|s| s.due).map(|s| s.kind).collect(),
        kinds: statuses,
    })
}

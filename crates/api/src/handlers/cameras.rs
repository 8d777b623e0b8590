//! Camera CRUD, probe-test, and discovery/sync handlers. Every handler binds
//! `company_id` from the path, checks it against the session before touching
//! the store, and notifies the runtime supervisor when the change has
//! runtime effects (a later `start-detection`/`stop-detection` call is what
//! actually spins workers up; these handlers only manage the durable row and
//! tear down a runtime that no longer has a durable camera behind it).

use crate::{error::ApiError, handlers::util, state::AppState};
use axum::extract::{Path, State};
use axum::Json;
use sentinel_core::{CameraId, CameraProtocol, CameraStatus, UserCtx};
use sentinel_store::{Camera, CameraFields};
use sentinel_vision::{discovery, probe, CameraSource, DiscoveredCamera, ProbeResult, RuntimeState, RuntimeSupervisor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CameraRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub location: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<i32>,
    pub protocol: Option<CameraProtocol>,
    pub stream_path: Option<String>,
    pub auth_type: Option<sentinel_core::AuthType>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub resolution_width: Option<i32>,
    pub resolution_height: Option<i32>,
    pub fps: Option<i32>,
    pub status: Option<CameraStatus>,
}

impl From<CameraRequest> for CameraFields {
    fn from(req: CameraRequest) -> Self {
        CameraFields {
            name: req.name,
            location: req.location,
            ip_address: req.ip_address,
            port: req.port,
            protocol: req.protocol,
            stream_path: req.stream_path,
            auth_type: req.auth_type,
            username: req.username,
            password: req.password,
            resolution_width: req.resolution_width,
            resolution_height: req.resolution_height,
            fps: req.fps,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DiscoverRequest {
    pub network_range: String,
    #[serde(default)]
    pub auto_sync: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncRequest {
    pub network_range: String,
    #[serde(default)]
    pub force_sync: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncReport {
    pub discovered: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub cameras: Vec<Uuid>,
}

pub async fn list_cameras(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let mut cameras = state.store.list_cameras(company_id).await?;
    for camera in cameras.iter_mut() {
        overlay_live_status(camera, &state.supervisor);
    }
    let summary = json!({
        "total": cameras.len(),
        "active": cameras.iter().filter(|c| c.status == CameraStatus::Active).count(),
    });
    Ok(Json(json!({ "cameras": cameras, "summary": summary })))
}

/// §4.1's "the list view must recompute live `status` if a runtime is
/// attached": a camera with an attached `CameraRuntime` reports the
/// runtime's own view of aliveness instead of the durable desired-state row.
fn overlay_live_status(camera: &mut Camera, supervisor: &RuntimeSupervisor) {
    let Some(runtime_status) = supervisor.status(CameraId(camera.camera_id)) else {
        return;
    };
    camera.status = match runtime_status.state {
        RuntimeState::Running | RuntimeState::Connecting | RuntimeState::Reconnecting => CameraStatus::Active,
        RuntimeState::Failed => CameraStatus::Error,
        RuntimeState::Init | RuntimeState::Stopped => camera.status,
    };
}

pub async fn add_camera(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CameraRequest>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let camera = state.store.add_camera(company_id, payload.into()).await?;
    Ok(Json(json!({ "camera_id": camera.camera_id })))
}

pub async fn update_camera(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path((company_id, camera_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CameraRequest>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let camera = state.store.update_camera(company_id, camera_id, payload.into()).await?;

    if matches!(camera.status, CameraStatus::Inactive | CameraStatus::Deleted | CameraStatus::Error) {
        state.supervisor.stop(CameraId(camera_id));
    }

    Ok(Json(json!({ "camera": camera })))
}

pub async fn delete_camera(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path((company_id, camera_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    state.store.soft_delete_camera(company_id, camera_id).await?;
    state.supervisor.stop(CameraId(camera_id));

    Ok(Json(json!({ "deleted": true })))
}

pub async fn test_camera(
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
    Json(source): Json<CameraSource>,
) -> Result<Json<ProbeResult>, ApiError> {
    util::require_company(&ctx, company_id)?;

    Ok(Json(probe::probe(source).await))
}

pub async fn discover_cameras(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<DiscoverRequest>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let cameras = discovery::scan(&payload.network_range, None).await?;

    if payload.auto_sync {
        insert_discovered(&state, company_id, &cameras).await;
    }

    Ok(Json(json!({ "cameras": cameras })))
}

pub async fn sync_cameras(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncReport>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let discovered = discovery::scan(&payload.network_range, None).await?;
    let existing = state.store.list_cameras(company_id).await?;

    let mut inserted = Vec::new();
    let mut skipped = 0usize;

    for candidate in &discovered {
        let already_known = existing.iter().any(|c| c.ip_address == candidate.ip_address);

        if already_known && !payload.force_sync {
            skipped += 1;
            continue;
        }

        match state.store.add_camera(company_id, camera_fields_for(candidate)).await {
            Ok(camera) => inserted.push(camera.camera_id),
            Err(_) => skipped += 1,
        }
    }

    Ok(Json(SyncReport {
        discovered: discovered.len(),
        inserted: inserted.len(),
        skipped,
        cameras: inserted,
    }))
}

fn camera_fields_for(candidate: &DiscoveredCamera) -> CameraFields {
    CameraFields {
        name: Some(format!("{}-{}", candidate.vendor_name, candidate.ip_address)),
        ip_address: Some(candidate.ip_address.clone()),
        port: candidate.open_ports.first().map(|p| *p as i32),
        protocol: Some(CameraProtocol::Http),
        status: Some(CameraStatus::Discovered),
        ..Default::default()
    }
}

async fn insert_discovered(state: &AppState, company_id: Uuid, cameras: &[DiscoveredCamera]) {
    for candidate in cameras {
        // Best-effort: a duplicate name or limit hit just means this host is skipped.
        let _ = state.store.add_camera(company_id, camera_fields_for(candidate)).await;
    }
}

//! Start/stop detection, poll the latest detection result, and stream the
//! annotated MJPEG feed. Mirrors the supervisor-mediated start/stop pattern
//! `sentinel_vision::supervisor` exposes: the control plane only ever reaches
//! the runtime through `RuntimeSupervisor`, never by constructing a
//! `CameraRuntime` directly.

use crate::{error::ApiError, handlers::util, state::AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::{self, Stream};
use sentinel_core::{CameraId, CompanyId, Error, UserCtx};
use sentinel_vision::{CameraSource, StartParams};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

const MJPEG_BOUNDARY: &str = "frame";
const STREAM_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartDetectionRequest {
    pub camera: Uuid,
    #[serde(default)]
    pub mode: Option<String>,
    pub confidence: Option<f32>,
}

pub async fn start_detection(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<StartDetectionRequest>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let company = state.store.get_company(company_id).await?;
    let camera = state.store.get_camera(company_id, payload.camera).await?;

    let ip_address = camera
        .ip_address
        .clone()
        .ok_or_else(|| Error::validation("camera has no ip_address configured"))?;

    let source = CameraSource {
        ip_address,
        port: camera.port.unwrap_or(80) as u16,
        protocol: camera.protocol,
        stream_path: camera.stream_path.clone(),
        username: camera.username.clone(),
        password: camera.password.clone(),
        resolution: (
            camera.resolution_width.unwrap_or(640) as u32,
            camera.resolution_height.unwrap_or(480) as u32,
        ),
    };

    let confidence_threshold = payload
        .confidence
        .unwrap_or(state.config.detection_default_confidence);

    state.supervisor.start(StartParams {
        company_id: CompanyId(company_id),
        camera_id: CameraId(payload.camera),
        source,
        fps: camera.fps.max(1) as u32,
        max_retries: None,
        sector: company.sector.clone().unwrap_or_else(|| "generic".to_string()),
        sample_every_n: state.config.detection_sample_every_n,
        confidence_threshold,
        required_ppe: company.required_ppe.0.clone(),
    });

    state.store.mark_camera_status(company_id, payload.camera, sentinel_core::CameraStatus::Active).await?;

    Ok(Json(json!({ "started": true, "camera_id": payload.camera })))
}

pub async fn stop_detection(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let stopped = state.supervisor.stop_all_for_company(CompanyId(company_id));
    Ok(Json(json!({ "stopped": stopped })))
}

pub async fn detection_results(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path((company_id, camera_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let result = state.supervisor.try_pop_result(CameraId(camera_id)).await?;
    Ok(Json(json!({ "result": result })))
}

/// `multipart/x-mixed-replace` feed of the camera's latest annotated frame.
/// Emits at `STREAM_INTERVAL` cadence; a zero-length part is sent when no
/// frame is available yet so the connection stays open. Per §4.9, the
/// handler terminates when the client disconnects (axum drops the stream
/// once the body write fails) or when the camera's runtime is stopped
/// (checked via `RuntimeSupervisor::is_running` each tick).
pub async fn video_feed(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path((company_id, camera_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    util::require_company(&ctx, company_id)?;

    let camera_id = CameraId(camera_id);
    let body = Body::from_stream(mjpeg_stream(state, camera_id));

    Ok((
        [(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={MJPEG_BOUNDARY}"),
        )],
        body,
    )
        .into_response())
}

fn mjpeg_stream(state: AppState, camera_id: CameraId) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> {
    stream::unfold(state, move |state| async move {
        if !state.supervisor.is_running(camera_id) {
            return None;
        }

        tokio::time::sleep(STREAM_INTERVAL).await;

        if !state.supervisor.is_running(camera_id) {
            return None;
        }

        let frame = state.supervisor.latest_frame_jpeg(camera_id);
        let mut part = format!("--{MJPEG_BOUNDARY}\r\nContent-Type: image/jpeg\r\n").into_bytes();

        match frame {
            Some(jpeg) => {
                part.extend_from_slice(format!("Content-Length: {}\r\n\r\n", jpeg.len()).as_bytes());
                part.extend_from_slice(&jpeg);
            }
            None => {
                part.extend_from_slice(b"Content-Length: 0\r\n\r\n");
            }
        }
        part.extend_from_slice(b"\r\n");

        Some((Ok(part), state))
    })
}

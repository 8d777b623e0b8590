//! `GET /violations/{path}`: serves a violation snapshot JPEG straight off
//! disk. `SnapshotStore::resolve_for_company` enforces that `path` both
//! starts with the caller's own `{company_id}/` prefix and canonicalizes to
//! somewhere inside the snapshot root (§8 "Snapshot path safety") before this
//! handler ever touches the filesystem.
use crate::{error::ApiError, state::AppState};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use sentinel_core::{Error, UserCtx};
use tokio::fs;

pub async fn get_violation_image(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = state
        .snapshots
        .resolve_for_company(ctx.company_id, &path)
        .ok_or_else(|| Error::not_found("snapshot not found"))?;

    let bytes = fs::read(&resolved)
        .await
        .map_err(|_| Error::not_found("snapshot not found"))?;

    Ok(([(axum::http::header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

//! `GET`/`PUT /api/company/{cid}/ppe-config`: the set of PPE classes a
//! company's detection runtimes enforce (§4.5). Stored as a JSON column on
//! `companies`, read by `DetectionRuntime` on every `start-detection` call.

use crate::{error::ApiError, handlers::util, state::AppState};
use axum::extract::{Path, State};
use axum::Json;
use sentinel_core::{RequiredPpe, UserCtx};
use uuid::Uuid;

pub async fn get_ppe_config(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
) -> Result<Json<RequiredPpe>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let company = state.store.get_company(company_id).await?;
    Ok(Json(company.required_ppe.0))
}

pub async fn update_ppe_config(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<RequiredPpe>,
) -> Result<Json<RequiredPpe>, ApiError> {
    util::require_company(&ctx, company_id)?;

    state.store.update_ppe_config(company_id, &payload).await?;
    Ok(Json(payload))
}

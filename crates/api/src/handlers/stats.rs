//! `GET /api/company/{cid}/stats` (§4.1.1). Thin pass-through onto
//! `TenantStore::get_stats`; the trend math itself lives in
//! `sentinel_store::stats::compute_trend`.

use crate::{error::ApiError, handlers::util, state::AppState};
use axum::extract::{Path, State};
use axum::Json;
use sentinel_core::UserCtx;
use sentinel_store::CompanyStats;
use uuid::Uuid;

pub async fn get_stats(
    State(state): State<AppState>,
    ctx: UserCtx,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyStats>, ApiError> {
    util::require_company(&ctx, company_id)?;

    let stats = state.store.get_stats(company_id).await?;
    Ok(Json(stats))
}

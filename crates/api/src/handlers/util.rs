//! Shared helper used across handler modules: enforcing that the `{cid}`
//! path segment matches the session's tenant before any store access
//! happens. `UserCtx` itself is pulled in via its `FromRequestParts` impl
//! (`sentinel_core::types`), so handlers take it as an ordinary extractor
//! argument rather than reaching into request extensions by hand.

use crate::error::ApiError;
use sentinel_core::{CompanyId, Error, UserCtx};
use uuid::Uuid;

/// Rejects the request with 403 unless the path's company id matches the
/// session's. Never reveals whether the other company exists.
pub fn require_company(ctx: &UserCtx, company_id: Uuid) -> Result<(), ApiError> {
    if ctx.company_id != CompanyId(company_id) {
        return Err(Error::forbidden("company mismatch").into());
    }
    Ok(())
}

//! Session extraction middleware. Reads the session cookie set by `login`,
//! validates it through `AuthService::authorize`, and attaches a
//! `RequestContext` to the request extensions the way the teacher's
//! `erp-auth::middleware::auth_middleware` attaches its JWT-derived context,
//! but against the opaque session store instead of a JWT + Redis revocation
//! list.

use crate::service::AuthService;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use sentinel_core::RequestContext;
use std::sync::Arc;
use tracing::warn;

pub const SESSION_COOKIE_NAME: &str = "sentinel_session";

#[derive(Clone)]
pub struct AuthState {
    pub auth: Arc<AuthService>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(session_id) = extract_session_id(&jar, &request) else {
        return Ok(unauthorized_response("missing session"));
    };

    let user_ctx = match state.auth.authorize(&session_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %e, "session authorization failed");
            return Ok(unauthorized_response("invalid or expired session"));
        }
    };

    let context = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default()
        .with_user_ctx(user_ctx);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

fn extract_session_id(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        return Some(cookie.value().to_string());
    }
    request
        .headers()
        .get("X-Session-Id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Rejects the request unless the attached `UserCtx` outranks `minimum`.
pub async fn require_role_middleware(
    minimum: sentinel_core::Role,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let role = request
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.user_ctx.as_ref())
        .map(|ctx| ctx.role);

    match role {
        Some(role) if crate::service::role_at_least(role, minimum) => Ok(next.run(request).await),
        Some(_) => Ok(forbidden_response("insufficient role")),
        None => Ok(unauthorized_response("authentication required")),
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

//! Registration, login, and logout. Login sets the `sentinel_session` cookie
//! `sentinel_auth::auth_middleware` reads back on every subsequent request;
//! logout clears it and revokes the session row.

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sentinel_auth::dto::{LoginRequest, RegisterRequest, RegisterResponse};
use sentinel_core::Error;
use std::net::SocketAddr;
use uuid::Uuid;
use validator::Validate;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    if !state.config.app.enable_registration {
        return Err(Error::forbidden("registration is disabled").into());
    }
    payload.validate().map_err(|e| Error::validation(e.to_string()))?;

    let response = state.auth.register(payload).await?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(company_id): Path<Uuid>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    payload.validate().map_err(|e| Error::validation(e.to_string()))?;

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = state.auth.login(payload, Some(addr.ip().to_string()), user_agent).await?;

    if response.company_id != company_id {
        state.auth.logout(&response.session_id).await?;
        return Err(Error::forbidden("company mismatch").into());
    }

    let mut cookie = Cookie::new(sentinel_auth::SESSION_COOKIE_NAME, response.session_id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.app.environment == "production");

    Ok((jar.add(cookie), Json(serde_json::json!({ "redirect": format!("/company/{company_id}/dashboard") }))))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    if let Some(cookie) = jar.get(sentinel_auth::SESSION_COOKIE_NAME) {
        state.auth.logout(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::from(sentinel_auth::SESSION_COOKIE_NAME));
    Ok((jar, Json(serde_json::json!({ "logged_out": true }))))
}

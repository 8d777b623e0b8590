use crate::dto::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sentinel PPE Monitoring API — Auth",
        version = "1.0.0",
        description = "Company registration, login and session lifecycle for the multi-tenant PPE compliance monitoring service.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        register,
        login,
        logout,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session management"),
    ),
    security(
        ("session_cookie" = []),
    )
)]
pub struct AuthApiDoc;

/// Register a company and its bootstrap admin user.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Company registered", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
async fn register() {}

/// Log in with email and password, receive a session cookie.
#[utoipa::path(
    post,
    path = "/company/{company_id}/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account or company inactive"),
    ),
    tag = "auth"
)]
async fn login() {}

/// Revoke the current session.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 204, description = "Session revoked"),
    ),
    tag = "auth"
)]
async fn logout() {}

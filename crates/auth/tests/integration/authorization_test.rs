use super::common::{init_test_logging, unique_email, TestContext};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use sentinel_auth::dto::{LoginRequest, RegisterRequest};
use sentinel_auth::middleware::{auth_middleware, AuthState, SESSION_COOKIE_NAME};
use tower::ServiceExt;

async fn registered_session(ctx: &TestContext) -> String {
    let email = unique_email("authz");
    let password = "StrongPassword42!";
    ctx.auth
        .register(RegisterRequest {
            company_name: "Authz Test Co".to_string(),
            sector: None,
            contact: None,
            email: unique_email("company"),
            phone: None,
            address: None,
            max_cameras: Some(2),
            admin_username: "authz-admin".to_string(),
            admin_email: email.clone(),
            admin_password: password.to_string(),
        })
        .await
        .expect("registration should succeed");

    ctx.auth
        .login(LoginRequest { email, password: password.to_string() }, None, None)
        .await
        .expect("login should succeed")
        .session_id
}

fn protected_router(state: AuthState) -> Router {
    async fn protected() -> &'static str {
        "ok"
    }

    Router::new()
        .route("/protected", get(protected))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[tokio::test]
async fn valid_session_cookie_passes_through() {
    init_test_logging();
    let ctx = TestContext::new().await;
    let session_id = registered_session(&ctx).await;

    let state = AuthState { auth: ctx.auth.clone() };
    let app = protected_router(state);

    let request = Request::builder()
        .uri("/protected")
        .method("GET")
        .header("cookie", format!("{SESSION_COOKIE_NAME}={session_id}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_session_cookie_is_unauthorized() {
    init_test_logging();
    let ctx = TestContext::new().await;

    let state = AuthState { auth: ctx.auth.clone() };
    let app = protected_router(state);

    let request = Request::builder()
        .uri("/protected")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoked_session_is_rejected() {
    init_test_logging();
    let ctx = TestContext::new().await;
    let session_id = registered_session(&ctx).await;

    ctx.auth.logout(&session_id).await.expect("logout should succeed");

    let state = AuthState { auth: ctx.auth.clone() };
    let app = protected_router(state);

    let request = Request::builder()
        .uri("/protected")
        .method("GET")
        .header("cookie", format!("{SESSION_COOKIE_NAME}={session_id}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

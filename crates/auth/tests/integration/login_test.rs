use super::common::{init_test_logging, unique_email, TestContext};
use sentinel_auth::dto::{LoginRequest, RegisterRequest};

async fn register_company(ctx: &TestContext, admin_email: String, password: &str) {
    let req = RegisterRequest {
        company_name: "Login Test Co".to_string(),
        sector: Some("warehouse".to_string()),
        contact: None,
        email: unique_email("company"),
        phone: None,
        address: None,
        max_cameras: Some(3),
        admin_username: "operator".to_string(),
        admin_email,
        admin_password: password.to_string(),
    };
    ctx.auth.register(req).await.expect("registration should succeed");
}

#[tokio::test]
async fn successful_login_returns_session_bound_to_registering_company() {
    init_test_logging();
    let ctx = TestContext::new().await;

    let email = unique_email("login");
    let password = "CorrectHorse99!";
    register_company(&ctx, email.clone(), password).await;

    let login = ctx
        .auth
        .login(
            LoginRequest { email, password: password.to_string() },
            Some("127.0.0.1".to_string()),
            Some("integration-test".to_string()),
        )
        .await
        .expect("login should succeed");

    assert!(!login.session_id.is_empty());
    assert_eq!(login.role, "admin");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    init_test_logging();
    let ctx = TestContext::new().await;

    let email = unique_email("login");
    register_company(&ctx, email.clone(), "CorrectHorse99!").await;

    let result = ctx
        .auth
        .login(
            LoginRequest { email, password: "WrongPassword99!".to_string() },
            None,
            None,
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    init_test_logging();
    let ctx = TestContext::new().await;

    let result = ctx
        .auth
        .login(
            LoginRequest {
                email: unique_email("nobody"),
                password: "WhateverPassword99!".to_string(),
            },
            None,
            None,
        )
        .await;

    assert!(result.is_err());
}

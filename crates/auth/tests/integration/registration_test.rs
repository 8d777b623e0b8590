use super::common::{init_test_logging, unique_email, TestContext};
use sentinel_auth::dto::RegisterRequest;
use validator::Validate;

fn valid_request() -> RegisterRequest {
    RegisterRequest {
        company_name: "Acme Construction".to_string(),
        sector: Some("construction".to_string()),
        contact: Some("Jane Doe".to_string()),
        email: unique_email("company"),
        phone: None,
        address: None,
        max_cameras: Some(5),
        admin_username: "jane".to_string(),
        admin_email: unique_email("admin"),
        admin_password: "SecurePassword123!".to_string(),
    }
}

#[tokio::test]
async fn registers_company_and_returns_api_key() {
    init_test_logging();
    let ctx = TestContext::new().await;

    let req = valid_request();
    assert!(req.validate().is_ok());

    let response = ctx
        .auth
        .register(req)
        .await
        .expect("registration should succeed");

    assert!(!response.api_key.is_empty());
}

#[tokio::test]
async fn rejects_weak_admin_password() {
    init_test_logging();
    let ctx = TestContext::new().await;

    let mut req = valid_request();
    req.admin_password = "allwords".to_string();

    let result = ctx.auth.register(req).await;
    assert!(result.is_err(), "passwords without digits/uppercase must be rejected");
}

#[test]
fn rejects_invalid_email_at_validation_layer() {
    let mut req = valid_request();
    req.admin_email = "not-an-email".to_string();
    assert!(req.validate().is_err());
}

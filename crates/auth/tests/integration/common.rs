use sentinel_auth::AuthService;
use sentinel_core::config::SecurityConfig;
use sentinel_core::security::PasswordHasher;
use sentinel_core::session::{SessionConfig, SessionManager};
use sentinel_store::TenantStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

pub struct TestContext {
    pub auth: Arc<AuthService>,
    pub store: Arc<TenantStore>,
}

impl TestContext {
    pub async fn new() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/sentinel_test".to_string());

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("failed to connect to test database");

        let store = Arc::new(TenantStore::new(pool.clone()));
        let sessions = Arc::new(SessionManager::new(pool, SessionConfig::default()));
        let hasher = Arc::new(
            PasswordHasher::new(&SecurityConfig::default()).expect("password hasher config"),
        );

        let auth = Arc::new(AuthService::new(store.clone(), sessions, hasher));

        Self { auth, store }
    }
}

#[cfg(test)]
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let _ = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sentinel_auth=debug".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4())
}

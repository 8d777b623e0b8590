//! Sentinel API server: multi-tenant PPE-compliance monitoring over Axum.
//!
//! ## Middleware stack
//!
//! 1. Security headers (HSTS, CSP, X-Frame-Options)
//! 2. Request ID tracking
//! 3. Auth (session cookie → `UserCtx`, protected routes only)
//! 4. Tracing
//! 5. Compression
//! 6. CORS
//!
//! ## Shutdown order
//!
//! Camera runtimes are stopped before the HTTP listener closes, and the HTTP
//! listener closes before the database pool does, so in-flight detection
//! work never outlives the store it writes to.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Duration as ChronoDuration;
use sentinel_auth::{AuthService, AuthState};
use sentinel_core::{
    AuthMetrics, Config, Database, MetricsRegistry, MetricsService, PasswordHasher, SessionCleanupService,
    SessionConfig, SessionManager,
};
use sentinel_store::TenantStore;
use sentinel_vision::{DetectorFactory, RuntimeSupervisor, SnapshotRetentionService, SnapshotStore};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api_middleware;
mod error;
mod handlers;
mod health;
mod state;

use crate::{handlers::*, state::AppState};

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, health::readiness_check),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "auth", description = "Registration, login, and logout"),
        (name = "cameras", description = "Camera inventory, discovery, and sync"),
        (name = "detection", description = "Detection control plane and live feed"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("starting sentinel-server");

    let config = Config::load()?;
    info!("configuration loaded for environment={}", config.app.environment);

    let db = Database::connect(&config.database_url, &config.database).await?;
    db.run_migrations().await?;
    info!("database migrations complete");

    let hasher = Arc::new(PasswordHasher::new(&config.security)?);
    let sessions = Arc::new(SessionManager::new(
        db.pool().clone(),
        SessionConfig { ttl: ChronoDuration::hours(config.session_ttl_hours) },
    ));
    let store = Arc::new(TenantStore::new(db.pool().clone()));
    let auth = Arc::new(AuthService::new(store.clone(), sessions.clone(), hasher.clone()));

    let snapshots = Arc::new(SnapshotStore::new(config.snapshot_base_path.clone()));
    let detectors = Arc::new(DetectorFactory::new());
    let supervisor = Arc::new(RuntimeSupervisor::new(store.clone(), snapshots.clone(), detectors.clone()));

    let metrics_registry = MetricsRegistry::new(config.metrics.clone());
    let auth_metrics = Arc::new(AuthMetrics::new(&config.metrics.namespace)?);
    metrics_registry.with_registry(|r| auth_metrics.register_all(r))?;
    let metrics = Arc::new(MetricsService::new(metrics_registry.clone()));

    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        sessions: sessions.clone(),
        store: store.clone(),
        auth: auth.clone(),
        supervisor: supervisor.clone(),
        snapshots: snapshots.clone(),
        detectors,
        metrics_registry,
        metrics,
        auth_metrics,
    };

    Arc::new(SessionCleanupService::new(
        sessions.clone(),
        ChronoDuration::minutes(10),
        ChronoDuration::hours(24),
    ))
    .start();

    Arc::new(SnapshotRetentionService::new(
        snapshots.clone(),
        Duration::from_secs(24 * 60 * 60),
        config.snapshot_retention_days,
    ))
    .start();

    let app = build_app(state.clone())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("http listener closed, stopping camera runtimes");
    for camera_id in supervisor.running_camera_ids() {
        supervisor.stop(camera_id);
    }

    db.pool().close().await;
    info!("server shutdown complete");
    Ok(())
}

fn build_app(state: AppState) -> Result<Router, Box<dyn std::error::Error>> {
    let auth_state = AuthState { auth: state.auth.clone() };

    let public_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/company/:company_id/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route(
            "/api/company/:company_id/cameras",
            get(cameras::list_cameras).post(cameras::add_camera),
        )
        .route(
            "/api/company/:company_id/cameras/:camera_id",
            put(cameras::update_camera).delete(cameras::delete_camera),
        )
        .route("/api/company/:company_id/cameras/test", post(cameras::test_camera))
        .route("/api/company/:company_id/cameras/discover", post(cameras::discover_cameras))
        .route("/api/company/:company_id/cameras/sync", post(cameras::sync_cameras))
        .route("/api/company/:company_id/start-detection", post(detection::start_detection))
        .route("/api/company/:company_id/stop-detection", post(detection::stop_detection))
        .route(
            "/api/company/:company_id/detection-results/:camera_id",
            get(detection::detection_results),
        )
        .route("/api/company/:company_id/video-feed/:camera_id", get(detection::video_feed))
        .route("/api/company/:company_id/stats", get(stats::get_stats))
        .route(
            "/api/company/:company_id/ppe-config",
            get(ppe_config::get_ppe_config).put(ppe_config::update_ppe_config),
        )
        .route("/violations/*path", get(violations::get_violation_image))
        .layer(middleware::from_fn_with_state(auth_state, sentinel_auth::auth_middleware));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .fallback(handler_404)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(api_middleware::security_headers::security_headers_middleware))
                .layer(middleware::from_fn(api_middleware::request_id::request_id_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(build_cors_layer(&state.config.cors)?),
        )
        .with_state(state);

    Ok(app)
}

fn build_cors_layer(cors_config: &sentinel_core::CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(cors_config.allow_credentials);

    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(AllowOrigin::any());
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            cors_config.allowed_origins.iter().map(|o| o.parse()).collect();
        cors = cors.allow_origin(origins?);
    }

    Ok(cors)
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "resource not found" })))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_api=debug,sentinel_auth=debug,sentinel_vision=debug,sentinel_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received terminate signal"),
    }
}

//! Composition root's state object. One `AppState` is built once in `main`
//! and cloned (cheaply — everything inside is an `Arc`) into every handler
//! via axum's `State` extractor.

use sentinel_auth::AuthService;
use sentinel_core::{AuthMetrics, Config, Database, MetricsRegistry, MetricsService, SessionManager};
use sentinel_store::TenantStore;
use sentinel_vision::{DetectorFactory, RuntimeSupervisor, SnapshotStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub sessions: Arc<SessionManager>,
    pub store: Arc<TenantStore>,
    pub auth: Arc<AuthService>,
    pub supervisor: Arc<RuntimeSupervisor>,
    pub snapshots: Arc<SnapshotStore>,
    pub detectors: Arc<DetectorFactory>,
    pub metrics_registry: MetricsRegistry,
    pub metrics: Arc<MetricsService>,
    pub auth_metrics: Arc<AuthMetrics>,
}

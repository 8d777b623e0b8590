use super::SessionManager;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::{sync::RwLock, task::JoinHandle, time::interval};
use tracing::{error, info};

/// Periodic session cleanup: deletes rows that expired or were revoked more than
/// `grace` ago. Same `tokio::spawn` + `tokio::time::interval` loop shape as the
/// teacher's Redis-backed cleanup service; retargeted at a single Postgres table
/// since tenancy here is a column filter, not a pool per tenant.
pub struct SessionCleanupService {
    session_manager: Arc<SessionManager>,
    cleanup_interval: Duration,
    grace: Duration,
    history: Arc<RwLock<Vec<SessionStatsSnapshot>>>,
}

#[derive(Debug, Clone)]
pub struct SessionStatsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cleaned_up_count: u64,
    pub active_sessions: i64,
}

impl SessionCleanupService {
    pub fn new(session_manager: Arc<SessionManager>, cleanup_interval: Duration, grace: Duration) -> Self {
        Self {
            session_manager,
            cleanup_interval,
            grace,
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_cleanup_loop().await;
        })
    }

    async fn run_cleanup_loop(&self) {
        let mut ticker = interval(self.cleanup_interval.to_std().unwrap_or(std::time::Duration::from_secs(300)));

        info!(interval_minutes = self.cleanup_interval.num_minutes(), "session cleanup service started");

        loop {
            ticker.tick().await;

            match self.perform_cleanup_cycle().await {
                Ok(cleaned) if cleaned > 0 => info!(cleaned_up_sessions = cleaned, "session cleanup cycle completed"),
                Ok(_) => {}
                Err(e) => error!(error = %e, "session cleanup cycle failed"),
            }
        }
    }

    async fn perform_cleanup_cycle(&self) -> Result<u64> {
        let cleaned = self.session_manager.cleanup_expired(self.grace).await?;
        let active = self.session_manager.count_active().await?;

        let mut history = self.history.write().await;
        history.push(SessionStatsSnapshot {
            timestamp: Utc::now(),
            cleaned_up_count: cleaned,
            active_sessions: active,
        });
        if history.len() > 144 {
            history.remove(0);
        }

        Ok(cleaned)
    }

    pub async fn manual_cleanup(&self) -> Result<u64> {
        info!("manual session cleanup triggered");
        self.perform_cleanup_cycle().await
    }

    pub async fn get_health_status(&self) -> CleanupServiceHealth {
        let history = self.history.read().await;
        let last_cleanup_time = history.last().map(|s| s.timestamp);

        let mut issues = Vec::new();
        let is_healthy = match last_cleanup_time {
            Some(last) => {
                let overdue_threshold = self.cleanup_interval + Duration::minutes(5);
                if Utc::now() - last > overdue_threshold {
                    issues.push(format!("cleanup overdue by more than {} minutes", overdue_threshold.num_minutes()));
                    false
                } else {
                    true
                }
            }
            None => {
                issues.push("no cleanup has run yet".to_string());
                false
            }
        };

        CleanupServiceHealth { is_healthy, last_cleanup_time, issues }
    }
}

#[derive(Debug)]
pub struct CleanupServiceHealth {
    pub is_healthy: bool,
    pub last_cleanup_time: Option<DateTime<Utc>>,
    pub issues: Vec<String>,
}

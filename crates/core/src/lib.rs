pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod security;
pub mod session;
pub mod types;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use error::{Error, ErrorCode, ErrorContext, ErrorMetrics, Result};
pub use metrics::{AuthMetrics, MetricsRegistry, MetricsService};
pub use security::{JwtService, PasswordHasher, TokenPair};
pub use session::{SessionConfig, SessionData, SessionManager, SessionStatus, SessionUser};
pub use types::*;

#[cfg(test)]
mod tests;

pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};

//! Tenant Store (C1): durable multi-tenant state for companies, users, cameras,
//! detections and violations. Every repository method here either takes a
//! `company_id` explicitly or derives it from a row already scoped to one, so
//! callers above this crate cannot accidentally cross a tenant boundary.

pub mod error;
pub mod models;
pub mod repository;
pub mod retry;
pub mod stats;

pub use models::*;
pub use repository::TenantStore;

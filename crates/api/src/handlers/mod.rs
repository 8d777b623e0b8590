//! HTTP handlers, one module per resource family (§6 of the HTTP surface).

pub mod auth;
pub mod cameras;
pub mod detection;
pub mod ppe_config;
pub mod stats;
pub mod util;
pub mod violations;

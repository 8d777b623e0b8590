pub mod dto;
pub mod middleware;
pub mod openapi;
pub mod service;

pub use dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
pub use middleware::{auth_middleware, require_role_middleware, AuthState, SESSION_COOKIE_NAME};
pub use openapi::AuthApiDoc;
pub use service::{role_at_least, AuthService};

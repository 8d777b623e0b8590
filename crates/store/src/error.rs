//! Store-specific error helpers layered on `sentinel_core::error`. No new
//! error type: callers already propagate `sentinel_core::Error` everywhere,
//! so the store just picks the right `ErrorCode` for its own failure modes.

use sentinel_core::{Error, ErrorCode};

pub use sentinel_core::error::Result;

pub fn duplicate_email(email: &str) -> Error {
    Error::new(ErrorCode::DuplicateValue, format!("email already registered: {email}"))
}

pub fn invalid(message: impl Into<String>) -> Error {
    Error::validation(message)
}

pub fn camera_limit_exceeded(max: i32) -> Error {
    Error::new(
        ErrorCode::ResourceAlreadyExists,
        format!("camera limit of {max} reached for this company"),
    )
}

pub fn camera_name_taken(name: &str) -> Error {
    Error::new(ErrorCode::DuplicateValue, format!("camera name already in use: {name}"))
}

pub fn bad_credentials() -> Error {
    Error::new(ErrorCode::InvalidCredentials, "invalid email or password")
}

pub fn suspended() -> Error {
    Error::new(ErrorCode::AuthorizationFailed, "account or company is suspended")
}

pub fn store_unavailable(source: impl std::fmt::Display) -> Error {
    Error::new(ErrorCode::DatabaseConnectionError, format!("store unavailable: {source}"))
}

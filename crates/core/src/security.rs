pub mod hashing;
pub mod jwt;

pub use hashing::PasswordHasher;
pub use jwt::{AccessClaims, JwtService, RefreshClaims, TokenPair};
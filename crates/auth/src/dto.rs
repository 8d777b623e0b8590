//! Request/response bodies for the auth HTTP surface (`POST /api/register`,
//! `POST /api/login`). Validated with `validator`, matching the teacher's
//! `erp-auth::dto` shape.

use sentinel_core::UserCtx;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
    pub sector: Option<String>,
    pub contact: Option<String>,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = 1, max = 10_000))]
    pub max_cameras: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub admin_username: String,
    #[validate(email)]
    pub admin_email: String,
    #[validate(length(min = 8, max = 256))]
    pub admin_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub company_id: Uuid,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub session_id: String,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: String,
    pub permissions: Vec<String>,
}

impl LoginResponse {
    pub fn new(session_id: String, user_ctx: &UserCtx) -> Self {
        Self {
            session_id,
            user_id: user_ctx.user_id.0,
            company_id: user_ctx.company_id.0,
            role: format!("{:?}", user_ctx.role).to_lowercase(),
            permissions: user_ctx.permissions.clone(),
        }
    }
}

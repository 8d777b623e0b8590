//! Row types returned by the repositories. These are deliberately the same
//! shape as the database rows (mirrors the teacher's `Tenant`/`User` structs in
//! `erp-auth::models`); callers above `sentinel-store` see only these, never a
//! raw `sqlx::Row`.

use chrono::{DateTime, Utc};
use sentinel_core::{
    AuthType, CameraProtocol, CameraStatus, CompanyStatus, PpeClass, RequiredPpe, Role,
    UserStatus, ViolationSeverity,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Company {
    pub company_id: Uuid,
    pub company_name: String,
    pub sector: Option<String>,
    pub contact: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub max_cameras: i32,
    pub subscription_type: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub status: CompanyStatus,
    pub api_key: String,
    pub required_ppe: Json<RequiredPpe>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub permissions: Json<Vec<String>>,
    pub last_login: Option<DateTime<Utc>>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Camera {
    pub camera_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<i32>,
    pub protocol: CameraProtocol,
    pub stream_path: Option<String>,
    pub auth_type: AuthType,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub resolution_width: Option<i32>,
    pub resolution_height: Option<i32>,
    pub fps: i32,
    pub status: CameraStatus,
    pub last_detection: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Detection {
    pub detection_id: Uuid,
    pub company_id: Uuid,
    pub camera_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total_people: i32,
    pub compliant_people: i32,
    pub violation_people: i32,
    pub compliance_rate: f32,
    pub confidence_score: f32,
    pub image_path: Option<String>,
    pub detection_data: Json<serde_json::Value>,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Violation {
    pub violation_id: Uuid,
    pub company_id: Uuid,
    pub camera_id: Uuid,
    pub user_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub violation_type: String,
    pub missing_ppe: Json<Vec<PpeClass>>,
    pub severity: ViolationSeverity,
    pub penalty_amount: f32,
    pub image_path: Option<String>,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Request shape for `TenantStore::CreateCompany`. The bootstrap admin's
/// credentials travel alongside the company fields since both rows are
/// created in one operation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub company_name: String,
    pub sector: Option<String>,
    pub contact: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub max_cameras: Option<i32>,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password_hash: String,
}

/// Fields accepted by `AddCamera`/`UpdateCamera`. All optional so the same
/// shape serves a partial `PUT`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraFields {
    pub name: Option<String>,
    pub location: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<i32>,
    pub protocol: Option<CameraProtocol>,
    pub stream_path: Option<String>,
    pub auth_type: Option<AuthType>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub resolution_width: Option<i32>,
    pub resolution_height: Option<i32>,
    pub fps: Option<i32>,
    pub status: Option<CameraStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDetection {
    pub company_id: Uuid,
    pub camera_id: Uuid,
    pub total_people: i32,
    pub compliant_people: i32,
    pub violation_people: i32,
    pub compliance_rate: f32,
    pub confidence_score: f32,
    pub image_path: Option<String>,
    pub detection_data: serde_json::Value,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewViolation {
    pub company_id: Uuid,
    pub camera_id: Uuid,
    pub user_id: Option<Uuid>,
    pub violation_type: String,
    pub missing_ppe: Vec<PpeClass>,
    pub severity: ViolationSeverity,
    pub penalty_amount: f32,
    pub image_path: Option<String>,
}

/// `GetStats` response. Trend fields are percentages, see
/// `stats::compute_trend` for the formula.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyStats {
    pub today_detections: i64,
    pub today_violations: i64,
    pub active_cameras: i64,
    pub monthly_violations: i64,
    pub violations_trend: i64,
    pub detections_trend: i64,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "axum")]
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Json,
};

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(CompanyId);
uuid_id!(UserId);
uuid_id!(CameraId);
uuid_id!(DetectionId);
uuid_id!(ViolationId);

/// Opaque bearer token, never a JWT. Carries no tenant information in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Operator,
    Viewer,
}

impl Role {
    /// Coarse permission set derived from role; fine-grained overrides are stored
    /// per-user in `users.permissions` and merged on top of this set.
    pub fn default_permissions(&self) -> Vec<String> {
        match self {
            Role::Admin => vec![
                "cameras:write".into(),
                "cameras:read".into(),
                "detection:control".into(),
                "stats:read".into(),
                "company:manage".into(),
            ],
            Role::Manager => vec![
                "cameras:write".into(),
                "cameras:read".into(),
                "detection:control".into(),
                "stats:read".into(),
            ],
            Role::Operator => vec!["cameras:read".into(), "detection:control".into()],
            Role::Viewer => vec!["cameras:read".into(), "stats:read".into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Active,
    Inactive,
    Error,
    Discovered,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CameraProtocol {
    Http,
    Rtsp,
    Local,
    Usb,
    IpWebcam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    None,
    Basic,
    Digest,
}

/// The closed set of protective equipment classes the detector can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PpeClass {
    Helmet,
    SafetyVest,
    SafetyShoes,
    Gloves,
    Glasses,
    FaceMask,
    Hairnet,
    Apron,
    SafetySuit,
}

impl fmt::Display for PpeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PpeClass::Helmet => "helmet",
            PpeClass::SafetyVest => "safety_vest",
            PpeClass::SafetyShoes => "safety_shoes",
            PpeClass::Gloves => "gloves",
            PpeClass::Glasses => "glasses",
            PpeClass::FaceMask => "face_mask",
            PpeClass::Hairnet => "hairnet",
            PpeClass::Apron => "apron",
            PpeClass::SafetySuit => "safety_suit",
        };
        write!(f, "{s}")
    }
}

impl PpeClass {
    /// `violation_type` string stored on the Violation row for the given missing class.
    pub fn violation_type(&self) -> String {
        format!("no_{}", self.no_prefix_suffix())
    }

    fn no_prefix_suffix(&self) -> &'static str {
        match self {
            PpeClass::Helmet => "helmet",
            PpeClass::SafetyVest => "vest",
            PpeClass::SafetyShoes => "shoes",
            PpeClass::Gloves => "gloves",
            PpeClass::Glasses => "glasses",
            PpeClass::FaceMask => "mask",
            PpeClass::Hairnet => "hairnet",
            PpeClass::Apron => "apron",
            PpeClass::SafetySuit => "suit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequiredPpe {
    pub required: Vec<PpeClass>,
    pub optional: Vec<PpeClass>,
}

/// Identity + tenant scope attached to a request after `Authorize` succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCtx {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl UserCtx {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Per-request context, populated by the auth middleware and extracted by handlers.
/// Mirrors the teacher's `RequestContext` extractor shape.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_ctx: Option<UserCtx>,
    pub request_id: String,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            user_ctx: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_user_ctx(mut self, ctx: UserCtx) -> Self {
        self.user_ctx = Some(ctx);
        self
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = request_id;
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "axum")]
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "authentication required" })),
            )
        })
    }
}

/// Authenticated user, attached to the request once `Authorize` validates the session.
#[cfg(feature = "axum")]
#[async_trait]
impl<S> FromRequestParts<S> for UserCtx
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.user_ctx.clone())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "authentication required" })),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

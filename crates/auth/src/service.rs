//! Session/Auth (C7): `register`, `login`, `logout`. Everything else the
//! teacher's `erp-auth::service` covered (2FA, password reset, email
//! verification, role/permission CRUD) has no counterpart in this service's
//! scope and lives only in the teacher's original tree.

use crate::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use sentinel_core::security::PasswordHasher;
use sentinel_core::session::SessionManager;
use sentinel_core::{Error, ErrorCode, Role, UserCtx};
use sentinel_store::{NewCompany, TenantStore};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<TenantStore>,
    sessions: Arc<SessionManager>,
    hasher: Arc<PasswordHasher>,
}

impl AuthService {
    pub fn new(store: Arc<TenantStore>, sessions: Arc<SessionManager>, hasher: Arc<PasswordHasher>) -> Self {
        Self { store, sessions, hasher }
    }

    /// Creates the company and its bootstrap admin user. The password is
    /// hashed here so `sentinel-store` never sees a plaintext credential.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, Error> {
        sentinel_core::utils::validate_password(&req.admin_password)
            .map_err(|msg| Error::validation(msg))?;

        let admin_password_hash = self.hasher.hash_password(&req.admin_password)?;

        let (company_id, api_key) = self
            .store
            .create_company(NewCompany {
                company_name: req.company_name,
                sector: req.sector,
                contact: req.contact,
                email: req.email,
                phone: req.phone,
                address: req.address,
                max_cameras: req.max_cameras,
                admin_username: req.admin_username,
                admin_email: req.admin_email,
                admin_password_hash,
            })
            .await?;

        info!(%company_id, "company registered");
        Ok(RegisterResponse { company_id, api_key })
    }

    /// `Login(email, password) -> (session_id, user_ctx) | Err` per §4.7.
    pub async fn login(
        &self,
        req: LoginRequest,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<LoginResponse, Error> {
        let Some((user, company)) = self.store.find_user_for_login(&req.email).await? else {
            return Err(bad_credentials());
        };

        self.store.require_active_pair(&user, &company).await?;

        let verified = self.hasher.verify_password(&req.password, &user.password_hash)?;
        if !verified {
            warn!(user_id = %user.user_id, "login failed: bad password");
            return Err(bad_credentials());
        }

        self.store.touch_last_login(user.user_id).await?;

        let session = self
            .sessions
            .create_session(user.user_id.into(), user.company_id.into(), ip_address, user_agent)
            .await?;

        let user_ctx = UserCtx {
            user_id: user.user_id.into(),
            company_id: user.company_id.into(),
            role: user.role,
            permissions: user.permissions.0.clone(),
        };

        info!(user_id = %user.user_id, company_id = %user.company_id, "login succeeded");
        Ok(LoginResponse::new(session.session_id, &user_ctx))
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), Error> {
        self.sessions.revoke_session(session_id).await
    }

    /// Resolves a session id into a `UserCtx`, used by the auth middleware.
    pub async fn authorize(&self, session_id: &str) -> Result<UserCtx, Error> {
        let session_user = self
            .sessions
            .validate_session(session_id)
            .await?
            .ok_or_else(|| Error::unauthorized("invalid or expired session"))?;

        Ok(UserCtx {
            user_id: session_user.user_id,
            company_id: session_user.company_id,
            role: session_user.role,
            permissions: session_user.permissions,
        })
    }
}

fn bad_credentials() -> Error {
    Error::new(ErrorCode::AuthenticationFailed, "invalid email or password")
}

/// Bootstrap role check helper used by handlers that gate on a minimum role
/// (e.g. only `Admin`/`Operator` may start detection).
pub fn role_at_least(role: Role, minimum: Role) -> bool {
    rank(role) >= rank(minimum)
}

fn rank(role: Role) -> u8 {
    match role {
        Role::Viewer => 0,
        Role::Operator => 1,
        Role::Manager => 2,
        Role::Admin => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ranking_orders_admin_above_operator_above_viewer() {
        assert!(role_at_least(Role::Admin, Role::Operator));
        assert!(role_at_least(Role::Operator, Role::Viewer));
        assert!(!role_at_least(Role::Viewer, Role::Operator));
    }
}

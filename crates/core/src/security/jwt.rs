//! Bearer-token issuance for API clients that prefer a stateless `Authorization: Bearer`
//! header over the cookie-backed session that the dashboard uses. Optional: the primary
//! authentication path is `sentinel-auth`'s Postgres-backed session (see `crate::session`).

use crate::config::SecurityConfig;
use crate::error::{Error, ErrorCode, Result};
use crate::types::{CompanyId, Role, UserId};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub company_id: String,
    pub role: Role,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub company_id: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: Duration,
    refresh_token_expiry: Duration,
}

impl JwtService {
    pub fn new(secret_key: &str, _security: &SecurityConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            access_token_expiry: Duration::minutes(15),
            refresh_token_expiry: Duration::hours(24),
        }
    }

    pub fn generate_token_pair(
        &self,
        user_id: UserId,
        company_id: CompanyId,
        role: Role,
        permissions: Vec<String>,
    ) -> Result<TokenPair> {
        let now = Utc::now();

        let access_claims = AccessClaims {
            sub: user_id.to_string(),
            company_id: company_id.to_string(),
            role,
            permissions,
            exp: (now + self.access_token_expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let refresh_claims = RefreshClaims {
            sub: user_id.to_string(),
            company_id: company_id.to_string(),
            exp: (now + self.refresh_token_expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS512);

        let access_token = encode(&header, &access_claims, &self.encoding_key)
            .map_err(|e| Error::new(ErrorCode::TokenInvalid, format!("failed to sign access token: {e}")))?;
        let refresh_token = encode(&header, &refresh_claims, &self.encoding_key)
            .map_err(|e| Error::new(ErrorCode::TokenInvalid, format!("failed to sign refresh token: {e}")))?;

        Ok(TokenPair { access_token, refresh_token })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = true;

        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| Error::new(ErrorCode::TokenInvalid, format!("invalid access token: {e}")))?;
        Ok(data.claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = true;

        let data = decode::<RefreshClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| Error::new(ErrorCode::TokenInvalid, format!("invalid refresh token: {e}")))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(&"x".repeat(32), &SecurityConfig::default())
    }

    #[test]
    fn round_trips_access_claims() {
        let svc = service();
        let user_id = UserId::new();
        let company_id = CompanyId::new();
        let pair = svc
            .generate_token_pair(user_id, company_id, Role::Operator, vec!["cameras:read".into()])
            .unwrap();

        let claims = svc.verify_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.company_id, company_id.to_string());
    }

    #[test]
    fn rejects_tampered_token() {
        let svc = service();
        let mut pair = svc
            .generate_token_pair(UserId::new(), CompanyId::new(), Role::Viewer, vec![])
            .unwrap();
        pair.access_token.push('x');
        assert!(svc.verify_access_token(&pair.access_token).is_err());
    }
}

use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{Header, Validation};
use platform_api::ApiError;
use platform_authz::{Principal, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

/// Bearer token claims. `tenant: None` marks a platform-scoped principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub perms: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

impl SessionClaims {
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            tenant: self.tenant.map(TenantId::from),
            roles: self.roles,
            permissions: self.perms,
            active: true,
        }
    }
}

pub fn issue_token(
    principal: &Principal,
    config: &AppConfig,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: principal.id,
        tenant: principal.tenant.as_ref().map(|t| t.as_str().to_string()),
        roles: principal.roles.clone(),
        perms: principal.permissions.clone(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(
    token: &str,
    config: &AppConfig,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

/// Extract the acting principal from the `Authorization: Bearer` header.
pub fn bearer_principal(headers: &HeaderMap, config: &AppConfig) -> Result<Principal, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = value.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
    let claims = decode_token(token.trim(), config).map_err(|_| ApiError::Unauthorized)?;
    Ok(claims.into_principal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn test_config() -> AppConfig {
        AppConfig {
            jwt_secret: vec![7u8; 32],
            session_ttl_minutes: 60,
            hide_forbidden: true,
            cors_allowed_origins: Vec::new(),
        }
    }

    #[test]
    fn tokens_round_trip_the_principal() {
        let config = test_config();
        let principal = Principal::member_of("alpha", Uuid::new_v4())
            .with_roles(["engineer"])
            .with_permissions(["documents.share"]);
        let token = issue_token(&principal, &config).unwrap();
        let claims = decode_token(&token, &config).unwrap();
        let decoded = claims.into_principal();
        assert_eq!(decoded.id, principal.id);
        assert_eq!(decoded.tenant, principal.tenant);
        assert_eq!(decoded.roles, principal.roles);
        assert_eq!(decoded.permissions, principal.permissions);
        assert!(decoded.active);
    }

    #[test]
    fn bearer_extraction_rejects_malformed_headers() {
        let config = test_config();
        let mut headers = HeaderMap::new();
        assert!(bearer_principal(&headers, &config).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_principal(&headers, &config).is_err());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-jwt"),
        );
        assert!(bearer_principal(&headers, &config).is_err());
    }

    #[test]
    fn bearer_extraction_accepts_issued_tokens() {
        let config = test_config();
        let principal = Principal::super_admin(Uuid::new_v4());
        let token = issue_token(&principal, &config).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let decoded = bearer_principal(&headers, &config).unwrap();
        assert_eq!(decoded.id, principal.id);
        assert!(decoded.tenant.is_none());
    }
}

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{DecodingKey, EncodingKey};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: Vec<u8>,
    pub session_ttl_minutes: i64,
    pub hide_forbidden: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let jwt_secret =
            std::env::var("SITEDESK_JWT_SECRET_BASE64").context("SITEDESK_JWT_SECRET_BASE64 missing")?;
        let jwt_secret = STANDARD
            .decode(jwt_secret.trim())
            .context("invalid SITEDESK_JWT_SECRET_BASE64")?;
        if jwt_secret.len() < 32 {
            return Err(anyhow!(
                "SITEDESK_JWT_SECRET_BASE64 must decode to at least 32 bytes"
            ));
        }

        let session_ttl_minutes = std::env::var("SITEDESK_SESSION_TTL_MINUTES")
            .ok()
            .map(|val| val.parse::<i64>())
            .transpose()
            .context("invalid SITEDESK_SESSION_TTL_MINUTES")?
            .unwrap_or(480);

        let hide_forbidden = std::env::var("SITEDESK_HIDE_FORBIDDEN")
            .ok()
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        let cors_allowed_origins = std::env::var("SITEDESK_CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            jwt_secret,
            session_ttl_minutes,
            hide_forbidden,
            cors_allowed_origins,
        })
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.jwt_secret)
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.jwt_secret)
    }
}

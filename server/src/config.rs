use anyhow::{Context, Result, anyhow};
use api::auth::AuthConfig;
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};

#[derive(Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub cookie_key: Key,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let defaults = AuthConfig::default();
        let admin_username =
            std::env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username);
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password);
        let session_ttl_hours = match std::env::var("SESSION_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .context("SESSION_TTL_HOURS must be an integer")?,
            Err(_) => defaults.session_ttl_hours,
        };
        if session_ttl_hours <= 0 {
            return Err(anyhow!("SESSION_TTL_HOURS must be positive"));
        }

        let cookie_secret =
            std::env::var("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let cookie_key = cookie_key_from_b64(&cookie_secret)?;

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
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
            auth: AuthConfig {
                admin_username,
                admin_password,
                session_ttl_hours,
            },
            cookie_key,
            cors_allowed_origins,
        })
    }
}

/// Decode the base64 cookie secret. `Key::from` wants the full 64 bytes of
/// signing plus encryption material and panics on anything shorter.
fn cookie_key_from_b64(encoded: &str) -> Result<Key> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("invalid COOKIE_SECRET_BASE64")?;
    if bytes.len() < 64 {
        return Err(anyhow!(
            "COOKIE_SECRET_BASE64 must decode to at least 64 bytes"
        ));
    }
    Ok(Key::from(&bytes))
}

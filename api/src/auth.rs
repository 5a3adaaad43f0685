//! Single-credential login backed by database sessions and an encrypted
//! session cookie.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use entity::sessions;
use sea_orm::{EntityTrait, Set};
use serde::{Deserialize, Serialize};
use time::Duration as TimeDuration;
use tracing::info;
use uuid::Uuid;

use crate::{error::{ApiError, ApiResult}, state::AppState};

pub const SESSION_COOKIE: &str = "__Host-rentas_session";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        // The credential the legacy dashboards shipped with; overridden
        // through ADMIN_USERNAME / ADMIN_PASSWORD in real deployments.
        Self {
            admin_username: "admin".into(),
            admin_password: "1234".into(),
            session_ttl_hours: 12,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<(PrivateCookieJar, Json<SessionInfo>)> {
    if body.username != state.auth.admin_username || body.password != state.auth.admin_password {
        return Err(ApiError::Unauthorized);
    }

    let session_id = Uuid::new_v4();
    let now = Utc::now();
    let expires_at = now + Duration::hours(state.auth.session_ttl_hours);
    // The id is generated here; skip the driver's last-insert id, which
    // SQLite cannot express as a uuid.
    let session = sessions::ActiveModel {
        id: Set(session_id),
        username: Set(body.username.clone()),
        created_at: Set(now.into()),
        expires_at: Set(expires_at.into()),
        ip: Set(None),
        user_agent: Set(None),
    };
    sessions::Entity::insert(session)
        .exec_without_returning(&state.pool)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::hours(state.auth.session_ttl_hours))
        .build();
    info!(username = %body.username, "operator logged in");
    Ok((
        jar.add(cookie),
        Json(SessionInfo {
            username: body.username,
            expires_at,
        }),
    ))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<(PrivateCookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session_id) = Uuid::parse_str(cookie.value()) {
            let _ = sessions::Entity::delete_by_id(session_id)
                .exec(&state.pool)
                .await;
        }
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

pub async fn me_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<Json<SessionInfo>> {
    let session = require_session(&state, &jar).await?;
    Ok(Json(SessionInfo {
        username: session.username,
        expires_at: session.expires_at.with_timezone(&Utc),
    }))
}

/// Resolve the session cookie to a live session row. Expired sessions are
/// deleted on sight.
pub async fn require_session(
    state: &AppState,
    jar: &PrivateCookieJar,
) -> ApiResult<sessions::Model> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
    let session_id = Uuid::parse_str(cookie.value()).map_err(|_| ApiError::Unauthorized)?;
    let session = sessions::Entity::find_by_id(session_id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if session.expires_at.with_timezone(&Utc) < Utc::now() {
        let _ = sessions::Entity::delete_by_id(session_id)
            .exec(&state.pool)
            .await;
        return Err(ApiError::Unauthorized);
    }
    Ok(session)
}

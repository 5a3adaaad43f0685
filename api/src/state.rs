use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use platform_db::DbPool;

use crate::auth::AuthConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth: Arc<AuthConfig>,
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Present only when JWT settings are configured; `None` disables auth.
    pub verifier: Option<Arc<TokenVerifier>>,
}

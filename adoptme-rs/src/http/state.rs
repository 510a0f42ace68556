use std::sync::Arc;

use serde_json::Value;

use crate::auth::SessionKeys;
use crate::db::Database;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionKeys,
    /// Assembled once at startup.
    pub openapi: Arc<Value>,
}

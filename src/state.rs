use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::store::Store;
use crate::uploads::UploadDir;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub store: Store,
    pub config: Arc<Config>,
    pub tokens: TokenIssuer,
    pub uploads: UploadDir,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let lifetime = config.auth.token_lifetime().unwrap_or_else(|e| {
            tracing::warn!("{}; using the default token lifetime", e);
            chrono::Duration::days(7)
        });
        let tokens = TokenIssuer::from_config(config.auth.jwt_secret.as_deref(), lifetime);
        let uploads = UploadDir::new(config.storage_path());

        Self {
            store: Store::new(db.clone()),
            db,
            config: Arc::new(config),
            tokens,
            uploads,
        }
    }
}

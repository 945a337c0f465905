use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{AccountRepo, PgAccountRepo},
    },
    books::repo::{BookRepo, PgBookRepo},
    config::AppConfig,
    db,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtKeys>,
    pub accounts: Arc<dyn AccountRepo>,
    pub books: Arc<dyn BookRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config).await?;

        let accounts = Arc::new(PgAccountRepo::new(pool.clone())) as Arc<dyn AccountRepo>;
        let books = Arc::new(PgBookRepo::new(pool)) as Arc<dyn BookRepo>;

        Ok(Self::from_parts(config, accounts, books))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        accounts: Arc<dyn AccountRepo>,
        books: Arc<dyn BookRepo>,
    ) -> Self {
        let jwt = Arc::new(JwtKeys::new(&config.jwt));
        Self {
            config,
            jwt,
            accounts,
            books,
        }
    }
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::users::{memory::MemoryUserStore, repo::PgUserStore, repo::UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = match config.store {
            StoreBackend::Postgres => Arc::new(PgUserStore::new(db::connect(&config).await?)),
            StoreBackend::Memory => Arc::new(MemoryUserStore::new()),
        };
        info!(store = ?config.store, "user store opened");
        Ok(Self::from_parts(users, Arc::new(config)))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// Closes the store. Call once, after the server has stopped.
    pub async fn close(&self) {
        self.users.close().await;
        info!("user store closed");
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            seed_default_users: false,
        });
        Self::from_parts(Arc::new(MemoryUserStore::new()), config)
    }
}

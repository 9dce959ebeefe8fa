use crate::catalog::Catalog;
use crate::config::{AppConfig, JwtConfig, ReportConfig, StorageConfig};
use crate::storage::{MemoryStore, PgStore, Store};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.storage {
            StorageConfig::Postgres {
                database_url,
                max_connections,
            } => {
                let pg = PgStore::connect(database_url, *max_connections).await?;
                pg.migrate().await?;
                Arc::new(pg) as Arc<dyn Store>
            }
            StorageConfig::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Ok(Self::from_parts(config, store, Arc::new(Catalog::builtin())))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn Store>, catalog: Arc<Catalog>) -> Self {
        Self {
            config,
            store,
            catalog,
        }
    }

    /// In-memory state with fixed JWT settings, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            storage: StorageConfig::Memory,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            reports: ReportConfig::default(),
        });

        Self::from_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(Catalog::builtin()),
        )
    }
}

//! 启动流程：连接数据库并完成迁移

use thiserror::Error;
use tracing::{error, info};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database::PgStore;
use crate::infrastructure::error::StoreError;
use crate::infrastructure::migrations::{MigrationError, MigrationStore, Migrator};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Connect(#[from] StoreError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// 执行全部待执行迁移；失败时调用方必须中止启动
pub async fn run_migrations(
    store: &dyn MigrationStore,
    config: &AppConfig,
) -> Result<Vec<String>, MigrationError> {
    let applied = Migrator::new(store, &config.migrations_dir).run().await?;
    info!(
        dir = %config.migrations_dir.display(),
        applied = applied.len(),
        "Migrations complete"
    );
    Ok(applied)
}

/// 建立连接池并迁移到最新结构
pub async fn init_database(config: &AppConfig) -> Result<PgStore, StartupError> {
    let store = PgStore::connect(&config.database).await.map_err(|e| {
        error!(error = %e, "database initialization failed");
        e
    })?;

    if let Err(err) = run_migrations(&store, config).await {
        store.close().await;
        return Err(err.into());
    }

    info!("Database initialized and migrations applied");
    Ok(store)
}

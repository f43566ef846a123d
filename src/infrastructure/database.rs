//! 数据库基础设施

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    Executor,
};
use std::time::Duration;
use tracing::info;

use super::config::DatabaseConfig;
use super::error::StoreError;
use super::migrations::MigrationStore;
use crate::app::health::HealthProbe;
use crate::app::users::{model::User, repository::UserRepository};

/// PostgreSQL 存储，持有连接池
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            user = %config.user,
            "Connecting to database"
        );

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(8))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>("SELECT uuid, fullname, study_level, age FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find(&self, uuid: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT uuid, fullname, study_level, age FROM users WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (uuid, fullname, study_level, age) VALUES ($1, $2, $3, $4)")
            .bind(&user.uuid)
            .bind(&user.fullname)
            .bind(&user.study_level)
            .bind(user.age)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE users SET fullname = $1, study_level = $2, age = $3 WHERE uuid = $4")
                .bind(&user.fullname)
                .bind(&user.study_level)
                .bind(user.age)
                .bind(&user.uuid)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, uuid: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl HealthProbe for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MigrationStore for PgStore {
    async fn ensure_bookkeeping(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                id VARCHAR(255) PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_applied(&self, id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT id FROM migrations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn apply(&self, id: &str, sql: &str, applied_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // 未绑定参数的字符串走简单查询协议，允许一个脚本包含多条语句
        (&mut *tx).execute(sql).await?;

        sqlx::query("INSERT INTO migrations (id, applied_at) VALUES ($1, $2)")
            .bind(id)
            .bind(applied_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

//! 数据库迁移
//!
//! 迁移脚本是迁移目录下以 `.sql` 结尾的文件，按文件名字典序执行，
//! 文件名即迁移标识。已执行的标识记录在 `migrations` 表中，重启后不会重复执行。

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use super::error::StoreError;

/// 迁移记录表
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// 建表（若不存在）
    async fn ensure_bookkeeping(&self) -> Result<(), StoreError>;

    async fn is_applied(&self, id: &str) -> Result<bool, StoreError>;

    /// 执行脚本并写入记录，二者要么都生效，要么都不生效
    async fn apply(&self, id: &str, sql: &str, applied_at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to prepare migrations table: {0}")]
    Bookkeeping(#[source] StoreError),

    #[error("failed to list migrations in {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read migration {script}: {source}")]
    ReadScript {
        script: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to apply migration {script}: {source}")]
    Apply {
        script: String,
        #[source]
        source: StoreError,
    },
}

impl MigrationError {
    /// 出错的脚本名（若已知）
    pub fn script(&self) -> Option<&str> {
        match self {
            MigrationError::ReadScript { script, .. } | MigrationError::Apply { script, .. } => {
                Some(script)
            }
            _ => None,
        }
    }
}

/// 迁移目录中的一个脚本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub id: String,
    pub path: PathBuf,
}

/// 列出迁移脚本并按文件名排序；目录不存在时返回空列表
pub async fn discover_scripts(dir: &Path) -> Result<Vec<MigrationScript>, MigrationError> {
    let read_dir_err = |source| MigrationError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(read_dir_err(err)),
    };

    let mut scripts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let id = match entry.file_name().into_string() {
            Ok(id) => id,
            Err(raw) => {
                if raw.to_string_lossy().ends_with(".sql") {
                    warn!(
                        file = %raw.to_string_lossy(),
                        "skipping migration with non UTF-8 file name"
                    );
                }
                continue;
            }
        };
        if !id.ends_with(".sql") {
            continue;
        }
        if !entry.file_type().await.map_err(read_dir_err)?.is_file() {
            continue;
        }
        scripts.push(MigrationScript {
            id,
            path: entry.path(),
        });
    }

    scripts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(scripts)
}

/// 启动期迁移执行器，每个进程只运行一次
pub struct Migrator<'a> {
    store: &'a dyn MigrationStore,
    dir: PathBuf,
}

impl<'a> Migrator<'a> {
    pub fn new(store: &'a dyn MigrationStore, dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.into(),
        }
    }

    /// 依次执行尚未记录的脚本，返回本次执行的脚本名
    ///
    /// 任意一步失败立即返回错误，后续脚本不会执行。
    pub async fn run(self) -> Result<Vec<String>, MigrationError> {
        let result = self.run_inner().await;
        if let Err(err) = &result {
            error!(script = err.script(), error = %err, "migration failed");
        }
        result
    }

    async fn run_inner(&self) -> Result<Vec<String>, MigrationError> {
        self.store
            .ensure_bookkeeping()
            .await
            .map_err(MigrationError::Bookkeeping)?;

        let mut applied = Vec::new();
        for script in discover_scripts(&self.dir).await? {
            let already = self
                .store
                .is_applied(&script.id)
                .await
                .map_err(MigrationError::Bookkeeping)?;
            if already {
                continue;
            }

            let sql = tokio::fs::read_to_string(&script.path)
                .await
                .map_err(|source| MigrationError::ReadScript {
                    script: script.id.clone(),
                    source,
                })?;

            info!(file = %script.id, "Applying migration");
            self.store
                .apply(&script.id, &sql, Utc::now())
                .await
                .map_err(|source| MigrationError::Apply {
                    script: script.id.clone(),
                    source,
                })?;
            info!(file = %script.id, "Migration applied");

            applied.push(script.id);
        }

        Ok(applied)
    }
}

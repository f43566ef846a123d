//! 内存存储
//!
//! 与 [`PgStore`](super::database::PgStore) 实现相同的接口，用于测试和本地试验。
//! 可以切换为不可用状态，模拟存储无法连接。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreError;
use super::migrations::MigrationStore;
use crate::app::health::HealthProbe;
use crate::app::users::{model::User, repository::UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    migrations: BTreeMap<String, DateTime<Utc>>,
    executed: Vec<String>,
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 已执行的迁移脚本，按执行顺序
    pub fn executed_scripts(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn applied_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.lock().migrations.get(id).copied()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // 持锁期间不会 panic，被毒化时沿用内部数据
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        Ok(self.lock().users.clone())
    }

    async fn find(&self, uuid: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.lock().users.iter().find(|u| u.uuid == uuid).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.uuid == user.uuid) {
            return Err(StoreError::Constraint(format!("duplicate key {}", user.uuid)));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<u64, StoreError> {
        self.check()?;
        let mut tables = self.lock();
        match tables.users.iter_mut().find(|u| u.uuid == user.uuid) {
            Some(existing) => {
                *existing = user.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, uuid: &str) -> Result<u64, StoreError> {
        self.check()?;
        let mut tables = self.lock();
        let before = tables.users.len();
        tables.users.retain(|u| u.uuid != uuid);
        Ok((before - tables.users.len()) as u64)
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

#[async_trait]
impl MigrationStore for MemoryStore {
    async fn ensure_bookkeeping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn is_applied(&self, id: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.lock().migrations.contains_key(id))
    }

    async fn apply(&self, id: &str, _sql: &str, applied_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.lock();
        if tables.migrations.contains_key(id) {
            return Err(StoreError::Constraint(format!("migration {} already recorded", id)));
        }
        tables.migrations.insert(id.to_string(), applied_at);
        tables.executed.push(id.to_string());
        Ok(())
    }
}

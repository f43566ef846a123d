//! 用户存储接口

use async_trait::async_trait;

use super::model::User;
use crate::infrastructure::error::StoreError;

/// 用户表的读写操作
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 全部记录，顺序由存储决定
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn find(&self, uuid: &str) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// 覆盖三个可变字段，返回受影响行数
    async fn update(&self, user: &User) -> Result<u64, StoreError>;

    /// 返回受影响行数
    async fn delete(&self, uuid: &str) -> Result<u64, StoreError>;
}

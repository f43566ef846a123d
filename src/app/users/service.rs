//! 用户业务服务

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use super::model::{User, UserPayload};
use super::repository::UserRepository;
use super::validator::parse_user;
use crate::core::error::CoreError;
use crate::infrastructure::error::StoreError;

const NOT_FOUND_MESSAGE: &str = "User not found";
const INVALID_DATA_MESSAGE: &str = "Invalid user data";

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        let users = self
            .repository
            .list()
            .await
            .map_err(|e| store_failure("list users", None, e))?;

        info!(count = users.len(), "GET /api/users");
        Ok(users)
    }

    pub async fn get_user(&self, uuid: &str) -> Result<User, CoreError> {
        let user = self
            .repository
            .find(uuid)
            .await
            .map_err(|e| store_failure("get user", Some(uuid), e))?;

        match user {
            Some(user) => {
                info!(uuid, "GET /api/users/:uuid - found");
                Ok(user)
            }
            None => {
                warn!(uuid, "GET /api/users/:uuid - not found");
                Err(CoreError::NotFound(NOT_FOUND_MESSAGE.to_string()))
            }
        }
    }

    pub async fn create_user(&self, body: &Value) -> Result<User, CoreError> {
        let payload = validated(body, "POST /api/users - invalid data")?;
        let user = User::create(payload);

        self.repository
            .insert(&user)
            .await
            .map_err(|e| store_failure("create user", Some(&user.uuid), e))?;

        info!(uuid = %user.uuid, "POST /api/users - created");
        Ok(user)
    }

    /// 整体替换三个可变字段
    ///
    /// 存在性检查与更新不在同一事务内：两者之间被并发删除时仍返回新表示。
    pub async fn update_user(&self, uuid: &str, body: &Value) -> Result<User, CoreError> {
        let payload = validated(body, "PUT /api/users/:uuid - invalid data")?;

        let existing = self
            .repository
            .find(uuid)
            .await
            .map_err(|e| store_failure("update user", Some(uuid), e))?;

        if existing.is_none() {
            warn!(uuid, "PUT /api/users/:uuid - not found");
            return Err(CoreError::NotFound(NOT_FOUND_MESSAGE.to_string()));
        }

        let user = User::with_uuid(uuid.to_string(), payload);
        self.repository
            .update(&user)
            .await
            .map_err(|e| store_failure("update user", Some(uuid), e))?;

        info!(uuid, "PUT /api/users/:uuid - updated");
        Ok(user)
    }

    pub async fn delete_user(&self, uuid: &str) -> Result<(), CoreError> {
        let affected = self
            .repository
            .delete(uuid)
            .await
            .map_err(|e| store_failure("delete user", Some(uuid), e))?;

        if affected == 0 {
            warn!(uuid, "DELETE /api/users/:uuid - not found");
            return Err(CoreError::NotFound(NOT_FOUND_MESSAGE.to_string()));
        }

        info!(uuid, "DELETE /api/users/:uuid - deleted");
        Ok(())
    }
}

fn validated(body: &Value, context: &'static str) -> Result<UserPayload, CoreError> {
    parse_user(body).map_err(|failure| {
        warn!(body = %body, reason = %failure, "{}", context);
        CoreError::BadRequest(INVALID_DATA_MESSAGE.to_string())
    })
}

fn store_failure(operation: &'static str, uuid: Option<&str>, err: StoreError) -> CoreError {
    error!(operation, uuid, error = %err, "store operation failed");
    CoreError::Store(err)
}

//! 用户数据模型

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 持久化的用户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub uuid: String,
    pub fullname: String,
    pub study_level: String,
    pub age: i32,
}

impl User {
    /// 以新生成的 v4 标识创建记录
    pub fn create(payload: UserPayload) -> Self {
        Self::with_uuid(uuid::Uuid::new_v4().to_string(), payload)
    }

    pub fn with_uuid(uuid: String, payload: UserPayload) -> Self {
        Self {
            uuid,
            fullname: payload.fullname,
            study_level: payload.study_level,
            age: payload.age,
        }
    }
}

/// 创建/更新请求体，仅在通过校验后构造
///
/// 长度上限与 `users` 表的列宽一致（按字符计）。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct UserPayload {
    #[validate(length(min = 1, max = 255, message = "fullname must be 1 to 255 characters"))]
    pub fullname: String,

    #[validate(length(min = 1, max = 100, message = "study_level must be 1 to 100 characters"))]
    pub study_level: String,

    #[validate(range(min = 1, message = "age must be a positive integer"))]
    pub age: i32,
}

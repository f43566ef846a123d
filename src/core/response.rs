//! 核心响应处理模块

use serde::{Deserialize, Serialize};

/// 仅包含确认信息的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

impl HealthResponse {
    pub fn connected() -> Self {
        Self {
            status: "OK".to_string(),
            database: "connected".to_string(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: "ERROR".to_string(),
            database: "disconnected".to_string(),
        }
    }
}

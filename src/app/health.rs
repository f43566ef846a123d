//! 存活探针

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info};

use crate::app::AppState;
use crate::core::response::HealthResponse;
use crate::infrastructure::error::StoreError;

/// 对存储做一次最简单的往返查询
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct HealthService {
    probe: Arc<dyn HealthProbe>,
}

impl HealthService {
    pub fn new(probe: Arc<dyn HealthProbe>) -> Self {
        Self { probe }
    }

    pub async fn check(&self) -> Result<(), StoreError> {
        self.probe.ping().await
    }
}

/// 只会返回 200 或 500
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.health.check().await {
        Ok(()) => {
            info!("/health - OK");
            (StatusCode::OK, Json(HealthResponse::connected()))
        }
        Err(err) => {
            error!(error = %err, "/health failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse::disconnected()),
            )
        }
    }
}

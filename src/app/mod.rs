//! 路由与应用状态

pub mod health;
pub mod users;

use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::middleware::request_logging_middleware;
use health::{HealthProbe, HealthService};
use users::{repository::UserRepository, service::UserService};

/// 处理器共享的状态；存储句柄在构造时注入，之后只读
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub health: HealthService,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            user_service: UserService::new(users),
            health: HealthService::new(probe),
        }
    }

    /// 同一个存储同时提供用户表访问和健康探针
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + HealthProbe + 'static,
    {
        Self::new(store.clone(), store)
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/users",
            get(users::handler::list_users).post(users::handler::create_user),
        )
        .route(
            "/api/users/:uuid",
            get(users::handler::get_user)
                .put(users::handler::update_user)
                .delete(users::handler::delete_user),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_logging_middleware)),
        )
        .with_state(state)
}

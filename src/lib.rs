//! # 用户 CRUD 服务
//!
//! 基于 Axum + SQLx 的用户资源服务：
//! - `/api/users` 的增删改查
//! - `/health` 存活探针
//! - 启动时按文件名顺序执行 SQL 迁移

pub mod app;
pub mod bootstrap;
pub mod core;
pub mod infrastructure;

pub use app::{create_routes, AppState};
pub use infrastructure::config::AppConfig;

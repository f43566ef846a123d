//! 基础设施：配置、日志、存储、迁移

pub mod config;
pub mod database;
pub mod error;
pub mod logger;
pub mod memory;
pub mod migrations;

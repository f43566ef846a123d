//! 用户资源：模型、校验、存储接口、服务与处理器

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod validator;

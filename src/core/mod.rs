//! HTTP 边界的公共部分：错误映射、响应体、中间件

pub mod error;
pub mod middleware;
pub mod response;

//! 环境变量配置

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_LOG_DIR: &str = "/var/logs/crud";
const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// 数据库连接参数
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            database: "crud_app".to_string(),
            port: DEFAULT_DB_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database: DatabaseConfig,
    pub log_dir: PathBuf,
    pub migrations_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            database: DatabaseConfig::default(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
        }
    }
}

impl AppConfig {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意键值来源构建配置，未设置的项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let db = DatabaseConfig::default();

        Ok(Self {
            host: parse_or(&lookup, "HOST", defaults.host)?,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            database: DatabaseConfig {
                host: lookup("DB_HOST").unwrap_or(db.host),
                user: lookup("DB_USER").unwrap_or(db.user),
                password: lookup("DB_PASSWORD").unwrap_or(db.password),
                database: lookup("DB_NAME").unwrap_or(db.database),
                port: parse_or(&lookup, "DB_PORT", db.port)?,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", db.max_connections)?,
            },
            log_dir: log_dir_from_lookup(&lookup),
            migrations_dir: lookup("MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_dir),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// 只读取日志目录；其余配置非法时仍可据此初始化日志
pub fn log_dir_from_env() -> PathBuf {
    log_dir_from_lookup(&|key: &str| std::env::var(key).ok())
}

fn log_dir_from_lookup<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.database.password, "");
        assert_eq!(config.database.database, "crud_app");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.log_dir, PathBuf::from("/var/logs/crud"));
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "students"),
            ("DB_PORT", "6543"),
            ("LOG_DIR", "/tmp/crud-logs"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.user, "app");
        assert_eq!(config.database.password, "s3cret");
        assert_eq!(config.database.database, "students");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/crud-logs"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DB_PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "DB_PORT", .. }));
    }

    #[test]
    fn test_log_dir_survives_invalid_numeric_settings() {
        let lookup = lookup_from(&[("PORT", "eighty"), ("LOG_DIR", "/tmp/crud-logs")]);

        assert!(AppConfig::from_lookup(&lookup).is_err());
        assert_eq!(log_dir_from_lookup(&lookup), PathBuf::from("/tmp/crud-logs"));
        assert_eq!(log_dir_from_lookup(&|_: &str| None), PathBuf::from("/var/logs/crud"));
    }

    #[test]
    fn test_debug_output_hides_password() {
        let config = AppConfig::from_lookup(lookup_from(&[("DB_PASSWORD", "hunter2")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
    }
}

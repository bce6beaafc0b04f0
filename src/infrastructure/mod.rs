//! 基础设施层：配置、数据库连接、日志

pub mod config;
pub mod database;
pub mod logger;

pub use config::{load_config, Config, ConfigError, LoggingConfig, PostgresConfig};
pub use database::{DatabaseError, DatabaseManager, DbLogLevel};
pub use logger::Logger;

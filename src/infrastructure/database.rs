//! 数据库基础设施
//!
//! 根据 [`PostgresConfig`] 构建连接池，连接建立后先 ping 一次再交给调用方。
//! 连接池由 [`DatabaseManager`] 独占持有，通过 [`DatabaseManager::get_pool`]
//! 显式传递给各个仓库。

use std::time::Duration;

use log::LevelFilter;
use sqlx::{
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    ConnectOptions, Connection,
};
use thiserror::Error;
use tracing::{error, info};

use super::config::{ConfigError, PostgresConfig};

/// 慢查询阈值
pub const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_millis(200);

/// SQL 日志级别，按详细程度递增排序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum DbLogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
}

impl From<&str> for DbLogLevel {
    fn from(value: &str) -> Self {
        match value {
            "silent" => DbLogLevel::Silent,
            "error" => DbLogLevel::Error,
            "warn" => DbLogLevel::Warn,
            "info" => DbLogLevel::Info,
            _ => DbLogLevel::Info,
        }
    }
}

impl DbLogLevel {
    /// sqlx 语句日志级别：(所有语句, 慢查询)
    pub fn statement_filters(self) -> (LevelFilter, LevelFilter) {
        match self {
            DbLogLevel::Silent | DbLogLevel::Error => (LevelFilter::Off, LevelFilter::Off),
            DbLogLevel::Warn => (LevelFilter::Off, LevelFilter::Warn),
            DbLogLevel::Info => (LevelFilter::Info, LevelFilter::Warn),
        }
    }

    /// 失败的语句由仓库在错误路径上记录，只有 `silent` 不记录
    pub fn logs_failures(self) -> bool {
        self >= DbLogLevel::Error
    }

    fn apply(self, options: PgConnectOptions) -> PgConnectOptions {
        let (statements, slow) = self.statement_filters();
        options
            .log_statements(statements)
            .log_slow_statements(slow, SLOW_STATEMENT_THRESHOLD)
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("failed to ping database: {0}")]
    Ping(#[source] sqlx::Error),
}

/// 由配置构建连接参数
pub fn connect_options(cfg: &PostgresConfig) -> Result<PgConnectOptions, ConfigError> {
    let options = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.dbname)
        .ssl_mode(cfg.ssl_mode()?)
        .options([("TimeZone", cfg.timezone.as_str())]);

    Ok(DbLogLevel::from(cfg.log_level.as_str()).apply(options))
}

/// 由配置构建连接池参数
pub fn pool_options(cfg: &PostgresConfig) -> PgPoolOptions {
    let max_lifetime = (cfg.max_lifetime > 0).then(|| Duration::from_secs(cfg.max_lifetime));

    PgPoolOptions::new()
        .max_connections(cfg.max_open_conns)
        .min_connections(cfg.max_idle_conns.min(cfg.max_open_conns))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout))
        .max_lifetime(max_lifetime)
}

pub struct DatabaseManager {
    pool: PgPool,
    log_level: DbLogLevel,
}

impl DatabaseManager {
    /// 初始化数据库连接
    pub async fn new(cfg: &PostgresConfig) -> Result<Self, DatabaseError> {
        cfg.validate()?;
        let options = connect_options(cfg)?;

        info!("Connecting to database: {}", cfg.redacted_dsn());

        let pool = pool_options(cfg)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                DatabaseError::Connect(e)
            })?;

        let manager = Self {
            pool,
            log_level: DbLogLevel::from(cfg.log_level.as_str()),
        };
        manager.ping().await?;

        info!("Connected to PostgreSQL at {}:{}/{}", cfg.host, cfg.port, cfg.dbname);
        Ok(manager)
    }

    /// 包装一个已经建好的连接池
    pub fn from_pool(pool: PgPool, log_level: DbLogLevel) -> Self {
        Self { pool, log_level }
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// 配置的 SQL 日志级别，交给仓库决定是否记录失败语句
    pub fn log_level(&self) -> DbLogLevel {
        self.log_level
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::Ping)?;
        conn.ping().await.map_err(DatabaseError::Ping)
    }

    /// 关闭连接池，等待所有借出的连接归还
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

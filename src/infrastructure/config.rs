//! 配置管理
//!
//! 配置来源按优先级从低到高：内置默认值 → TOML 配置文件 → `PG*` 环境变量。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use sqlx::postgres::PgSslMode;
use tracing_subscriber::EnvFilter;

/// 默认的配置文件搜索路径
pub const CONFIG_PATHS: [&str; 2] = ["config.toml", "./config/config.toml"];

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 数据库配置
    pub database: PostgresConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// PostgreSQL 连接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    /// disable / allow / prefer / require / verify-ca / verify-full
    pub sslmode: String,
    /// 空闲时保留的连接数
    pub max_idle_conns: u32,
    /// 最大连接数
    pub max_open_conns: u32,
    /// 连接最大存活时间（秒），0 表示不限制
    pub max_lifetime: u64,
    /// 获取连接的超时时间（秒）
    pub acquire_timeout: u64,
    /// SQL 日志级别：silent / error / warn / info，其他值按 info 处理
    pub log_level: String,
    /// 会话时区
    pub timezone: String,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令，如 `info`、`rust_sqlx_crud=debug,sqlx=warn`
    pub level: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "gin_app".to_string(),
            sslmode: "disable".to_string(),
            max_idle_conns: 10,
            max_open_conns: 100,
            max_lifetime: 60,
            acquire_timeout: 8,
            log_level: "info".to_string(),
            timezone: "Asia/Shanghai".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PostgresConfig {
    pub fn ssl_mode(&self) -> Result<PgSslMode, ConfigError> {
        PgSslMode::from_str(&self.sslmode)
            .map_err(|_| ConfigError::Validation(format!("无效的 sslmode: {}", self.sslmode)))
    }

    /// 隐去密码的连接串，仅用于日志
    pub fn redacted_dsn(&self) -> String {
        format!(
            "host={} user={} password=*** dbname={} port={} sslmode={} TimeZone={}",
            self.host, self.user, self.dbname, self.port, self.sslmode, self.timezone
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Validation("数据库主机不能为空".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Validation("数据库端口必须大于0".to_string()));
        }
        if self.user.is_empty() {
            return Err(ConfigError::Validation("数据库用户不能为空".to_string()));
        }
        if self.dbname.is_empty() {
            return Err(ConfigError::Validation("数据库名称不能为空".to_string()));
        }
        if self.max_open_conns == 0 {
            return Err(ConfigError::Validation("最大连接数必须大于0".to_string()));
        }
        if self.timezone.is_empty() {
            return Err(ConfigError::Validation("时区不能为空".to_string()));
        }
        self.ssl_mode()?;
        Ok(())
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::FileWrite(e.to_string()))?;
        }

        fs::write(path.as_ref(), content).map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// 用环境变量覆盖数据库配置
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_with(|key| std::env::var(key).ok())
    }

    /// 用 `lookup` 提供的值覆盖数据库配置，变量名与 libpq 一致
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.database;

        if let Some(host) = lookup("PGHOST") {
            db.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            db.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("无效的 PGPORT: {port}")))?;
        }
        if let Some(user) = lookup("PGUSER") {
            db.user = user;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            db.password = password;
        }
        if let Some(dbname) = lookup("PGDATABASE") {
            db.dbname = dbname;
        }
        if let Some(sslmode) = lookup("PGSSLMODE") {
            db.sslmode = sslmode;
        }

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;

        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            ConfigError::Validation(format!("无效的日志级别: {}，{}", self.logging.level, e))
        })?;

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("文件写入错误: {0}")]
    FileWrite(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置序列化错误: {0}")]
    Serialize(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 从默认路径加载配置，找不到配置文件时使用默认配置
pub fn load_config() -> Result<Config, ConfigError> {
    for path in &CONFIG_PATHS {
        if Path::new(path).exists() {
            println!("从配置文件加载: {}", path);
            return Config::load_from_file(path);
        }
    }

    println!("未找到配置文件，使用默认配置");
    Ok(Config::default())
}

//! # SQLx 泛型仓库 Demo
//!
//! 这个库演示如何在 PostgreSQL 上用一个泛型仓库完成增删改查，包括：
//! - 基于 `Entity` 约定的泛型仓库 `BaseRepository<T>`
//! - 自动迁移（建表、补列、建索引）
//! - 软删除、批量创建、分页查询
//! - 专用仓库 `UserRepository` 的按年龄查询
//! - 由配置构建的连接池

pub mod app;
pub mod core;
pub mod infrastructure;

pub use crate::app::user::{User, UserRepository};
pub use crate::core::{
    BaseRepository, Column, Entity, Index, Page, PersistHooks, RepoError, RepoResult, Timestamps,
};
pub use crate::infrastructure::{Config, DatabaseManager, PostgresConfig};

//! 实体约定
//!
//! 一个实体对应一张表：`id BIGSERIAL` 主键、若干可写列，以及由仓库维护的
//! `created_at` / `updated_at` / `deleted_at` 三个时间戳列。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, query_builder::Separated, FromRow, Postgres};
use validator::Validate;

/// 列定义：列名 + 完整的 SQL 类型声明
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self { name, sql_type }
    }
}

/// 索引定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    pub const fn new(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: false,
        }
    }

    pub const fn unique(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: true,
        }
    }
}

/// 由仓库维护的时间戳，实体通过 `#[sqlx(flatten)]` 嵌入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 软删除标记，`Some` 表示已逻辑删除
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// 可被 [`BaseRepository`](crate::core::repository::BaseRepository) 持久化的实体
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Validate + Send + Sync + Unpin + 'static
{
    /// 表名，可带 schema 前缀（如 `app.users`）
    const TABLE: &'static str;

    /// 可写列，不含 `id` 和时间戳列；顺序必须与 [`Entity::bind_columns`] 一致
    const COLUMNS: &'static [Column];

    const INDEXES: &'static [Index] = &[];

    /// 为 `false` 时删除操作直接移除行，查询也不再过滤 `deleted_at`
    const SOFT_DELETE: bool = true;

    fn id(&self) -> i64;

    fn timestamps(&self) -> &Timestamps;

    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// 按 [`Entity::COLUMNS`] 的顺序绑定可写列的值
    fn bind_columns<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>);
}

/// 去掉 schema 前缀后的表名，用于索引命名等场景
pub fn table_basename(table: &str) -> &str {
    table.rsplit('.').next().unwrap_or(table)
}

/// 表的 schema 前缀（如有）
pub fn table_schema(table: &str) -> Option<&str> {
    table.rsplit_once('.').map(|(schema, _)| schema)
}

//! SQL 语句生成
//!
//! 所有语句都由 [`Entity`] 的表名和列定义拼出，值一律走绑定参数。

use sqlx::{Postgres, QueryBuilder};

use super::entity::{table_basename, table_schema, Entity};

/// PostgreSQL 单条语句的绑定参数上限
pub const BIND_LIMIT: usize = u16::MAX as usize;

/// 单条批量 insert 最多能容纳的行数
pub fn max_rows_per_insert<T: Entity>() -> usize {
    // 可写列 + created_at + updated_at + 可能的 id
    let per_row = T::COLUMNS.len() + 3;
    (BIND_LIMIT / per_row).max(1)
}

/// 默认查询作用域：软删除实体只看未删除的行
pub fn live_scope<T: Entity>() -> &'static str {
    if T::SOFT_DELETE {
        "deleted_at IS NULL"
    } else {
        "TRUE"
    }
}

fn column_list<T: Entity>() -> String {
    T::COLUMNS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// 自动迁移语句：建 schema、建表、补列、建索引
pub fn migration_statements<T: Entity>() -> Vec<String> {
    let table = T::TABLE;
    let mut statements = Vec::new();

    if let Some(schema) = table_schema(table) {
        statements.push(format!("CREATE SCHEMA IF NOT EXISTS {schema}"));
    }

    let mut defs = vec!["id BIGSERIAL PRIMARY KEY".to_string()];
    defs.extend(T::COLUMNS.iter().map(|c| format!("{} {}", c.name, c.sql_type)));
    defs.push("created_at TIMESTAMPTZ NOT NULL".to_string());
    defs.push("updated_at TIMESTAMPTZ NOT NULL".to_string());
    if T::SOFT_DELETE {
        defs.push("deleted_at TIMESTAMPTZ".to_string());
    }
    statements.push(format!(
        "CREATE TABLE IF NOT EXISTS {table} ({})",
        defs.join(", ")
    ));

    // 已存在的旧表补齐新增列，时间戳列带默认值以兼容已有数据
    let mut added: Vec<(&str, &str)> = T::COLUMNS.iter().map(|c| (c.name, c.sql_type)).collect();
    added.push(("created_at", "TIMESTAMPTZ NOT NULL DEFAULT now()"));
    added.push(("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT now()"));
    if T::SOFT_DELETE {
        added.push(("deleted_at", "TIMESTAMPTZ"));
    }
    for (name, sql_type) in added {
        statements.push(format!(
            "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {name} {sql_type}"
        ));
    }

    for index in T::INDEXES {
        statements.push(format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {table} ({})",
            if index.unique { "UNIQUE " } else { "" },
            index.name,
            index.columns.join(", ")
        ));
    }

    if T::SOFT_DELETE {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_deleted_at ON {table} (deleted_at)",
            table_basename(table)
        ));
    }

    statements
}

/// 多行 insert，`with_id` 为 true 时显式写入主键
pub fn insert<T: Entity>(rows: &[T], with_id: bool) -> QueryBuilder<'static, Postgres> {
    let mut qb = insert_values(rows, with_id);
    qb.push(" RETURNING *");
    qb
}

/// 按给定 id 插入；id 已存在（包括已软删除的行）时覆盖可写列并恢复该行，
/// `created_at` 保持原值
pub fn upsert<T: Entity>(entity: &T) -> QueryBuilder<'static, Postgres> {
    let mut assignments: Vec<String> = T::COLUMNS
        .iter()
        .map(|c| format!("{0} = EXCLUDED.{0}", c.name))
        .collect();
    assignments.push("updated_at = EXCLUDED.updated_at".to_string());
    if T::SOFT_DELETE {
        assignments.push("deleted_at = NULL".to_string());
    }

    let mut qb = insert_values(std::slice::from_ref(entity), true);
    qb.push(format!(
        " ON CONFLICT (id) DO UPDATE SET {} RETURNING *",
        assignments.join(", ")
    ));
    qb
}

/// 显式写入 id 后把自增序列推到当前最大 id
pub fn sync_id_sequence<T: Entity>() -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{0}', 'id'), (SELECT MAX(id) FROM {0}))",
        T::TABLE
    )
}

fn insert_values<T: Entity>(rows: &[T], with_id: bool) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}{}, created_at, updated_at) ",
        T::TABLE,
        if with_id { "id, " } else { "" },
        column_list::<T>()
    ));

    qb.push_values(rows.iter(), |mut b, row| {
        if with_id {
            b.push_bind(row.id());
        }
        row.bind_columns(&mut b);
        b.push_bind(row.timestamps().created_at);
        b.push_bind(row.timestamps().updated_at);
    });
    qb
}

/// 整行覆盖更新，不写 `created_at`
pub fn update<T: Entity>(entity: &T) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "UPDATE {} SET ({}, updated_at) = ROW(",
        T::TABLE,
        column_list::<T>()
    ));

    {
        let mut row = qb.separated(", ");
        entity.bind_columns(&mut row);
        row.push_bind(entity.timestamps().updated_at);
    }

    qb.push(") WHERE id = ")
        .push_bind(entity.id())
        .push(" AND ")
        .push(live_scope::<T>())
        .push(" RETURNING *");
    qb
}

pub fn select_by_id<T: Entity>(scoped: bool) -> String {
    if scoped {
        format!(
            "SELECT * FROM {} WHERE id = $1 AND {}",
            T::TABLE,
            live_scope::<T>()
        )
    } else {
        format!("SELECT * FROM {} WHERE id = $1", T::TABLE)
    }
}

pub fn select_all<T: Entity>() -> String {
    format!(
        "SELECT * FROM {} WHERE {} ORDER BY id",
        T::TABLE,
        live_scope::<T>()
    )
}

pub fn select_page<T: Entity>() -> String {
    format!(
        "SELECT * FROM {} WHERE {} ORDER BY id LIMIT $1 OFFSET $2",
        T::TABLE,
        live_scope::<T>()
    )
}

pub fn count<T: Entity>() -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        T::TABLE,
        live_scope::<T>()
    )
}

pub fn soft_delete<T: Entity>() -> String {
    format!(
        "UPDATE {} SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        T::TABLE
    )
}

pub fn hard_delete<T: Entity>() -> String {
    format!("DELETE FROM {} WHERE id = $1", T::TABLE)
}

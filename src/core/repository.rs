//! 泛型仓库
//!
//! `BaseRepository<T>` 为任意 [`Entity`] 提供建表、增删改查、分页和计数。
//! 写操作在执行 SQL 前先做校验，再调用 [`PersistHooks`] 中的变换函数，
//! 执行成功后用 `RETURNING *` 的结果覆盖调用方传入的实体。

use std::marker::PhantomData;

use chrono::Utc;
use serde::Serialize;
use sqlx::postgres::{PgExecutor, PgPool};
use tracing::{debug, error, info};

use super::{
    entity::Entity,
    error::{RepoError, RepoResult},
    hooks::PersistHooks,
    query,
};
use crate::infrastructure::DbLogLevel;

/// 分页结果，`total` 与 `items` 来自同一快照
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: u32,
    pub limit: u32,
}

pub struct BaseRepository<T> {
    pool: PgPool,
    hooks: PersistHooks<T>,
    log_level: DbLogLevel,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for BaseRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            hooks: self.hooks,
            log_level: self.log_level,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> BaseRepository<T> {
    /// 创建基础仓库，使用默认的时间戳变换
    pub fn new(pool: PgPool) -> Self {
        Self::with_hooks(pool, PersistHooks::default())
    }

    pub fn with_hooks(pool: PgPool, hooks: PersistHooks<T>) -> Self {
        Self {
            pool,
            hooks,
            log_level: DbLogLevel::default(),
            _entity: PhantomData,
        }
    }

    /// 设置失败语句的日志级别，通常取自 [`DatabaseManager::log_level`](crate::DatabaseManager::log_level)
    pub fn with_log_level(mut self, log_level: DbLogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// 获取原始连接池
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn log_level(&self) -> DbLogLevel {
        self.log_level
    }

    /// 记录失败的语句，`silent` 级别下不输出
    pub(crate) fn log_failure(&self, action: &str, err: &sqlx::Error) {
        if self.log_level.logs_failures() {
            error!(table = T::TABLE, action, "statement failed: {}", err);
        }
    }

    fn db_error(&self, action: &'static str) -> impl Fn(sqlx::Error) -> RepoError + '_ {
        move |e| {
            self.log_failure(action, &e);
            RepoError::Database(e)
        }
    }

    /// 自动迁移：建 schema、建表、补列、建索引，全部在一个事务内完成
    pub async fn create_table(&self) -> RepoResult<()> {
        let migration_failed = |source: sqlx::Error| {
            self.log_failure("create_table", &source);
            RepoError::Migration {
                table: T::TABLE,
                source,
            }
        };

        let mut tx = self.pool.begin().await.map_err(migration_failed)?;
        for statement in query::migration_statements::<T>() {
            debug!(table = T::TABLE, %statement, "applying migration");
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(migration_failed)?;
        }
        tx.commit().await.map_err(migration_failed)?;

        info!("Table {} migrated successfully", T::TABLE);
        Ok(())
    }

    /// 创建实体，成功后 `entity` 带上分配的 id 和落库的时间戳
    pub async fn create(&self, entity: &mut T) -> RepoResult<()> {
        entity.validate()?;
        (self.hooks.before_create)(entity, Utc::now());

        let mut qb = query::insert(std::slice::from_ref(entity), false);
        *entity = qb
            .build_query_as::<T>()
            .fetch_one(&self.pool)
            .await
            .map_err(self.db_error("create"))?;

        debug!(table = T::TABLE, id = entity.id(), "record created");
        Ok(())
    }

    /// 批量创建，在同一事务内完成：要么全部成功，要么返回第一个错误
    pub async fn batch_create(&self, entities: &mut [T]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }

        for entity in entities.iter() {
            entity.validate()?;
        }

        let now = Utc::now();
        for entity in entities.iter_mut() {
            (self.hooks.before_create)(entity, now);
        }

        let failed = self.db_error("batch_create");
        let mut tx = self.pool.begin().await.map_err(&failed)?;
        for chunk in entities.chunks_mut(query::max_rows_per_insert::<T>()) {
            let mut qb = query::insert(chunk, false);
            let rows = qb
                .build_query_as::<T>()
                .fetch_all(&mut *tx)
                .await
                .map_err(&failed)?;
            // 依赖 PostgreSQL 对 INSERT ... VALUES 按 VALUES 顺序返回 RETURNING 行
            debug_assert_eq!(rows.len(), chunk.len());
            for (entity, row) in chunk.iter_mut().zip(rows) {
                *entity = row;
            }
        }
        tx.commit().await.map_err(&failed)?;

        debug!(table = T::TABLE, count = entities.len(), "records created in batch");
        Ok(())
    }

    /// 根据 id 查询未删除的实体
    pub async fn get_by_id(&self, id: i64) -> RepoResult<T> {
        self.fetch_by_id(id, true).await
    }

    /// 根据 id 查询，包括已软删除的实体
    pub async fn get_by_id_unscoped(&self, id: i64) -> RepoResult<T> {
        self.fetch_by_id(id, false).await
    }

    async fn fetch_by_id(&self, id: i64, scoped: bool) -> RepoResult<T> {
        sqlx::query_as::<_, T>(&query::select_by_id::<T>(scoped))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(self.db_error("get_by_id"))?
            .ok_or(RepoError::NotFound {
                table: T::TABLE,
                id,
            })
    }

    /// 按 id 整行保存
    ///
    /// - `id == 0`：等同于 [`create`](Self::create)
    /// - 存在未删除的同 id 行：覆盖全部可写列并刷新 `updated_at`，`created_at` 不变
    /// - 否则按给定 id 写入：没有该行时插入，该行已被软删除时覆盖并恢复，
    ///   随后把自增序列推到最大 id
    pub async fn update(&self, entity: &mut T) -> RepoResult<()> {
        if entity.id() == 0 {
            return self.create(entity).await;
        }

        entity.validate()?;
        (self.hooks.before_update)(entity, Utc::now());

        let failed = self.db_error("update");
        let mut tx = self.pool.begin().await.map_err(&failed)?;

        let mut qb = query::update(entity);
        let updated = qb
            .build_query_as::<T>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(&failed)?;

        let saved = match updated {
            Some(row) => row,
            None => {
                debug!(table = T::TABLE, id = entity.id(), "no live row, upserting");
                (self.hooks.before_create)(entity, Utc::now());
                let mut qb = query::upsert(entity);
                let row = qb
                    .build_query_as::<T>()
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(&failed)?;
                sqlx::query(&query::sync_id_sequence::<T>())
                    .execute(&mut *tx)
                    .await
                    .map_err(&failed)?;
                row
            }
        };

        tx.commit().await.map_err(&failed)?;
        *entity = saved;

        debug!(table = T::TABLE, id = entity.id(), "record saved");
        Ok(())
    }

    /// 软删除；不支持软删除的实体直接物理删除
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        if !T::SOFT_DELETE {
            return self.hard_delete(id).await;
        }

        let result = sqlx::query(&query::soft_delete::<T>())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(self.db_error("delete"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound {
                table: T::TABLE,
                id,
            });
        }

        debug!(table = T::TABLE, id, "record soft-deleted");
        Ok(())
    }

    /// 物理删除，无论该行是否已被软删除
    pub async fn hard_delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query(&query::hard_delete::<T>())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(self.db_error("hard_delete"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound {
                table: T::TABLE,
                id,
            });
        }

        debug!(table = T::TABLE, id, "record deleted");
        Ok(())
    }

    /// 查询所有未删除的实体（不分页，结果集大小由调用方负责）
    pub async fn list_all(&self) -> RepoResult<Vec<T>> {
        let entities = sqlx::query_as::<_, T>(&query::select_all::<T>())
            .fetch_all(&self.pool)
            .await
            .map_err(self.db_error("list_all"))?;
        Ok(entities)
    }

    /// 分页查询，计数与取数在同一个可重复读事务中执行
    pub async fn list(&self, offset: u32, limit: u32) -> RepoResult<Page<T>> {
        let failed = self.db_error("list");
        let mut tx = self.pool.begin().await.map_err(&failed)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(&failed)?;

        let total = count_live::<T, _>(&mut *tx).await.map_err(&failed)?;
        let items = sqlx::query_as::<_, T>(&query::select_page::<T>())
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&mut *tx)
            .await
            .map_err(&failed)?;

        tx.commit().await.map_err(&failed)?;

        Ok(Page {
            items,
            total,
            offset,
            limit,
        })
    }

    /// 未删除实体的总数
    pub async fn count(&self) -> RepoResult<i64> {
        count_live::<T, _>(&self.pool)
            .await
            .map_err(self.db_error("count"))
    }
}

async fn count_live<'e, T, E>(executor: E) -> Result<i64, sqlx::Error>
where
    T: Entity,
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(&query::count::<T>())
        .fetch_one(executor)
        .await
}

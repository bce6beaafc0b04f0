//! 持久化前的变换函数
//!
//! 仓库在写入前显式调用这些函数，实体类型本身不携带隐式回调。

use chrono::{DateTime, Utc};

use super::entity::Entity;

pub type Hook<T> = fn(&mut T, DateTime<Utc>);

/// 仓库在 insert / update 前调用的变换函数
pub struct PersistHooks<T> {
    pub before_create: Hook<T>,
    pub before_update: Hook<T>,
}

impl<T: Entity> Default for PersistHooks<T> {
    fn default() -> Self {
        Self {
            before_create: stamp_created::<T>,
            before_update: stamp_updated::<T>,
        }
    }
}

impl<T> Clone for PersistHooks<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PersistHooks<T> {}

/// 写入创建时间和更新时间，覆盖调用方传入的任何值
pub fn stamp_created<T: Entity>(entity: &mut T, now: DateTime<Utc>) {
    let ts = entity.timestamps_mut();
    ts.created_at = now;
    ts.updated_at = now;
}

/// 只刷新更新时间
pub fn stamp_updated<T: Entity>(entity: &mut T, now: DateTime<Utc>) {
    entity.timestamps_mut().updated_at = now;
}

//! 用户仓库

use tracing::debug;

use super::model::User;
use crate::core::{query::live_scope, BaseRepository, Entity, RepoError, RepoResult};

/// 用户仓库：泛型仓库的全部操作 + 按年龄查询
pub type UserRepository = BaseRepository<User>;

fn select_older_than() -> String {
    format!(
        "SELECT * FROM {} WHERE age > $1 AND {} ORDER BY id",
        User::TABLE,
        live_scope::<User>()
    )
}

impl BaseRepository<User> {
    /// 根据年龄查询用户：年龄严格大于 `min_age` 且未删除
    pub async fn get_user_by_age(&self, min_age: i32) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&select_older_than())
            .bind(min_age)
            .fetch_all(self.pool())
            .await
            .map_err(|source| {
                self.log_failure("get_user_by_age", &source);
                RepoError::Query {
                    context: "age query failed",
                    source,
                }
            })?;

        debug!(min_age, count = users.len(), "users fetched by age");
        Ok(users)
    }
}

//! 核心错误处理模块

use thiserror::Error;

/// 仓库层错误类型
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("table {table} migration failed: {source}")]
    Migration {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("record not found: {table} id={id}")]
    NotFound { table: &'static str, id: i64 },

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound { .. })
    }

    /// 唯一约束冲突（如重复邮箱）
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RepoError::Database(sqlx::Error::Database(db))
            | RepoError::Query {
                source: sqlx::Error::Database(db),
                ..
            } => db.is_unique_violation(),
            _ => false,
        }
    }
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RepoError::NotFound {
            table: "postgresql_test.users",
            id: 7,
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "record not found: postgresql_test.users id=7");

        let err = RepoError::Query {
            context: "age query failed",
            source: sqlx::Error::RowNotFound,
        };
        assert!(err.to_string().starts_with("age query failed: "));
        assert!(!err.is_unique_violation());

        let err = RepoError::Migration {
            table: "users",
            source: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().starts_with("table users migration failed: "));
    }
}

//! 用户数据模型

use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, FromRow, Postgres};
use validator::Validate;

use crate::core::{Column, Entity, Index, Timestamps};

/// 用户模型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, Validate)]
pub struct User {
    pub id: i64,

    #[validate(length(min = 1, max = 20, message = "Name must be between 1 and 20 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(range(min = 0, max = 120, message = "Age must be between 0 and 120"))]
    pub age: i32,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl User {
    /// 新建尚未持久化的用户，id 与时间戳由仓库负责填写
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
            ..Default::default()
        }
    }
}

impl Entity for User {
    // PostgreSQL 格式: schema.table_name
    const TABLE: &'static str = "postgresql_test.users";

    const COLUMNS: &'static [Column] = &[
        Column::new("name", "VARCHAR(100) NOT NULL"),
        Column::new("email", "VARCHAR(100) NOT NULL"),
        Column::new("age", "INTEGER NOT NULL"),
    ];

    const INDEXES: &'static [Index] = &[Index::unique("idx_users_email", &["email"])];

    fn id(&self) -> i64 {
        self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn bind_columns<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.name.clone())
            .push_bind(self.email.clone())
            .push_bind(self.age);
    }
}

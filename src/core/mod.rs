//! 核心层：实体约定、泛型仓库与错误类型

pub mod entity;
pub mod error;
pub mod hooks;
pub mod query;
pub mod repository;

pub use entity::{Column, Entity, Index, Timestamps};
pub use error::{RepoError, RepoResult};
pub use hooks::PersistHooks;
pub use repository::{BaseRepository, Page};

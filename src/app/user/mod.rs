//! 用户实体与用户仓库

mod model;
mod repository;

pub use model::User;
pub use repository::UserRepository;

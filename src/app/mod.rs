//! 应用层：具体实体及其专用仓库

pub mod user;

/// 业务模块管理
/// 包含所有业务模块的定义和导出

pub mod admin;
pub mod articles;
pub mod auth;
pub mod comments;
pub mod location;
pub mod users;

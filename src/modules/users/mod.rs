/// 用户模块
/// User module

pub mod models;
pub mod repo;
pub mod routes;

pub use routes::configure_user_routes;

/// 认证模块
/// Auth module

pub mod models;
pub mod routes;

pub use routes::configure_auth_routes;

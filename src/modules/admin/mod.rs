/// 管理后台模块
/// Admin panel module

pub mod models;
pub mod repo;
pub mod routes;

pub use routes::configure_admin_routes;

/// 启动模块：应用启动器与全局路由装配
/// Bootstrap: application runner and global route assembly

pub mod app_bootstrap;
pub mod route_registry;

pub use app_bootstrap::{AppBootstrap, AppConfig};
pub use route_registry::configure_global_routes;

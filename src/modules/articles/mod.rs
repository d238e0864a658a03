/// 文章模块
/// Article module

pub mod models;
pub mod repo;
pub mod routes;

pub use routes::configure_article_routes;

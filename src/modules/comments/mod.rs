/// 评论模块
/// Comment module

pub mod models;
pub mod repo;
pub mod routes;

pub use routes::configure_comment_routes;

/// 客户端状态层：REST 客户端与乐观更新容器
/// Client-side state layer: REST client plus optimistic containers

pub mod client;
pub mod feed;

pub use client::{settlement_code, ApiClient, ApiError};
pub use feed::{FeedStore, LikeSettlement, LikeSnapshot};

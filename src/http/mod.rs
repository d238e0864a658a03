/// HTTP 通用类型 / Common HTTP types
pub mod pagination;

pub mod audit;
pub mod auth;
pub mod bootstrap;
pub mod comm;
pub mod db;
pub mod error;
pub mod http;
pub mod middleware;
pub mod store;

// Modules
pub mod modules;

// Re-export bootstrap modules
pub use bootstrap::{configure_global_routes, AppBootstrap, AppConfig};
pub use error::{AppError, AppResult};

//! 应用启动器
//! Application bootstrap

use actix_web::{middleware::Logger, App, HttpServer};
use tracing::{info, warn};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::bootstrap::route_registry::configure_global_routes;
use crate::comm::config::get_global_config_manager;
use crate::db::connection::{check_health, default_pool};
use crate::error::{AppError, AppResult};

/// 应用配置结构体
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9889,
            workers: None,
            debug: false,
        }
    }
}

impl AppConfig {
    /// 从全局配置读取 server.* 配置项
    pub fn from_config() -> AppResult<Self> {
        let mgr = get_global_config_manager().map_err(AppError::Internal)?;
        let defaults = Self::default();
        Ok(Self {
            host: mgr.get_or("server.host", defaults.host),
            port: mgr.get_or("server.port", defaults.port as i64) as u16,
            workers: mgr.get("server.workers").ok().map(|w: i64| w as usize),
            debug: mgr.get_or("server.debug", defaults.debug),
        })
    }
}

/// 应用启动器
pub struct AppBootstrap {
    config: Option<AppConfig>,
}

impl AppBootstrap {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 初始化结构化日志（bunyan JSON 格式）
    fn init_tracing() -> AppResult<()> {
        let mgr = get_global_config_manager().map_err(AppError::Internal)?;
        let level = mgr.get_or("logging.level", "info".to_string());
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let formatting_layer = BunyanFormattingLayer::new("moments".into(), std::io::stdout);
        let subscriber = Registry::default()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(formatting_layer);
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("日志初始化失败: {}", e)))?;
        Ok(())
    }

    /// 运行应用服务器
    pub async fn run(self) -> AppResult<()> {
        Self::init_tracing()?;

        let config = match self.config {
            Some(c) => c,
            None => AppConfig::from_config()?,
        };
        info!("启动应用服务器，配置: {:?}", config);

        // 连接池为懒加载，启动时做一次探测但不阻止启动
        match default_pool().await {
            Ok(pool) => {
                if let Err(e) = check_health(&pool).await {
                    warn!("数据库暂不可达，首个请求前请确认: {}", e);
                }
            }
            Err(e) => warn!("连接池初始化失败: {}", e),
        }

        let bind_addr = (config.host.clone(), config.port);
        info!("服务器监听 {}:{}", config.host, config.port);

        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .configure(configure_global_routes)
        });
        if let Some(workers) = config.workers {
            server = server.workers(workers);
        }
        server
            .bind(bind_addr)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("端口绑定失败: {}", e)))?
            .run()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("服务器运行错误: {}", e)))
    }
}

impl Default for AppBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_app_config() {
        let c = AppConfig::default();
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.port, 9889);
        assert!(c.workers.is_none());
    }
}

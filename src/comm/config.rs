use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};

lazy_static! {
    static ref GLOBAL_CONFIG_MANAGER: RwLock<Option<Arc<ConfigManager>>> = RwLock::new(None);
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置项 '{key}' 不存在")]
    KeyNotFound { key: String },
    #[error("配置项 '{key}' 类型转换失败: {message}")]
    TypeConversionError { key: String, message: String },
    #[error("配置初始化失败: {message}")]
    InitializationError { message: String },
}

/// 配置管理器：分层加载 TOML 文件与环境变量
/// Config manager: layered TOML files plus environment variables
///
/// 优先级（后加载者生效）/ precedence (last wins):
/// `config/development.toml` < `config/default.toml` < `config/production.toml` < `MOMENTS_*` 环境变量
pub struct ConfigManager {
    config: Config,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder();

        for path in [
            "config/development.toml",
            "config/default.toml",
            "config/production.toml",
        ] {
            // 可选文件：不存在则跳过
            if std::path::Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml).required(false));
            }
        }
        builder = builder.add_source(Environment::with_prefix("MOMENTS").separator("_"));

        let config = builder
            .build()
            .map_err(|e| anyhow!("构建配置失败: {}", e))?;
        Ok(Self { config })
    }

    /// 获取指定 key 的配置值
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.config
            .get(key)
            .map_err(|e| anyhow!("获取配置 '{}' 失败: {}", key, e))
    }

    /// 获取指定 key 的配置值，如果不存在返回默认值
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// 获取字符串配置值
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// 检查配置项是否存在
    pub fn exists(&self, key: &str) -> bool {
        self.config.get::<serde_json::Value>(key).is_ok()
    }

    /// 验证必需的配置项
    pub fn validate_required_keys(&self, required_keys: &[&str]) -> Result<(), ConfigError> {
        for key in required_keys {
            if !self.exists(key) {
                return Err(ConfigError::KeyNotFound {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// 获取全局配置管理器（惰性初始化）
/// Get the global config manager (lazy init)
pub fn get_global_config_manager() -> Result<Arc<ConfigManager>> {
    {
        let r = GLOBAL_CONFIG_MANAGER
            .read()
            .map_err(|e| anyhow!("配置锁获取失败: {}", e))?;
        if let Some(mgr) = r.as_ref() {
            return Ok(mgr.clone());
        }
    }
    let mgr = Arc::new(ConfigManager::new()?);
    let mut w = GLOBAL_CONFIG_MANAGER
        .write()
        .map_err(|e| anyhow!("配置锁获取失败: {}", e))?;
    if let Some(existing) = w.as_ref() {
        return Ok(existing.clone());
    }
    *w = Some(mgr.clone());
    Ok(mgr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override() {
        std::env::set_var("MOMENTS_SERVER_PORT", "7001");
        let mgr = ConfigManager::new().unwrap();
        let port: u16 = mgr.get_or("server.port", 0u16);
        assert_eq!(port, 7001);
        std::env::remove_var("MOMENTS_SERVER_PORT");
    }

    #[test]
    fn test_get_or_default() {
        let mgr = ConfigManager::new().unwrap();
        let v: i64 = mgr.get_or("no.such.key", 42i64);
        assert_eq!(v, 42);
    }

    #[test]
    fn test_validate_required_keys() {
        std::env::set_var("MOMENTS_JWT_SECRET", "test-secret");
        let mgr = ConfigManager::new().unwrap();
        assert!(mgr.validate_required_keys(&["jwt.secret"]).is_ok());
        assert!(mgr.validate_required_keys(&["definitely.missing"]).is_err());
        std::env::remove_var("MOMENTS_JWT_SECRET");
    }
}

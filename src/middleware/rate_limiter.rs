//! 固定窗口限流中间件
//! Fixed-window rate limiting middleware
//!
//! 按客户端IP计数，窗口内超过阈值返回 429。
//! Counts per client IP, returns 429 once the window budget is spent.

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::comm::config::get_global_config_manager;

/// 限流配置
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 每个时间窗口允许的最大请求数
    pub max_requests: u32,
    /// 时间窗口大小（秒）
    pub window_size: u64,
    /// 是否启用限流
    pub enabled: bool,
    /// 白名单IP列表，支持 * 通配符
    pub whitelist: Vec<String>,
    /// 自定义错误消息
    pub error_message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_size: 60,
            enabled: true,
            whitelist: Vec::new(),
            error_message: "请求过于频繁，请稍后再试".to_string(),
        }
    }
}

impl RateLimitConfig {
    /// 从全局配置读取 rate_limit.* 配置项
    pub fn from_config() -> Self {
        let defaults = Self::default();
        match get_global_config_manager() {
            Ok(mgr) => Self {
                enabled: mgr.get_or("rate_limit.enabled", defaults.enabled),
                max_requests: mgr
                    .get_or("rate_limit.max_requests", defaults.max_requests as i64)
                    as u32,
                window_size: mgr.get_or("rate_limit.window_size", defaults.window_size as i64)
                    as u64,
                whitelist: defaults.whitelist,
                error_message: defaults.error_message,
            },
            Err(_) => defaults,
        }
    }
}

/// 请求记录
#[derive(Debug, Clone)]
struct RequestRecord {
    count: u32,
    window_start: Instant,
    last_request: Instant,
}

impl RequestRecord {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            count: 0,
            window_start: now,
            last_request: now,
        }
    }
}

type RateLimitStore = Arc<Mutex<HashMap<String, RequestRecord>>>;

/// 固定窗口限流器
#[derive(Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// 检查IP是否在白名单中
    fn is_whitelisted(&self, ip: &str) -> bool {
        self.config.whitelist.iter().any(|pattern| {
            if pattern.contains('*') {
                // 简单的通配符匹配
                let pattern = pattern.replace('*', ".*");
                if let Ok(regex) = regex::Regex::new(&pattern) {
                    regex.is_match(ip)
                } else {
                    false
                }
            } else {
                pattern == ip
            }
        })
    }

    /// 检查是否允许请求
    pub fn check_rate_limit(&self, client_ip: &str) -> RateLimitInfo {
        if !self.config.enabled || self.is_whitelisted(client_ip) {
            return RateLimitInfo {
                allowed: true,
                remaining: self.config.max_requests,
                retry_after: None,
            };
        }

        let mut store = self.store.lock().unwrap();
        let now = Instant::now();
        let record = store
            .entry(client_ip.to_string())
            .or_insert_with(RequestRecord::new);

        let window_duration = Duration::from_secs(self.config.window_size);
        if now.duration_since(record.window_start) >= window_duration {
            record.count = 0;
            record.window_start = now;
        }

        if record.count >= self.config.max_requests {
            let reset_time = record.window_start + window_duration;
            return RateLimitInfo {
                allowed: false,
                remaining: 0,
                retry_after: Some(reset_time.duration_since(now)),
            };
        }

        record.count += 1;
        record.last_request = now;

        RateLimitInfo {
            allowed: true,
            remaining: self.config.max_requests - record.count,
            retry_after: None,
        }
    }

    /// 清理过期记录，保留2个窗口的数据
    pub fn cleanup_expired(&self) {
        let mut store = self.store.lock().unwrap();
        let now = Instant::now();
        let keep = Duration::from_secs(self.config.window_size * 2);
        store.retain(|_, record| now.duration_since(record.last_request) < keep);
    }
}

/// 限流检查结果
#[derive(Debug)]
pub struct RateLimitInfo {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after: Option<Duration>,
}

/// 限流中间件
pub struct RateLimitMiddleware {
    limiter: RateLimiter,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            let client_ip = crate::auth::client_ip(req.request());
            debug!("限流检查: IP {} 访问 {}", client_ip, req.path());

            let info = limiter.check_rate_limit(&client_ip);
            if info.allowed {
                let response = service.call(req).await?;
                Ok(response.map_into_boxed_body())
            } else {
                warn!("限流拒绝: IP {} 超过限制", client_ip);
                // 顺带清理过期的计数记录
                limiter.cleanup_expired();
                let error_response = HttpResponse::TooManyRequests()
                    .json(serde_json::json!({ "error": limiter.config.error_message }));
                Ok(req.into_response(error_response))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn test_handler() -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({"message": "success"}))
    }

    #[actix_web::test]
    async fn test_rate_limit_allows_requests_within_limit() {
        let config = RateLimitConfig {
            max_requests: 5,
            window_size: 60,
            ..Default::default()
        };

        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(config))
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        for _ in 0..5 {
            let req = test::TestRequest::get().uri("/test").to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }
    }

    #[actix_web::test]
    async fn test_rate_limit_blocks_excess_requests() {
        let config = RateLimitConfig {
            max_requests: 2,
            window_size: 60,
            ..Default::default()
        };

        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(config))
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/test").to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::get().uri("/test").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 429);
    }

    #[tokio::test]
    async fn test_whitelist_bypass() {
        let config = RateLimitConfig {
            max_requests: 1,
            window_size: 60,
            whitelist: vec!["10.0.0.*".to_string()],
            ..Default::default()
        };

        let limiter = RateLimiter::new(config);
        for _ in 0..10 {
            assert!(limiter.check_rate_limit("10.0.0.8").allowed);
        }
    }

    #[tokio::test]
    async fn test_disabled_limiter_never_blocks() {
        let config = RateLimitConfig {
            max_requests: 1,
            window_size: 60,
            enabled: false,
            ..Default::default()
        };

        let limiter = RateLimiter::new(config);
        for _ in 0..10 {
            assert!(limiter.check_rate_limit("192.168.1.1").allowed);
        }
    }

    #[tokio::test]
    async fn test_counters_are_per_ip() {
        let config = RateLimitConfig {
            max_requests: 1,
            window_size: 60,
            ..Default::default()
        };

        let limiter = RateLimiter::new(config);
        assert!(limiter.check_rate_limit("192.168.1.1").allowed);
        assert!(!limiter.check_rate_limit("192.168.1.1").allowed);
        assert!(limiter.check_rate_limit("192.168.1.2").allowed);
    }
}

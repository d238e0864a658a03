//! 注册与登录接口
//! Register and login endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

use crate::audit::{self, actions, AuditEntry};
use crate::auth::{client_ip, hash_password, issue_token, verify_password};
use crate::db::connection::default_pool;
use crate::error::{AppError, AppResult};
use crate::modules::auth::models::{LoginPayload, RegisterPayload, TokenResponse};
use crate::modules::users::repo as user_repo;

fn user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// 用户注册
/// POST /api/auth/register
#[actix_web::post("/register")]
pub async fn register(
    req: HttpRequest,
    payload: web::Json<RegisterPayload>,
) -> AppResult<impl Responder> {
    payload
        .validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let pool = default_pool().await?;
    if user_repo::identifier_taken(&pool, &payload.username, payload.email.as_deref()).await? {
        return Err(AppError::conflict("用户名或邮箱已被占用"));
    }

    let hash = hash_password(&payload.password)?;
    let user = user_repo::insert(
        &pool,
        &payload.username,
        &hash,
        payload.email.as_deref(),
        payload.nickname.as_deref(),
    )
    .await?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::USER_REGISTER_SUCCESS)
            .user(user.id)
            .target("user", user.id)
            .ip(client_ip(&req))
            .user_agent_opt(user_agent(&req)),
    );
    Ok(HttpResponse::Created().json(user.profile()))
}

/// 用户登录
/// POST /api/auth/login
#[actix_web::post("/login")]
pub async fn login(
    req: HttpRequest,
    payload: web::Json<LoginPayload>,
) -> AppResult<impl Responder> {
    if payload.identifier.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("用户名和密码均不能为空"));
    }

    let pool = default_pool().await?;
    let ip = client_ip(&req);
    let ua = user_agent(&req);

    let user = match user_repo::find_by_identifier(&pool, &payload.identifier).await? {
        Some(u) if verify_password(&payload.password, &u.password) => u,
        _ => {
            audit::record(
                pool.clone(),
                AuditEntry::new(actions::USER_LOGIN_FAILED)
                    .failed()
                    .details(json!({"identifier": payload.identifier}))
                    .ip(ip)
                    .user_agent_opt(ua),
            );
            return Err(AppError::unauthorized("用户名或密码错误"));
        }
    };

    if user.status != 1 {
        audit::record(
            pool.clone(),
            AuditEntry::new(actions::USER_LOGIN_FAILED)
                .failed()
                .user(user.id)
                .details(json!({"reason": "status", "status": user.status}))
                .ip(ip)
                .user_agent_opt(ua),
        );
        return Err(AppError::forbidden("账号未激活或已被封禁"));
    }

    let token = issue_token(user.id, &user.username, user.role)?;
    audit::record(
        pool.clone(),
        AuditEntry::new(actions::USER_LOGIN_SUCCESS)
            .user(user.id)
            .ip(ip)
            .user_agent_opt(ua),
    );
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// 注册认证模块路由（外层挂接限流中间件）
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    use crate::middleware::rate_limiter::{RateLimitConfig, RateLimitMiddleware};

    cfg.service(
        web::scope("/api/auth")
            .wrap(RateLimitMiddleware::new(RateLimitConfig::from_config()))
            .service(register)
            .service(login),
    );
}

//! 用户接口
//! User endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::audit::{self, actions, AuditEntry};
use crate::auth::{client_ip, hash_password, verify_password, AuthUser};
use crate::db::connection::default_pool;
use crate::error::{AppError, AppResult};
use crate::modules::users::models::{ChangePasswordPayload, PublicProfile, UpdateProfilePayload};
use crate::modules::users::repo;

/// 获取当前登录用户的资料
/// GET /api/user
#[actix_web::get("")]
pub async fn get_profile(auth: AuthUser) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let user = repo::find_by_id(&pool, auth.0.sub)
        .await?
        .filter(|u| u.status == 1)
        .ok_or_else(|| AppError::not_found("用户不存在或未激活"))?;
    Ok(HttpResponse::Ok().json(user.profile()))
}

/// 局部更新当前用户资料
/// PATCH /api/user
#[actix_web::patch("")]
pub async fn update_profile(
    auth: AuthUser,
    req: HttpRequest,
    payload: web::Json<UpdateProfilePayload>,
) -> AppResult<impl Responder> {
    if payload.is_empty() {
        return Err(AppError::bad_request("未提供任何需要更新的字段"));
    }
    let pool = default_pool().await?;
    let affected = repo::update_profile(&pool, auth.0.sub, &payload).await?;
    if affected == 0 {
        return Err(AppError::not_found("用户不存在"));
    }
    let user = repo::find_by_id(&pool, auth.0.sub)
        .await?
        .ok_or_else(|| AppError::not_found("用户不存在"))?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::USER_UPDATE_PROFILE)
            .user(auth.0.sub)
            .target("user", auth.0.sub)
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::Ok().json(user.profile()))
}

/// 修改密码
/// PATCH /api/user/password
#[actix_web::patch("/password")]
pub async fn change_password(
    auth: AuthUser,
    req: HttpRequest,
    payload: web::Json<ChangePasswordPayload>,
) -> AppResult<impl Responder> {
    if payload.old_password.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::bad_request("旧密码和新密码均不能为空"));
    }
    if payload.old_password == payload.new_password {
        return Err(AppError::bad_request("新密码不能与旧密码相同"));
    }

    let pool = default_pool().await?;
    let user = repo::find_by_id(&pool, auth.0.sub)
        .await?
        .ok_or_else(|| AppError::not_found("用户不存在"))?;
    if !verify_password(&payload.old_password, &user.password) {
        return Err(AppError::unauthorized("旧密码不正确"));
    }

    let hash = hash_password(&payload.new_password)?;
    repo::update_password(&pool, auth.0.sub, &hash).await?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::USER_UPDATE_PROFILE)
            .user(auth.0.sub)
            .target("user", auth.0.sub)
            .details(json!({"field": "password"}))
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::Ok().json(json!({"message": "密码修改成功"})))
}

/// 查看公开主页
/// GET /api/user/{username}
#[actix_web::get("/{username}")]
pub async fn get_public_profile(path: web::Path<String>) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let user = repo::find_by_username(&pool, &path.into_inner())
        .await?
        .filter(|u| u.status == 1)
        .ok_or_else(|| AppError::not_found("用户不存在"))?;
    Ok(HttpResponse::Ok().json(PublicProfile::from(&user)))
}

/// 注册用户模块路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/user")
            .service(get_profile)
            .service(update_profile)
            .service(change_password)
            .service(get_public_profile),
    );
}

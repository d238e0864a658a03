//! 管理后台接口，除 publicConfig 外均要求管理员身份
//! Admin panel endpoints, admin role required except for publicConfig

use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::connection::default_pool;
use crate::error::{AppError, AppResult};
use crate::http::pagination::Paged;
use crate::modules::admin::models::{
    AdminUpdateCommentPayload, AdminUpdateUserPayload, CommentFilter, UserFilter,
};
use crate::modules::admin::repo;
use crate::modules::users::repo as user_repo;

/// 可公开读取的配置键 / Config keys readable without auth
pub const PUBLIC_CONFIG_KEYS: &[&str] = &[
    "site_name",
    "site_description",
    "site_avatar",
    "site_icp",
    "allow_register",
    "allow_guest_like",
];

/// 用户计数
/// GET /api/admin/user
#[actix_web::get("/user")]
pub async fn user_counts(_admin: AdminUser) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    Ok(HttpResponse::Ok().json(repo::user_counts(&pool).await?))
}

/// 文章计数
/// GET /api/admin/article
#[actix_web::get("/article")]
pub async fn article_counts(_admin: AdminUser) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    Ok(HttpResponse::Ok().json(repo::article_counts(&pool).await?))
}

/// 评论计数
/// GET /api/admin/comment
#[actix_web::get("/comment")]
pub async fn comment_counts(_admin: AdminUser) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    Ok(HttpResponse::Ok().json(repo::comment_counts(&pool).await?))
}

/// 公开配置，白名单键，无需登录
/// GET /api/admin/publicConfig
#[actix_web::get("/publicConfig")]
pub async fn public_config() -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let config = repo::config_subset(&pool, PUBLIC_CONFIG_KEYS).await?;
    Ok(HttpResponse::Ok().json(config))
}

/// 全部配置
/// GET /api/admin/config
#[actix_web::get("/config")]
pub async fn get_config(_admin: AdminUser) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    Ok(HttpResponse::Ok().json(repo::all_config(&pool).await?))
}

/// 更新配置，只写已存在的键，返回实际更新的键列表
/// PATCH /api/admin/config
#[actix_web::patch("/config")]
pub async fn patch_config(
    _admin: AdminUser,
    payload: web::Json<HashMap<String, String>>,
) -> AppResult<impl Responder> {
    if payload.is_empty() {
        return Err(AppError::bad_request("未提供任何配置项"));
    }
    let pool = default_pool().await?;
    let updated = repo::update_config(&pool, &payload).await?;
    Ok(HttpResponse::Ok().json(json!({"updateKeys": updated})))
}

/// 用户管理列表
/// GET /api/admin/allUsers
#[actix_web::get("/allUsers")]
pub async fn all_users(
    _admin: AdminUser,
    filter: web::Query<UserFilter>,
) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let page = filter.page_query();
    let (users, total) = repo::list_users(&pool, &filter, &page).await?;
    let profiles: Vec<_> = users.iter().map(|u| u.profile()).collect();
    Ok(HttpResponse::Ok().json(Paged::new(profiles, total, &page)))
}

/// 管理员更新用户
/// PATCH /api/admin/user/{id}
#[actix_web::patch("/user/{id}")]
pub async fn patch_user(
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<AdminUpdateUserPayload>,
) -> AppResult<impl Responder> {
    if payload.is_empty() {
        return Err(AppError::bad_request("未提供任何需要更新的字段"));
    }
    let id = path.into_inner();
    let pool = default_pool().await?;
    let affected = repo::update_user(&pool, id, &payload).await?;
    if affected == 0 {
        return Err(AppError::not_found("用户不存在"));
    }
    let user = user_repo::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("用户不存在"))?;
    Ok(HttpResponse::Ok().json(user.profile()))
}

/// 管理员软删除用户
/// DELETE /api/admin/user/{id}
#[actix_web::delete("/user/{id}")]
pub async fn delete_user(_admin: AdminUser, path: web::Path<i64>) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let affected = repo::delete_user(&pool, path.into_inner()).await?;
    if affected == 0 {
        return Err(AppError::not_found("用户不存在"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "用户已删除"})))
}

/// 评论管理列表
/// GET /api/admin/allComment
#[actix_web::get("/allComment")]
pub async fn all_comments(
    _admin: AdminUser,
    filter: web::Query<CommentFilter>,
) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let page = filter.page_query();
    let (views, total) = repo::list_comments(&pool, &filter, &page).await?;
    Ok(HttpResponse::Ok().json(Paged::new(views, total, &page)))
}

/// 管理员修改评论内容
/// PATCH /api/admin/comment/{id}
#[actix_web::patch("/comment/{id}")]
pub async fn patch_comment(
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<AdminUpdateCommentPayload>,
) -> AppResult<impl Responder> {
    if payload
        .content
        .as_deref()
        .map(str::trim)
        .map_or(true, str::is_empty)
    {
        return Err(AppError::bad_request("评论内容不能为空"));
    }
    let pool = default_pool().await?;
    let affected = repo::update_comment(&pool, path.into_inner(), &payload).await?;
    if affected == 0 {
        return Err(AppError::not_found("评论不存在"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "评论已更新"})))
}

/// 注册管理后台路由
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .service(user_counts)
            .service(article_counts)
            .service(comment_counts)
            .service(public_config)
            .service(get_config)
            .service(patch_config)
            .service(all_users)
            .service(patch_user)
            .service(delete_user)
            .service(all_comments)
            .service(patch_comment),
    );
}

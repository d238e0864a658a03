//! 文章接口
//! Article endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::audit::{self, actions, AuditEntry};
use crate::auth::{client_ip, AuthUser, GuestId, MaybeUser};
use crate::db::connection::default_pool;
use crate::db::error::DbError;
use crate::error::{AppError, AppResult};
use crate::http::pagination::{PageQuery, Paged};
use crate::modules::articles::models::{
    ArticleFilter, CreateArticlePayload, UpdateArticlePayload, Viewer,
};
use crate::modules::articles::repo;
use crate::modules::comments::repo as comment_repo;

fn resolve_viewer(maybe: &MaybeUser, guest: &GuestId) -> Viewer {
    match (&maybe.0, &guest.0) {
        (Some(claims), _) => Viewer::User(claims.sub),
        (None, Some(guest_id)) => Viewer::Guest(guest_id.clone()),
        (None, None) => Viewer::Anonymous,
    }
}

/// 发布文章
/// POST /api/articles
#[actix_web::post("")]
pub async fn create_article(
    auth: AuthUser,
    req: HttpRequest,
    payload: web::Json<CreateArticlePayload>,
) -> AppResult<impl Responder> {
    if !payload.has_content() {
        return Err(AppError::bad_request("正文与附件不能同时为空"));
    }
    let pool = default_pool().await?;
    let article = repo::insert_with_attachments(&pool, auth.0.sub, &payload).await?;
    let view = repo::load_views(&pool, std::slice::from_ref(&article), &Viewer::User(auth.0.sub))
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("文章不存在"))?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::ARTICLE_CREATE)
            .user(auth.0.sub)
            .target("article", article.id)
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::Created().json(view))
}

/// 文章列表（置顶优先，时间倒序）
/// GET /api/articles
#[actix_web::get("")]
pub async fn list_articles(
    maybe: MaybeUser,
    guest: GuestId,
    filter: web::Query<ArticleFilter>,
) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let page = filter.page_query();
    let (articles, total) = repo::list(&pool, &filter, &page).await?;
    let viewer = resolve_viewer(&maybe, &guest);
    let views = repo::load_views(&pool, &articles, &viewer).await?;
    Ok(HttpResponse::Ok().json(Paged::new(views, total, &page)))
}

/// 文章详情
/// GET /api/articles/{id}
#[actix_web::get("/{id}")]
pub async fn get_article(
    maybe: MaybeUser,
    guest: GuestId,
    path: web::Path<i64>,
) -> AppResult<impl Responder> {
    let pool = default_pool().await?;
    let article = repo::find_published(&pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    let viewer = resolve_viewer(&maybe, &guest);
    let view = repo::load_views(&pool, std::slice::from_ref(&article), &viewer)
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    Ok(HttpResponse::Ok().json(view))
}

/// 编辑文章，作者或管理员可操作
/// PATCH /api/articles/{id}
#[actix_web::patch("/{id}")]
pub async fn update_article(
    auth: AuthUser,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<UpdateArticlePayload>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let pool = default_pool().await?;
    let article = repo::find_live(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    if article.user_id != auth.0.sub && !auth.0.is_admin() {
        audit::record(
            pool.clone(),
            AuditEntry::new(actions::ARTICLE_UPDATE)
                .failed()
                .user(auth.0.sub)
                .target("article", id)
                .details(json!({"reason": "forbidden"}))
                .ip(client_ip(&req)),
        );
        return Err(AppError::forbidden("只有作者或管理员可以编辑文章"));
    }
    if payload.is_empty() {
        return Err(AppError::bad_request("未提供任何需要更新的字段"));
    }
    repo::update(&pool, id, &payload).await?;
    let updated = repo::find_live(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    let view = repo::load_views(&pool, std::slice::from_ref(&updated), &Viewer::User(auth.0.sub))
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("文章不存在"))?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::ARTICLE_UPDATE)
            .user(auth.0.sub)
            .target("article", id)
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::Ok().json(view))
}

/// 删除文章（软删除），作者或管理员可操作
/// DELETE /api/articles/{id}
#[actix_web::delete("/{id}")]
pub async fn delete_article(
    auth: AuthUser,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let pool = default_pool().await?;
    let article = repo::find_live(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    if article.user_id != auth.0.sub && !auth.0.is_admin() {
        return Err(AppError::forbidden("只有作者或管理员可以删除文章"));
    }
    repo::soft_delete(&pool, id).await?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::ARTICLE_DELETE)
            .user(auth.0.sub)
            .target("article", id)
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::NoContent().finish())
}

/// 文章的评论树：顶层评论分页，内嵌一层回复
/// GET /api/articles/{id}/comments
#[actix_web::get("/{id}/comments")]
pub async fn article_comments(
    path: web::Path<i64>,
    page: web::Query<PageQuery>,
) -> AppResult<impl Responder> {
    let article_id = path.into_inner();
    let pool = default_pool().await?;
    repo::find_published(&pool, article_id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    let (views, total) = comment_repo::top_level_with_replies(&pool, article_id, &page).await?;
    Ok(HttpResponse::Ok().json(Paged::new(views, total, &page)))
}

/// 点赞：登录用户走用户点赞表，游客走游客点赞表
/// POST /api/articles/{id}/like
#[actix_web::post("/{id}/like")]
pub async fn like_article(
    maybe: MaybeUser,
    guest: GuestId,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let pool = default_pool().await?;
    repo::find_published(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    let ip = client_ip(&req);

    match resolve_viewer(&maybe, &guest) {
        Viewer::User(user_id) => {
            repo::like_by_user(&pool, user_id, id).await.map_err(|e| {
                if matches!(e, DbError::Conflict) {
                    AppError::conflict("已经点过赞了")
                } else {
                    e.into()
                }
            })?;
            audit::record(
                pool.clone(),
                AuditEntry::new(actions::LIKE_CREATE)
                    .user(user_id)
                    .target("article", id)
                    .ip(ip),
            );
        }
        Viewer::Guest(guest_id) => {
            // 同一IP的游客赞按防刷处理，见存储层说明
            if repo::guest_like_exists_for_ip(&pool, id, &ip).await? {
                audit::record(
                    pool.clone(),
                    AuditEntry::new(actions::LIKE_CREATE)
                        .failed()
                        .target("article", id)
                        .details(json!({"reason": "ip_throttle"}))
                        .ip(ip),
                );
                return Err(AppError::too_many_requests("操作过于频繁，请稍后再试"));
            }
            repo::like_by_guest(&pool, &guest_id, id, &ip)
                .await
                .map_err(|e| {
                    if matches!(e, DbError::Conflict) {
                        AppError::conflict("已经点过赞了")
                    } else {
                        e.into()
                    }
                })?;
            audit::record(
                pool.clone(),
                AuditEntry::new(actions::LIKE_CREATE)
                    .target("article", id)
                    .details(json!({"guestId": guest_id}))
                    .ip(ip),
            );
        }
        Viewer::Anonymous => {
            return Err(AppError::bad_request("游客点赞需要提供 X-Guest-Id 请求头"));
        }
    }
    Ok(HttpResponse::Ok().json(json!({"message": "点赞成功"})))
}

/// 取消点赞
/// DELETE /api/articles/{id}/like
#[actix_web::delete("/{id}/like")]
pub async fn unlike_article(
    maybe: MaybeUser,
    guest: GuestId,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let pool = default_pool().await?;
    let ip = client_ip(&req);

    let result = match resolve_viewer(&maybe, &guest) {
        Viewer::User(user_id) => {
            let r = repo::unlike_by_user(&pool, user_id, id).await;
            if r.is_ok() {
                audit::record(
                    pool.clone(),
                    AuditEntry::new(actions::LIKE_DELETE)
                        .user(user_id)
                        .target("article", id)
                        .ip(ip),
                );
            }
            r
        }
        Viewer::Guest(guest_id) => {
            let r = repo::unlike_by_guest(&pool, &guest_id, id).await;
            if r.is_ok() {
                audit::record(
                    pool.clone(),
                    AuditEntry::new(actions::LIKE_DELETE)
                        .target("article", id)
                        .details(json!({"guestId": guest_id}))
                        .ip(ip),
                );
            }
            r
        }
        Viewer::Anonymous => {
            return Err(AppError::bad_request("游客操作需要提供 X-Guest-Id 请求头"));
        }
    };

    result.map_err(|e| {
        if matches!(e, DbError::NotFound) {
            AppError::not_found("还没有点过赞")
        } else {
            e.into()
        }
    })?;
    Ok(HttpResponse::Ok().json(json!({"message": "已取消点赞"})))
}

/// 点赞用户列表
/// GET /api/articles/{id}/like
#[actix_web::get("/{id}/like")]
pub async fn article_likers(path: web::Path<i64>) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let pool = default_pool().await?;
    repo::find_published(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    let likers = repo::likers(&pool, id).await?;
    Ok(HttpResponse::Ok().json(likers))
}

/// 注册文章模块路由
pub fn configure_article_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/articles")
            .service(create_article)
            .service(list_articles)
            .service(article_comments)
            .service(like_article)
            .service(unlike_article)
            .service(article_likers)
            .service(get_article)
            .service(update_article)
            .service(delete_article),
    );
}

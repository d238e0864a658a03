//! 评论接口
//! Comment endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::audit::{self, actions, AuditEntry};
use crate::auth::{client_ip, AuthUser};
use crate::db::connection::default_pool;
use crate::error::{AppError, AppResult};
use crate::http::pagination::{PageQuery, Paged};
use crate::modules::articles::repo as article_repo;
use crate::modules::comments::models::{CommentView, CreateCommentPayload};
use crate::modules::comments::repo;
use crate::modules::users::repo as user_repo;

/// 发表评论或回复
/// POST /api/comments
#[actix_web::post("")]
pub async fn create_comment(
    auth: AuthUser,
    req: HttpRequest,
    payload: web::Json<CreateCommentPayload>,
) -> AppResult<impl Responder> {
    let article_id = payload
        .article_id
        .ok_or_else(|| AppError::bad_request("articleId 不能为空"))?;
    let content = payload
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("评论内容不能为空"))?;

    let pool = default_pool().await?;
    article_repo::find_published(&pool, article_id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;

    if let Some(parent_id) = payload.parent_id {
        let parent = repo::find_live(&pool, parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("父评论不存在"))?;
        if parent.article_id != article_id {
            return Err(AppError::bad_request("父评论不属于该文章"));
        }
    }

    let comment =
        repo::insert_with_counter(&pool, article_id, auth.0.sub, payload.parent_id, content)
            .await?;

    let mut view = CommentView::from_comment(&comment);
    if let Some(user) = user_repo::find_by_id(&pool, auth.0.sub).await? {
        view.user = Some(user.summary());
    }

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::COMMENT_CREATE)
            .user(auth.0.sub)
            .target("comment", view.id)
            .details(json!({"articleId": article_id, "parentId": payload.parent_id}))
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::Created().json(view))
}

/// 删除评论及其整棵回复子树（软删除）
/// DELETE /api/comments/{id}
#[actix_web::delete("/{id}")]
pub async fn delete_comment(
    auth: AuthUser,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let pool = default_pool().await?;
    let comment = repo::find_live(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("评论不存在"))?;
    if comment.user_id != auth.0.sub {
        return Err(AppError::forbidden("只能删除自己的评论"));
    }

    let ids = repo::collect_descendants(&pool, id).await?;
    repo::delete_subtree(&pool, comment.article_id, &ids).await?;

    audit::record(
        pool.clone(),
        AuditEntry::new(actions::COMMENT_DELETE)
            .user(auth.0.sub)
            .target("comment", id)
            .details(json!({"articleId": comment.article_id, "deletedIds": ids}))
            .ip(client_ip(&req)),
    );
    Ok(HttpResponse::NoContent().finish())
}

/// 文章评论平铺列表
/// GET /api/comments/{articleId}
#[actix_web::get("/{articleId}")]
pub async fn list_comments(
    path: web::Path<i64>,
    page: web::Query<PageQuery>,
) -> AppResult<impl Responder> {
    let article_id = path.into_inner();
    let pool = default_pool().await?;
    article_repo::find_published(&pool, article_id)
        .await?
        .ok_or_else(|| AppError::not_found("文章不存在"))?;
    let (views, total) = repo::flat_list(&pool, article_id, &page).await?;
    Ok(HttpResponse::Ok().json(Paged::new(views, total, &page)))
}

/// 注册评论模块路由
pub fn configure_comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/comments")
            .service(create_comment)
            .service(delete_comment)
            .service(list_comments),
    );
}

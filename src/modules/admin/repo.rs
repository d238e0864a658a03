//! 管理后台存储层
//! Admin panel storage layer

use std::collections::HashMap;

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::db::error::{DbError, Result};
use crate::http::pagination::PageQuery;
use crate::modules::admin::models::{
    AdminUpdateCommentPayload, AdminUpdateUserPayload, CommentFilter, CountSummary, UserFilter,
};
use crate::modules::comments::models::{Comment, CommentView};
use crate::modules::users::models::User;
use crate::modules::users::repo as user_repo;

/// 用户计数：total 未删除，active status=1
pub async fn user_counts(pool: &Pool<Postgres>) -> Result<CountSummary> {
    let (total, active): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 1) FROM users WHERE deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(CountSummary::new(total, active))
}

/// 文章计数：total 未删除，active 已发布
pub async fn article_counts(pool: &Pool<Postgres>) -> Result<CountSummary> {
    let (total, active): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 1) FROM articles WHERE deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(CountSummary::new(total, active))
}

/// 评论计数：total 未删除，active 顶层评论
pub async fn comment_counts(pool: &Pool<Postgres>) -> Result<CountSummary> {
    let (total, active): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE parent_id IS NULL) FROM comments \
         WHERE deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(CountSummary::new(total, active))
}

/// 全部配置项 / Every config row as a flat map
pub async fn all_config(pool: &Pool<Postgres>) -> Result<HashMap<String, Option<String>>> {
    let rows: Vec<(String, Option<String>)> = sqlx::query_as("SELECT k, v FROM config")
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?;
    Ok(rows.into_iter().collect())
}

/// 白名单内的配置项 / Config rows within the given key whitelist
pub async fn config_subset(
    pool: &Pool<Postgres>,
    keys: &[&str],
) -> Result<HashMap<String, Option<String>>> {
    let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    let rows: Vec<(String, Option<String>)> =
        sqlx::query_as("SELECT k, v FROM config WHERE k = ANY($1)")
            .bind(&keys)
            .fetch_all(pool)
            .await
            .map_err(DbError::classify)?;
    Ok(rows.into_iter().collect())
}

/// 一个事务内更新已存在的配置键，返回实际更新的键列表
/// Update only keys already present, inside one transaction; returns the
/// list of keys that changed
pub async fn update_config(
    pool: &Pool<Postgres>,
    patch: &HashMap<String, String>,
) -> Result<Vec<String>> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    let mut updated = Vec::new();
    for (k, v) in patch {
        let result = sqlx::query("UPDATE config SET v = $1 WHERE k = $2")
            .bind(v)
            .bind(k)
            .execute(&mut *tx)
            .await
            .map_err(DbError::classify)?;
        if result.rows_affected() > 0 {
            updated.push(k.clone());
        }
    }
    tx.commit().await.map_err(DbError::classify)?;
    updated.sort();
    Ok(updated)
}

fn push_user_filters(qb: &mut QueryBuilder<Postgres>, filter: &UserFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(id) = filter.user_id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(username) = &filter.username {
        qb.push(" AND username ILIKE ")
            .push_bind(format!("%{}%", username));
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email ILIKE ")
            .push_bind(format!("%{}%", email));
    }
    if let Some(nickname) = &filter.nickname {
        qb.push(" AND nickname ILIKE ")
            .push_bind(format!("%{}%", nickname));
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
}

/// 用户管理列表，最新注册的在前 / User moderation list, newest first
pub async fn list_users(
    pool: &Pool<Postgres>,
    filter: &UserFilter,
    page: &PageQuery,
) -> Result<(Vec<User>, i64)> {
    let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM users");
    push_user_filters(&mut count_qb, filter);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(DbError::classify)?;

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, username, email, password, nickname, brief, avatar, header_background, \
         role, status, created_at, updated_at, deleted_at FROM users",
    );
    push_user_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb
        .build_query_as::<User>()
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?;
    Ok((rows, total))
}

/// 管理员的用户局部更新，可改状态与角色
pub async fn update_user(
    pool: &Pool<Postgres>,
    id: i64,
    patch: &AdminUpdateUserPayload,
) -> Result<u64> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET updated_at = NOW()");
    if let Some(nickname) = &patch.nickname {
        qb.push(", nickname = ").push_bind(nickname);
    }
    if let Some(brief) = &patch.brief {
        qb.push(", brief = ").push_bind(brief);
    }
    if let Some(avatar) = &patch.avatar {
        qb.push(", avatar = ").push_bind(avatar);
    }
    if let Some(header) = &patch.header_background {
        qb.push(", header_background = ").push_bind(header);
    }
    if let Some(email) = &patch.email {
        qb.push(", email = ").push_bind(email);
    }
    if let Some(status) = patch.status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(role) = patch.role {
        qb.push(", role = ").push_bind(role);
    }
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" AND deleted_at IS NULL");
    let result = qb.build().execute(pool).await.map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

/// 软删除用户 / Soft delete a user
pub async fn delete_user(pool: &Pool<Postgres>, id: i64) -> Result<u64> {
    let result =
        sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await
            .map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

fn push_comment_filters(qb: &mut QueryBuilder<Postgres>, filter: &CommentFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(id) = filter.comment_id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(article_id) = filter.article_id {
        qb.push(" AND article_id = ").push_bind(article_id);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(parent_id) = filter.parent_id {
        qb.push(" AND parent_id = ").push_bind(parent_id);
    }
    if let Some(content) = &filter.content {
        qb.push(" AND content ILIKE ")
            .push_bind(format!("%{}%", content));
    }
}

/// 评论管理列表，最新的在前，带作者摘要
/// Comment moderation list, newest first, author subset embedded
pub async fn list_comments(
    pool: &Pool<Postgres>,
    filter: &CommentFilter,
    page: &PageQuery,
) -> Result<(Vec<CommentView>, i64)> {
    let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM comments");
    push_comment_filters(&mut count_qb, filter);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(DbError::classify)?;

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, article_id, user_id, parent_id, content, created_at, updated_at, deleted_at \
         FROM comments",
    );
    push_comment_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb
        .build_query_as::<Comment>()
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?;

    let mut user_ids: Vec<i64> = rows.iter().map(|c| c.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users: HashMap<i64, _> = user_repo::find_many(pool, &user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect();

    let views = rows
        .iter()
        .map(|c| {
            let mut v = CommentView::from_comment(c);
            v.user = users.get(&c.user_id).cloned();
            v
        })
        .collect();
    Ok((views, total))
}

/// 管理员修改评论内容 / Admin comment content update
pub async fn update_comment(
    pool: &Pool<Postgres>,
    id: i64,
    patch: &AdminUpdateCommentPayload,
) -> Result<u64> {
    let content = patch.content.as_deref().unwrap_or_default();
    let result = sqlx::query(
        "UPDATE comments SET content = $1, updated_at = NOW() \
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(content)
    .bind(id)
    .execute(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

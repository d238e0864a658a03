//! 评论存储层
//! Comment storage layer
//!
//! 子树删除先按层收集后代，再在一个事务里批量软删并按行数扣减计数。
//! Subtree deletion first collects descendants level by level, then one
//! transaction bulk soft-deletes and decrements the counter by the row count.

use std::collections::HashMap;
use std::future::Future;

use sqlx::{Pool, Postgres};

use crate::db::error::{DbError, Result};
use crate::http::pagination::PageQuery;
use crate::modules::comments::models::{Comment, CommentView};
use crate::modules::users::repo as user_repo;

const COMMENT_COLUMNS: &str =
    "id, article_id, user_id, parent_id, content, created_at, updated_at, deleted_at";

/// 按 id 查询未删除评论 / Find a live comment
pub async fn find_live(pool: &Pool<Postgres>, id: i64) -> Result<Option<Comment>> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE id = $1 AND deleted_at IS NULL",
        COMMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(DbError::classify)
}

/// 一个事务内插入评论并给文章计数 +1
/// Insert the comment and bump the article counter in one transaction
pub async fn insert_with_counter(
    pool: &Pool<Postgres>,
    article_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    content: &str,
) -> Result<Comment> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "INSERT INTO comments (article_id, user_id, parent_id, content) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(article_id)
    .bind(user_id)
    .bind(parent_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await
    .map_err(DbError::classify)?;
    sqlx::query("UPDATE articles SET comment_count = comment_count + 1 WHERE id = $1")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    tx.commit().await.map_err(DbError::classify)?;
    Ok(comment)
}

/// 逐层扩展边界收集整棵子树的 id，边界为空时结束
/// Expand the frontier level by level until it comes back empty,
/// accumulating every visited id
pub async fn bfs_collect<F, Fut, E>(root: i64, mut children_of: F) -> std::result::Result<Vec<i64>, E>
where
    F: FnMut(Vec<i64>) -> Fut,
    Fut: Future<Output = std::result::Result<Vec<i64>, E>>,
{
    let mut collected = vec![root];
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        let next = children_of(frontier).await?;
        collected.extend_from_slice(&next);
        frontier = next;
    }
    Ok(collected)
}

/// 目标评论及其所有未删除后代的 id
/// The target comment plus all of its live descendants
pub async fn collect_descendants(pool: &Pool<Postgres>, root: i64) -> Result<Vec<i64>> {
    bfs_collect(root, |frontier| {
        let pool = pool.clone();
        async move {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM comments WHERE parent_id = ANY($1) AND deleted_at IS NULL",
            )
            .bind(frontier)
            .fetch_all(&pool)
            .await
            .map_err(DbError::classify)
        }
    })
    .await
}

/// 一个事务内批量软删并按实际删除行数扣减文章计数，返回删除行数
/// Bulk soft-delete and decrement the article counter by the affected
/// row count, all in one transaction
pub async fn delete_subtree(pool: &Pool<Postgres>, article_id: i64, ids: &[i64]) -> Result<u64> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    let deleted = sqlx::query(
        "UPDATE comments SET deleted_at = NOW() WHERE id = ANY($1) AND deleted_at IS NULL",
    )
    .bind(ids)
    .execute(&mut *tx)
    .await
    .map_err(DbError::classify)?;
    sqlx::query("UPDATE articles SET comment_count = comment_count - $1 WHERE id = $2")
        .bind(deleted.rows_affected() as i64)
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    tx.commit().await.map_err(DbError::classify)?;
    Ok(deleted.rows_affected())
}

async fn attach_users(pool: &Pool<Postgres>, views: &mut [CommentView]) -> Result<()> {
    let mut user_ids: Vec<i64> = views
        .iter()
        .flat_map(|v| {
            std::iter::once(v.user_id).chain(v.replies.iter().map(|r| r.user_id))
        })
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users: HashMap<i64, _> = user_repo::find_many(pool, &user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect();
    for view in views.iter_mut() {
        view.user = users.get(&view.user_id).cloned();
        for reply in view.replies.iter_mut() {
            reply.user = users.get(&reply.user_id).cloned();
        }
    }
    Ok(())
}

/// 顶层评论分页（时间正序），每条内嵌一层未删除回复；total 统计文章全部未删除评论
/// Paginated top-level comments (ascending), each embedding one level of
/// live replies; total counts every live comment of the article
pub async fn top_level_with_replies(
    pool: &Pool<Postgres>,
    article_id: i64,
    page: &PageQuery,
) -> Result<(Vec<CommentView>, i64)> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments WHERE article_id = $1 AND deleted_at IS NULL",
    )
    .bind(article_id)
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;

    let top = sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE article_id = $1 AND parent_id IS NULL \
         AND deleted_at IS NULL ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        COMMENT_COLUMNS
    ))
    .bind(article_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(DbError::classify)?;

    let mut views: Vec<CommentView> = top.iter().map(CommentView::from_comment).collect();
    let top_ids: Vec<i64> = top.iter().map(|c| c.id).collect();
    if !top_ids.is_empty() {
        let replies = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE parent_id = ANY($1) AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        ))
        .bind(&top_ids)
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?;

        let index: HashMap<i64, usize> =
            views.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
        for reply in &replies {
            if let Some(&i) = reply.parent_id.as_ref().and_then(|p| index.get(p)) {
                views[i].replies.push(CommentView::from_comment(reply));
            }
        }
    }
    attach_users(pool, &mut views).await?;
    Ok((views, total))
}

#[derive(Debug, sqlx::FromRow)]
struct FlatCommentRow {
    id: i64,
    article_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    content: String,
    created_at: chrono::NaiveDateTime,
    parent_display_name: Option<String>,
}

/// 平铺评论列表，带父评论者展示名
/// Flat comment list with the parent author's display name
pub async fn flat_list(
    pool: &Pool<Postgres>,
    article_id: i64,
    page: &PageQuery,
) -> Result<(Vec<CommentView>, i64)> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments WHERE article_id = $1 AND deleted_at IS NULL",
    )
    .bind(article_id)
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;

    let rows = sqlx::query_as::<_, FlatCommentRow>(
        "SELECT c.id, c.article_id, c.user_id, c.parent_id, c.content, c.created_at, \
                COALESCE(NULLIF(pu.nickname, ''), pu.username) AS parent_display_name \
         FROM comments c \
         LEFT JOIN comments p ON p.id = c.parent_id \
         LEFT JOIN users pu ON pu.id = p.user_id \
         WHERE c.article_id = $1 AND c.deleted_at IS NULL \
         ORDER BY c.created_at ASC, c.id ASC LIMIT $2 OFFSET $3",
    )
    .bind(article_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(DbError::classify)?;

    let mut views: Vec<CommentView> = rows
        .into_iter()
        .map(|r| CommentView {
            id: r.id,
            article_id: r.article_id,
            user_id: r.user_id,
            parent_id: r.parent_id,
            content: r.content,
            created_at: r.created_at,
            user: None,
            replies: Vec::new(),
            parent_display_name: r.parent_display_name,
        })
        .collect();
    attach_users(pool, &mut views).await?;
    Ok((views, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn children_map() -> HashMap<i64, Vec<i64>> {
        // 1 ── 2 ── 4
        //   └─ 3    └─ 5
        let mut tree = HashMap::new();
        tree.insert(1, vec![2, 3]);
        tree.insert(2, vec![4]);
        tree.insert(4, vec![5]);
        tree
    }

    async fn collect_in_memory(root: i64, tree: HashMap<i64, Vec<i64>>) -> Vec<i64> {
        bfs_collect::<_, _, std::convert::Infallible>(root, |frontier| {
            let tree = tree.clone();
            async move {
                Ok(frontier
                    .iter()
                    .flat_map(|id| tree.get(id).cloned().unwrap_or_default())
                    .collect())
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_bfs_collects_whole_subtree() {
        let ids = collect_in_memory(1, children_map()).await;
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_bfs_from_mid_tree_node() {
        let ids = collect_in_memory(2, children_map()).await;
        assert_eq!(ids, vec![2, 4, 5]);
    }

    #[tokio::test]
    async fn test_bfs_leaf_only_collects_itself() {
        let ids = collect_in_memory(3, children_map()).await;
        assert_eq!(ids, vec![3]);
    }
}

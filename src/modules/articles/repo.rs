//! 文章存储层
//! Article storage layer
//!
//! 点赞/取消点赞与计数列同事务更新，计数列从不重算。
//! Likes and the counter column change in one transaction, the counter is
//! never recomputed from child rows.

use std::collections::{HashMap, HashSet};

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::db::error::{DbError, Result};
use crate::http::pagination::PageQuery;
use crate::modules::articles::models::{
    Article, ArticleFilter, ArticleView, Attachment, CreateArticlePayload, LikerEntry,
    UpdateArticlePayload, Viewer,
};
use crate::modules::users::repo as user_repo;

const ARTICLE_COLUMNS: &str = "id, user_id, content, status, type, location, is_top, is_ad, \
     like_count, comment_count, created_at, updated_at, deleted_at";

/// 一个事务内插入文章与有序附件
/// Insert the article row plus ordered attachments in one transaction
pub async fn insert_with_attachments(
    pool: &Pool<Postgres>,
    user_id: i64,
    payload: &CreateArticlePayload,
) -> Result<Article> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;

    let article = sqlx::query_as::<_, Article>(&format!(
        "INSERT INTO articles (user_id, content, status, type, location, is_top, is_ad) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
        ARTICLE_COLUMNS
    ))
    .bind(user_id)
    .bind(payload.content.as_deref())
    .bind(payload.status.unwrap_or(1))
    .bind(payload.kind.unwrap_or(0))
    .bind(payload.location.as_deref())
    .bind(payload.is_top)
    .bind(payload.is_ad)
    .fetch_one(&mut *tx)
    .await
    .map_err(DbError::classify)?;

    for (i, url) in payload.images.iter().enumerate() {
        sqlx::query("INSERT INTO article_images (article_id, image_url, sort_order) VALUES ($1, $2, $3)")
            .bind(article.id)
            .bind(url)
            .bind(i as i32)
            .execute(&mut *tx)
            .await
            .map_err(DbError::classify)?;
    }
    for (i, url) in payload.videos.iter().enumerate() {
        sqlx::query("INSERT INTO article_videos (article_id, video_url, sort_order) VALUES ($1, $2, $3)")
            .bind(article.id)
            .bind(url)
            .bind(i as i32)
            .execute(&mut *tx)
            .await
            .map_err(DbError::classify)?;
    }

    tx.commit().await.map_err(DbError::classify)?;
    Ok(article)
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, filter: &ArticleFilter) {
    qb.push(" WHERE status = 1 AND deleted_at IS NULL");
    if let Some(id) = filter.article_id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(content) = &filter.content {
        qb.push(" AND content ILIKE ")
            .push_bind(format!("%{}%", content));
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND type = ").push_bind(kind);
    }
    if let Some(is_top) = filter.is_top {
        qb.push(" AND is_top = ").push_bind(is_top);
    }
    if let Some(is_ad) = filter.is_ad {
        qb.push(" AND is_ad = ").push_bind(is_ad);
    }
}

/// 已发布文章列表与总数 / Published feed page plus total count
pub async fn list(
    pool: &Pool<Postgres>,
    filter: &ArticleFilter,
    page: &PageQuery,
) -> Result<(Vec<Article>, i64)> {
    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM articles");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(DbError::classify)?;

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM articles", ARTICLE_COLUMNS));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY is_top DESC, created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb
        .build_query_as::<Article>()
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?;

    Ok((rows, total))
}

/// 按 id 查询已发布未删除的文章 / Find a published live article
pub async fn find_published(pool: &Pool<Postgres>, id: i64) -> Result<Option<Article>> {
    sqlx::query_as::<_, Article>(&format!(
        "SELECT {} FROM articles WHERE id = $1 AND status = 1 AND deleted_at IS NULL",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(DbError::classify)
}

/// 按 id 查询未删除的文章（不限状态） / Find a live article regardless of status
pub async fn find_live(pool: &Pool<Postgres>, id: i64) -> Result<Option<Article>> {
    sqlx::query_as::<_, Article>(&format!(
        "SELECT {} FROM articles WHERE id = $1 AND deleted_at IS NULL",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(DbError::classify)
}

/// 局部更新文章 / Partial article update
pub async fn update(pool: &Pool<Postgres>, id: i64, patch: &UpdateArticlePayload) -> Result<u64> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("UPDATE articles SET updated_at = NOW()");
    if let Some(content) = &patch.content {
        qb.push(", content = ").push_bind(content);
    }
    if let Some(status) = patch.status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(kind) = patch.kind {
        qb.push(", type = ").push_bind(kind);
    }
    if let Some(location) = &patch.location {
        qb.push(", location = ").push_bind(location);
    }
    if let Some(is_top) = patch.is_top {
        qb.push(", is_top = ").push_bind(is_top);
    }
    if let Some(is_ad) = patch.is_ad {
        qb.push(", is_ad = ").push_bind(is_ad);
    }
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" AND deleted_at IS NULL");
    let result = qb.build().execute(pool).await.map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

/// 软删除文章 / Soft delete
pub async fn soft_delete(pool: &Pool<Postgres>, id: i64) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE articles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

async fn attachments(
    pool: &Pool<Postgres>,
    table: &str,
    url_column: &str,
    ids: &[i64],
) -> Result<Vec<Attachment>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Attachment>(&format!(
        "SELECT article_id, {} AS url, sort_order FROM {} WHERE article_id = ANY($1) \
         ORDER BY sort_order ASC",
        url_column, table
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
    .map_err(DbError::classify)
}

/// 某批文章里请求方点过赞的文章 id 集合
/// Article ids within the batch the viewer has liked
pub async fn liked_ids(
    pool: &Pool<Postgres>,
    viewer: &Viewer,
    ids: &[i64],
) -> Result<HashSet<i64>> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows: Vec<i64> = match viewer {
        Viewer::User(user_id) => sqlx::query_scalar(
            "SELECT article_id FROM article_likes WHERE user_id = $1 AND article_id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?,
        Viewer::Guest(guest_id) => sqlx::query_scalar(
            "SELECT article_id FROM article_guest_likes WHERE guest_id = $1 AND article_id = ANY($2)",
        )
        .bind(guest_id)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(DbError::classify)?,
        Viewer::Anonymous => Vec::new(),
    };
    Ok(rows.into_iter().collect())
}

/// 组装对外视图：作者摘要、有序附件、isLiked
/// Assemble outward views: author subset, ordered attachments, isLiked
pub async fn load_views(
    pool: &Pool<Postgres>,
    articles: &[Article],
    viewer: &Viewer,
) -> Result<Vec<ArticleView>> {
    let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
    let mut author_ids: Vec<i64> = articles.iter().map(|a| a.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i64, _> = user_repo::find_many(pool, &author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect();
    let images = attachments(pool, "article_images", "image_url", &ids).await?;
    let videos = attachments(pool, "article_videos", "video_url", &ids).await?;
    let liked = liked_ids(pool, viewer, &ids).await?;

    let mut views: Vec<ArticleView> = articles
        .iter()
        .map(|a| {
            let mut view = ArticleView::from_article(a);
            view.user = authors.get(&a.user_id).cloned();
            view.is_liked = liked.contains(&a.id);
            view
        })
        .collect();

    let index: HashMap<i64, usize> = views.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
    for img in images {
        if let Some(&i) = index.get(&img.article_id) {
            views[i].images.push(img.url);
        }
    }
    for vid in videos {
        if let Some(&i) = index.get(&vid.article_id) {
            views[i].videos.push(vid.url);
        }
    }
    Ok(views)
}

/// 登录用户点赞：点赞行与计数同事务，重复点赞由唯一约束转为 Conflict
/// Authenticated like: row and counter in one transaction, duplicates
/// surface as Conflict via the primary key
pub async fn like_by_user(pool: &Pool<Postgres>, user_id: i64, article_id: i64) -> Result<()> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    sqlx::query("INSERT INTO article_likes (user_id, article_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    sqlx::query("UPDATE articles SET like_count = like_count + 1 WHERE id = $1")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    tx.commit().await.map_err(DbError::classify)
}

/// 登录用户取消点赞，无点赞行时返回 NotFound
pub async fn unlike_by_user(pool: &Pool<Postgres>, user_id: i64, article_id: i64) -> Result<()> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    let deleted = sqlx::query("DELETE FROM article_likes WHERE user_id = $1 AND article_id = $2")
        .bind(user_id)
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    if deleted.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    sqlx::query("UPDATE articles SET like_count = like_count - 1 WHERE id = $1")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    tx.commit().await.map_err(DbError::classify)
}

/// 同一IP是否已给该文章留过游客点赞（简单防刷，已知偏弱）
/// Whether the same IP already holds a guest like on the article
/// (simple throttle heuristic, known to be weak)
pub async fn guest_like_exists_for_ip(
    pool: &Pool<Postgres>,
    article_id: i64,
    ip: &str,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM article_guest_likes WHERE article_id = $1 AND ip_address = $2",
    )
    .bind(article_id)
    .bind(ip)
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(count > 0)
}

/// 游客点赞 / Guest like
pub async fn like_by_guest(
    pool: &Pool<Postgres>,
    guest_id: &str,
    article_id: i64,
    ip: &str,
) -> Result<()> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    sqlx::query("INSERT INTO article_guest_likes (guest_id, article_id, ip_address) VALUES ($1, $2, $3)")
        .bind(guest_id)
        .bind(article_id)
        .bind(ip)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    sqlx::query("UPDATE articles SET like_count = like_count + 1 WHERE id = $1")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    tx.commit().await.map_err(DbError::classify)
}

/// 游客取消点赞 / Guest unlike
pub async fn unlike_by_guest(
    pool: &Pool<Postgres>,
    guest_id: &str,
    article_id: i64,
) -> Result<()> {
    let mut tx = pool.begin().await.map_err(DbError::classify)?;
    let deleted =
        sqlx::query("DELETE FROM article_guest_likes WHERE guest_id = $1 AND article_id = $2")
            .bind(guest_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::classify)?;
    if deleted.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    sqlx::query("UPDATE articles SET like_count = like_count - 1 WHERE id = $1")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::classify)?;
    tx.commit().await.map_err(DbError::classify)
}

/// 点赞用户列表，最新的在前 / Liking users, newest first
pub async fn likers(pool: &Pool<Postgres>, article_id: i64) -> Result<Vec<LikerEntry>> {
    sqlx::query_as::<_, LikerEntry>(
        "SELECT u.id, u.username, \
                COALESCE(NULLIF(u.nickname, ''), u.username) AS display_name, u.avatar \
         FROM article_likes al JOIN users u ON u.id = al.user_id \
         WHERE al.article_id = $1 ORDER BY al.created_at DESC",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .map_err(DbError::classify)
}

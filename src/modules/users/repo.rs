//! 用户存储层
//! User storage layer

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::db::error::{DbError, Result};
use crate::modules::users::models::{UpdateProfilePayload, User};

const USER_COLUMNS: &str = "id, username, email, password, nickname, brief, avatar, \
     header_background, role, status, created_at, updated_at, deleted_at";

/// 按 id 查询未删除用户 / Find a live user by id
pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(DbError::classify)
}

/// 按用户名查询未删除用户 / Find a live user by username
pub async fn find_by_username(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1 AND deleted_at IS NULL",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(DbError::classify)
}

/// 按用户名或邮箱查询（登录标识） / Find by username or email (login identifier)
pub async fn find_by_identifier(pool: &Pool<Postgres>, identifier: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE (username = $1 OR email = $1) AND deleted_at IS NULL",
        USER_COLUMNS
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
    .map_err(DbError::classify)
}

/// 用户名或邮箱是否已被占用 / Whether username or email is already taken
pub async fn identifier_taken(
    pool: &Pool<Postgres>,
    username: &str,
    email: Option<&str>,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE (username = $1 OR ($2::TEXT IS NOT NULL AND email = $2)) \
         AND deleted_at IS NULL",
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(count > 0)
}

/// 插入新用户 / Insert a new user
pub async fn insert(
    pool: &Pool<Postgres>,
    username: &str,
    password_hash: &str,
    email: Option<&str>,
    nickname: Option<&str>,
) -> Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password, email, nickname) VALUES ($1, $2, $3, $4) \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(username)
    .bind(password_hash)
    .bind(email)
    .bind(nickname)
    .fetch_one(pool)
    .await
    .map_err(DbError::classify)
}

/// 局部更新个人资料，返回影响行数
/// Partial profile update, returns affected rows
pub async fn update_profile(
    pool: &Pool<Postgres>,
    id: i64,
    patch: &UpdateProfilePayload,
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
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" AND deleted_at IS NULL");

    let result = qb.build().execute(pool).await.map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

/// 更新密码哈希 / Update the password hash
pub async fn update_password(pool: &Pool<Postgres>, id: i64, password_hash: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(password_hash)
    .bind(id)
    .execute(pool)
    .await
    .map_err(DbError::classify)?;
    Ok(result.rows_affected())
}

/// 批量查询用户摘要用列 / Batch fetch users for embedding
pub async fn find_many(pool: &Pool<Postgres>, ids: &[i64]) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ANY($1)",
        USER_COLUMNS
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
    .map_err(DbError::classify)
}

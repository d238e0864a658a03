use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("配置错误: {0}")]
    Config(String),
    #[error("SQLx 错误: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("未找到记录")]
    NotFound,
    #[error("唯一约束冲突")]
    Conflict,
}

impl DbError {
    /// 将 SQLx 错误归一化：唯一约束冲突与未找到分别映射
    /// Normalize a SQLx error: unique violations and missing rows get their own variants
    pub fn classify(e: sqlx::Error) -> DbError {
        match &e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db) => {
                // PostgreSQL 23505 = unique_violation
                if db.code().as_deref() == Some("23505") {
                    DbError::Conflict
                } else {
                    DbError::Sqlx(e)
                }
            }
            _ => DbError::Sqlx(e),
        }
    }
}

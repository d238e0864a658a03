//! 操作审计日志
//! Operation audit logging
//!
//! 写入 logs 表。日志写入失败不影响业务流程，只记录告警。
//! Writes to the logs table. A failed write never breaks the business flow.

use serde_json::Value;
use sqlx::{Pool, Postgres};

/// 审计动作常量 / Audit action constants
pub mod actions {
    pub const USER_REGISTER_SUCCESS: &str = "USER_REGISTER_SUCCESS";
    pub const USER_LOGIN_SUCCESS: &str = "USER_LOGIN_SUCCESS";
    pub const USER_LOGIN_FAILED: &str = "USER_LOGIN_FAILED";
    pub const USER_UPDATE_PROFILE: &str = "USER_UPDATE_PROFILE";
    pub const ARTICLE_CREATE: &str = "ARTICLE_CREATE";
    pub const ARTICLE_UPDATE: &str = "ARTICLE_UPDATE";
    pub const ARTICLE_DELETE: &str = "ARTICLE_DELETE";
    pub const COMMENT_CREATE: &str = "COMMENT_CREATE";
    pub const COMMENT_DELETE: &str = "COMMENT_DELETE";
    pub const LIKE_CREATE: &str = "LIKE_CREATE";
    pub const LIKE_DELETE: &str = "LIKE_DELETE";
}

/// 一条待写入的审计记录 / One audit entry to persist
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<i64>,
    pub action: &'static str,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    /// SUCCESS / FAILED
    pub status: &'static str,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    pub fn new(action: &'static str) -> Self {
        Self {
            user_id: None,
            action,
            target_type: None,
            target_id: None,
            status: "SUCCESS",
            details: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn target<T: Into<String>>(mut self, target_type: T, target_id: i64) -> Self {
        self.target_type = Some(target_type.into());
        self.target_id = Some(target_id);
        self
    }

    pub fn failed(mut self) -> Self {
        self.status = "FAILED";
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip<T: Into<String>>(mut self, ip: T) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn user_agent_opt(mut self, ua: Option<String>) -> Self {
        self.user_agent = ua;
        self
    }
}

/// 同步写入一条审计记录 / Persist one entry synchronously
pub async fn write(pool: &Pool<Postgres>, entry: &AuditEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO logs (user_id, action, target_type, target_id, status, details, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.target_type.as_deref())
    .bind(entry.target_id)
    .bind(entry.status)
    .bind(entry.details.clone())
    .bind(entry.ip_address.as_deref())
    .bind(entry.user_agent.as_deref())
    .execute(pool)
    .await
    .map(|_| ())
}

/// 异步落库，不阻塞调用方，失败仅告警
/// Fire-and-forget persist, failures only produce a warning
pub fn record(pool: Pool<Postgres>, entry: AuditEntry) {
    tokio::spawn(async move {
        if let Err(e) = write(&pool, &entry).await {
            tracing::warn!(action = entry.action, "审计日志写入失败: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_builder() {
        let entry = AuditEntry::new(actions::USER_LOGIN_FAILED)
            .failed()
            .details(json!({"username": "alice"}))
            .ip("127.0.0.1");
        assert_eq!(entry.action, "USER_LOGIN_FAILED");
        assert_eq!(entry.status, "FAILED");
        assert!(entry.user_id.is_none());
        assert_eq!(entry.ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_entry_target() {
        let entry = AuditEntry::new(actions::ARTICLE_DELETE)
            .user(3)
            .target("article", 99);
        assert_eq!(entry.user_id, Some(3));
        assert_eq!(entry.target_type.as_deref(), Some("article"));
        assert_eq!(entry.target_id, Some(99));
        assert_eq!(entry.status, "SUCCESS");
    }
}

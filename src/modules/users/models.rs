//! 用户数据模型
//! User data models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// users 表的完整行 / Full row of the users table
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// argon2 PHC 哈希，永不序列化
    pub password: String,
    pub nickname: Option<String>,
    pub brief: Option<String>,
    pub avatar: Option<String>,
    pub header_background: Option<String>,
    /// 0普通用户 1管理员
    pub role: i16,
    /// 0未激活 1正常 2封禁
    pub status: i16,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// 展示名：昵称优先，回退到用户名
    pub fn display_name(&self) -> String {
        self.nickname
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.username.clone())
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name(),
            avatar: self.avatar.clone(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            nickname: self.nickname.clone(),
            brief: self.brief.clone(),
            avatar: self.avatar.clone(),
            header_background: self.header_background.clone(),
            role: self.role,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// 对外的用户信息，不含密码 / Outward user info, never carries the password
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub brief: Option<String>,
    pub avatar: Option<String>,
    pub header_background: Option<String>,
    pub role: i16,
    pub status: i16,
    pub created_at: NaiveDateTime,
}

/// 嵌入到文章/评论里的用户摘要 / User subset embedded in articles and comments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

/// 公开主页的用户子集 / Public profile subset
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub brief: Option<String>,
    pub avatar: Option<String>,
    pub header_background: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<&User> for PublicProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            nickname: u.nickname.clone(),
            brief: u.brief.clone(),
            avatar: u.avatar.clone(),
            header_background: u.header_background.clone(),
            created_at: u.created_at,
        }
    }
}

/// 个人资料更新请求 / Profile patch payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    pub nickname: Option<String>,
    pub brief: Option<String>,
    pub avatar: Option<String>,
    pub header_background: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfilePayload {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.brief.is_none()
            && self.avatar.is_none()
            && self.header_background.is_none()
            && self.email.is_none()
    }
}

/// 修改密码请求 / Password change payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    pub old_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = chrono::Utc::now().naive_utc();
        User {
            id: 1,
            username: "alice".into(),
            email: Some("a@example.com".into()),
            password: "$argon2id$...".into(),
            nickname: Some("Ally".into()),
            brief: None,
            avatar: None,
            header_background: None,
            role: 0,
            status: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        let mut u = sample_user();
        assert_eq!(u.display_name(), "Ally");
        u.nickname = Some(String::new());
        assert_eq!(u.display_name(), "alice");
        u.nickname = None;
        assert_eq!(u.display_name(), "alice");
    }

    #[test]
    fn test_profile_never_contains_password() {
        let u = sample_user();
        let v = serde_json::to_value(u.profile()).unwrap();
        assert!(v.get("password").is_none());
        assert_eq!(v["username"], "alice");
        assert_eq!(v["headerBackground"], serde_json::Value::Null);
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(UpdateProfilePayload::default().is_empty());
        let p = UpdateProfilePayload {
            brief: Some("hi".into()),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }
}

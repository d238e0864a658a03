//! 管理后台数据模型
//! Admin panel data models

use serde::{Deserialize, Serialize};

use crate::http::pagination::PageQuery;

/// 资源计数概览 / Resource count summary
#[derive(Debug, Clone, Serialize)]
pub struct CountSummary {
    pub total: i64,
    pub active: i64,
    pub negative: i64,
}

impl CountSummary {
    pub fn new(total: i64, active: i64) -> Self {
        Self {
            total,
            active,
            negative: total - active,
        }
    }
}

/// 用户管理列表筛选 / User moderation filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub status: Option<i16>,
    pub role: Option<i16>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

impl UserFilter {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// 评论管理列表筛选 / Comment moderation filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilter {
    pub comment_id: Option<i64>,
    pub article_id: Option<i64>,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub content: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

impl CommentFilter {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// 管理员的用户更新请求，可改状态和角色
/// Admin user patch, may change status and role
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserPayload {
    pub nickname: Option<String>,
    pub brief: Option<String>,
    pub avatar: Option<String>,
    pub header_background: Option<String>,
    pub email: Option<String>,
    pub status: Option<i16>,
    pub role: Option<i16>,
}

impl AdminUpdateUserPayload {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.brief.is_none()
            && self.avatar.is_none()
            && self.header_background.is_none()
            && self.email.is_none()
            && self.status.is_none()
            && self.role.is_none()
    }
}

/// 管理员的评论更新请求 / Admin comment patch
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUpdateCommentPayload {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_summary_negative() {
        let s = CountSummary::new(10, 7);
        assert_eq!(s.negative, 3);
    }

    #[test]
    fn test_admin_user_patch_empty_detection() {
        assert!(AdminUpdateUserPayload::default().is_empty());
        let p = AdminUpdateUserPayload {
            status: Some(2),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }
}

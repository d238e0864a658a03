//! 评论数据模型
//! Comment data models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::modules::users::models::UserSummary;

/// comments 表的行 / Row of the comments table
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

/// 对外的评论视图，树形接口带一层回复，平铺接口带父评论者展示名
/// Outward comment view: tree endpoint embeds one reply level, the flat
/// endpoint carries the parent author's display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub user: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_display_name: Option<String>,
}

impl CommentView {
    pub fn from_comment(c: &Comment) -> Self {
        Self {
            id: c.id,
            article_id: c.article_id,
            user_id: c.user_id,
            parent_id: c.parent_id,
            content: c.content.clone(),
            created_at: c.created_at,
            user: None,
            replies: Vec::new(),
            parent_display_name: None,
        }
    }
}

/// 发表评论请求 / Create comment payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentPayload {
    pub article_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_serialization_skips_empty_extras() {
        let now = chrono::Utc::now().naive_utc();
        let c = Comment {
            id: 1,
            article_id: 2,
            user_id: 3,
            parent_id: None,
            content: "nice".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let v = serde_json::to_value(CommentView::from_comment(&c)).unwrap();
        assert_eq!(v["articleId"], 2);
        assert!(v.get("replies").is_none());
        assert!(v.get("parentDisplayName").is_none());
    }
}

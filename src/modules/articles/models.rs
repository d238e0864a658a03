//! 文章数据模型
//! Article data models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::http::pagination::PageQuery;
use crate::modules::users::models::UserSummary;

/// articles 表的行 / Row of the articles table
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: i64,
    pub user_id: i64,
    pub content: Option<String>,
    /// 0草稿 1已发布
    pub status: i16,
    #[sqlx(rename = "type")]
    pub kind: i16,
    pub location: Option<String>,
    pub is_top: bool,
    pub is_ad: bool,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

/// 附件行（图片/视频通用） / Attachment row (shared by images and videos)
#[derive(Debug, Clone, FromRow)]
pub struct Attachment {
    pub article_id: i64,
    pub url: String,
    pub sort_order: i32,
}

/// 请求方身份，用于计算 isLiked
/// The requesting party, used to compute isLiked
#[derive(Debug, Clone)]
pub enum Viewer {
    User(i64),
    Guest(String),
    Anonymous,
}

/// 对外的文章视图 / Outward article view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: i64,
    pub user_id: i64,
    pub content: Option<String>,
    pub status: i16,
    #[serde(rename = "type")]
    pub kind: i16,
    pub location: Option<String>,
    pub is_top: bool,
    pub is_ad: bool,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: NaiveDateTime,
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub is_liked: bool,
}

impl ArticleView {
    pub fn from_article(article: &Article) -> Self {
        Self {
            id: article.id,
            user_id: article.user_id,
            content: article.content.clone(),
            status: article.status,
            kind: article.kind,
            location: article.location.clone(),
            is_top: article.is_top,
            is_ad: article.is_ad,
            like_count: article.like_count,
            comment_count: article.comment_count,
            created_at: article.created_at,
            user: None,
            images: Vec::new(),
            videos: Vec::new(),
            is_liked: false,
        }
    }
}

/// 发布文章请求 / Create article payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticlePayload {
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub status: Option<i16>,
    #[serde(rename = "type")]
    pub kind: Option<i16>,
    pub location: Option<String>,
    #[serde(default)]
    pub is_top: bool,
    #[serde(default)]
    pub is_ad: bool,
}

impl CreateArticlePayload {
    /// 正文或附件至少要有其一
    pub fn has_content(&self) -> bool {
        self.content.as_deref().map_or(false, |c| !c.trim().is_empty())
            || !self.images.is_empty()
            || !self.videos.is_empty()
    }
}

/// 编辑文章请求 / Update article payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticlePayload {
    pub content: Option<String>,
    pub status: Option<i16>,
    #[serde(rename = "type")]
    pub kind: Option<i16>,
    pub location: Option<String>,
    pub is_top: Option<bool>,
    pub is_ad: Option<bool>,
}

impl UpdateArticlePayload {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.status.is_none()
            && self.kind.is_none()
            && self.location.is_none()
            && self.is_top.is_none()
            && self.is_ad.is_none()
    }
}

/// 文章列表筛选参数 / Feed filter params
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilter {
    pub article_id: Option<i64>,
    pub user_id: Option<i64>,
    pub content: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<i16>,
    pub is_top: Option<bool>,
    pub is_ad: Option<bool>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

impl ArticleFilter {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// 点赞用户条目 / Liking-user entry
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LikerEntry {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payload_requires_substance() {
        assert!(!CreateArticlePayload::default().has_content());
        let blank = CreateArticlePayload {
            content: Some("   ".into()),
            ..Default::default()
        };
        assert!(!blank.has_content());
        let with_text = CreateArticlePayload {
            content: Some("hello".into()),
            ..Default::default()
        };
        assert!(with_text.has_content());
        let with_image = CreateArticlePayload {
            images: vec!["https://cdn/x.jpg".into()],
            ..Default::default()
        };
        assert!(with_image.has_content());
    }

    #[test]
    fn test_update_payload_empty_detection() {
        assert!(UpdateArticlePayload::default().is_empty());
        let p = UpdateArticlePayload {
            is_top: Some(true),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }

    #[test]
    fn test_filter_deserializes_camel_case() {
        let f: ArticleFilter =
            serde_json::from_str(r#"{"userId": 3, "isTop": true, "type": 1, "pageSize": 10}"#)
                .unwrap();
        assert_eq!(f.user_id, Some(3));
        assert_eq!(f.is_top, Some(true));
        assert_eq!(f.kind, Some(1));
        assert_eq!(f.page_query().page_size(), 10);
    }
}

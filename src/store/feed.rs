//! 信息流状态容器，点赞走乐观更新
//! Feed state container with optimistic like toggling
//!
//! 先改本地状态并留下回滚快照，请求失败后按结果回滚或收敛：
//! 409 收敛为已点赞，其余错误整体回滚。

use crate::http::pagination::Paged;
use crate::modules::articles::models::ArticleView;

/// 点赞操作的回滚快照 / Rollback snapshot of a like toggle
#[derive(Debug, Clone, PartialEq)]
pub struct LikeSnapshot {
    pub article_id: i64,
    pub is_liked: bool,
    pub like_count: i32,
}

/// 乐观点赞的最终结局 / Final outcome of an optimistic toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeSettlement {
    /// 服务端确认，本地状态保持
    Confirmed,
    /// 服务端返回 409，收敛为已点赞
    ForcedLiked,
    /// 其余失败，整体回滚
    RolledBack,
}

/// 信息流容器 / Feed container
#[derive(Debug, Default, Clone)]
pub struct FeedStore {
    pub articles: Vec<ArticleView>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一页数据：第一页替换，其余页追加
    pub fn ingest_page(&mut self, page: Paged<ArticleView>) {
        if page.page <= 1 {
            self.articles = page.data;
        } else {
            self.articles.extend(page.data);
        }
        self.total = page.total;
        self.page = page.page;
        self.page_size = page.page_size;
    }

    pub fn find(&self, article_id: i64) -> Option<&ArticleView> {
        self.articles.iter().find(|a| a.id == article_id)
    }

    fn find_mut(&mut self, article_id: i64) -> Option<&mut ArticleView> {
        self.articles.iter_mut().find(|a| a.id == article_id)
    }

    /// 乐观切换点赞状态，返回回滚快照
    /// Optimistically toggle the like state, returning a rollback snapshot
    pub fn toggle_like(&mut self, article_id: i64) -> Option<LikeSnapshot> {
        let article = self.find_mut(article_id)?;
        let snapshot = LikeSnapshot {
            article_id,
            is_liked: article.is_liked,
            like_count: article.like_count,
        };
        if article.is_liked {
            article.is_liked = false;
            article.like_count -= 1;
        } else {
            article.is_liked = true;
            article.like_count += 1;
        }
        Some(snapshot)
    }

    /// 回滚到快照状态 / Revert to the snapshot
    pub fn rollback(&mut self, snapshot: &LikeSnapshot) {
        if let Some(article) = self.find_mut(snapshot.article_id) {
            article.is_liked = snapshot.is_liked;
            article.like_count = snapshot.like_count;
        }
    }

    /// 按请求结果落定乐观更新：Ok 保持，Err(409) 收敛为已点赞，其余回滚
    /// Settle the optimistic toggle from the request result
    pub fn settle_like(
        &mut self,
        snapshot: &LikeSnapshot,
        result: Result<(), u16>,
    ) -> LikeSettlement {
        match result {
            Ok(()) => LikeSettlement::Confirmed,
            Err(409) => {
                // 服务端早已记下这份赞，计数以服务端为准
                if let Some(article) = self.find_mut(snapshot.article_id) {
                    article.is_liked = true;
                    article.like_count = snapshot.like_count;
                }
                LikeSettlement::ForcedLiked
            }
            Err(_) => {
                self.rollback(snapshot);
                LikeSettlement::RolledBack
            }
        }
    }

    /// 评论创建/删除后的本地计数调整
    /// Local counter adjustment after comment create/delete
    pub fn adjust_comment_count(&mut self, article_id: i64, delta: i32) {
        if let Some(article) = self.find_mut(article_id) {
            article.comment_count = (article.comment_count + delta).max(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, like_count: i32, is_liked: bool) -> ArticleView {
        let now = chrono::Utc::now().naive_utc();
        ArticleView {
            id,
            user_id: 1,
            content: Some("hello".into()),
            status: 1,
            kind: 0,
            location: None,
            is_top: false,
            is_ad: false,
            like_count,
            comment_count: 0,
            created_at: now,
            user: None,
            images: Vec::new(),
            videos: Vec::new(),
            is_liked,
        }
    }

    fn store_with(articles: Vec<ArticleView>) -> FeedStore {
        let total = articles.len() as i64;
        let mut store = FeedStore::new();
        store.ingest_page(Paged {
            data: articles,
            total,
            page: 1,
            page_size: 5,
        });
        store
    }

    #[test]
    fn test_ingest_replaces_first_page_and_appends_rest() {
        let mut store = store_with(vec![article(1, 0, false)]);
        store.ingest_page(Paged {
            data: vec![article(2, 0, false)],
            total: 2,
            page: 2,
            page_size: 5,
        });
        assert_eq!(store.articles.len(), 2);

        store.ingest_page(Paged {
            data: vec![article(3, 0, false)],
            total: 1,
            page: 1,
            page_size: 5,
        });
        assert_eq!(store.articles.len(), 1);
        assert_eq!(store.articles[0].id, 3);
    }

    #[test]
    fn test_toggle_then_confirm() {
        let mut store = store_with(vec![article(1, 3, false)]);
        let snap = store.toggle_like(1).unwrap();
        assert!(store.find(1).unwrap().is_liked);
        assert_eq!(store.find(1).unwrap().like_count, 4);

        let settled = store.settle_like(&snap, Ok(()));
        assert_eq!(settled, LikeSettlement::Confirmed);
        assert_eq!(store.find(1).unwrap().like_count, 4);
    }

    #[test]
    fn test_failed_toggle_leaves_store_unchanged() {
        let mut store = store_with(vec![article(1, 3, false), article(2, 9, true)]);
        let before = store.clone();

        let snap = store.toggle_like(1).unwrap();
        let settled = store.settle_like(&snap, Err(429));
        assert_eq!(settled, LikeSettlement::RolledBack);

        let a = store.find(1).unwrap();
        let b = before.find(1).unwrap();
        assert_eq!(a.is_liked, b.is_liked);
        assert_eq!(a.like_count, b.like_count);
        assert_eq!(store.find(2).unwrap().like_count, 9);
    }

    #[test]
    fn test_conflict_settles_to_liked() {
        let mut store = store_with(vec![article(1, 3, false)]);
        let snap = store.toggle_like(1).unwrap();
        let settled = store.settle_like(&snap, Err(409));
        assert_eq!(settled, LikeSettlement::ForcedLiked);

        let a = store.find(1).unwrap();
        assert!(a.is_liked);
        // 计数回到服务端已计入的值
        assert_eq!(a.like_count, 3);
    }

    #[test]
    fn test_unlike_toggle_and_rollback() {
        let mut store = store_with(vec![article(1, 5, true)]);
        let snap = store.toggle_like(1).unwrap();
        assert!(!store.find(1).unwrap().is_liked);
        assert_eq!(store.find(1).unwrap().like_count, 4);

        store.rollback(&snap);
        assert!(store.find(1).unwrap().is_liked);
        assert_eq!(store.find(1).unwrap().like_count, 5);
    }

    #[test]
    fn test_comment_count_adjustment_floors_at_zero() {
        let mut store = store_with(vec![article(1, 0, false)]);
        store.adjust_comment_count(1, 2);
        assert_eq!(store.find(1).unwrap().comment_count, 2);
        store.adjust_comment_count(1, -5);
        assert_eq!(store.find(1).unwrap().comment_count, 0);
    }

    #[test]
    fn test_toggle_unknown_article_is_noop() {
        let mut store = store_with(vec![article(1, 0, false)]);
        assert!(store.toggle_like(99).is_none());
    }
}

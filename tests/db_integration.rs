//! 数据库集成测试，需要本地 PostgreSQL
//! Database integration tests, require a local PostgreSQL
//!
//! 运行前先导入 schema.sql 并设置 MOMENTS_DATABASE_DEFAULT_* 环境变量，
//! 然后 `cargo test -- --ignored`。

use moments::db::connection::default_pool;
use moments::http::pagination::PageQuery;
use moments::modules::articles::models::CreateArticlePayload;
use moments::modules::articles::repo as article_repo;
use moments::modules::comments::repo as comment_repo;
use moments::modules::users::repo as user_repo;

fn unique_name(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", prefix, nanos)
}

async fn seed_user(pool: &sqlx::Pool<sqlx::Postgres>) -> i64 {
    let user = user_repo::insert(pool, &unique_name("it_user"), "$argon2id$test", None, None)
        .await
        .unwrap();
    user.id
}

async fn seed_article(pool: &sqlx::Pool<sqlx::Postgres>, user_id: i64) -> i64 {
    let payload = CreateArticlePayload {
        content: Some("integration test article".into()),
        ..Default::default()
    };
    article_repo::insert_with_attachments(pool, user_id, &payload)
        .await
        .unwrap()
        .id
}

#[tokio::test]
#[ignore]
async fn like_then_unlike_restores_like_count() {
    let pool = default_pool().await.unwrap();
    let user_id = seed_user(&pool).await;
    let article_id = seed_article(&pool, user_id).await;

    let before = article_repo::find_live(&pool, article_id)
        .await
        .unwrap()
        .unwrap()
        .like_count;

    article_repo::like_by_user(&pool, user_id, article_id)
        .await
        .unwrap();
    let liked = article_repo::find_live(&pool, article_id)
        .await
        .unwrap()
        .unwrap()
        .like_count;
    assert_eq!(liked, before + 1);

    // 重复点赞撞唯一约束
    assert!(article_repo::like_by_user(&pool, user_id, article_id)
        .await
        .is_err());

    article_repo::unlike_by_user(&pool, user_id, article_id)
        .await
        .unwrap();
    let after = article_repo::find_live(&pool, article_id)
        .await
        .unwrap()
        .unwrap()
        .like_count;
    assert_eq!(after, before);
}

#[tokio::test]
#[ignore]
async fn deleting_comment_subtree_decrements_count_by_subtree_size() {
    let pool = default_pool().await.unwrap();
    let user_id = seed_user(&pool).await;
    let article_id = seed_article(&pool, user_id).await;

    // 根评论 + 两个子评论 + 一个孙评论，外加一条独立评论
    let root = comment_repo::insert_with_counter(&pool, article_id, user_id, None, "root")
        .await
        .unwrap();
    let child_a =
        comment_repo::insert_with_counter(&pool, article_id, user_id, Some(root.id), "a")
            .await
            .unwrap();
    comment_repo::insert_with_counter(&pool, article_id, user_id, Some(root.id), "b")
        .await
        .unwrap();
    comment_repo::insert_with_counter(&pool, article_id, user_id, Some(child_a.id), "a1")
        .await
        .unwrap();
    let standalone =
        comment_repo::insert_with_counter(&pool, article_id, user_id, None, "other")
            .await
            .unwrap();

    let before = article_repo::find_live(&pool, article_id)
        .await
        .unwrap()
        .unwrap()
        .comment_count;
    assert_eq!(before, 5);

    let ids = comment_repo::collect_descendants(&pool, root.id).await.unwrap();
    assert_eq!(ids.len(), 4);
    let deleted = comment_repo::delete_subtree(&pool, article_id, &ids)
        .await
        .unwrap();
    assert_eq!(deleted, 4);

    let after = article_repo::find_live(&pool, article_id)
        .await
        .unwrap()
        .unwrap()
        .comment_count;
    assert_eq!(after, before - 4);

    // 独立评论不受影响
    assert!(comment_repo::find_live(&pool, standalone.id)
        .await
        .unwrap()
        .is_some());
    let (views, total) = comment_repo::top_level_with_replies(
        &pool,
        article_id,
        &PageQuery::default(),
    )
    .await
    .unwrap();
    assert_eq!(total, 1);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].id, standalone.id);
}

#[tokio::test]
#[ignore]
async fn guest_like_same_ip_is_detected() {
    let pool = default_pool().await.unwrap();
    let user_id = seed_user(&pool).await;
    let article_id = seed_article(&pool, user_id).await;

    let ip = "203.0.113.77";
    assert!(!article_repo::guest_like_exists_for_ip(&pool, article_id, ip)
        .await
        .unwrap());
    article_repo::like_by_guest(&pool, &unique_name("guest"), article_id, ip)
        .await
        .unwrap();
    assert!(article_repo::guest_like_exists_for_ip(&pool, article_id, ip)
        .await
        .unwrap());
}

//! 全局路由装配
//! Global route assembly

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::db::connection::{check_health, default_pool};
use crate::modules::admin::configure_admin_routes;
use crate::modules::articles::configure_article_routes;
use crate::modules::auth::configure_auth_routes;
use crate::modules::comments::configure_comment_routes;
use crate::modules::location::configure_location_routes;
use crate::modules::users::configure_user_routes;

/// 健康检查：进程存活即 200，数据库状态随报告给出
/// Health probe: 200 while the process lives, database state reported inline
#[actix_web::get("/health")]
pub async fn health() -> impl Responder {
    let database = match default_pool().await {
        Ok(pool) => match check_health(&pool).await {
            Ok(()) => "up",
            Err(_) => "down",
        },
        Err(_) => "down",
    };
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// 配置全局路由：各业务模块 + 健康检查
pub fn configure_global_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
    configure_auth_routes(cfg);
    configure_user_routes(cfg);
    configure_article_routes(cfg);
    configure_comment_routes(cfg);
    configure_admin_routes(cfg);
    configure_location_routes(cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_endpoint_always_responds() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_global_routes_register_without_conflicts() {
        let app = test::init_service(App::new().configure(configure_global_routes)).await;
        let req = test::TestRequest::get().uri("/no-such-route").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}

//! IP归属地代理接口
//! IP geolocation proxy endpoint

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::comm::geo;
use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub ip: Option<String>,
}

/// 查询IP归属地，缺省用请求方的公网IP
/// GET /api/location
#[actix_web::get("")]
pub async fn get_location(query: web::Query<LocationQuery>) -> AppResult<impl Responder> {
    let payload = geo::get_location(query.ip.as_deref())
        .await
        .map_err(|e| AppError::external_service("ip.plus", e.to_string()))?;
    Ok(HttpResponse::Ok().json(payload))
}

/// 注册归属地模块路由
pub fn configure_location_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/location").service(get_location));
}

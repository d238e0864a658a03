//! 认证相关代码
//! Authentication related code
//!
//! JWT 签发/校验、请求提取器（必须登录 / 可选登录 / 游客ID / 管理员）、密码哈希。
//! JWT issue/verify, request extractors (required / optional / guest id / admin), password hashing.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::comm::config::get_global_config_manager;
use crate::error::AppError;

/// 游客身份请求头 / Guest identity header
pub const GUEST_ID_HEADER: &str = "X-Guest-Id";

/// JWT 载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 id
    pub sub: i64,
    pub username: String,
    /// 0普通用户 1管理员
    pub role: i16,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == 1
    }
}

fn jwt_secret() -> Result<String, AppError> {
    let mgr = get_global_config_manager().map_err(AppError::Internal)?;
    Ok(mgr.get_or("jwt.secret", "change-me".to_string()))
}

/// 签发令牌 / Issue a bearer token
pub fn issue_token(user_id: i64, username: &str, role: i16) -> Result<String, AppError> {
    let mgr = get_global_config_manager().map_err(AppError::Internal)?;
    let expire_days: i64 = mgr.get_or("jwt.expire_days", 7i64);
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::days(expire_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("签发令牌失败: {}", e)))
}

/// 校验令牌 / Verify a bearer token
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("无效或已过期的令牌"))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn extract_claims(req: &HttpRequest) -> Result<Claims, AppError> {
    let token = bearer_token(req)
        .ok_or_else(|| AppError::unauthorized("未提供认证令牌或认证令牌格式错误"))?;
    verify_token(token)
}

/// 必须登录的提取器 / Required-login extractor
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req).map(AuthUser))
    }
}

/// 可选登录的提取器：令牌无效按游客处理
/// Optional-login extractor: invalid tokens fall back to guest
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Claims>);

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = match bearer_token(req) {
            Some(token) => match verify_token(token) {
                Ok(c) => Some(c),
                Err(_) => {
                    tracing::warn!("捕获到无效的Token，按游客处理");
                    None
                }
            },
            None => None,
        };
        ready(Ok(MaybeUser(claims)))
    }
}

/// 管理员提取器：必须登录且 role == 1
/// Admin extractor: requires login and role == 1
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req).and_then(|claims| {
            if claims.is_admin() {
                Ok(AdminUser(claims))
            } else {
                Err(AppError::forbidden("权限不足，仅限管理员操作"))
            }
        }))
    }
}

/// 游客ID提取器（X-Guest-Id 请求头） / Guest id extractor (X-Guest-Id header)
#[derive(Debug, Clone)]
pub struct GuestId(pub Option<String>);

impl FromRequest for GuestId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(GUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());
        ready(Ok(GuestId(id)))
    }
}

/// 获取客户端IP地址：优先代理头，其次连接信息
/// Resolve client IP: proxy headers first, then peer address
pub fn client_ip(req: &HttpRequest) -> String {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(s) = forwarded_for.to_str() {
            if let Some(first_ip) = s.split(',').next() {
                return first_ip.trim().to_string();
            }
        }
    }
    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(s) = real_ip.to_str() {
            return s.to_string();
        }
    }
    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// 密码哈希（argon2, PHC 格式） / Password hashing (argon2, PHC string)
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("密码哈希失败: {}", e)))
}

/// 校验密码 / Verify a password against its stored hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(42, "alice", 0).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, 0);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(verify_token("not-a-token").is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }

    #[actix_web::test]
    async fn test_maybe_user_without_header() {
        let req = TestRequest::default().to_http_request();
        let MaybeUser(claims) = MaybeUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert!(claims.is_none());
    }

    #[actix_web::test]
    async fn test_auth_user_requires_header() {
        let req = TestRequest::default().to_http_request();
        assert!(AuthUser::from_request(&req, &mut Payload::None)
            .await
            .is_err());
    }

    #[actix_web::test]
    async fn test_admin_user_rejects_normal_role() {
        let token = issue_token(7, "bob", 0).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        let result = AdminUser::from_request(&req, &mut Payload::None).await;
        match result {
            Err(e) => assert_eq!(
                e.status_code(),
                actix_web::http::StatusCode::FORBIDDEN
            ),
            Ok(_) => panic!("normal role must not pass the admin extractor"),
        }
    }

    #[actix_web::test]
    async fn test_guest_id_header() {
        let req = TestRequest::default()
            .insert_header((GUEST_ID_HEADER, "g-123"))
            .to_http_request();
        let GuestId(id) = GuestId::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("g-123"));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .to_http_request();
        assert_eq!(client_ip(&req), "203.0.113.9");
    }
}

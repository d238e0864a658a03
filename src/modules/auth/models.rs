//! 认证接口的请求/响应模型
//! Request/response models of the auth endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 注册请求 / Register payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 3, max = 32, message = "用户名长度须在3到32之间"))]
    pub username: String,
    #[validate(length(min = 6, max = 72, message = "密码长度须在6到72之间"))]
    pub password: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
    pub nickname: Option<String>,
}

/// 登录请求：identifier 为用户名或邮箱
/// Login payload: identifier is a username or an email
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub identifier: String,
    pub password: String,
}

/// 登录响应 / Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterPayload {
            username: "alice".into(),
            password: "secret1".into(),
            email: Some("a@example.com".into()),
            nickname: None,
        };
        assert!(ok.validate().is_ok());

        let short_name = RegisterPayload {
            username: "ab".into(),
            password: "secret1".into(),
            email: None,
            nickname: None,
        };
        assert!(short_name.validate().is_err());

        let bad_email = RegisterPayload {
            username: "alice".into(),
            password: "secret1".into(),
            email: Some("not-an-email".into()),
            nickname: None,
        };
        assert!(bad_email.validate().is_err());
    }
}

//! REST 客户端，为状态容器发起实际请求
//! Thin REST client driving the state containers

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::auth::GUEST_ID_HEADER;
use crate::http::pagination::Paged;
use crate::modules::articles::models::ArticleView;
use crate::modules::auth::models::TokenResponse;
use crate::modules::comments::models::CommentView;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络错误: {0}")]
    Network(String),
    #[error("服务端返回 {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

/// 带身份头的 REST 客户端 / REST client carrying the identity headers
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
    guest_id: Option<String>,
}

impl ApiClient {
    pub fn new<T: Into<String>>(base_url: T) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            token: None,
            guest_id: None,
        }
    }

    pub fn with_token<T: Into<String>>(mut self, token: T) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_guest_id<T: Into<String>>(mut self, guest_id: T) -> Self {
        self.guest_id = Some(guest_id.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(guest_id) = &self.guest_id {
            builder = builder.header(GUEST_ID_HEADER, guest_id);
        }
        builder
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        // 失败时服务端给出 {"error": ...}
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    /// 登录并把令牌存入客户端
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/auth/login")
            .json(&json!({"identifier": identifier, "password": password}))
            .send()
            .await?;
        let token = Self::check(response)
            .await?
            .json::<TokenResponse>()
            .await?;
        self.token = Some(token.token);
        Ok(())
    }

    /// 拉取一页信息流
    pub async fn fetch_feed(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<Paged<ArticleView>, ApiError> {
        self.get_json(&format!(
            "/api/articles?page={}&pageSize={}",
            page, page_size
        ))
        .await
    }

    pub async fn fetch_article(&self, id: i64) -> Result<ArticleView, ApiError> {
        self.get_json(&format!("/api/articles/{}", id)).await
    }

    pub async fn like(&self, article_id: i64) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/api/articles/{}/like", article_id))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    pub async fn unlike(&self, article_id: i64) -> Result<(), ApiError> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/articles/{}/like", article_id),
            )
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    pub async fn create_comment(
        &self,
        article_id: i64,
        parent_id: Option<i64>,
        content: &str,
    ) -> Result<CommentView, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/comments")
            .json(&json!({"articleId": article_id, "parentId": parent_id, "content": content}))
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<CommentView>().await?)
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/comments/{}", comment_id),
            )
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }
}

/// 请求结果转为状态容器的落定输入：状态码或网络错误占位码
/// Map a request result to the settlement input of the store
pub fn settlement_code(result: &Result<(), ApiError>) -> Result<(), u16> {
    match result {
        Ok(()) => Ok(()),
        Err(e) => Err(e
            .status()
            .unwrap_or(StatusCode::SERVICE_UNAVAILABLE.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_code_mapping() {
        assert_eq!(settlement_code(&Ok(())), Ok(()));
        let conflict = ApiError::Status {
            status: 409,
            message: "已经点过赞了".into(),
        };
        assert_eq!(settlement_code(&Err(conflict)), Err(409));
        let network = ApiError::Network("timeout".into());
        assert_eq!(settlement_code(&Err(network)), Err(503));
    }
}

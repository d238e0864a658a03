use thiserror::Error;

// 统一错误类型 / Unified error type
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP错误: {0}")]
    Http(String),
    #[error("接口返回错误: {0}")]
    Api(String),
}

// 获取公网IP（ip.plus 服务，返回纯文本）
// Fetch public IP (ip.plus service, plain text response)
pub async fn get_public_ip() -> Result<String, GeoError> {
    let resp = reqwest::Client::new()
        .get("https://ip.plus/myip")
        .send()
        .await
        .map_err(|e| GeoError::Http(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(GeoError::Http(format!("status={}", resp.status())));
    }
    let body = resp
        .text()
        .await
        .map_err(|e| GeoError::Http(e.to_string()))?;
    let ip = body.trim();
    // 验证IP格式（IPv4/IPv6）
    if ip.parse::<std::net::IpAddr>().is_ok() {
        Ok(ip.to_string())
    } else {
        Err(GeoError::Http(format!("invalid ip text: {}", ip)))
    }
}

// 通过 ip.plus 查询 IP 归属地（可选指定IP；若为空则自动获取公网IP）
// Resolve location via ip.plus (optionally specify IP; defaults to public IP)
pub async fn get_location(ip: Option<&str>) -> Result<serde_json::Value, GeoError> {
    let ip_val = match ip {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => get_public_ip().await?,
    };

    let url = format!("https://api.ip.plus/{}", ip_val);
    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .map_err(|e| GeoError::Http(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(GeoError::Api(format!("status={}", resp.status())));
    }
    resp.json::<serde_json::Value>()
        .await
        .map_err(|e| GeoError::Http(e.to_string()))
}

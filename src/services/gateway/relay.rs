use super::ModelGateway;
use crate::config::Config;
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// 中转服务请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// 中转服务成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
}

/// 中转服务失败响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayErrorBody {
    pub error: String,
}

/// 经由中转服务调用模型
pub struct RelayGateway {
    http: reqwest::Client,
    url: String,
}

impl RelayGateway {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Self::with_url(&config.relay_url, config.request_timeout_secs)
    }

    pub fn with_url(url: impl Into<String>, timeout_secs: u64) -> Result<Self, ServiceError> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::transport(&url, e))?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl ModelGateway for RelayGateway {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!("调用中转服务 {}，提示词长度: {} 字符", self.url, prompt.len());

        let response = self
            .http
            .post(&self.url)
            .json(&GenerateRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!("中转服务请求失败: {}", e);
                ServiceError::transport(&self.url, e)
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ServiceError::transport(&self.url, e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<RelayErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP Error: {}", status.as_u16()));
            warn!("中转服务返回错误 {}: {}", status.as_u16(), message);
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_slice(&body).map_err(|e| ServiceError::MalformedResponse {
                message: e.to_string(),
            })?;

        Ok(parsed.text)
    }

    fn name(&self) -> &str {
        "relay"
    }
}

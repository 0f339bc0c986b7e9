use super::ModelGateway;
use crate::config::Config;
use crate::error::ServiceError;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::{debug, warn};

/// 直连 Hugging Face 推理接口
pub struct HuggingFaceGateway {
    http: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl HuggingFaceGateway {
    /// 创建网关，缺少访问令牌时报错
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        if config.hf_access_token.trim().is_empty() {
            return Err(ServiceError::NotConfigured(
                "HF_ACCESS_TOKEN missing".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::transport(&config.hf_api_url, e))?;

        Ok(Self {
            http,
            api_url: config.hf_api_url.clone(),
            access_token: config.hf_access_token.clone(),
        })
    }
}

#[async_trait]
impl ModelGateway for HuggingFaceGateway {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        if prompt.trim().is_empty() {
            return Err(ServiceError::InvalidPrompt);
        }

        debug!("调用 Hugging Face 推理接口: {}", self.api_url);

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .json(&json!({
                "inputs": prompt,
                "parameters": {
                    "max_new_tokens": 1024,
                    "temperature": 0.7,
                    "top_p": 0.95,
                    "return_full_text": false,
                },
            }))
            .send()
            .await
            .map_err(|e| {
                warn!("Hugging Face 请求失败: {}", e);
                ServiceError::transport(&self.api_url, e)
            })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::transport(&self.api_url, e))?;

        let parsed = if is_json {
            serde_json::from_str::<JsonValue>(&body).unwrap_or(JsonValue::String(body))
        } else {
            JsonValue::String(body)
        };

        if !status.is_success() {
            let message = match &parsed {
                JsonValue::String(text) => text.clone(),
                other => other
                    .get("error")
                    .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                    .unwrap_or_else(|| other.to_string()),
            };
            warn!("Hugging Face 返回错误 {}: {}", status.as_u16(), message);
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(extract_generated_text(parsed))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// 统一推理接口可能的几种响应形状
///
/// `[{generated_text}]`、`{generated_text}`、纯文本，其余情况原样序列化。
pub fn extract_generated_text(parsed: JsonValue) -> String {
    let from_object = |value: &JsonValue| {
        value
            .get("generated_text")
            .and_then(JsonValue::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };

    match &parsed {
        JsonValue::Array(items) => items.first().and_then(from_object),
        JsonValue::Object(_) => from_object(&parsed),
        JsonValue::String(text) => Some(text.clone()),
        _ => None,
    }
    .unwrap_or_else(|| parsed.to_string())
}

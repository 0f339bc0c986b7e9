//! 模型网关 - 业务能力层
//!
//! 只负责"把提示词发给模型、拿回文本"，不关心提示词内容和回复格式
//!
//! ## 实现
//! - `RelayGateway` - 经由中转服务（`{prompt}` → `{text}` / `{error}`）
//! - `OpenAiGateway` - OpenAI 兼容的对话接口（`async-openai`）
//! - `HuggingFaceGateway` - 直连 Hugging Face 推理接口
//! - `ScriptedGateway` - 内存中的脚本化网关，用于测试和演练

pub mod huggingface;
pub mod openai;
pub mod relay;
pub mod scripted;

use crate::config::{Config, GatewayKind};
use crate::error::ServiceError;
use async_trait::async_trait;
use std::sync::Arc;

pub use huggingface::HuggingFaceGateway;
pub use openai::OpenAiGateway;
pub use relay::{GenerateRequest, GenerateResponse, RelayGateway, RelayErrorBody};
pub use scripted::ScriptedGateway;

/// 模型网关
///
/// 单次调用失败只影响当前这份作业，不做重试。
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// 发送提示词，返回模型生成的原始文本
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;

    /// 网关名称（日志用）
    fn name(&self) -> &str;
}

/// 按配置创建网关
pub fn from_config(config: &Config) -> Result<Arc<dyn ModelGateway>, ServiceError> {
    let gateway: Arc<dyn ModelGateway> = match config.gateway {
        GatewayKind::Relay => Arc::new(RelayGateway::new(config)?),
        GatewayKind::OpenAi => Arc::new(OpenAiGateway::new(config)),
        GatewayKind::HuggingFace => Arc::new(HuggingFaceGateway::new(config)?),
    };
    tracing::info!("🔌 使用模型网关: {}", gateway.name());
    Ok(gateway)
}

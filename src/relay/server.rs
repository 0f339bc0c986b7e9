use crate::config::Config;
use crate::error::ServiceError;
use crate::services::gateway::{
    GenerateResponse, HuggingFaceGateway, ModelGateway, RelayErrorBody,
};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 生成接口路径
pub const GENERATE_PATH: &str = "/api/generate";

const MISSING_TOKEN: &str = "Server configuration error: HF_ACCESS_TOKEN missing";
const INVALID_PROMPT: &str = "Missing or invalid prompt";
const INVALID_JSON: &str = "Invalid JSON body";
const METHOD_NOT_ALLOWED: &str = "Method not allowed";

type RelayReply = Result<Json<GenerateResponse>, (StatusCode, Json<RelayErrorBody>)>;

/// 中转服务状态
///
/// `upstream` 为空表示缺少上游令牌，所有请求返回 500。
#[derive(Clone)]
pub struct RelayState {
    upstream: Option<Arc<dyn ModelGateway>>,
}

impl RelayState {
    pub fn new(upstream: Arc<dyn ModelGateway>) -> Self {
        Self {
            upstream: Some(upstream),
        }
    }

    /// 未配置上游的状态
    pub fn unconfigured() -> Self {
        Self { upstream: None }
    }

    /// 按配置连接 Hugging Face；缺少令牌时照常启动，请求时报配置错误
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        match HuggingFaceGateway::new(config) {
            Ok(gateway) => Ok(Self::new(Arc::new(gateway))),
            Err(ServiceError::NotConfigured(reason)) => {
                warn!("⚠️ 中转服务未配置上游: {}", reason);
                Ok(Self::unconfigured())
            }
            Err(e) => Err(e),
        }
    }
}

/// 构建路由
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route(
            GENERATE_PATH,
            post(generate_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// 监听并运行中转服务，直到进程退出
pub async fn serve(addr: &str, state: RelayState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法监听地址: {}", addr))?;
    info!("🛰️ 中转服务已启动: http://{}{}", addr, GENERATE_PATH);

    axum::serve(listener, router(state))
        .await
        .context("中转服务异常退出")?;
    Ok(())
}

async fn generate_handler(State(state): State<RelayState>, body: Bytes) -> RelayReply {
    let Some(upstream) = state.upstream.as_ref() else {
        error!("HF_ACCESS_TOKEN 未设置");
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, MISSING_TOKEN));
    };

    let prompt = parse_prompt(&body)?;

    match upstream.generate(&prompt).await {
        Ok(text) => Ok(Json(GenerateResponse { text })),
        Err(e) => {
            warn!("上游调用失败: {}", e);
            Err(map_upstream_error(e))
        }
    }
}

async fn method_not_allowed() -> (StatusCode, Json<RelayErrorBody>) {
    reject(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
}

/// 请求体为空时按 `{}` 处理
fn parse_prompt(body: &[u8]) -> Result<String, (StatusCode, Json<RelayErrorBody>)> {
    let value: JsonValue = if body.is_empty() {
        JsonValue::Object(Default::default())
    } else {
        serde_json::from_slice(body)
            .map_err(|_| reject(StatusCode::BAD_REQUEST, INVALID_JSON))?
    };

    value
        .get("prompt")
        .and_then(JsonValue::as_str)
        .filter(|prompt| !prompt.is_empty())
        .map(str::to_string)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, INVALID_PROMPT))
}

fn map_upstream_error(err: ServiceError) -> (StatusCode, Json<RelayErrorBody>) {
    match err {
        ServiceError::Upstream { status, message } => reject(
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            message,
        ),
        ServiceError::InvalidPrompt => reject(StatusCode::BAD_REQUEST, INVALID_PROMPT),
        ServiceError::NotConfigured(_) => {
            reject(StatusCode::INTERNAL_SERVER_ERROR, MISSING_TOKEN)
        }
        ServiceError::Transport { message, .. } => reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error: {}", message),
        ),
        other => reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error: {}", other),
        ),
    }
}

fn reject(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<RelayErrorBody>) {
    (
        status,
        Json(RelayErrorBody {
            error: error.into(),
        }),
    )
}

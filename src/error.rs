//! 错误类型
//!
//! 按关注点划分：输入格式（整批致命）、模型服务（单份作业隔离）、
//! 配置、输出。`AppError` 汇总全部错误。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文件错误（评分标准 / 压缩包）
    #[error("输入错误: {0}")]
    Input(#[from] InputFormatError),
    /// 模型服务错误
    #[error("模型服务错误: {0}")]
    Service(#[from] ServiceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 报告输出错误
    #[error("输出错误: {0}")]
    Output(#[from] OutputError),
}

/// 评分标准解析错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RubricError {
    /// 输入没有任何内容
    #[error("评分标准为空")]
    Empty,
    /// 表头中出现重复的类别名
    #[error("评分标准类别重复: {name}")]
    DuplicateCategory { name: String },
    /// 表头中存在空白类别名
    #[error("评分标准第 {column} 列类别名为空")]
    BlankCategory { column: usize },
}

/// 输入格式错误
///
/// 在处理任何作业之前报告，整批中止。
#[derive(Debug, Error)]
pub enum InputFormatError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 扩展名不符
    #[error("文件 {path} 不是 {expected} 文件")]
    WrongExtension { path: String, expected: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 压缩包无法解析
    #[error("无法解析压缩包 ({path}): {source}")]
    BadArchive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
    /// 评分标准无效
    #[error("评分标准无效: {0}")]
    Rubric(#[from] RubricError),
}

/// 模型服务错误
///
/// 只影响当前这一份作业，记录为待处理。
#[derive(Debug, Error, Clone)]
pub enum ServiceError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },
    /// 上游返回非 2xx 状态
    #[error("上游返回错误 {status}: {message}")]
    Upstream { status: u16, message: String },
    /// 响应体无法解析
    #[error("响应无法解析: {message}")]
    MalformedResponse { message: String },
    /// 模型返回内容为空
    #[error("模型返回内容为空")]
    EmptyReply,
    /// 提示词为空或无效
    #[error("提示词必须是非空字符串")]
    InvalidPrompt,
    /// 网关未配置（缺少令牌等）
    #[error("网关未配置: {0}")]
    NotConfigured(String),
}

impl ServiceError {
    /// 创建传输错误
    pub fn transport(endpoint: impl Into<String>, source: impl std::fmt::Display) -> Self {
        ServiceError::Transport {
            endpoint: endpoint.into(),
            message: source.to_string(),
        }
    }

    /// 上游 HTTP 状态码（仅上游错误有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("无法读取配置文件 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 未知的网关类型
    #[error("未知的网关类型: {0}")]
    UnknownGateway(String),
}

/// 报告输出错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// PDF 生成失败
    #[error("PDF生成失败 ({title}): {message}")]
    PdfFailed { title: String, message: String },
    /// JSON 序列化失败
    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Output(OutputError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为整批致命错误
    pub fn is_fatal_to_batch(&self) -> bool {
        matches!(self, AppError::Input(_) | AppError::Config(_))
    }
}

impl From<RubricError> for AppError {
    fn from(err: RubricError) -> Self {
        AppError::Input(InputFormatError::Rubric(err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rubric_errors_are_input_errors() {
        let err: AppError = RubricError::DuplicateCategory {
            name: "Content".to_string(),
        }
        .into();
        assert!(err.is_fatal_to_batch());
        assert!(err.to_string().contains("Content"));
    }

    #[test]
    fn service_errors_are_not_fatal() {
        let err: AppError = ServiceError::Upstream {
            status: 503,
            message: "busy".to_string(),
        }
        .into();
        assert!(!err.is_fatal_to_batch());
        if let AppError::Service(inner) = &err {
            assert_eq!(inner.status(), Some(503));
        } else {
            panic!("应该是服务错误");
        }
    }
}

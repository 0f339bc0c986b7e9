use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 模型网关类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// 经由中转服务（`{prompt}` → `{text}`）
    Relay,
    /// OpenAI 兼容的对话接口
    OpenAi,
    /// 直连 Hugging Face 推理接口
    HuggingFace,
}

impl GatewayKind {
    /// 从字符串解析网关类型
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relay" => Ok(GatewayKind::Relay),
            "openai" => Ok(GatewayKind::OpenAi),
            "huggingface" | "hf" => Ok(GatewayKind::HuggingFace),
            other => Err(ConfigError::UnknownGateway(other.to_string())),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时评分的作业数量
    pub max_concurrent_submissions: usize,
    /// 使用的模型网关
    pub gateway: GatewayKind,
    /// 中转服务地址
    pub relay_url: String,
    /// 中转服务监听地址
    pub relay_bind_addr: String,
    // --- OpenAI 兼容接口配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- Hugging Face 配置 ---
    pub hf_api_url: String,
    pub hf_access_token: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 报告输出目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_submissions: 8,
            gateway: GatewayKind::Relay,
            relay_url: "http://127.0.0.1:8787/api/generate".to_string(),
            relay_bind_addr: "127.0.0.1:8787".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            hf_api_url:
                "https://router.huggingface.co/hf-inference/mistralai/Mistral-7B-Instruct-v0.2"
                    .to_string(),
            hf_access_token: String::new(),
            request_timeout_secs: 120,
            output_dir: "grading_output".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 读取 TOML 配置文件，再叠加环境变量
    ///
    /// 环境变量的值无法解析时返回错误，不会静默回退到缺省值。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                        path: path.display().to_string(),
                        source,
                    })?;
                toml::from_str::<Config>(&content).map_err(|source| {
                    ConfigError::TomlParseFailed {
                        path: path.display().to_string(),
                        source,
                    }
                })?
            }
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用 `lookup` 给出的变量覆盖各字段
    ///
    /// # 参数
    /// - `lookup`: 按变量名取值，通常是 `std::env::var`
    fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gateway = match lookup("GRADER_GATEWAY") {
            Some(value) => GatewayKind::parse(&value)?,
            None => self.gateway,
        };

        Ok(Self {
            max_concurrent_submissions: parse_var(
                &lookup,
                "MAX_CONCURRENT_SUBMISSIONS",
                "usize",
            )?
            .unwrap_or(self.max_concurrent_submissions),
            gateway,
            relay_url: lookup("RELAY_URL").unwrap_or(self.relay_url),
            relay_bind_addr: lookup("RELAY_BIND_ADDR").unwrap_or(self.relay_bind_addr),
            llm_api_key: lookup("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            hf_api_url: lookup("HF_API_URL").unwrap_or(self.hf_api_url),
            hf_access_token: lookup("HF_ACCESS_TOKEN").unwrap_or(self.hf_access_token),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            output_dir: lookup("OUTPUT_DIR").unwrap_or(self.output_dir),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }
}

/// 解析一个变量；未设置时返回 `None`
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_gateway_kinds() {
        assert_eq!(GatewayKind::parse("relay").unwrap(), GatewayKind::Relay);
        assert_eq!(GatewayKind::parse(" OpenAI ").unwrap(), GatewayKind::OpenAi);
        assert_eq!(GatewayKind::parse("hf").unwrap(), GatewayKind::HuggingFace);
        assert!(GatewayKind::parse("carrier-pigeon").is_err());
    }

    #[test]
    fn toml_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            max_concurrent_submissions = 3
            gateway = "huggingface"
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrent_submissions, 3);
        assert_eq!(config.gateway, GatewayKind::HuggingFace);
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.request_timeout_secs, 120);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_values_override_fields() {
        let config = Config::default()
            .with_overrides(vars(&[
                ("GRADER_GATEWAY", "openai"),
                ("MAX_CONCURRENT_SUBMISSIONS", "2"),
                ("REQUEST_TIMEOUT_SECS", " 30 "),
                ("VERBOSE_LOGGING", "true"),
                ("OUTPUT_DIR", "reports"),
            ]))
            .unwrap();

        assert_eq!(config.gateway, GatewayKind::OpenAi);
        assert_eq!(config.max_concurrent_submissions, 2);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.verbose_logging);
        assert_eq!(config.output_dir, "reports");
    }

    #[test]
    fn unset_values_keep_defaults() {
        let config = Config::default().with_overrides(vars(&[])).unwrap();
        assert_eq!(config.gateway, GatewayKind::Relay);
        assert_eq!(config.max_concurrent_submissions, 8);
    }

    #[test]
    fn misspelled_gateway_is_an_error() {
        let err = Config::default()
            .with_overrides(vars(&[("GRADER_GATEWAY", "huggingfce")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGateway(name) if name == "huggingfce"));
    }

    #[test]
    fn unparsable_concurrency_is_an_error() {
        let err = Config::default()
            .with_overrides(vars(&[("MAX_CONCURRENT_SUBMISSIONS", "eight")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, ref value, .. }
                if var_name == "MAX_CONCURRENT_SUBMISSIONS" && value == "eight"
        ));
    }

    #[test]
    fn unparsable_timeout_is_an_error() {
        let err = Config::default()
            .with_overrides(vars(&[("REQUEST_TIMEOUT_SECS", "-5")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "REQUEST_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn unparsable_verbose_flag_is_an_error() {
        let err = Config::default()
            .with_overrides(vars(&[("VERBOSE_LOGGING", "yes please")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "VERBOSE_LOGGING"
        ));
        assert!(err.to_string().contains("bool"));
    }
}

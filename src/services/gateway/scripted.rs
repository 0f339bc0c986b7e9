use super::ModelGateway;
use crate::error::ServiceError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 脚本化网关
///
/// 按提示词中包含的片段依次匹配预设回复，第一个命中的规则生效；
/// 都不命中时返回默认回复。不访问网络。
pub struct ScriptedGateway {
    rules: Vec<Rule>,
    default_reply: Result<String, ServiceError>,
    calls: AtomicUsize,
}

struct Rule {
    needle: String,
    reply: Result<String, ServiceError>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default_reply: Ok(default_reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 提示词包含 `needle` 时返回 `text`
    pub fn reply_when(mut self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Ok(text.into()),
            delay: None,
        });
        self
    }

    /// 提示词包含 `needle` 时返回错误
    pub fn fail_when(mut self, needle: impl Into<String>, error: ServiceError) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Err(error),
            delay: None,
        });
        self
    }

    /// 提示词包含 `needle` 时先等待 `delay` 再回复
    pub fn delay_when(
        mut self,
        needle: impl Into<String>,
        delay: Duration,
        text: impl Into<String>,
    ) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Ok(text.into()),
            delay: Some(delay),
        });
        self
    }

    /// 已收到的调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let rule = self.rules.iter().find(|rule| prompt.contains(&rule.needle));
        if let Some(delay) = rule.and_then(|rule| rule.delay) {
            tokio::time::sleep(delay).await;
        }

        rule.map(|rule| &rule.reply)
            .unwrap_or(&self.default_reply)
            .clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let gateway = ScriptedGateway::new("fallback")
            .reply_when("alice", "for alice")
            .fail_when("bob", ServiceError::EmptyReply)
            .reply_when("alice", "shadowed");

        tokio_test::block_on(async {
            assert_eq!(gateway.generate("grade alice").await.unwrap(), "for alice");
            assert!(matches!(
                gateway.generate("grade bob").await,
                Err(ServiceError::EmptyReply)
            ));
            assert_eq!(gateway.generate("grade carol").await.unwrap(), "fallback");
        });

        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn delayed_rule_still_replies() {
        let gateway = ScriptedGateway::new("fallback").delay_when(
            "slow",
            Duration::from_millis(10),
            "eventually",
        );

        assert_eq!(gateway.generate("slow one").await.unwrap(), "eventually");
    }
}

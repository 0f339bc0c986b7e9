//! 作业评分流程 - 流程层
//!
//! 核心职责：定义"一份作业"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词
//! 2. 调用模型网关
//! 3. 解析回复
//! 4. 渲染评分详情

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::models::result::SubmissionResult;
use crate::models::session::ClassSession;
use crate::models::submission::Submission;
use crate::services::gateway::ModelGateway;
use crate::services::{GradeReplyParser, PromptBuilder, ReportRenderer};
use crate::utils::truncate_text;
use crate::workflow::submission_ctx::SubmissionCtx;

/// 作业评分流程
///
/// - 编排单份作业的处理流程
/// - 不写文件，失败时把错误交给上层记为待处理
/// - 只依赖业务能力（services）
pub struct GradingFlow {
    gateway: Arc<dyn ModelGateway>,
    parser: GradeReplyParser,
    renderer: ReportRenderer,
    verbose_logging: bool,
}

impl GradingFlow {
    /// 创建新的作业评分流程
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway,
            parser: GradeReplyParser::new(),
            renderer: ReportRenderer::new(),
            verbose_logging: false,
        }
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// 批改一份作业
    ///
    /// # 参数
    /// - `session`: 评分会话（课程名与评分标准）
    /// - `submission`: 作业
    /// - `ctx`: 作业上下文（日志用）
    ///
    /// # 返回
    /// 成功时返回评分结果（含渲染好的详情文档），模型调用失败或回复为空时返回错误
    pub async fn run(
        &self,
        session: &ClassSession,
        submission: &Submission,
        ctx: &SubmissionCtx,
    ) -> Result<SubmissionResult, ServiceError> {
        if self.verbose_logging {
            debug!(
                "{} 作业预览: {}",
                ctx,
                truncate_text(submission.text.trim(), 80)
            );
        }

        // ========== 1. 构建提示词 ==========
        let prompt = PromptBuilder::for_session(session).build(&submission.text);
        debug!("{} 提示词长度: {} 字符", ctx, prompt.len());

        // ========== 2. 调用模型 ==========
        info!("{} 🤖 正在请求模型 ({})...", ctx, self.gateway.name());
        let reply = self.gateway.generate(&prompt).await?;
        if reply.trim().is_empty() {
            warn!("{} ⚠️ 模型返回内容为空", ctx);
            return Err(ServiceError::EmptyReply);
        }

        // ========== 3. 解析回复 ==========
        let parsed = self.parser.parse(&reply);
        for warning in &parsed.warnings {
            warn!("{} 回复解析: {}", ctx, warning);
        }
        self.check_categories(session, &parsed.records, ctx);

        // ========== 4. 渲染详情 ==========
        let detail = self
            .renderer
            .render_detail(&submission.id, &parsed.records);

        info!(
            "{} ✓ 评分完成，{} 个类别",
            ctx,
            parsed.records.len()
        );

        Ok(SubmissionResult {
            submission_id: submission.id.clone(),
            records: parsed.records,
            warnings: parsed.warnings,
            detail,
        })
    }

    /// 回复中出现评分标准之外的类别时只记日志，记录照常保留
    fn check_categories(
        &self,
        session: &ClassSession,
        records: &[crate::models::grade::GradeRecord],
        ctx: &SubmissionCtx,
    ) {
        let known = session.category_names();
        for record in records {
            if !known.iter().any(|name| name == &record.category) {
                warn!("{} 回复中出现未知类别: {}", ctx, record.category);
            }
        }
        if records.len() != known.len() {
            debug!(
                "{} 类别数不一致: 回复 {} / 评分标准 {}",
                ctx,
                records.len(),
                known.len()
            );
        }
    }
}

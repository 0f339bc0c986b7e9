//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一批作业的评分和输出。
//!
//! ## 核心功能
//!
//! 1. **输入校验**：评分标准和压缩包有问题时整批失败，不处理任何作业
//! 2. **并发控制**：所有作业在当前任务上并发推进，Semaphore 限制同时在途的模型请求数
//! 3. **失败隔离**：单份作业失败只记为待处理，不影响其他作业
//! 4. **汇总**：按完成顺序收集结果，渲染班级汇总
//! 5. **输出**：详情报告、待处理作业的报告、汇总报告、results.json、pending.txt

use crate::config::Config;
use crate::error::{AppError, AppResult, OutputError};
use crate::models::loaders::archive_loader::check_input_file;
use crate::models::result::{BatchOutcome, ClassSummary, SubmissionFailure, SubmissionResult};
use crate::models::session::ClassSession;
use crate::models::submission::{file_stem_of, Submission};
use crate::models::{load_rubric, load_submissions};
use crate::services::gateway::{self, ModelGateway};
use crate::services::pending_writer::PENDING_FILE_STEM;
use crate::services::{PendingWriter, ReportRenderer};
use crate::utils::logging;
use crate::workflow::{GradingFlow, SubmissionCtx};
use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 汇总报告文件名（不含扩展名）
pub const SUMMARY_FILE_STEM: &str = "class_summary";
/// 结构化结果文件名
pub const RESULTS_FILE_NAME: &str = "results.json";
/// 运行日志文件名
pub const LOG_FILE_NAME: &str = "grading.log";

/// 固定输出占用的文件名（不含扩展名），作业报告需避开
const RESERVED_STEMS: [&str; 2] = [SUMMARY_FILE_STEM, PENDING_FILE_STEM];

/// 一次评分任务的输入
#[derive(Debug, Clone)]
pub struct GradeJob {
    pub class_name: String,
    pub rubric_path: PathBuf,
    pub archive_path: PathBuf,
    /// 为空时使用配置中的输出目录
    pub output_dir: Option<PathBuf>,
}

/// 批改一批作业
///
/// # 参数
/// - `session`: 评分会话
/// - `gateway`: 模型网关
/// - `submissions`: 待批改的作业
/// - `max_concurrent`: 同时在途的模型请求上限
///
/// # 返回
/// 成功结果按完成顺序排列；失败的作业只出现在 `pending` 中，不进入汇总
pub async fn grade_all(
    session: &ClassSession,
    gateway: Arc<dyn ModelGateway>,
    submissions: Vec<Submission>,
    max_concurrent: usize,
) -> BatchOutcome {
    let flow = GradingFlow::new(gateway);
    grade_with_flow(session, &flow, &submissions, max_concurrent).await
}

async fn grade_with_flow(
    session: &ClassSession,
    flow: &GradingFlow,
    submissions: &[Submission],
    max_concurrent: usize,
) -> BatchOutcome {
    let semaphore = Semaphore::new(max_concurrent.max(1));
    let total = submissions.len();

    let mut in_flight = FuturesUnordered::new();
    for (idx, submission) in submissions.iter().enumerate() {
        let ctx = SubmissionCtx::new(submission.id.clone(), idx + 1, total);
        let semaphore = &semaphore;
        in_flight.push(async move {
            let _permit = semaphore.acquire().await.ok();
            let outcome = flow.run(session, submission, &ctx).await;
            (ctx, outcome)
        });
    }

    let mut results: Vec<SubmissionResult> = Vec::with_capacity(total);
    let mut pending: Vec<SubmissionFailure> = Vec::new();

    while let Some((ctx, outcome)) = in_flight.next().await {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                error!("{} ❌ 评分失败，记为待处理: {}", ctx, e);
                pending.push(SubmissionFailure {
                    submission_id: ctx.submission_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    let summary = ClassSummary::from_results(&results);
    let summary_document =
        ReportRenderer::new().render_summary(&summary_title(session), &summary.entries);

    BatchOutcome {
        results,
        pending,
        summary,
        summary_document,
    }
}

fn summary_title(session: &ClassSession) -> String {
    format!("{} summary", session.class_name())
}

/// 应用主结构
pub struct App {
    config: Config,
    gateway: Arc<dyn ModelGateway>,
    renderer: ReportRenderer,
}

impl App {
    /// 初始化应用：按配置创建模型网关
    pub async fn initialize(config: Config) -> Result<Self> {
        let gateway = gateway::from_config(&config).map_err(AppError::from)?;
        Ok(Self::with_gateway(config, gateway))
    }

    /// 使用指定的模型网关创建应用
    pub fn with_gateway(config: Config, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            config,
            gateway,
            renderer: ReportRenderer::new(),
        }
    }

    /// 运行一次批量评分
    ///
    /// 输入文件有问题时直接返回错误（可 downcast 为 `AppError::Input`），
    /// 不会处理任何作业。
    pub async fn run(&self, job: GradeJob) -> Result<BatchOutcome> {
        let (session, submissions) = self.load_inputs(&job).await?;

        let output_dir = job
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.output_dir));
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(output_dir.display().to_string(), e))?;
        logging::init_log_file(&output_dir.join(LOG_FILE_NAME), session.class_name())?;

        logging::log_startup(session.class_name(), self.config.max_concurrent_submissions);
        logging::log_submissions_loaded(submissions.len(), session.rubric().len());
        if submissions.is_empty() {
            warn!("⚠️ 压缩包中没有 .txt 作业，只生成空汇总");
        }

        let flow = GradingFlow::new(self.gateway.clone())
            .with_verbose_logging(self.config.verbose_logging);
        let outcome = grade_with_flow(
            &session,
            &flow,
            &submissions,
            self.config.max_concurrent_submissions,
        )
        .await;

        self.write_outputs(&outcome, &output_dir)
            .await
            .context("写入评分报告失败")?;

        logging::print_final_stats(outcome.results.len(), outcome.pending.len(), &output_dir);

        Ok(outcome)
    }

    /// 校验并加载评分标准和作业
    async fn load_inputs(&self, job: &GradeJob) -> AppResult<(ClassSession, Vec<Submission>)> {
        // 先校验两个输入，再加载
        check_input_file(&job.rubric_path, ".csv")?;
        check_input_file(&job.archive_path, ".zip")?;

        let rubric = load_rubric(&job.rubric_path).await?;
        let session = ClassSession::new(job.class_name.clone(), rubric);

        info!("\n📁 正在读取作业压缩包...");
        let submissions = load_submissions(&job.archive_path).await?;
        Ok((session, submissions))
    }

    /// 写出全部报告
    async fn write_outputs(&self, outcome: &BatchOutcome, output_dir: &Path) -> Result<(), OutputError> {
        // 汇总和待处理清单的文件名先占位，作业报告不能覆盖它们
        let mut used_stems: HashSet<String> = RESERVED_STEMS.iter().map(|s| s.to_string()).collect();
        for result in &outcome.results {
            let stem = unique_stem(&file_stem_of(&result.submission_id), &mut used_stems);
            self.renderer
                .save(&result.detail, &output_dir.join(stem))
                .await?;
        }
        for failure in &outcome.pending {
            let stem = unique_stem(&file_stem_of(&failure.submission_id), &mut used_stems);
            let document = self
                .renderer
                .render_pending(&failure.submission_id, &failure.reason);
            self.renderer.save(&document, &output_dir.join(stem)).await?;
        }

        self.renderer
            .save(&outcome.summary_document, &output_dir.join(SUMMARY_FILE_STEM))
            .await?;

        let results_path = output_dir.join(RESULTS_FILE_NAME);
        let json = serde_json::to_string_pretty(outcome)?;
        tokio::fs::write(&results_path, json)
            .await
            .map_err(|source| OutputError::WriteFailed {
                path: results_path.display().to_string(),
                source,
            })?;

        let pending_writer = PendingWriter::new(output_dir);
        pending_writer.reset().await?;
        for failure in &outcome.pending {
            pending_writer.write(failure).await?;
        }

        Ok(())
    }
}

/// 不同目录下的同名作业（如 `a/essay.txt` 和 `b/essay.txt`）不能互相覆盖
fn unique_stem(stem: &str, used: &mut HashSet<String>) -> String {
    if used.insert(stem.to_string()) {
        return stem.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", stem, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

//! # TA Grader
//!
//! 按评分标准批量批改学生作业，并生成逐份详情与班级汇总报告
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 评分标准、作业、评分记录、结果与文档
//! - `loaders` - 读取 CSV 评分标准与 ZIP 作业包
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单份作业
//! - `PromptBuilder` - 拼接提示词
//! - `ModelGateway` - 调用模型（中转 / OpenAI 兼容 / Hugging Face）
//! - `GradeReplyParser` - 解析模型回复
//! - `ReportRenderer` - 渲染表格，导出 PDF / 纯文本
//! - `PendingWriter` - 写 pending.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份作业"的完整处理流程
//! - `SubmissionCtx` - 上下文封装（序号 + 作业标识）
//! - `GradingFlow` - 流程编排（prompt → gateway → parse → render）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 并发批改、汇总、写出报告
//!
//! 另有 `relay/`：持有上游令牌的最小中转服务。

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod relay;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, GatewayKind};
pub use error::{AppError, AppResult};
pub use models::{BatchOutcome, ClassSession, RubricTable, Submission};
pub use orchestrator::{grade_all, App, GradeJob};
pub use services::gateway::ModelGateway;
pub use workflow::{GradingFlow, SubmissionCtx};

//! 作业处理上下文
//!
//! 封装"我正在批改这一批里的第几份作业"这一信息

use std::fmt::Display;

/// 作业处理上下文
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 作业标识（压缩包内的文件名）
    pub submission_id: String,

    /// 作业在本批中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本批作业总数
    pub total: usize,
}

impl SubmissionCtx {
    /// 创建新的作业上下文
    pub fn new(submission_id: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            submission_id: submission_id.into(),
            index,
            total,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[作业 {}/{} {}]",
            self.index, self.total, self.submission_id
        )
    }
}

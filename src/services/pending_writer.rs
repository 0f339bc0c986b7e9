//! 待处理清单写入 - 业务能力层
//!
//! 只负责"写 pending.txt"能力，不关心流程

use crate::error::OutputError;
use crate::models::result::SubmissionFailure;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 待处理清单文件名
pub const PENDING_FILE_NAME: &str = "pending.txt";
/// 待处理清单文件名（不含扩展名）
pub const PENDING_FILE_STEM: &str = "pending";

/// 待处理清单写入服务
///
/// 每条失败一行：`<submission> | <reason>`
pub struct PendingWriter {
    path: PathBuf,
}

impl PendingWriter {
    /// 在输出目录下写 `pending.txt`
    pub fn new(output_dir: &Path) -> Self {
        Self::with_path(output_dir.join(PENDING_FILE_NAME))
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 清空清单（新一轮批改开始时调用）
    pub async fn reset(&self) -> Result<(), OutputError> {
        tokio::fs::write(&self.path, b"")
            .await
            .map_err(|source| self.write_failed(source))
    }

    /// 追加一条失败记录
    ///
    /// # 参数
    /// - `failure`: 失败的作业及原因
    pub async fn write(&self, failure: &SubmissionFailure) -> Result<(), OutputError> {
        debug!(
            "写入待处理: {} | 原因长度: {}",
            failure.submission_id,
            failure.reason.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.write_failed(source))?;

        let line = format!(
            "{} | {}\n",
            failure.submission_id,
            single_line(&failure.reason)
        );

        file.write_all(line.as_bytes())
            .await
            .map_err(|source| self.write_failed(source))
    }

    fn write_failed(&self, source: std::io::Error) -> OutputError {
        OutputError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// 原因里的换行会打断"一行一条"的格式
fn single_line(reason: &str) -> String {
    reason.split_whitespace().collect::<Vec<_>>().join(" ")
}

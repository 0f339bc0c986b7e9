//! 评分会话
//!
//! 封装"这一轮在给哪门课、按哪份评分标准评分"这一信息

use crate::models::rubric::RubricTable;
use std::fmt::Display;
use std::sync::Arc;

/// 评分会话
///
/// 不可变值，每轮评分构建一次，显式传给提示词构建和批量编排。
#[derive(Debug, Clone)]
pub struct ClassSession {
    class_name: String,
    rubric: Arc<RubricTable>,
    rubric_text: String,
}

impl ClassSession {
    /// 创建新的评分会话
    pub fn new(class_name: impl Into<String>, rubric: RubricTable) -> Self {
        let rubric_text = rubric.rubric_text();
        Self {
            class_name: class_name.into(),
            rubric: Arc::new(rubric),
            rubric_text,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn rubric(&self) -> &RubricTable {
        &self.rubric
    }

    /// 预先生成的评分标准文本
    pub fn rubric_text(&self) -> &str {
        &self.rubric_text
    }

    pub fn category_names(&self) -> Vec<String> {
        self.rubric.category_names()
    }
}

impl Display for ClassSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[课程 {} 类别数#{}]",
            self.class_name,
            self.rubric.len()
        )
    }
}

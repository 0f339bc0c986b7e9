use crate::models::document::Document;
use crate::models::grade::{GradeRecord, ParseWarning};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static LEADING_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(\s*(\d+(?:\.\d+)?)\s*\)").expect("valid score regex"));

/// 一份作业的评分结果
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub submission_id: String,
    pub records: Vec<GradeRecord>,
    pub warnings: Vec<ParseWarning>,
    #[serde(skip)]
    pub detail: Document,
}

impl SubmissionResult {
    /// 总分：各类别评分文本开头 `(n)` 的数字之和
    ///
    /// 没有任何类别带数字时返回 `None`。
    pub fn overall_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .records
            .iter()
            .filter_map(|record| leading_score(&record.grade))
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum())
        }
    }
}

/// 提取评分文本开头括号里的数字，例如 `(5) excellent` → 5
pub fn leading_score(grade: &str) -> Option<f64> {
    LEADING_SCORE
        .captures(grade)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 评分失败的作业（待处理）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionFailure {
    pub submission_id: String,
    pub reason: String,
}

/// 班级汇总中的一行
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SummaryEntry {
    pub submission_id: String,
    pub score: String,
}

/// 班级汇总
///
/// 每份成功评分的作业一行，顺序为完成顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub entries: Vec<SummaryEntry>,
}

impl ClassSummary {
    pub fn from_results(results: &[SubmissionResult]) -> Self {
        let entries = results
            .iter()
            .map(|result| SummaryEntry {
                submission_id: result.submission_id.clone(),
                score: format_score(result.overall_score()),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) if value.fract() == 0.0 => format!("{}", value as i64),
        Some(value) => format!("{:.2}", value),
        None => "-".to_string(),
    }
}

/// 一批作业的评分结果
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// 成功的作业，按完成顺序
    pub results: Vec<SubmissionResult>,
    /// 失败的作业，标记为待处理
    pub pending: Vec<SubmissionFailure>,
    pub summary: ClassSummary,
    #[serde(skip)]
    pub summary_document: Document,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.results.len() + self.pending.len()
    }
}

//! 模型回复解析 - 业务能力层
//!
//! 只负责"把模型回复拆成逐类别的评分记录"，不关心流程
//!
//! 每个类别一行，字段以 `;` 分隔：
//! `{类别}: ({分数}) {档位}; """{评语}"""; {置信度}; {说明}`
//!
//! 解析尽量宽松：格式不对的行不会报错，而是以 `ParseWarning` 的形式返回。

use crate::models::grade::{
    ConfidenceLevel, GradeRecord, GradeReply, ParseWarning, ParseWarningKind,
};
use tracing::debug;

const TRIPLE_QUOTE: &str = "\"\"\"";

/// 模型回复解析器
pub struct GradeReplyParser;

impl GradeReplyParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析模型回复
    ///
    /// 输出顺序与回复中的行顺序一致，类别名不去重。
    pub fn parse(&self, reply: &str) -> GradeReply {
        let mut out = GradeReply::default();

        for (index, raw_line) in reply.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            parse_line(index + 1, line, &mut out);
        }

        debug!(
            "回复解析完成: {} 条记录, {} 条警告",
            out.records.len(),
            out.warnings.len()
        );
        out
    }
}

impl Default for GradeReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line_no: usize, line: &str, out: &mut GradeReply) {
    let warn = |out: &mut GradeReply, kind: ParseWarningKind| {
        out.warnings.push(ParseWarning {
            line: line_no,
            kind,
            raw: line.to_string(),
        })
    };

    let fields = split_fields(line);
    let head = fields.first().map(String::as_str).unwrap_or("");
    if head.is_empty() {
        warn(out, ParseWarningKind::MalformedLine);
        return;
    }

    let (category, grade) = match head.split_once(':') {
        Some((category, grade)) => (category.trim(), grade.trim()),
        None => (head, ""),
    };
    if category.is_empty() {
        warn(out, ParseWarningKind::MalformedLine);
        return;
    }

    if fields.len() == 1 {
        warn(out, ParseWarningKind::IncompleteLine);
        out.records.push(GradeRecord {
            category: category.to_string(),
            grade: String::new(),
            feedback: String::new(),
            confidence: ConfidenceLevel::Unspecified,
            comment: None,
        });
        return;
    }

    let rest = &fields[1..];

    // 模型有时会省略评语：未加三引号且本身就是置信度标签的字段视为置信度
    let feedback_omitted =
        !rest[0].contains(TRIPLE_QUOTE) && ConfidenceLevel::recognize(&rest[0]).is_some();
    let (feedback, confidence_at) = if feedback_omitted {
        (String::new(), 0)
    } else {
        (strip_triple_quotes(&rest[0]), 1)
    };

    let confidence = rest
        .get(confidence_at)
        .map(|field| ConfidenceLevel::parse_lenient(field))
        .unwrap_or(ConfidenceLevel::Unspecified);

    let comment_parts: Vec<&str> = rest
        .iter()
        .skip(confidence_at + 1)
        .map(String::as_str)
        .filter(|part| !part.is_empty())
        .collect();
    let comment = if comment_parts.is_empty() {
        None
    } else {
        Some(comment_parts.join("; "))
    };

    match &confidence {
        ConfidenceLevel::Unspecified => warn(out, ParseWarningKind::MissingConfidence),
        ConfidenceLevel::Unrecognized(_) => warn(out, ParseWarningKind::UnrecognizedConfidence),
        level if level.needs_comment() && comment.is_none() => {
            warn(out, ParseWarningKind::MissingComment)
        }
        level if !level.needs_comment() && comment.is_some() => {
            warn(out, ParseWarningKind::UnexpectedComment)
        }
        _ => {}
    }

    out.records.push(GradeRecord {
        category: category.to_string(),
        grade: grade.to_string(),
        feedback,
        confidence,
        comment,
    });
}

/// 按 `;` 拆分字段，三引号内的分号不拆分
///
/// 三引号不成对时退化为普通拆分。字段首尾空白被去掉。
fn split_fields(line: &str) -> Vec<String> {
    let bytes = line.as_bytes();
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(TRIPLE_QUOTE.as_bytes()) {
            in_quotes = !in_quotes;
            i += TRIPLE_QUOTE.len();
            continue;
        }
        if bytes[i] == b';' && !in_quotes {
            fields.push(line[start..i].trim().to_string());
            start = i + 1;
        }
        i += 1;
    }

    if in_quotes {
        return line.split(';').map(|f| f.trim().to_string()).collect();
    }

    fields.push(line[start..].trim().to_string());
    fields
}

fn strip_triple_quotes(field: &str) -> String {
    field.replace(TRIPLE_QUOTE, "").trim().to_string()
}

use serde::Serialize;
use std::fmt;

/// 置信度
///
/// 四个固定档位按从高到低排列；无法识别的标签原样保留（宽松透传）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// 证据明确
    VeryConfident,
    /// 大体符合，有小的不一致
    PrettyConfident,
    /// 可能符合多个档位
    SomewhatUnsure,
    /// 评分标准无法清晰对应，需要说明
    Unsure,
    /// 模型给了无法识别的标签
    Unrecognized(String),
    /// 回复中缺少置信度字段
    Unspecified,
}

static KNOWN_LEVELS: phf::Map<&'static str, ConfidenceLevel> = phf::phf_map! {
    "very confident" => ConfidenceLevel::VeryConfident,
    "pretty confident" => ConfidenceLevel::PrettyConfident,
    "somewhat unsure" => ConfidenceLevel::SomewhatUnsure,
    "unsure" => ConfidenceLevel::Unsure,
};

impl ConfidenceLevel {
    /// 四个固定档位，按从高到低排列
    pub const ALL: [ConfidenceLevel; 4] = [
        ConfidenceLevel::VeryConfident,
        ConfidenceLevel::PrettyConfident,
        ConfidenceLevel::SomewhatUnsure,
        ConfidenceLevel::Unsure,
    ];

    /// 标准标签
    pub fn label(&self) -> &str {
        match self {
            ConfidenceLevel::VeryConfident => "very confident",
            ConfidenceLevel::PrettyConfident => "pretty confident",
            ConfidenceLevel::SomewhatUnsure => "somewhat unsure",
            ConfidenceLevel::Unsure => "unsure",
            ConfidenceLevel::Unrecognized(raw) => raw,
            ConfidenceLevel::Unspecified => "",
        }
    }

    /// 档位含义（用于提示词）
    pub fn definition(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryConfident => "The submission clearly fits one rubric category. Evidence is strong, unambiguous, and easily supported with direct quotes.",
            ConfidenceLevel::PrettyConfident => "The submission mostly fits one category, but there are minor inconsistencies or weaker evidence in places.",
            ConfidenceLevel::SomewhatUnsure => "The submission could reasonably fit multiple categories. Evidence supports more than one possible grade, making the choice debatable.",
            ConfidenceLevel::Unsure => "The rubric definitions don't map cleanly to the submission. Deciding requires arbitrary judgment or assumptions beyond the rubric.",
            ConfidenceLevel::Unrecognized(_) | ConfidenceLevel::Unspecified => "",
        }
    }

    /// 尝试识别标准标签（忽略大小写、首尾空白和句末标点）
    pub fn recognize(s: &str) -> Option<Self> {
        let normalized = s
            .trim()
            .trim_end_matches(|c: char| c == '.' || c == '!')
            .to_lowercase();
        KNOWN_LEVELS.get(normalized.as_str()).cloned()
    }

    /// 解析置信度字段，无法识别时原样保留
    pub fn parse_lenient(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return ConfidenceLevel::Unspecified;
        }
        Self::recognize(trimmed).unwrap_or_else(|| ConfidenceLevel::Unrecognized(trimmed.to_string()))
    }

    /// 最低两档需要附带说明
    pub fn needs_comment(&self) -> bool {
        matches!(self, ConfidenceLevel::SomewhatUnsure | ConfidenceLevel::Unsure)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 一个类别在一份作业上的评分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeRecord {
    pub category: String,
    /// 分数与档位文本，例如 `(5) excellent`，不解析为数字
    pub grade: String,
    pub feedback: String,
    pub confidence: ConfidenceLevel,
    pub comment: Option<String>,
}

impl GradeRecord {
    /// 置信度说明，没有时为空字符串
    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    /// 按回复行格式重新序列化
    ///
    /// 字段间空白与多余字段不会被还原，因此不保证与原始行一致。
    pub fn to_reply_line(&self) -> String {
        let mut line = format!(
            "{}: {}; \"\"\"{}\"\"\"; {}",
            self.category, self.grade, self.feedback, self.confidence
        );
        if let Some(comment) = &self.comment {
            line.push_str("; ");
            line.push_str(comment);
        }
        line
    }
}

/// 解析警告类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseWarningKind {
    /// 类别名为空，整行被丢弃
    MalformedLine,
    /// 只有一个字段，仅保留类别
    IncompleteLine,
    /// 缺少置信度字段
    MissingConfidence,
    /// 置信度不是四个标准标签之一
    UnrecognizedConfidence,
    /// 最低两档缺少说明
    MissingComment,
    /// 高置信度却附带了说明
    UnexpectedComment,
}

impl fmt::Display for ParseWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseWarningKind::MalformedLine => "类别名为空，已丢弃",
            ParseWarningKind::IncompleteLine => "只有类别字段",
            ParseWarningKind::MissingConfidence => "缺少置信度",
            ParseWarningKind::UnrecognizedConfidence => "无法识别的置信度",
            ParseWarningKind::MissingComment => "低置信度缺少说明",
            ParseWarningKind::UnexpectedComment => "高置信度附带了说明",
        };
        write!(f, "{}", text)
    }
}

/// 解析警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 回复中的行号（从 1 开始）
    pub line: usize,
    pub kind: ParseWarningKind,
    pub raw: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "第 {} 行: {} ({})", self.line, self.kind, self.raw)
    }
}

/// 一次模型回复的解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeReply {
    pub records: Vec<GradeRecord>,
    pub warnings: Vec<ParseWarning>,
}

impl GradeReply {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

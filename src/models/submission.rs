use serde::Serialize;
use std::path::Path;

/// 一份学生作业
///
/// `id` 是压缩包内的相对路径，`text` 是原始文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: String,
    pub text: String,
}

impl Submission {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// 用作输出文件名的主干（去掉目录与扩展名）
    pub fn file_stem(&self) -> String {
        file_stem_of(&self.id)
    }
}

/// 从作业标识取输出文件名主干
pub fn file_stem_of(id: &str) -> String {
    let stem = Path::new(id)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.is_empty() {
        "submission".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_strips_folders_and_extension() {
        assert_eq!(Submission::new("period1/alice.txt", "").file_stem(), "alice");
        assert_eq!(Submission::new("bob.TXT", "").file_stem(), "bob");
        assert_eq!(file_stem_of(""), "submission");
    }
}

use crate::error::InputFormatError;
use crate::models::submission::Submission;
use std::io::{Cursor, Read};
use std::path::Path;
use tokio::fs;

/// 检查文件存在且扩展名匹配（忽略大小写）
pub(crate) fn check_input_file(path: &Path, ext: &str) -> Result<(), InputFormatError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(InputFormatError::NotFound { path: display });
    }
    if !display.to_lowercase().ends_with(ext) {
        return Err(InputFormatError::WrongExtension {
            path: display,
            expected: ext.to_string(),
        });
    }
    Ok(())
}

/// 从 ZIP 文件加载所有作业
///
/// 只收取 `.txt` 条目，其余条目（包括目录）被忽略。
pub async fn load_submissions(archive_path: &Path) -> Result<Vec<Submission>, InputFormatError> {
    check_input_file(archive_path, ".zip")?;

    let bytes = fs::read(archive_path)
        .await
        .map_err(|source| InputFormatError::ReadFailed {
            path: archive_path.display().to_string(),
            source,
        })?;

    load_submissions_from_bytes(&bytes, &archive_path.display().to_string())
}

/// 从内存中的 ZIP 数据加载作业
///
/// # 参数
/// - `bytes`: 压缩包内容
/// - `origin`: 压缩包来源（仅用于错误信息）
pub fn load_submissions_from_bytes(
    bytes: &[u8],
    origin: &str,
) -> Result<Vec<Submission>, InputFormatError> {
    let bad_archive = |source| InputFormatError::BadArchive {
        path: origin.to_string(),
        source,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(bad_archive)?;
    let mut submissions = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(bad_archive)?;
        let name = entry.name().to_string();

        if entry.is_dir() || !name.to_lowercase().ends_with(".txt") {
            tracing::debug!("跳过非文本条目: {}", name);
            continue;
        }

        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|source| InputFormatError::ReadFailed {
                path: format!("{}:{}", origin, name),
                source,
            })?;

        tracing::info!("正在加载: {}", name);
        submissions.push(Submission::new(name, String::from_utf8_lossy(&raw)));
    }

    Ok(submissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn only_txt_entries_become_submissions() {
        let bytes = build_zip(&[
            ("alice.txt", "Alice essay"),
            ("notes.docx", "binary"),
            ("period2/BOB.TXT", "Bob essay"),
        ]);

        let submissions = load_submissions_from_bytes(&bytes, "class.zip").unwrap();

        let ids: Vec<&str> = submissions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["alice.txt", "period2/BOB.TXT"]);
        assert_eq!(submissions[1].text, "Bob essay");
    }

    #[test]
    fn garbage_bytes_are_a_bad_archive() {
        let err = load_submissions_from_bytes(b"not a zip", "class.zip").unwrap_err();
        assert!(matches!(err, InputFormatError::BadArchive { .. }));
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submissions.rar");
        std::fs::write(&path, b"whatever").unwrap();

        let err = load_submissions(&path).await.unwrap_err();
        assert!(matches!(err, InputFormatError::WrongExtension { .. }));
    }

    #[tokio::test]
    async fn missing_archive_is_reported() {
        let err = load_submissions(Path::new("/definitely/not/here.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, InputFormatError::NotFound { .. }));
    }
}

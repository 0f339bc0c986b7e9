use crate::error::InputFormatError;
use crate::models::loaders::archive_loader::check_input_file;
use crate::models::rubric::RubricTable;
use std::path::Path;
use tokio::fs;

/// 从 CSV 文件加载评分标准
pub async fn load_rubric(csv_path: &Path) -> Result<RubricTable, InputFormatError> {
    check_input_file(csv_path, ".csv")?;

    let content = fs::read_to_string(csv_path)
        .await
        .map_err(|source| InputFormatError::ReadFailed {
            path: csv_path.display().to_string(),
            source,
        })?;

    let table = RubricTable::parse(&content)?;
    tracing::info!(
        "成功加载评分标准 {}: {} 个类别, {} 档描述",
        csv_path.display(),
        table.len(),
        table.rows().len()
    );

    Ok(table)
}

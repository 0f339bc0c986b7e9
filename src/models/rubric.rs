//! 评分标准表
//!
//! 首行为类别名，其余每行给出各类别的一档描述。
//! 不支持引号转义：逗号总是分隔符。

use crate::error::RubricError;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// 单个评分类别
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricCategory {
    pub name: String,
    /// 非空的描述，按行顺序排列
    pub descriptors: Vec<String>,
}

/// 评分标准中的一行，单元格数量与表头一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricRow {
    cells: Vec<String>,
}

impl RubricRow {
    /// 按列序取单元格
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// 评分标准表
///
/// 构建后不可变；加载新的评分标准时整体替换。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricTable {
    categories: Vec<RubricCategory>,
    rows: Vec<RubricRow>,
}

impl RubricTable {
    /// 解析逗号分隔的评分标准文本
    ///
    /// - 输入为空 → `RubricError::Empty`
    /// - 表头重复 → `RubricError::DuplicateCategory`
    /// - 表头空白 → `RubricError::BlankCategory`
    /// - 行短于表头时右侧补空字符串，多出的单元格被忽略
    pub fn parse(text: &str) -> Result<Self, RubricError> {
        let mut lines = text.trim().lines();

        let header_line = match lines.next() {
            Some(line) if !line.trim().is_empty() => line,
            _ => return Err(RubricError::Empty),
        };

        let headers: Vec<String> = header_line.split(',').map(|h| h.trim().to_string()).collect();

        let mut seen = HashSet::new();
        for (index, header) in headers.iter().enumerate() {
            if header.is_empty() {
                return Err(RubricError::BlankCategory { column: index + 1 });
            }
            if !seen.insert(header.as_str()) {
                return Err(RubricError::DuplicateCategory {
                    name: header.clone(),
                });
            }
        }

        let mut rows = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut cells: Vec<String> = line.split(',').map(|v| v.trim().to_string()).collect();
            if cells.len() > headers.len() {
                warn!(
                    "评分标准第 {} 行有 {} 个单元格，多于表头的 {} 个，多余部分已忽略",
                    line_no + 2,
                    cells.len(),
                    headers.len()
                );
                cells.truncate(headers.len());
            }
            cells.resize(headers.len(), String::new());
            rows.push(RubricRow { cells });
        }

        let categories = headers
            .into_iter()
            .enumerate()
            .map(|(column, name)| RubricCategory {
                name,
                descriptors: rows
                    .iter()
                    .filter_map(|row| row.cell(column))
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        Ok(Self { categories, rows })
    }

    pub fn categories(&self) -> &[RubricCategory] {
        &self.categories
    }

    /// 类别名，按表头顺序
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    /// 某个类别的描述列表
    pub fn descriptors(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.descriptors.as_slice())
    }

    pub fn rows(&self) -> &[RubricRow] {
        &self.rows
    }

    /// 按类别名取某一行的单元格
    pub fn row_value(&self, row: usize, category: &str) -> Option<&str> {
        let column = self.categories.iter().position(|c| c.name == category)?;
        self.rows.get(row)?.cell(column)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 生成可读的评分标准文本，每个类别一行
    ///
    /// 格式：`<类别>: <第一档>: <其余各档用 "; " 连接>`
    pub fn rubric_text(&self) -> String {
        self.categories
            .iter()
            .map(|category| match category.descriptors.split_first() {
                None => format!("{}:", category.name),
                Some((first, [])) => format!("{}: {}", category.name, first),
                Some((first, rest)) => {
                    format!("{}: {}: {}", category.name, first, rest.join("; "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

use serde::Serialize;

/// 渲染后的文档
///
/// 表格数据加上按页切分好的文本，可导出为 PDF 或纯文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 每页的文本行
    pub pages: Vec<Vec<String>>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 纯文本形式，页与页之间用换页符分隔
    pub fn to_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\u{c}\n")
    }
}

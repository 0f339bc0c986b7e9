//! 报告渲染 - 业务能力层
//!
//! 只负责"把评分记录排成表格文档"，以及把文档导出为 PDF / 纯文本

use crate::error::OutputError;
use crate::models::document::Document;
use crate::models::grade::GradeRecord;
use crate::models::result::SummaryEntry;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::object::Segment;
use tabled::settings::{Modify, Style, Width};
use tracing::{debug, warn};

/// A4 横向
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 10.0;
const FONT_SIZE_PT: f32 = 8.0;
const LINE_HEIGHT_MM: f32 = 3.6;

/// 版面参数
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    /// 每行最多字符数
    pub line_width: usize,
    /// 每页正文行数（不含页眉）
    pub lines_per_page: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            line_width: 150,
            lines_per_page: 48,
        }
    }
}

/// 报告渲染器
pub struct ReportRenderer {
    layout: Layout,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::with_layout(Layout::default())
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self { layout }
    }

    /// 单个学生的评分详情
    ///
    /// 每个类别一列（按记录顺序），两行正文：评分行和评语行。
    pub fn render_detail(&self, title: &str, records: &[GradeRecord]) -> Document {
        let header: Vec<String> = records.iter().map(|r| r.category.clone()).collect();
        let grade_row: Vec<String> = records.iter().map(grade_cell).collect();
        let feedback_row: Vec<String> = records.iter().map(|r| r.feedback.clone()).collect();

        self.layout_document(title, header, vec![grade_row, feedback_row])
    }

    /// 班级汇总：两列（Student, Score），每条一行，保持传入顺序
    pub fn render_summary(&self, title: &str, entries: &[SummaryEntry]) -> Document {
        let header = vec!["Student".to_string(), "Score".to_string()];
        let rows = entries
            .iter()
            .map(|entry| vec![entry.submission_id.clone(), entry.score.clone()])
            .collect();

        self.layout_document(title, header, rows)
    }

    /// 未能评分的作业：一行状态和原因，供助教按学生查看
    pub fn render_pending(&self, title: &str, reason: &str) -> Document {
        let header = vec!["Status".to_string(), "Reason".to_string()];
        let rows = vec![vec!["pending".to_string(), reason.to_string()]];

        self.layout_document(title, header, rows)
    }

    /// 是否有行超出版面宽度（PDF 中会被页边截断）
    pub fn overflows(&self, document: &Document) -> bool {
        document
            .pages
            .iter()
            .flatten()
            .any(|line| line.chars().count() > self.layout.line_width)
    }

    /// 导出为 PDF
    pub fn to_pdf(&self, document: &Document) -> Result<Vec<u8>, OutputError> {
        let pdf_error = |message: String| OutputError::PdfFailed {
            title: document.title.clone(),
            message,
        };

        let (doc, first_page, first_layer) = PdfDocument::new(
            document.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| pdf_error(e.to_string()))?;

        for (index, lines) in document.pages.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
            };
            let canvas = doc.get_page(page).get_layer(layer);

            for (line_no, line) in lines.iter().enumerate() {
                let y = PAGE_HEIGHT_MM - MARGIN_MM - LINE_HEIGHT_MM * (line_no as f32 + 1.0);
                canvas.use_text(pdf_safe(line), FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
            }
        }

        doc.save_to_bytes().map_err(|e| pdf_error(e.to_string()))
    }

    /// 把文档写成 `<base>.pdf` 和 `<base>.txt`
    ///
    /// # 返回
    /// 返回 PDF 文件路径
    pub async fn save(&self, document: &Document, base: &Path) -> Result<PathBuf, OutputError> {
        let pdf_path = with_suffix(base, "pdf");
        let txt_path = with_suffix(base, "txt");

        let pdf = self.to_pdf(document)?;
        write_file(&pdf_path, &pdf).await?;
        write_file(&txt_path, document.to_text().as_bytes()).await?;

        debug!(
            "已写入报告: {} ({} 页)",
            pdf_path.display(),
            document.page_count()
        );
        Ok(pdf_path)
    }

    fn layout_document(&self, title: &str, header: Vec<String>, rows: Vec<Vec<String>>) -> Document {
        let body_lines: Vec<String> = if header.is_empty() {
            vec!["(no entries)".to_string()]
        } else {
            self.render_table(&header, &rows)
                .lines()
                .map(str::to_string)
                .collect()
        };

        let pages = paginate(title, &body_lines, self.layout.lines_per_page);

        let document = Document {
            title: title.to_string(),
            header,
            rows,
            pages,
        };
        if self.overflows(&document) {
            warn!(
                "⚠️ {} 的表格宽于版面 ({} 列，每行 {} 字符)，PDF 右侧会被截断",
                title,
                document.header.len(),
                self.layout.line_width
            );
        }
        document
    }

    fn render_table(&self, header: &[String], rows: &[Vec<String>]) -> String {
        let columns = header.len().max(1);
        // 每列两侧各一格内边距，外加 columns + 1 条竖线
        let cell_width = (self.layout.line_width.saturating_sub(columns + 1) / columns)
            .saturating_sub(2)
            .max(6);

        let mut builder = Builder::default();
        builder.push_record(header.iter().cloned());
        for row in rows {
            builder.push_record(row.iter().cloned());
        }

        let mut table = builder.build();
        table
            .with(Style::ascii())
            .with(Modify::new(Segment::all()).with(Width::wrap(cell_width).keep_words(true)));
        table.to_string()
    }
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn grade_cell(record: &GradeRecord) -> String {
    let mut cell = record.grade.clone();
    if !record.confidence.label().is_empty() {
        cell.push_str(&format!("\n[{}]", record.confidence));
    }
    if let Some(comment) = &record.comment {
        cell.push_str(&format!("\n{}", comment));
    }
    cell
}

/// 按固定行数分页，每页带页眉
fn paginate(title: &str, lines: &[String], lines_per_page: usize) -> Vec<Vec<String>> {
    let chunks: Vec<&[String]> = lines.chunks(lines_per_page.max(1)).collect();
    let total = chunks.len().max(1);

    if chunks.is_empty() {
        return vec![vec![format!("{} (page 1/1)", title), String::new()]];
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut page = Vec::with_capacity(chunk.len() + 2);
            page.push(format!("{} (page {}/{})", title, index + 1, total));
            page.push(String::new());
            page.extend(chunk.iter().cloned());
            page
        })
        .collect()
}

/// 内置字体只支持 WinAnsi，常见的弯引号替换为直引号，其余非 ASCII 字符替换为 `?`
fn pdf_safe(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// 追加扩展名；`with_extension` 会把 `essay.v2` 里的 `v2` 当成扩展名替换掉
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| OutputError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grade::ConfidenceLevel;

    fn record(category: &str, grade: &str, feedback: &str) -> GradeRecord {
        GradeRecord {
            category: category.to_string(),
            grade: grade.to_string(),
            feedback: feedback.to_string(),
            confidence: ConfidenceLevel::VeryConfident,
            comment: None,
        }
    }

    #[test]
    fn detail_has_one_column_per_record_and_two_rows() {
        let renderer = ReportRenderer::new();
        let doc = renderer.render_detail(
            "alice.txt",
            &[
                record("Content", "(5) excellent", "Strong thesis."),
                record("Style", "(3) ok", "Wordy in places."),
            ],
        );

        assert_eq!(doc.header, vec!["Content", "Style"]);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[0][0], "(5) excellent\n[very confident]");
        assert_eq!(doc.rows[1][1], "Wordy in places.");

        let text = doc.to_text();
        assert!(text.contains("alice.txt (page 1/1)"));
        assert!(text.contains("Strong thesis."));
    }

    #[test]
    fn summary_keeps_entry_order() {
        let renderer = ReportRenderer::new();
        let entries = vec![
            SummaryEntry {
                submission_id: "bob.txt".to_string(),
                score: "7".to_string(),
            },
            SummaryEntry {
                submission_id: "alice.txt".to_string(),
                score: "9".to_string(),
            },
        ];

        let doc = renderer.render_summary("Class summary", &entries);

        assert_eq!(doc.header, vec!["Student", "Score"]);
        assert_eq!(doc.rows, vec![vec!["bob.txt", "7"], vec!["alice.txt", "9"]]);
        let text = doc.to_text();
        assert!(text.find("bob.txt").unwrap() < text.find("alice.txt").unwrap());
    }

    #[test]
    fn long_tables_are_split_into_pages() {
        let renderer = ReportRenderer::with_layout(Layout {
            line_width: 60,
            lines_per_page: 5,
        });
        let entries: Vec<SummaryEntry> = (0..20)
            .map(|i| SummaryEntry {
                submission_id: format!("student{}.txt", i),
                score: i.to_string(),
            })
            .collect();

        let doc = renderer.render_summary("Summary", &entries);

        assert!(doc.page_count() > 1);
        for (index, page) in doc.pages.iter().enumerate() {
            assert!(page[0].starts_with(&format!("Summary (page {}/", index + 1)));
            assert!(page.len() <= 5 + 2);
        }
    }

    #[test]
    fn pending_report_shows_status_and_reason() {
        let doc = ReportRenderer::new().render_pending("bob.txt", "Model is loading");

        assert_eq!(doc.header, vec!["Status", "Reason"]);
        assert_eq!(doc.rows, vec![vec!["pending", "Model is loading"]]);
        let text = doc.to_text();
        assert!(text.contains("bob.txt (page 1/1)"));
        assert!(text.contains("Model is loading"));
    }

    #[test]
    fn too_many_categories_overflow_the_page() {
        let renderer = ReportRenderer::new();
        let wide: Vec<GradeRecord> = (0..30)
            .map(|i| record(&format!("C{}", i), "(1) weak", "Too short."))
            .collect();
        let narrow = vec![
            record("Content", "(5) excellent", "Strong thesis."),
            record("Style", "(3) ok", "Wordy in places."),
        ];

        assert!(renderer.overflows(&renderer.render_detail("wide.txt", &wide)));
        assert!(!renderer.overflows(&renderer.render_detail("narrow.txt", &narrow)));
    }

    #[test]
    fn empty_detail_still_renders_a_page() {
        let doc = ReportRenderer::new().render_detail("empty.txt", &[]);
        assert_eq!(doc.page_count(), 1);
        assert!(doc.to_text().contains("(no entries)"));
    }

    #[test]
    fn pdf_output_has_pdf_magic() {
        let renderer = ReportRenderer::new();
        let doc = renderer.render_detail("a.txt", &[record("Content", "(4) good", "“Nice” work")]);

        let bytes = renderer.to_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn suffix_keeps_dotted_stems() {
        assert_eq!(
            with_suffix(Path::new("out/essay.v2"), "pdf"),
            PathBuf::from("out/essay.v2.pdf")
        );
    }

    #[test]
    fn pdf_safe_replaces_non_ascii() {
        assert_eq!(pdf_safe("“quote” – é"), "\"quote\" - ?");
    }
}

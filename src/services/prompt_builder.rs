//! 提示词构建 - 业务能力层
//!
//! 只负责"把评分标准和一份作业拼成提示词"，纯函数，不关心流程

use crate::models::grade::ConfidenceLevel;
use crate::models::session::ClassSession;

const SPECTRUM_HEADER: &str = "Confidence Spectrum - possible confidence scores";

const REPLY_FORMAT: &str = "{Category name}: ({score}) {score label}; \"\"\"{feedback}\"\"\"; {confidence score}; {confidence comment (if applicable)}";

const EXAMPLE_REPLY: &str = "Category 1: (5) good; \"\"\"The submission demonstrates strong historical knowledge and clear analysis. For instance, the student notes that 'Lorem Ipsum is not simply random text' and correctly identifies its origin in Cicero's 'de Finibus Bonorum et Malorum.' These details show accurate recall and contextualization.\"\"\"; very confident\n\
Category 3: (1) bad; \"\"\"The submission does not adequately address the ethical implications of the text. Although the student references 'a treatise on the theory of ethics,' they fail to analyze its significance or connect it to the assignment's focus. The discussion remains superficial.\"\"\"; somewhat unsure; The rubric definition of \"bad\" is broad, and parts of the essay could arguably fit \"ok.\"";

const NOTES: &str = "Notes: The {feedback} field is a 80-120 word comment including at least two examples of evidence from the student submission supporting why you chose the grade that you did. Incorporate at least one verbatim quote of the student's. The {confidence score} field uses the Confidence Spectrum above to assess how confident you are that the student deserves the score. If you choose a score of \"somewhat unsure\" or \"unsure\", explain why in the {confidence comment} field. Write exactly one line per rubric category and nothing else.";

/// 提示词构建器
///
/// 职责：
/// - 按固定顺序拼接四个部分：评分标准、置信度说明、评分要求、任务
/// - 作业文本原样放在引号内，不做转义
pub struct PromptBuilder<'a> {
    class_name: &'a str,
    rubric_text: &'a str,
    category_names: Vec<String>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(class_name: &'a str, rubric_text: &'a str, category_names: Vec<String>) -> Self {
        Self {
            class_name,
            rubric_text,
            category_names,
        }
    }

    /// 从评分会话创建
    pub fn for_session(session: &'a ClassSession) -> Self {
        Self::new(
            session.class_name(),
            session.rubric_text(),
            session.category_names(),
        )
    }

    /// 为一份作业构建提示词
    pub fn build(&self, submission_text: &str) -> String {
        build_prompt(
            self.class_name,
            self.rubric_text,
            &self.category_names,
            submission_text,
        )
    }
}

/// 构建评分提示词
///
/// # 参数
/// - `class_name`: 课程名称
/// - `rubric_text`: 评分标准文本（原样放在最前面）
/// - `category_names`: 类别名，按评分标准顺序
/// - `submission_text`: 作业原文
pub fn build_prompt(
    class_name: &str,
    rubric_text: &str,
    category_names: &[String],
    submission_text: &str,
) -> String {
    [
        rubric_text.to_string(),
        confidence_spectrum(),
        grading_instructions(class_name),
        task_framing(category_names, submission_text),
    ]
    .join("\n\n")
}

/// 置信度说明：四个档位及其含义
pub fn confidence_spectrum() -> String {
    let mut section = String::from(SPECTRUM_HEADER);
    for level in ConfidenceLevel::ALL.iter() {
        section.push('\n');
        section.push_str(level.label());
        section.push_str(": ");
        section.push_str(level.definition());
    }
    section
}

fn grading_instructions(class_name: &str) -> String {
    format!(
        "You are a teaching assistant for the class {}. For each rubric category above, please generate a rubric grade. A rubric grade consists of the following: the grade, the feedback, and the confidence score. It will follow this format: {}. For example:\n\n{}\n\n{}",
        class_name, REPLY_FORMAT, EXAMPLE_REPLY, NOTES
    )
}

fn task_framing(category_names: &[String], submission_text: &str) -> String {
    format!(
        "Your task: generate a rubric grade for each of the categories in the rubric for this assignment - {} - for the student submission below.\n\nStudent submission:\n\"{}\"",
        category_names.join(", "),
        submission_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rubric::RubricTable;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sections_appear_in_order() {
        let prompt = build_prompt(
            "HIST 101",
            "Content: (5) excellent: (1) poor",
            &names(&["Content", "Style"]),
            "The war ended in 1945.",
        );

        let rubric_at = prompt.find("Content: (5) excellent").unwrap();
        let spectrum_at = prompt.find(SPECTRUM_HEADER).unwrap();
        let class_at = prompt.find("teaching assistant for the class HIST 101").unwrap();
        let task_at = prompt.find("Your task:").unwrap();

        assert_eq!(rubric_at, 0);
        assert!(rubric_at < spectrum_at && spectrum_at < class_at && class_at < task_at);
        assert!(prompt.contains("this assignment - Content, Style - for"));
    }

    #[test]
    fn submission_is_quoted_verbatim_with_all_levels() {
        let submission = "She said \"no\"; then left.\nSecond line.";
        let prompt = build_prompt("ENG", "A: x", &names(&["A"]), submission);

        assert!(prompt.contains(&format!("\"{}\"", submission)));
        for level in ConfidenceLevel::ALL.iter() {
            assert!(prompt.contains(level.label()), "缺少置信度: {}", level);
        }
        assert!(prompt.ends_with(&format!("\"{}\"", submission)));
    }

    #[test]
    fn spectrum_has_four_definitions() {
        let spectrum = confidence_spectrum();
        assert_eq!(spectrum.lines().count(), 5);
        assert!(spectrum.contains("unsure: The rubric definitions don't map cleanly"));
    }

    #[test]
    fn instructions_state_feedback_constraints() {
        let prompt = build_prompt("ENG", "", &[], "");
        assert!(prompt.contains("80-120 word"));
        assert!(prompt.contains("at least two examples of evidence"));
        assert!(prompt.contains("at least one verbatim quote"));
        assert!(prompt.contains(REPLY_FORMAT));
    }

    #[test]
    fn session_builder_matches_free_function() {
        let rubric = RubricTable::parse("Content,Style\n(5) great,(5) vivid\n").unwrap();
        let session = ClassSession::new("ART 200", rubric);

        let built = PromptBuilder::for_session(&session).build("essay");
        let expected = build_prompt(
            "ART 200",
            "Content: (5) great\nStyle: (5) vivid",
            &names(&["Content", "Style"]),
            "essay",
        );
        assert_eq!(built, expected);
    }
}

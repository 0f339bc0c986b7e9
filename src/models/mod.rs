pub mod document;
pub mod grade;
pub mod loaders;
pub mod result;
pub mod rubric;
pub mod session;
pub mod submission;

pub use document::Document;
pub use grade::{ConfidenceLevel, GradeRecord, GradeReply, ParseWarning, ParseWarningKind};
pub use loaders::{load_rubric, load_submissions, load_submissions_from_bytes};
pub use result::{BatchOutcome, ClassSummary, SubmissionFailure, SubmissionResult, SummaryEntry};
pub use rubric::{RubricCategory, RubricRow, RubricTable};
pub use session::ClassSession;
pub use submission::Submission;

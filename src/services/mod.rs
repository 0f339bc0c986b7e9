//! 业务能力层
//!
//! 每个服务只负责一种能力，不关心批量流程

pub mod gateway;
pub mod pending_writer;
pub mod prompt_builder;
pub mod reply_parser;
pub mod report_renderer;

pub use gateway::ModelGateway;
pub use pending_writer::PendingWriter;
pub use prompt_builder::PromptBuilder;
pub use reply_parser::GradeReplyParser;
pub use report_renderer::{Layout, ReportRenderer};

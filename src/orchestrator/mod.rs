//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Submission>，并发 + 汇总 + 输出)
//!     ↓
//! workflow::GradingFlow (处理单份 Submission)
//!     ↓
//! services (能力层：prompt / gateway / parse / render / pending)
//! ```
//!
//! 编排层只做调度和统计，不做具体业务判断。

pub mod batch_processor;

pub use batch_processor::{grade_all, App, GradeJob};

pub mod archive_loader;
pub mod rubric_loader;

pub use archive_loader::{load_submissions, load_submissions_from_bytes};
pub use rubric_loader::load_rubric;

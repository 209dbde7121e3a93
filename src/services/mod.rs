pub mod judge;
pub mod report_renderer;
pub mod result_store;
pub mod stats;

pub use judge::{Judge, JudgeInvoker, LlmJudge};
pub use report_renderer::render;
pub use result_store::{ExportFormat, Progress, ResultStore};
pub use stats::{summarize, summarize_at};

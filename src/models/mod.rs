pub mod grading;
pub mod loaders;
pub mod summary;
pub mod work_item;

pub use grading::{GradingResult, ResultRecord, ResultSet, Scores};
pub use loaders::{load_dataset, load_work_items, DatasetEntry};
pub use summary::{MetricStats, ScoreDistribution, Summary};
pub use work_item::WorkItem;

pub mod dataset_loader;

pub use dataset_loader::{load_dataset, load_work_items, read_text_lossy, DatasetEntry};

pub mod file_collector;
pub mod file_filter;

pub use file_collector::{Collection, FileCollector, FileEntry};
pub use file_filter::FileFilter;

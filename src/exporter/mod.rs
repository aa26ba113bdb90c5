pub mod block;
pub mod orchestrator;
pub mod part_writer;
pub mod report;
pub mod word_counter;

pub use block::{language_hint, FormattedBlock};
pub use orchestrator::ExportOrchestrator;
pub use part_writer::{part_file_path, PartWriter};
pub use report::{ExportProgress, ExportReport, PartSummary};
pub use word_counter::count_words;

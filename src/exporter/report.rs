use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub part_number: usize,
    pub part_word_count: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub unreadable_files: usize,
    pub warnings: Vec<String>,
}

impl ExportProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            part_number: 1,
            part_word_count: 0,
            current_file: None,
            start_time: Instant::now(),
            unreadable_files: 0,
            warnings: Vec::new(),
        }
    }

    pub fn update_file(&mut self, filename: String) {
        self.files_processed += 1;
        self.current_file = Some(filename);
    }

    pub fn add_warning<S: Into<String>>(&mut self, warning: S) {
        self.warnings.push(warning.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartSummary {
    pub number: usize,
    pub path: PathBuf,
    pub files: usize,
    pub words: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub generated_at: DateTime<Local>,
    pub word_limit: usize,
    pub files_processed: usize,
    pub unreadable_files: usize,
    pub skipped_own_outputs: usize,
    pub parts: Vec<PartSummary>,
    pub warnings: Vec<String>,
    pub duration: Duration,
}

impl ExportReport {
    pub fn total_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

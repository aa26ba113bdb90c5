use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::exporter::block::{language_hint, read_error_placeholder, FormattedBlock};
use crate::exporter::part_writer::{is_part_file, part_file_path, PartWriter};
use crate::exporter::report::{ExportProgress, ExportReport, PartSummary};
use crate::scanner::file_collector::sort_for_export;
use crate::scanner::{Collection, FileCollector, FileEntry, FileFilter};
use crate::ui::GracefulShutdown;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Drives an export: orders the files, renders each one and rotates to a new
/// part whenever the word budget would be exceeded.
pub struct ExportOrchestrator {
    config: ExportConfig,
    generated_at: DateTime<Local>,
}

impl ExportOrchestrator {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            generated_at: Local::now(),
        }
    }

    /// Pins the timestamp written into every part header.
    pub fn with_generated_at(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn collector(&self) -> FileCollector {
        FileCollector::new(FileFilter::new(
            &self.config.extensions,
            &self.config.exclude_dirs,
        ))
    }

    /// Collects files from the source directory and exports them.
    pub fn run(
        &self,
        shutdown: &GracefulShutdown,
        progress_callback: Option<&dyn Fn(&ExportProgress)>,
    ) -> Result<ExportReport> {
        let collection = self.collector().collect(&self.config.source_dir);
        self.export_collection(collection, shutdown, progress_callback)
    }

    /// Exports an already collected tree. Traversal warnings lead the report's
    /// warning list.
    pub fn export_collection(
        &self,
        collection: Collection,
        shutdown: &GracefulShutdown,
        progress_callback: Option<&dyn Fn(&ExportProgress)>,
    ) -> Result<ExportReport> {
        let mut warnings: Vec<String> = collection
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect();

        let mut report = self.export(collection.files, shutdown, progress_callback)?;
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        Ok(report)
    }

    /// Writes `files` into one or more parts and reports what was produced.
    pub fn export(
        &self,
        mut files: Vec<FileEntry>,
        shutdown: &GracefulShutdown,
        progress_callback: Option<&dyn Fn(&ExportProgress)>,
    ) -> Result<ExportReport> {
        shutdown.check_shutdown()?;

        let before = files.len();
        let own_output = comparable_path(&self.config.output_path);
        files.retain(|f| !is_part_file(&comparable_path(&f.path), &own_output));
        let skipped_own_outputs = before - files.len();

        sort_for_export(&mut files);

        let word_limit = self.config.word_limit;
        let generated_on = self.generated_at.format(TIMESTAMP_FORMAT).to_string();
        let mut progress = ExportProgress::new(files.len());
        let mut parts: Vec<PartSummary> = Vec::new();

        let mut part_number = 1;
        let mut writer = PartWriter::open(part_file_path(&self.config.output_path, part_number))?;
        let mut part_words = writer.write_header(
            &self.config.source_dir,
            part_number,
            &self.config.extensions,
            &generated_on,
        )?;
        let mut part_files = 0;

        for file in &files {
            shutdown.check_shutdown()?;

            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let content = match read_content(&file.path) {
                Ok(content) => content,
                Err(e) => {
                    progress.unreadable_files += 1;
                    progress.add_warning(
                        ExportError::FileRead {
                            path: file.display_path(),
                            message: e.to_string(),
                        }
                        .to_string(),
                    );
                    read_error_placeholder(&e.to_string())
                }
            };

            let block = FormattedBlock::new(
                &file.display_path(),
                language_hint(&file.extension),
                &content,
            );

            // A part's first file is always written, however large
            if word_limit > 0 && part_files > 0 && part_words + block.word_count() > word_limit {
                parts.push(PartSummary {
                    number: part_number,
                    path: writer.path().to_path_buf(),
                    files: part_files,
                    words: part_words,
                });
                writer.close_with_footer(part_number, false, part_number)?;

                part_number += 1;
                writer = PartWriter::open(part_file_path(&self.config.output_path, part_number))?;
                part_words = writer.write_header(
                    &self.config.source_dir,
                    part_number,
                    &self.config.extensions,
                    &generated_on,
                )?;
                part_files = 0;
                progress.part_number = part_number;
            }

            writer.write_block(&block)?;
            part_words += block.word_count();
            part_files += 1;
            progress.part_word_count = part_words;
            progress.update_file(file.file_name());
        }

        parts.push(PartSummary {
            number: part_number,
            path: writer.path().to_path_buf(),
            files: part_files,
            words: part_words,
        });
        writer.close_with_footer(part_number, true, part_number)?;

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok(ExportReport {
            source_dir: self.config.source_dir.clone(),
            output_path: self.config.output_path.clone(),
            generated_at: self.generated_at,
            word_limit,
            files_processed: progress.files_processed,
            unreadable_files: progress.unreadable_files,
            skipped_own_outputs,
            parts,
            warnings: progress.warnings.clone(),
            duration: progress.elapsed(),
        })
    }
}

/// Reads a file as text. Invalid UTF-8 is replaced rather than rejected and a
/// leading byte-order mark is dropped.
fn read_content(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

/// Canonical parent joined with the file name, so paths spelled differently
/// compare equal. Falls back to the path as given.
fn comparable_path(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return path.to_path_buf(),
    };

    match (parent.canonicalize(), path.file_name()) {
        (Ok(parent), Some(name)) => parent.join(name),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::word_counter::count_words;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn export_config(source: &Path, output: &Path, word_limit: usize) -> ExportConfig {
        ExportConfig {
            source_dir: source.to_path_buf(),
            output_path: output.to_path_buf(),
            word_limit,
            extensions: vec![".txt".to_string()],
            exclude_dirs: vec!["node_modules".to_string()],
        }
    }

    fn orchestrator(config: ExportConfig) -> ExportOrchestrator {
        let pinned = Local
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .unwrap();
        ExportOrchestrator::new(config).with_generated_at(pinned)
    }

    fn run(orchestrator: &ExportOrchestrator) -> ExportReport {
        orchestrator
            .run(&GracefulShutdown::new_for_test(), None)
            .unwrap()
    }

    /// Word count of a block for `name` holding `content`, as the exporter sees it.
    fn block_words(name: &str, content: &str) -> usize {
        FormattedBlock::new(name, "", content).word_count()
    }

    #[test]
    fn test_single_part_without_limit() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "one two three four five");
        write_file(&source.path().join("b/b.txt"), "six seven eight");

        let output = out.path().join("export.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 0)));

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.total_parts(), 1);

        let written = fs::read_to_string(&output).unwrap();
        let a = written.find("// FILE: a.txt").unwrap();
        let b = written.find("// FILE: b/b.txt").unwrap();
        assert!(a < b);
        assert!(written.contains("one two three four five"));
        assert!(written.ends_with("\n// End of part 1\n"));
        assert!(!written.contains("Total output files"));
        assert!(!out.path().join("export_part2.txt").exists());
    }

    #[test]
    fn test_files_ordered_by_extension_then_path() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("z.md"), "z");
        write_file(&source.path().join("a.txt"), "a");
        write_file(&source.path().join("m.rs"), "m");
        write_file(&source.path().join("B.MD"), "b");

        let mut config = export_config(source.path(), &out.path().join("o.txt"), 0);
        config.extensions = vec![".txt".to_string(), ".md".to_string(), ".rs".to_string()];
        run(&orchestrator(config));

        let written = fs::read_to_string(out.path().join("o.txt")).unwrap();
        let positions: Vec<usize> = ["B.MD", "z.md", "m.rs", "a.txt"]
            .iter()
            .map(|name| written.find(&format!("// FILE: {}", name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(written.contains("// FILE: m.rs [Rust]"));
    }

    #[test]
    fn test_limit_splits_into_parts() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let content = "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10 w11 w12";
        write_file(&source.path().join("a.txt"), content);
        write_file(&source.path().join("b.txt"), content);
        assert_eq!(block_words("a.txt", content), 15);

        let output = out.path().join("export.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 10)));

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.total_parts(), 2);
        assert_eq!(report.parts[0].files, 1);
        assert_eq!(report.parts[1].files, 1);

        let first = fs::read_to_string(&output).unwrap();
        let second = fs::read_to_string(out.path().join("export_part2.txt")).unwrap();

        assert!(first.contains("// FILE: a.txt"));
        assert!(!first.contains("// FILE: b.txt"));
        assert!(first.ends_with("\n// End of part 1\n"));
        assert!(!first.contains("// Part "));

        assert!(second.contains("// Part 2\n"));
        assert!(second.contains("// FILE: b.txt"));
        assert!(second.ends_with("\n// End of part 2\n// Total output files: 2\n"));
    }

    #[test]
    fn test_parts_respect_budget_except_first_block() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        for (i, words) in [3usize, 40, 5, 5, 5, 60, 2].iter().enumerate() {
            let content: Vec<String> = (0..*words).map(|w| format!("w{}", w)).collect();
            write_file(
                &source.path().join(format!("f{}.txt", i)),
                &content.join(" "),
            );
        }

        let output = out.path().join("export.txt");
        let limit = 50;
        let report = run(&orchestrator(export_config(source.path(), &output, limit)));

        assert_eq!(report.files_processed, 7);
        assert_eq!(report.parts.iter().map(|p| p.files).sum::<usize>(), 7);

        for part in &report.parts {
            let text = fs::read_to_string(&part.path).unwrap();
            let footer_start = text.rfind("\n// End of part").unwrap();
            let counted = count_words(&text[..footer_start]);
            assert_eq!(counted, part.words);
            if part.files > 1 {
                assert!(part.words <= limit, "part {} has {} words", part.number, part.words);
            }
        }
    }

    #[test]
    fn test_oversized_first_file_is_not_deferred() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let huge: Vec<String> = (0..100).map(|w| format!("w{}", w)).collect();
        write_file(&source.path().join("a.txt"), &huge.join(" "));
        write_file(&source.path().join("b.txt"), &huge.join(" "));

        let output = out.path().join("export.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 5)));

        assert_eq!(report.total_parts(), 2);
        let first = fs::read_to_string(&output).unwrap();
        assert!(first.contains("// FILE: a.txt"));
        assert!(!out.path().join("export_part3.txt").exists());
    }

    #[test]
    fn test_unlimited_export_is_single_part_regardless_of_size() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let big = "word ".repeat(5000);
        for name in ["a.txt", "b.txt", "c.txt"] {
            write_file(&source.path().join(name), &big);
        }

        let report = run(&orchestrator(export_config(
            source.path(),
            &out.path().join("o.txt"),
            0,
        )));
        assert_eq!(report.total_parts(), 1);
        assert_eq!(report.parts[0].files, 3);
    }

    #[test]
    fn test_excluded_directory_contributes_nothing() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("node_modules/x.txt"), "dependency");
        write_file(&source.path().join("x.txt"), "root");

        let output = out.path().join("o.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 0)));

        assert_eq!(report.files_processed, 1);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("// FILE: x.txt"));
        assert!(!written.contains("node_modules"));
        assert!(!written.contains("dependency"));
    }

    #[test]
    fn test_empty_tree_still_produces_one_part() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let output = out.path().join("o.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 10)));

        assert_eq!(report.files_processed, 0);
        assert_eq!(report.total_parts(), 1);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("// Code Export from "));
        assert!(written.ends_with("\n// End of part 1\n"));
    }

    #[test]
    fn test_repeated_runs_are_byte_identical() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "alpha beta");
        write_file(&source.path().join("sub/b.txt"), "gamma");
        write_file(&source.path().join("sub/deeper/c.txt"), "delta epsilon zeta");

        let output = out.path().join("o.txt");
        let exporter = orchestrator(export_config(source.path(), &output, 20));

        run(&exporter);
        let first = fs::read(&output).unwrap();
        run(&exporter);
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_output_inside_source_is_not_reingested() {
        let source = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "alpha");
        write_file(&source.path().join("export_part2.txt"), "stale part");

        let output = source.path().join("export.txt");
        let exporter = orchestrator(export_config(source.path(), &output, 0));

        run(&exporter);
        let report = run(&exporter);

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.skipped_own_outputs, 2);
        let written = fs::read_to_string(&output).unwrap();
        assert!(!written.contains("// FILE: export.txt"));
        assert!(!written.contains("stale part"));
    }

    #[test]
    fn test_invalid_utf8_is_exported_lossily() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(source.path().join("bin.txt"), [0xEF, 0xBB, 0xBF, b'o', b'k', 0xFF]).unwrap();

        let output = out.path().join("o.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 0)));

        assert_eq!(report.unreadable_files, 0);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("\n\nok\u{fffd}\n\n\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_gets_placeholder() {
        use std::os::unix::fs::PermissionsExt;

        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let locked = source.path().join("locked.txt");
        write_file(&locked, "secret");
        write_file(&source.path().join("open.txt"), "visible");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the file anyway
        let readable_anyway = fs::read(&locked).is_ok();

        let output = out.path().join("o.txt");
        let report = run(&orchestrator(export_config(source.path(), &output, 0)));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(report.files_processed, 2);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("// FILE: locked.txt"));
        if !readable_anyway {
            assert_eq!(report.unreadable_files, 1);
            assert!(written.contains("// ERROR reading file: "));
            assert!(!written.contains("secret"));
        }
    }

    #[test]
    fn test_cancellation_stops_before_writing() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "alpha");

        let shutdown = GracefulShutdown::new_for_test();
        shutdown.request_shutdown();

        let output = out.path().join("o.txt");
        let result = orchestrator(export_config(source.path(), &output, 0)).run(&shutdown, None);

        assert!(matches!(result, Err(ExportError::Cancelled)));
        assert!(!output.exists());
    }

    #[test]
    fn test_output_open_failure_is_fatal() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "alpha");
        let blocker = out.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();

        let result = orchestrator(export_config(source.path(), &blocker.join("o.txt"), 0))
            .run(&GracefulShutdown::new_for_test(), None);

        assert!(matches!(result, Err(ExportError::OutputOpen { .. })));
    }

    #[test]
    fn test_rotation_open_failure_is_fatal_after_closing_previous_part() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let content = "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10 w11 w12";
        write_file(&source.path().join("a.txt"), content);
        write_file(&source.path().join("b.txt"), content);

        let output = out.path().join("export.txt");
        fs::create_dir(out.path().join("export_part2.txt")).unwrap();

        let result = orchestrator(export_config(source.path(), &output, 10))
            .run(&GracefulShutdown::new_for_test(), None);

        match result {
            Err(ExportError::OutputOpen { path, .. }) => {
                assert_eq!(path, out.path().join("export_part2.txt"));
            }
            other => panic!("expected OutputOpen, got {:?}", other.map(|r| r.files_processed)),
        }

        let first = fs::read_to_string(&output).unwrap();
        assert!(first.contains("// FILE: a.txt"));
        assert!(!first.contains("// FILE: b.txt"));
        assert!(first.ends_with("\n// End of part 1\n"));
    }

    #[test]
    fn test_progress_callback_sees_every_file() {
        use std::cell::RefCell;

        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "a");
        write_file(&source.path().join("b.txt"), "b");

        let seen = RefCell::new(Vec::new());
        let callback = |p: &ExportProgress| seen.borrow_mut().push(p.files_processed);

        orchestrator(export_config(source.path(), &out.path().join("o.txt"), 0))
            .run(&GracefulShutdown::new_for_test(), Some(&callback))
            .unwrap();

        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_traversal_warnings_lead_the_report() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&source.path().join("a.txt"), "a");

        let orchestrator = orchestrator(export_config(source.path(), &out.path().join("o.txt"), 0));
        let mut collection = orchestrator.collector().collect(source.path());
        collection.warnings.push(ExportError::DirectoryAccess {
            path: "locked".to_string(),
            message: "Permission denied".to_string(),
        });

        let report = orchestrator
            .export_collection(collection, &GracefulShutdown::new_for_test(), None)
            .unwrap();

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("locked"));
    }
}

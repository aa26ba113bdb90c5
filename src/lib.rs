pub mod cli;
pub mod config;
pub mod error;
pub mod exporter;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ExportConfig, FilterConfig, OutputConfig};
pub use error::{ExportError, Result, UserFriendlyError};

// Core functionality re-exports
pub use exporter::{
    count_words, ExportOrchestrator, ExportProgress, ExportReport, FormattedBlock, PartSummary,
};
pub use scanner::{Collection, FileCollector, FileEntry, FileFilter};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::{Path, PathBuf};

/// Main library interface for CodeExport functionality
pub struct CodeExport {
    config: ExportConfig,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl CodeExport {
    /// Create a new instance for a resolved run configuration
    pub fn new(config: ExportConfig, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create an instance for testing (no signal handler conflicts)
    #[cfg(test)]
    pub fn new_for_test(config: ExportConfig, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    /// Create an instance from CLI arguments, prompting for missing settings
    /// when attended
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let mut config = cli_args.load_config()?;
        let source_dir = cli_args.resolve_source_dir(&mut config)?;
        let export_config = ExportConfig::new(&config, &source_dir, cli_args.output.as_deref())?;

        Self::new(
            export_config,
            OutputMode::from(&cli_args.output_format),
            cli_args.verbosity_level(),
            cli_args.quiet,
        )
    }

    /// Export the configured source tree
    pub fn run_export(&self) -> Result<ExportReport> {
        self.shutdown.check_shutdown()?;

        self.output_formatter.start_operation("Starting code export");
        self.output_formatter.print_configuration(&self.config);

        let orchestrator = ExportOrchestrator::new(self.config.clone());
        let collection = self.collect_files(&orchestrator);
        self.shutdown.check_shutdown()?;

        self.output_formatter
            .info(&format!("Found {} files to export", collection.files.len()));

        let file_progress = self
            .progress_manager
            .create_file_progress(collection.files.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |progress: &ExportProgress| {
                ui::progress::update_export_progress(&pb, progress);
            }
        };

        let result = orchestrator.export_collection(collection, &self.shutdown, Some(&progress_callback));

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Exported {} files", report.files_processed),
            report.duration,
        );

        for part in &report.parts {
            self.output_formatter.debug(&format!(
                "Part {}: {} ({} files, {} words)",
                part.number,
                part.path.display(),
                part.files,
                part.words
            ));
        }
        self.output_formatter.print_warnings(&report.warnings);

        Ok(report)
    }

    /// Collect the files an export would write, without writing anything
    pub fn plan_export(&self) -> Collection {
        let orchestrator = ExportOrchestrator::new(self.config.clone());
        let mut collection = self.collect_files(&orchestrator);
        scanner::file_collector::sort_for_export(&mut collection.files);
        collection
    }

    fn collect_files(&self, orchestrator: &ExportOrchestrator) -> Collection {
        let spinner = self.progress_manager.create_spinner("Scanning source directory");
        let collection = orchestrator.collector().collect(&self.config.source_dir);
        spinner.finish_and_clear();
        collection
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let output_path = output_path.as_ref();
        if output_path.exists() {
            return Err(ExportError::Config {
                message: format!("{} already exists", output_path.display()),
            });
        }

        let sample_config = Config::create_sample_config();
        std::fs::write(output_path, sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Path of the first output file
    pub fn output_path(&self) -> PathBuf {
        exporter::part_file_path(&self.config.output_path, 1)
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Check if shutdown has been requested
    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Request graceful shutdown
    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ExportError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Process exit code for a failed run
pub fn exit_code_for(error: &ExportError) -> i32 {
    match error {
        ExportError::Cancelled => 130,
        ExportError::Config { .. } => 3,
        ExportError::SourceNotFound { .. } => 4,
        ExportError::OutputOpen { .. } | ExportError::Write { .. } => 5,
        _ => 1,
    }
}

/// Process exit code for a finished run
pub fn exit_code_for_report(report: &ExportReport) -> i32 {
    if report.has_warnings() {
        2
    } else {
        0
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CodeExport {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}

use crate::config::{CliOverrides, Config};
use crate::error::{ExportError, Result};
use crate::ui::prompt::{self, PromptAnswers, PromptRequest, Prompter};
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "codeexport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concatenate a source tree into word-limited text exports")]
#[command(
    long_about = "CodeExport walks a source directory, keeps the files whose extension is \
                  accepted and writes them into one annotated text file, split into parts \
                  when a word limit is set."
)]
#[command(after_help = "EXAMPLES:\n  \
    codeexport ./my-project\n  \
    codeexport ./my-project --word-limit 50000 --output export.txt\n  \
    codeexport ./my-project --extensions rs,toml,md --exclude target,.git\n  \
    codeexport ./my-project --config codeexport.toml --dry-run\n\n\
    Run without SOURCE_DIR in a terminal to be prompted for the settings.")]
pub struct Cli {
    /// Directory to export (prompted for when omitted)
    pub source_dir: Option<PathBuf>,

    /// Output file path (defaults to <dir>_code_export_<timestamp>.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory receiving the default-named output file
    #[arg(long, conflicts_with = "output")]
    pub output_dir: Option<PathBuf>,

    /// Maximum words per output file, 0 for no limit
    #[arg(short, long)]
    pub word_limit: Option<usize>,

    /// File extensions to include (comma or semicolon separated)
    #[arg(short, long, help = "File extensions to include (e.g., rs,toml,md)")]
    pub extensions: Option<String>,

    /// Directory names to skip at any depth (comma or semicolon separated)
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// List the files that would be exported without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<&OutputFormat> for OutputMode {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_extensions(self.extensions.clone())
            .with_exclude(self.exclude.clone())
            .with_word_limit(self.word_limit)
            .with_output_dir(self.output_dir.clone())
    }

    /// What to ask for when no source directory was given. Settings passed as
    /// flags are never asked again.
    pub fn prompt_request(&self) -> Option<PromptRequest> {
        if self.source_dir.is_some() {
            return None;
        }

        Some(PromptRequest {
            source_dir: true,
            word_limit: self.word_limit.is_none(),
            extensions: self.extensions.is_none(),
            exclude: self.exclude.is_none(),
        })
    }

    /// Returns the source directory, prompting on an attended terminal when it
    /// was omitted. Prompt answers are merged into `config`.
    pub fn resolve_source_dir(&self, config: &mut Config) -> Result<PathBuf> {
        let request = match self.prompt_request() {
            None => return Ok(self.source_dir.clone().unwrap_or_default()),
            Some(request) => request,
        };

        if !prompt::is_interactive() {
            return Err(ExportError::Config {
                message: "No source directory given and no terminal to prompt on".to_string(),
            });
        }

        let answers = Prompter::new().ask(request)?;
        apply_answers(config, answers)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Where `--generate-config` writes.
    pub fn generated_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("codeexport.toml"))
    }
}

/// Merges interactive answers over `config` and returns the chosen source
/// directory.
pub fn apply_answers(config: &mut Config, answers: PromptAnswers) -> Result<PathBuf> {
    let source_dir = answers.source_dir.ok_or_else(|| ExportError::Config {
        message: "No source directory given".to_string(),
    })?;

    let overrides = CliOverrides::new()
        .with_extensions(answers.extensions)
        .with_exclude(answers.exclude)
        .with_word_limit(answers.word_limit);
    config.merge_with_cli_args(&overrides);
    config.validate()?;

    Ok(source_dir)
}

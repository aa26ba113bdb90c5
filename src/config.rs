use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    // C-family languages
    ".c", ".cpp", ".h", ".hpp", ".cs",
    // Web technologies
    ".html", ".css", ".js", ".ts", ".jsx", ".tsx",
    // Python
    ".py", ".pyw", ".ipynb",
    // JVM
    ".java", ".kt", ".groovy",
    // Other languages
    ".go", ".rb", ".php", ".swift", ".rs", ".lua",
    // Markup and config
    ".xml", ".xaml", ".json", ".yaml", ".yml", ".toml",
    // Shell scripts
    ".sh", ".bash", ".ps1", ".bat", ".cmd",
    // Documentation
    ".md", ".rst", ".txt",
];

pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "bin",
    "obj",
    "node_modules",
    "packages",
    ".vs",
    ".git",
    "__pycache__",
    "venv",
    "env",
    "dist",
    "build",
];

const DEFAULT_CONFIG_FILES: &[&str] = &["codeexport.toml", ".codeexport.toml"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub filters: FilterConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory receiving the generated file when no explicit output path is given.
    pub directory: PathBuf,
    /// Maximum words per part, 0 disables splitting.
    pub word_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filters: FilterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            word_limit: 0,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExportError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ExportError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ExportError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        config.filters.extensions = normalize_extensions(&config.filters.extensions);
        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                for default_path in DEFAULT_CONFIG_FILES {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref extensions) = cli_args.extensions {
            self.filters.extensions = normalize_extensions(&parse_list(extensions));
        }

        if let Some(ref exclude) = cli_args.exclude {
            self.filters.exclude_dirs = parse_list(exclude);
        }

        if let Some(word_limit) = cli_args.word_limit {
            self.output.word_limit = word_limit;
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = output_dir.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ExportError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| ExportError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.extensions.is_empty() {
            return Err(ExportError::Config {
                message: "At least one file extension must be specified".to_string(),
            });
        }

        if let Some(bad) = self.filters.extensions.iter().find(|e| e.len() < 2) {
            return Err(ExportError::Config {
                message: format!("Invalid file extension: '{}'", bad),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.output.directory = PathBuf::from(".");
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub extensions: Option<String>,
    pub exclude: Option<String>,
    pub word_limit: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(mut self, extensions: Option<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_word_limit(mut self, word_limit: Option<usize>) -> Self {
        self.word_limit = word_limit;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }
}

/// Splits a user supplied list on `,` or `;`, trimming entries and dropping empties.
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split([',', ';'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercases extensions and guarantees the leading dot. First occurrence wins.
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());

    for ext in extensions {
        let ext = ext.as_ref().trim().to_lowercase();
        if ext.is_empty() {
            continue;
        }
        let ext = if ext.starts_with('.') {
            ext
        } else {
            format!(".{}", ext)
        };
        if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }

    normalized
}

/// Resolved, validated settings for a single export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportConfig {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub word_limit: usize,
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
}

impl ExportConfig {
    /// Builds the run configuration. The source directory must exist; when
    /// `output_path` is `None` a timestamped file name is synthesized in the
    /// configured output directory. The output's parent directory is created.
    pub fn new(config: &Config, source_dir: &Path, output_path: Option<&Path>) -> Result<Self> {
        config.validate()?;

        if !source_dir.is_dir() {
            return Err(ExportError::SourceNotFound {
                path: source_dir.display().to_string(),
            });
        }

        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => config
                .output
                .directory
                .join(default_output_file_name(source_dir)),
        };

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ExportError::OutputOpen {
                    path: output_path.clone(),
                    source: e,
                })?;
            }
        }

        Ok(Self {
            source_dir: source_dir.to_path_buf(),
            output_path,
            word_limit: config.output.word_limit,
            extensions: normalize_extensions(&config.filters.extensions),
            exclude_dirs: config.filters.exclude_dirs.clone(),
        })
    }
}

fn default_output_file_name(source_dir: &Path) -> String {
    let dir_name = source_dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(|p| p.file_name())
        .or_else(|| source_dir.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "source".to_string());

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_code_export_{}.txt", dir_name, timestamp)
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Source directory not found: {path}")]
    SourceNotFound { path: String },

    #[error("Cannot open output file {}: {source}", path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed writing to output file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not access directory {path}: {message}")]
    DirectoryAccess { path: String, message: String },

    #[error("Could not read file {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ExportError {
    fn user_message(&self) -> String {
        match self {
            ExportError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ExportError::SourceNotFound { path } => {
                format!("Directory not found: {}", path)
            }
            ExportError::OutputOpen { path, source } => {
                format!("Cannot create output file {}: {}", path.display(), source)
            }
            ExportError::Write { path, source } => {
                format!("Writing {} failed: {}", path.display(), source)
            }
            ExportError::DirectoryAccess { path, message } => {
                format!("Could not access {}: {}", path, message)
            }
            ExportError::FileRead { path, message } => {
                format!("Could not read {}: {}", path, message)
            }
            ExportError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ExportError::Config { .. } => Some(
                "Check your configuration file syntax and the values passed on the command line.".to_string()
            ),
            ExportError::SourceNotFound { .. } => Some(
                "Pass an existing directory as the first argument, or run without arguments to be prompted.".to_string()
            ),
            ExportError::OutputOpen { .. } | ExportError::Write { .. } => Some(
                "Ensure the output location is writable, or choose another path with --output.".to_string()
            ),
            ExportError::DirectoryAccess { .. } => Some(
                "Run with sufficient permissions or add the directory to the exclude list with --exclude.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(error: toml::de::Error) -> Self {
        ExportError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

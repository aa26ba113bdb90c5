use crate::config::normalize_extensions;
use std::path::Path;

/// Extension and directory-name rules applied during collection.
///
/// Both comparisons are case-insensitive. Extensions are stored with their
/// leading dot; directory exclusion is by exact base-name equality, never by
/// path prefix or pattern.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl FileFilter {
    pub fn new<S: AsRef<str>, T: AsRef<str>>(extensions: &[S], exclude_dirs: &[T]) -> Self {
        Self {
            extensions: normalize_extensions(extensions),
            exclude_dirs: exclude_dirs
                .iter()
                .map(|d| d.as_ref().trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn is_accepted_file(&self, path: &Path) -> bool {
        match dotted_extension(path) {
            Some(ext) => self.extensions.contains(&ext),
            None => false,
        }
    }

    pub fn should_traverse_directory(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => {
                let name = name.to_string_lossy().to_lowercase();
                !self.exclude_dirs.iter().any(|exclude| *exclude == name)
            }
            None => true,
        }
    }
}

/// Lowercased extension of `path` including the leading dot, e.g. `.rs`.
/// A dotfile with no further dot, such as `.env`, is its own extension.
pub fn dotted_extension(path: &Path) -> Option<String> {
    if let Some(ext) = path.extension() {
        return Some(format!(".{}", ext.to_string_lossy().to_lowercase()));
    }

    let name = path.file_name()?.to_string_lossy();
    if name.len() > 1 && name.starts_with('.') {
        Some(name.to_lowercase())
    } else {
        None
    }
}

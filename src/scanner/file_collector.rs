use crate::error::ExportError;
use crate::scanner::file_filter::{dotted_extension, FileFilter};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    /// Lowercased, dot-prefixed extension; empty when the file has none.
    pub extension: String,
}

impl FileEntry {
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let relative_path = relative_display_path(&path, root);
        let extension = dotted_extension(&path).unwrap_or_default();

        Self {
            path,
            relative_path,
            extension,
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.to_string_lossy().replace('\\', "/")
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Export order: extension first, then the full path compared as a string.
    pub fn export_order(&self, other: &Self) -> Ordering {
        self.extension
            .cmp(&other.extension)
            .then_with(|| self.path.to_string_lossy().cmp(&other.path.to_string_lossy()))
    }
}

/// Result of a best-effort collection: matched files plus the failures that
/// were skipped over.
#[derive(Debug, Default)]
pub struct Collection {
    pub files: Vec<FileEntry>,
    pub warnings: Vec<ExportError>,
}

pub struct FileCollector {
    filter: FileFilter,
}

impl FileCollector {
    pub fn new(filter: FileFilter) -> Self {
        Self { filter }
    }

    /// Walks `root` and returns every accepted file beneath it, unordered.
    ///
    /// Symbolic links are followed. A directory that cannot be read, or a link
    /// that loops back to an ancestor, is recorded as a warning and contributes
    /// nothing; its siblings are still visited.
    pub fn collect<P: AsRef<Path>>(&self, root: P) -> Collection {
        let root_path = root.as_ref();
        let mut collection = Collection::default();

        let walker = WalkDir::new(root_path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| self.should_traverse(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root_path.display().to_string());
                    let message = err
                        .io_error()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| err.to_string());
                    collection
                        .warnings
                        .push(ExportError::DirectoryAccess { path, message });
                    continue;
                }
            };

            if entry.file_type().is_file() && self.filter.is_accepted_file(entry.path()) {
                collection
                    .files
                    .push(FileEntry::new(entry.path().to_path_buf(), root_path));
            }
        }

        collection
    }

    fn should_traverse(&self, entry: &DirEntry) -> bool {
        // The root itself is never subject to exclusion
        if entry.depth() == 0 {
            return true;
        }

        if entry.file_type().is_dir() {
            return self.filter.should_traverse_directory(entry.path());
        }

        true
    }
}


/// `path` with the `root` prefix and any leading separators removed.
pub fn relative_display_path(path: &Path, root: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            let full = path.to_string_lossy();
            let prefix = root.to_string_lossy();
            let trimmed = full
                .strip_prefix(prefix.as_ref())
                .unwrap_or(&full)
                .trim_start_matches(['/', '\\']);
            PathBuf::from(trimmed)
        }
    }
}

/// Sorts entries into export order.
pub fn sort_for_export(files: &mut [FileEntry]) {
    files.sort_by(|a, b| a.export_order(b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn collector(extensions: &[&str], exclude: &[&str]) -> FileCollector {
        FileCollector::new(FileFilter::new(extensions, exclude))
    }

    fn relative_names(collection: &Collection) -> Vec<String> {
        let mut names: Vec<String> = collection.files.iter().map(|f| f.display_path()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_collects_matching_files_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_file(&root.join("a.txt"), "alpha");
        write_file(&root.join("b/b.txt"), "beta");
        write_file(&root.join("b/c/deep.TXT"), "deep");
        write_file(&root.join("b/skip.rs"), "fn main() {}");

        let collection = collector(&[".txt"], &[]).collect(root);

        assert!(collection.warnings.is_empty());
        assert_eq!(
            relative_names(&collection),
            vec!["a.txt", "b/b.txt", "b/c/deep.TXT"]
        );
    }

    #[test]
    fn test_excluded_directories_are_pruned_at_any_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_file(&root.join("x.txt"), "keep");
        write_file(&root.join("node_modules/x.txt"), "drop");
        write_file(&root.join("pkg/Node_Modules/lib/y.txt"), "drop");
        write_file(&root.join("pkg/src/z.txt"), "keep");

        let collection = collector(&[".txt"], &["node_modules"]).collect(root);

        assert_eq!(relative_names(&collection), vec!["pkg/src/z.txt", "x.txt"]);
    }

    #[test]
    fn test_root_is_never_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("build");
        write_file(&root.join("main.txt"), "content");

        let collection = collector(&[".txt"], &["build"]).collect(&root);

        assert_eq!(relative_names(&collection), vec!["main.txt"]);
    }

    #[test]
    fn test_missing_root_reports_warning() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let collection = collector(&[".txt"], &[]).collect(&missing);

        assert!(collection.files.is_empty());
        assert_eq!(collection.warnings.len(), 1);
        assert!(matches!(
            collection.warnings[0],
            ExportError::DirectoryAccess { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_does_not_stop_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_file(&root.join("locked/secret.txt"), "hidden");
        write_file(&root.join("open/visible.txt"), "shown");

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the directory anyway; nothing to assert then
        let readable_anyway = fs::read_dir(&locked).is_ok();

        let collection = collector(&[".txt"], &[]).collect(root);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(relative_names(&collection).contains(&"open/visible.txt".to_string()));
        if !readable_anyway {
            assert_eq!(relative_names(&collection), vec!["open/visible.txt"]);
            assert_eq!(collection.warnings.len(), 1);
        }
    }

    #[test]
    fn test_dotfiles_are_matched_by_their_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_file(&root.join(".env"), "KEY=value");
        write_file(&root.join("a.env"), "OTHER=value");
        write_file(&root.join(".envrc"), "use nix");

        let collection = collector(&[".env"], &[]).collect(root);

        assert_eq!(relative_names(&collection), vec![".env", "a.env"]);
        assert!(collection.files.iter().all(|f| f.extension == ".env"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_followed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let shared = temp_dir.path().join("shared");

        write_file(&root.join("main.txt"), "main");
        write_file(&shared.join("lib.txt"), "lib");
        symlink(&shared, root.join("linked")).unwrap();

        let collection = collector(&[".txt"], &[]).collect(&root);

        assert!(collection.warnings.is_empty());
        assert_eq!(relative_names(&collection), vec!["linked/lib.txt", "main.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_reported_not_followed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_file(&root.join("sub/a.txt"), "a");
        symlink(root, root.join("sub/back")).unwrap();

        let collection = collector(&[".txt"], &[]).collect(root);

        assert_eq!(relative_names(&collection), vec!["sub/a.txt"]);
        assert_eq!(collection.warnings.len(), 1);
        assert!(matches!(
            collection.warnings[0],
            ExportError::DirectoryAccess { .. }
        ));
    }

    #[test]
    fn test_export_order_groups_by_extension_then_path() {
        let root = Path::new("/src");
        let mut files = vec![
            FileEntry::new(PathBuf::from("/src/z.md"), root),
            FileEntry::new(PathBuf::from("/src/b/b.txt"), root),
            FileEntry::new(PathBuf::from("/src/a.txt"), root),
            FileEntry::new(PathBuf::from("/src/A.MD"), root),
            FileEntry::new(PathBuf::from("/src/lib.rs"), root),
        ];

        sort_for_export(&mut files);

        let order: Vec<String> = files.iter().map(|f| f.display_path()).collect();
        assert_eq!(order, vec!["A.MD", "z.md", "lib.rs", "a.txt", "b/b.txt"]);
    }

    #[test]
    fn test_relative_display_path_strips_root() {
        assert_eq!(
            relative_display_path(Path::new("/src/b/b.txt"), Path::new("/src")),
            PathBuf::from("b/b.txt")
        );
        assert_eq!(
            relative_display_path(Path::new("/src/a.txt"), Path::new("/src/")),
            PathBuf::from("a.txt")
        );
    }
}

use crate::exporter::word_counter::count_words;

pub const SEPARATOR_WIDTH: usize = 80;

/// One file's rendered section of an export: banner, raw content and the
/// trailing blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedBlock {
    text: String,
    word_count: usize,
}

impl FormattedBlock {
    pub fn new(relative_path: &str, language_hint: &str, content: &str) -> Self {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        // The space before the hint is kept even when the hint is empty
        let title = format!("// FILE: {} {}", relative_path, language_hint);

        let text = format!("{separator}\n{title}\n{separator}\n\n{content}\n\n\n");
        let word_count = count_words(&text);

        Self { text, word_count }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

/// Placeholder written in place of content that could not be read.
pub fn read_error_placeholder(message: &str) -> String {
    format!("// ERROR reading file: {}", message)
}

/// Cosmetic label for a dot-prefixed, lowercased extension. Unknown
/// extensions map to the empty string.
pub fn language_hint(extension: &str) -> &'static str {
    match extension {
        ".cs" => "[C#]",
        ".c" => "[C]",
        ".cpp" | ".hpp" | ".h" => "[C++]",
        ".js" => "[JavaScript]",
        ".ts" => "[TypeScript]",
        ".jsx" => "[JSX]",
        ".tsx" => "[TSX]",
        ".py" | ".pyw" => "[Python]",
        ".java" => "[Java]",
        ".kt" => "[Kotlin]",
        ".html" => "[HTML]",
        ".css" => "[CSS]",
        ".xml" | ".xaml" => "[XML]",
        ".json" => "[JSON]",
        ".md" => "[Markdown]",
        ".yml" | ".yaml" => "[YAML]",
        ".rb" => "[Ruby]",
        ".php" => "[PHP]",
        ".go" => "[Go]",
        ".rs" => "[Rust]",
        ".swift" => "[Swift]",
        ".sh" | ".bash" => "[Shell]",
        ".ps1" => "[PowerShell]",
        ".bat" | ".cmd" => "[Batch]",
        ".sql" => "[SQL]",
        ".lua" => "[Lua]",
        ".r" => "[R]",
        ".pl" => "[Perl]",
        _ => "",
    }
}

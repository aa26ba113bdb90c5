use crate::error::{ExportError, Result};
use console::Term;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Answers collected interactively. `None` keeps the configured value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PromptAnswers {
    pub source_dir: Option<PathBuf>,
    pub word_limit: Option<usize>,
    pub extensions: Option<String>,
    pub exclude: Option<String>,
}

/// Which values still have to be asked for.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptRequest {
    pub source_dir: bool,
    pub word_limit: bool,
    pub extensions: bool,
    pub exclude: bool,
}

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && Term::stderr().is_term()
}

pub struct Prompter {
    term: Term,
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    pub fn ask(&self, request: PromptRequest) -> Result<PromptAnswers> {
        let mut answers = PromptAnswers::default();

        if request.source_dir {
            let input = self.read("Enter the path to your source code directory: ")?;
            let path = parse_source_dir(&input).ok_or_else(|| ExportError::Config {
                message: "No source directory given".to_string(),
            })?;
            answers.source_dir = Some(path);
        }

        if request.word_limit {
            loop {
                let input = self.read("Enter word limit per file (leave blank for no limit): ")?;
                match parse_word_limit(&input) {
                    Ok(limit) => {
                        answers.word_limit = limit;
                        break;
                    }
                    Err(message) => self.term.write_line(&message)?,
                }
            }
        }

        if request.extensions {
            let input = self.read(
                "Enter file extensions to include (comma-separated, leave blank for defaults): ",
            )?;
            answers.extensions = non_blank(&input);
        }

        if request.exclude {
            let input = self.read(
                "Enter directories to exclude (comma-separated, leave blank for defaults): ",
            )?;
            answers.exclude = non_blank(&input);
        }

        Ok(answers)
    }

    fn read(&self, prompt: &str) -> Result<String> {
        self.term.write_str(prompt)?;
        Ok(self.term.read_line()?)
    }
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Trims whitespace and the quotes a shell drag-and-drop leaves around paths.
pub fn parse_source_dir(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Blank means "no answer". Anything else must be a non-negative integer.
pub fn parse_word_limit(input: &str) -> std::result::Result<Option<usize>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<usize>()
        .map(Some)
        .map_err(|_| format!("'{}' is not a valid word limit", trimmed))
}

fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

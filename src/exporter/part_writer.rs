use crate::error::{ExportError, Result};
use crate::exporter::block::FormattedBlock;
use crate::exporter::word_counter::count_words;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 64 * 1024;

/// The single open output part of an export.
///
/// The destination is released exactly once: either by
/// [`close_with_footer`](Self::close_with_footer) or, on any early exit, when
/// the writer is dropped.
pub struct PartWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl PartWriter {
    /// Creates or truncates the destination at `path`, creating its parent
    /// directory first when needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ExportError::OutputOpen {
                    path: path.clone(),
                    source: e,
                })?;
            }
        }

        let file = File::create(&path).map_err(|e| ExportError::OutputOpen {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::with_capacity(BUFFER_SIZE, file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the part banner and returns its word count.
    pub fn write_header(
        &mut self,
        source_dir: &Path,
        part_number: usize,
        extensions: &[String],
        generated_on: &str,
    ) -> Result<usize> {
        let header = format_header(source_dir, part_number, extensions, generated_on);
        self.write_str(&header)?;
        Ok(count_words(&header))
    }

    pub fn write_block(&mut self, block: &FormattedBlock) -> Result<()> {
        self.write_str(block.text())
    }

    /// Writes the closing banner, then flushes and releases the destination.
    pub fn close_with_footer(
        mut self,
        part_number: usize,
        is_final: bool,
        total_parts: usize,
    ) -> Result<()> {
        let footer = format_footer(part_number, is_final, total_parts);
        self.write_str(&footer)?;

        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| ExportError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| ExportError::Write {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "part already closed"),
        })?;

        writer
            .write_all(text.as_bytes())
            .map_err(|e| ExportError::Write {
                path: self.path.clone(),
                source: e,
            })
    }
}

impl Drop for PartWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

pub fn format_header(
    source_dir: &Path,
    part_number: usize,
    extensions: &[String],
    generated_on: &str,
) -> String {
    let mut header = String::new();
    header.push_str(&format!("// Code Export from {}\n", source_dir.display()));
    header.push_str(&format!("// Generated on {}\n", generated_on));
    header.push_str(&format!("// File types included: {}\n", extensions.join(", ")));

    if part_number > 1 {
        header.push_str(&format!("// Part {}\n", part_number));
    }

    header.push('\n');
    header
}

pub fn format_footer(part_number: usize, is_final: bool, total_parts: usize) -> String {
    let mut footer = format!("\n// End of part {}\n", part_number);
    if is_final && total_parts > 1 {
        footer.push_str(&format!("// Total output files: {}\n", total_parts));
    }
    footer
}

/// Path of part `part_number`: the requested path for part 1, otherwise
/// `<stem>_part<N><.ext>` in the same directory.
pub fn part_file_path(output_path: &Path, part_number: usize) -> PathBuf {
    if part_number <= 1 {
        return output_path.to_path_buf();
    }

    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match output_path.extension() {
        Some(ext) => format!("{}_part{}.{}", stem, part_number, ext.to_string_lossy()),
        None => format!("{}_part{}", stem, part_number),
    };

    output_path.with_file_name(file_name)
}

/// Whether `candidate` is one of the part files an export to `output_path`
/// would produce.
pub fn is_part_file(candidate: &Path, output_path: &Path) -> bool {
    if candidate.parent() != output_path.parent() {
        return false;
    }
    if candidate.file_name() == output_path.file_name() {
        return true;
    }

    let (Some(candidate_stem), Some(output_stem)) = (candidate.file_stem(), output_path.file_stem())
    else {
        return false;
    };
    if candidate.extension() != output_path.extension() {
        return false;
    }

    let candidate_stem = candidate_stem.to_string_lossy();
    let prefix = format!("{}_part", output_stem.to_string_lossy());
    match candidate_stem.strip_prefix(&prefix) {
        Some(number) => !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::ops::diff::{Edit, LineStore, apply_edits};

/// Error type for document I/O
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
}

/// A document on disk held as lines.
///
/// Line endings are stripped on read and restored on write, along with
/// whether the file ended in a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub path: PathBuf,
    pub lines: Vec<String>,
    pub trailing_newline: bool,
    pub crlf: bool,
}

impl TextFile {
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        TextFile {
            path: path.into(),
            lines: text.lines().map(|l| l.to_string()).collect(),
            trailing_newline: text.ends_with('\n'),
            crlf: text.contains("\r\n"),
        }
    }

    pub fn to_text(&self) -> String {
        let eol = if self.crlf { "\r\n" } else { "\n" };
        let mut text = self.lines.join(eol);
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(eol);
        }
        text
    }
}

impl LineStore for TextFile {
    fn len(&self) -> usize {
        self.lines.len()
    }

    fn insert_lines(&mut self, before: usize, lines: &[String]) {
        self.lines.insert_lines(before, lines);
    }

    fn delete_lines(&mut self, start: usize, count: usize) {
        self.lines.delete_lines(start, count);
    }

    fn replace_line(&mut self, line: usize, text: &str) {
        self.lines.replace_line(line, text);
    }
}

pub fn read_document(path: &Path) -> Result<TextFile, DocumentError> {
    let text = fs::read_to_string(path).map_err(|e| DocumentError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file = TextFile::from_text(path, &text);
    tracing::debug!(path = %path.display(), lines = file.lines.len(), "read document");
    Ok(file)
}

/// Write the document back atomically
pub fn write_document(file: &TextFile) -> Result<(), DocumentError> {
    atomic_write(&file.path, file.to_text().as_bytes()).map_err(|e| {
        DocumentError::WriteError {
            path: file.path.clone(),
            source: e,
        }
    })
}

/// Apply an edit script to the document and write it out.
/// Returns the number of edits; nothing is written when there are none.
pub fn apply_to_file(file: &mut TextFile, edits: &[Edit]) -> Result<usize, DocumentError> {
    if edits.is_empty() {
        return Ok(0);
    }
    apply_edits(file, edits);
    write_document(file)?;
    tracing::debug!(path = %file.path.display(), edits = edits.len(), "applied edits");
    Ok(edits.len())
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::diff::diff_lines;
    use tempfile::TempDir;

    #[test]
    fn test_text_round_trip() {
        for text in ["", "\n", "a", "a\n", "a\nb\n", "a\n\n", "a\r\nb\r\n"] {
            assert_eq!(TextFile::from_text("x.md", text).to_text(), text, "{:?}", text);
        }
    }

    #[test]
    fn test_read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = read_document(&tmp.path().join("missing.md"));
        assert!(matches!(result, Err(DocumentError::ReadError { .. })));
    }

    #[test]
    fn test_apply_to_file_preserves_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.md");
        fs::write(&path, "# TODO Task\nbody\n").unwrap();

        let mut file = read_document(&path).unwrap();
        let target = vec!["# DONE Task".to_string(), "body".to_string()];
        let edits = diff_lines(&file.lines, &target);
        assert_eq!(apply_to_file(&mut file, &edits).unwrap(), 1);

        assert_eq!(fs::read_to_string(&path).unwrap(), "# DONE Task\nbody\n");
    }

    #[test]
    fn test_apply_no_edits_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.md");
        fs::write(&path, "same").unwrap();
        let mut file = read_document(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(apply_to_file(&mut file, &[]).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.md");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}

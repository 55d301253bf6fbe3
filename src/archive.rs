//! Archive Log - append-only text log of captured clipboard content
//!
//! Entry layout:
//!
//! ```text
//!
//! ----------------------------------------
//! [ENTRY #3 | 2026-10-18 14:02:11]
//! <body>
//! ```
//!
//! The sequence number is the number of separators already in the file plus
//! one. That means a full re-read on every append, fine for an operator tool
//! writing a handful of entries.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEPARATOR: &str = "----------------------------------------";

/// Archive errors
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Nothing to archive: body is empty")]
    EmptyBody,

    #[error("Archive IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One written entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub sequence_number: usize,
    pub timestamp: String,
    pub body: String,
}

impl ArchiveEntry {
    fn render(&self, separator: &str) -> String {
        format!(
            "\n{}\n[ENTRY #{} | {}]\n{}\n",
            separator, self.sequence_number, self.timestamp, self.body
        )
    }
}

/// Append-only log file.
#[derive(Debug, Clone)]
pub struct ArchiveLog {
    path: PathBuf,
    separator: String,
}

impl ArchiveLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_separator(path, DEFAULT_SEPARATOR)
    }

    pub fn with_separator(path: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            separator: separator.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number the next entry will get.
    pub fn next_sequence_number(&self) -> Result<usize, ArchiveError> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(existing.matches(self.separator.as_str()).count() + 1)
    }

    /// Append a timestamped entry. Blank bodies are rejected before any write.
    pub fn append(&self, body: &str) -> Result<ArchiveEntry, ArchiveError> {
        if body.trim().is_empty() {
            return Err(ArchiveError::EmptyBody);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let entry = ArchiveEntry {
            sequence_number: self.next_sequence_number()?,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            body: body.to_string(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(entry.render(&self.separator).as_bytes())
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(
            path = %self.path.display(),
            seq = entry.sequence_number,
            chars = body.chars().count(),
            "Archive entry written"
        );
        Ok(entry)
    }

    fn io_error(&self, source: std::io::Error) -> ArchiveError {
        ArchiveError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sequence_numbers_count_up() {
        let dir = tempdir().unwrap();
        let log = ArchiveLog::new(dir.path().join("chat.txt"));

        let seqs: Vec<usize> = ["one", "two", "three"]
            .iter()
            .map(|b| log.append(b).unwrap().sequence_number)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches(DEFAULT_SEPARATOR).count(), 3);
        assert!(content.contains("[ENTRY #3 | "));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let log = ArchiveLog::new(dir.path().join("a").join("b").join("chat.txt"));
        log.append("hello").unwrap();
        assert!(log.path().exists());
    }

    #[test]
    fn test_blank_body_writes_nothing() {
        let dir = tempdir().unwrap();
        let log = ArchiveLog::new(dir.path().join("chat.txt"));
        assert!(matches!(log.append("  \n\t"), Err(ArchiveError::EmptyBody)));
        assert!(!log.path().exists());
    }

    #[test]
    fn test_numbering_follows_existing_separators() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        fs::write(&path, "#### old\n#### older\n").unwrap();
        let log = ArchiveLog::with_separator(&path, "####");
        assert_eq!(log.append("new").unwrap().sequence_number, 3);
    }
}

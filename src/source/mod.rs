//! File reader collaborator.
//!
//! # Responsibilities
//! - Turn a path into bytes for the tokenizer
//! - Expand `include` patterns into an ordered file list
//!
//! # Design Decisions
//! - Missing files are `NotFound`, everything else is `Io`
//! - Wildcard expansion is sorted so include order is deterministic

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ConfError, ConfResult, ErrorKind};

/// Yields configuration file contents.
pub trait FileReader: Send + Sync {
    fn read(&self, path: &Path) -> ConfResult<Vec<u8>>;

    /// Paths matching `pattern`, in include order. Plain paths expand to
    /// themselves.
    fn expand(&self, pattern: &Path) -> ConfResult<Vec<PathBuf>> {
        Ok(vec![pattern.to_path_buf()])
    }
}

fn is_pattern(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?', '['])
}

/// Reads from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &Path) -> ConfResult<Vec<u8>> {
        fs::read(path).map_err(|e| {
            let path = path.display().to_string();
            match e.kind() {
                io::ErrorKind::NotFound => ConfError::new(ErrorKind::NotFound { path }),
                _ => ConfError::new(ErrorKind::Io { path, source: e }),
            }
        })
    }

    fn expand(&self, pattern: &Path) -> ConfResult<Vec<PathBuf>> {
        if !is_pattern(pattern) {
            return Ok(vec![pattern.to_path_buf()]);
        }

        let text = pattern.to_string_lossy();
        let entries = glob::glob(&text).map_err(|e| {
            ConfError::new(ErrorKind::Syntax(format!(
                "invalid include pattern \"{}\": {}",
                text, e
            )))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().display().to_string();
                ConfError::new(ErrorKind::Io {
                    path,
                    source: e.into_error(),
                })
            })?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// In-memory file set, keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }
}

impl FileReader for MemoryReader {
    fn read(&self, path: &Path) -> ConfResult<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            ConfError::new(ErrorKind::NotFound {
                path: path.display().to_string(),
            })
        })
    }

    fn expand(&self, pattern: &Path) -> ConfResult<Vec<PathBuf>> {
        if !is_pattern(pattern) {
            return Ok(vec![pattern.to_path_buf()]);
        }

        let text = pattern.to_string_lossy();
        let matcher = glob::Pattern::new(&text).map_err(|e| {
            ConfError::new(ErrorKind::Syntax(format!(
                "invalid include pattern \"{}\": {}",
                text, e
            )))
        })?;
        // BTreeMap keys are already sorted
        Ok(self
            .files
            .keys()
            .filter(|p| matcher.matches_path(p))
            .cloned()
            .collect())
    }
}

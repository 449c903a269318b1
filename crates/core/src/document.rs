use std::path::{Path, PathBuf};

use crate::error::PressError;

/// A document handed in for rendering.
///
/// Lives for one render call; nothing about it is cached.
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw markdown source.
    pub text: String,
    /// Directory that relative include and import targets resolve against.
    pub base_path: PathBuf,
    /// The document's own file, when it came from disk.
    pub path: Option<PathBuf>,
}

impl Document {
    /// Wraps in-memory text with the directory its directives resolve from.
    pub fn new(text: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            base_path: base_path.into(),
            path: None,
        }
    }

    /// Reads a document from disk. The base path is the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PressError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self {
            text,
            base_path,
            path: Some(path.to_path_buf()),
        })
    }

    /// Attaches the document's own path so includes that loop back to it are cut.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_sets_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("guide.md");
        std::fs::write(&file, "# Guide\n").unwrap();

        let doc = Document::from_path(&file).unwrap();
        assert_eq!(doc.text, "# Guide\n");
        assert_eq!(doc.base_path, dir.path());
        assert_eq!(doc.path.as_deref(), Some(file.as_path()));
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let err = Document::from_path("/definitely/not/here.md").unwrap_err();
        assert!(matches!(err, PressError::Io(_)));
    }
}

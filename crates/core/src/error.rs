use std::path::PathBuf;

use thiserror::Error;

/// Source location information for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional file path
    pub file: Option<PathBuf>,
    /// Line number (1-indexed)
    pub line: usize,
}

impl SourceLocation {
    /// Create a location without file information
    pub fn new(line: usize) -> Self {
        Self { file: None, line }
    }

    /// Create a location inside a specific file
    pub fn in_file(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: Some(file.into()),
            line,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}", file.display(), self.line)
        } else {
            write!(f, "line {}", self.line)
        }
    }
}

/// Errors that abort a render.
///
/// Only collaborator failures end up here. Everything the pipeline can
/// recover from is reported through [`Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum PressError {
    /// IO error while reading a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The syntax highlighting engine failed on a line.
    #[error("Highlight error ({language}): {message}")]
    Highlight {
        /// Language the block was highlighted as
        language: String,
        /// Engine message
        message: String,
    },
    /// markdown-rs rejected a list or table fragment.
    #[error("Markdown parse error: {0}")]
    Markdown(String),
    /// lol_html failed while rewriting the final fragment.
    #[error("HTML rewrite error: {0}")]
    Rewrite(String),
    /// Invalid configuration payload.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl PressError {
    /// Create a highlight error for the given language
    pub fn highlight(language: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Highlight {
            language: language.into(),
            message: message.to_string(),
        }
    }
}

/// Recoverable conditions encountered while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An include or import target could not be read.
    MissingTarget {
        /// Resolved target path
        path: PathBuf,
        /// Where the directive was found
        location: SourceLocation,
    },
    /// A directive pointed back at a file already being resolved.
    CycleSkipped {
        /// Resolved target path
        path: PathBuf,
        /// Where the directive was found
        location: SourceLocation,
    },
    /// A named region was not present in the target.
    MissingRegion {
        /// Resolved target path
        path: PathBuf,
        /// Requested region name
        region: String,
        /// Where the directive was found
        location: SourceLocation,
    },
    /// A `{start-end}` selector could not be applied.
    MalformedRange {
        /// The selector as written
        range: String,
        /// Where the directive was found
        location: SourceLocation,
    },
    /// Include recursion went past the configured depth.
    DepthExceeded {
        /// Resolved target path
        path: PathBuf,
        /// Depth at which resolution stopped
        depth: usize,
    },
    /// Code fence opened but never closed.
    UnclosedCodeFence {
        /// Where the fence started
        location: SourceLocation,
        /// Fence marker character (backtick or tilde)
        marker: char,
    },
    /// `:::` container opened but never closed.
    UnclosedContainer {
        /// Where the container started
        location: SourceLocation,
        /// Container kind as written
        kind: String,
    },
    /// Block nesting went past the supported depth.
    NestingTooDeep {
        /// Where the nested block started
        location: SourceLocation,
        /// Depth at which classification stopped
        depth: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingTarget { path, location } => {
                write!(f, "{}: target not found: {}", location, path.display())
            }
            Diagnostic::CycleSkipped { path, location } => {
                write!(f, "{}: circular include skipped: {}", location, path.display())
            }
            Diagnostic::MissingRegion {
                path,
                region,
                location,
            } => write!(
                f,
                "{}: region '{}' not found in {}",
                location,
                region,
                path.display()
            ),
            Diagnostic::MalformedRange { range, location } => {
                write!(f, "{}: malformed line range '{}'", location, range)
            }
            Diagnostic::DepthExceeded { path, depth } => write!(
                f,
                "include depth {} exceeded at {}",
                depth,
                path.display()
            ),
            Diagnostic::UnclosedCodeFence { location, marker } => {
                write!(f, "{}: unclosed code fence ({})", location, marker)
            }
            Diagnostic::UnclosedContainer { location, kind } => {
                write!(f, "{}: unclosed '{}' container", location, kind)
            }
            Diagnostic::NestingTooDeep { location, depth } => {
                write!(f, "{}: block nesting deeper than {}", location, depth)
            }
        }
    }
}

/// Collection of recoverable diagnostics gathered during one render.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Diagnostics in the order they were raised
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Check if anything was recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over recorded diagnostics
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

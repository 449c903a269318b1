//! Syntax highlighting.
//!
//! The grammar and theme sets are loaded once per process into a shared
//! engine. [`HighlightEngine::acquire`] hands out reference-counted handles
//! and [`HighlightEngine::dispose`] drops the process-wide reference; handles
//! already given out keep working until they are dropped.

use std::sync::{Arc, Mutex, PoisonError};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use mdpress_core::PressError;

/// Theme used when the configured one is not bundled.
pub const FALLBACK_THEME: &str = "InspiredGitHub";

static ENGINE: Mutex<Option<Arc<HighlightEngine>>> = Mutex::new(None);

/// Turns cleaned code lines into per-line HTML.
pub trait Highlighter: Send + Sync {
    /// Returns one HTML string per input line. Text must come back escaped.
    fn highlight(&self, lines: &[String], lang: &str) -> Result<Vec<String>, PressError>;
}

/// Escapes lines without coloring them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, lines: &[String], _lang: &str) -> Result<Vec<String>, PressError> {
        Ok(escape_lines(lines))
    }
}

fn escape_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| html_escape::encode_text(line).into_owned())
        .collect()
}

/// Loaded syntect grammars and themes.
pub struct HighlightEngine {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
}

impl HighlightEngine {
    fn load() -> Self {
        log::debug!("loading syntect grammars and themes");
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
        }
    }

    /// Returns a handle to the process-wide engine, loading it on first use.
    pub fn acquire() -> EngineHandle {
        let mut slot = ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
        let engine = slot.get_or_insert_with(|| Arc::new(Self::load()));
        EngineHandle(Arc::clone(engine))
    }

    /// Drops the process-wide reference. Returns false if nothing was loaded.
    pub fn dispose() -> bool {
        let mut slot = ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
        slot.take().is_some()
    }

    /// Whether the process currently holds a loaded engine.
    pub fn is_loaded() -> bool {
        ENGINE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn find_syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        let lower = lang.to_ascii_lowercase();
        let token = match lower.as_str() {
            "ts" | "typescript" | "tsx" | "jsx" | "mjs" | "cjs" => "js",
            "shell" | "zsh" | "console" => "bash",
            "htm" | "vue" | "svelte" => "html",
            "yml" => "yaml",
            "rs" => "rust",
            "py" => "python",
            other => other,
        };
        self.syntaxes.find_syntax_by_token(token)
    }

    fn theme(&self, name: &str) -> Option<&Theme> {
        self.themes
            .themes
            .get(name)
            .or_else(|| self.themes.themes.get(FALLBACK_THEME))
    }
}

/// Shared handle to the loaded engine.
#[derive(Clone)]
pub struct EngineHandle(Arc<HighlightEngine>);

impl EngineHandle {
    /// Highlighter bound to a theme.
    pub fn with_theme(&self, theme: impl Into<String>) -> SyntectHighlighter {
        SyntectHighlighter {
            engine: self.clone(),
            theme: theme.into(),
        }
    }

    /// Whether two handles share the same loaded engine.
    pub fn same_engine(&self, other: &EngineHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// syntect-backed [`Highlighter`].
///
/// Unknown languages fall back to escaped plain text.
#[derive(Clone)]
pub struct SyntectHighlighter {
    engine: EngineHandle,
    theme: String,
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, lines: &[String], lang: &str) -> Result<Vec<String>, PressError> {
        let engine = &self.engine.0;
        let (Some(syntax), Some(theme)) = (engine.find_syntax(lang), engine.theme(&self.theme))
        else {
            log::debug!("no grammar or theme for {:?}, emitting plain text", lang);
            return Ok(escape_lines(lines));
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            let with_newline = format!("{}\n", line);
            let regions = highlighter
                .highlight_line(&with_newline, &engine.syntaxes)
                .map_err(|e| PressError::highlight(lang, e))?;
            let regions: Vec<(Style, &str)> = regions
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches('\n')))
                .filter(|(_, text)| !text.is_empty())
                .collect();
            let html = styled_line_to_highlighted_html(&regions, IncludeBackground::No)
                .map_err(|e| PressError::highlight(lang, e))?;
            out.push(html);
        }
        Ok(out)
    }
}

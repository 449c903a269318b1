//! Code annotation engine.
//!
//! Turns a fenced block's info string and body into per-line annotations
//! and marker-free source, then wraps highlighter output line by line.
//!
//! # Module Structure
//!
//! - `highlight` - process-wide syntect engine and the [`Highlighter`] seam
//!
//! [`Highlighter`]: highlight::Highlighter

pub mod highlight;

use std::fmt::Write as _;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use highlight::Highlighter;
use mdpress_core::PressError;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\s*(?://|#|/\*|<!--)\s*\[!code\s+(focus|\+\+|--|error|warning|highlight|hl)\](?:\s*(?:\*/|-->))?",
    )
    .expect("marker pattern is valid")
});

/// 1-based line numbers to highlight, kept as ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    ranges: Vec<RangeInclusive<usize>>,
}

impl HighlightSet {
    /// Parses `1,3-5,8`. Tokens that are not numbers or ascending ranges are skipped.
    pub fn parse(spec: &str) -> Self {
        let mut ranges = Vec::new();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let range = match token.split_once('-') {
                Some((a, b)) => match (a.trim().parse::<usize>(), b.trim().parse::<usize>()) {
                    (Ok(a), Ok(b)) if a >= 1 && a <= b => a..=b,
                    _ => {
                        log::debug!("ignoring highlight token {:?}", token);
                        continue;
                    }
                },
                None => match token.parse::<usize>() {
                    Ok(n) if n >= 1 => n..=n,
                    _ => {
                        log::debug!("ignoring highlight token {:?}", token);
                        continue;
                    }
                },
            };
            ranges.push(range);
        }
        Self { ranges }
    }

    /// Whether 1-based line `n` is highlighted.
    pub fn contains(&self, n: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&n))
    }

    /// True when no line is highlighted.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Everything needed to render one fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockSpec {
    /// Language tag (may be empty).
    pub lang: String,
    /// Whether each line gets a number prefix.
    pub line_numbers: bool,
    /// Explicit first line number from `:line-numbers=N`.
    pub start_line: Option<usize>,
    /// Lines highlighted by the `{...}` spec.
    pub highlights: HighlightSet,
    /// Tab label from a trailing `[label]`, used by code groups.
    pub label: Option<String>,
    /// Raw body lines, markers still present.
    pub lines: Vec<String>,
}

impl CodeBlockSpec {
    /// Parses a fence info string and body.
    ///
    /// The info grammar is `lang[:line-numbers[=N]][{ranges}][ [label]]`;
    /// the flags may appear in any order after the language.
    /// `default_line_numbers` applies when the info string has neither
    /// `:line-numbers` nor `:no-line-numbers`.
    pub fn parse(info: &str, body: &str, default_line_numbers: bool) -> Self {
        let info = info.trim();
        let lang_end = info
            .find(|c: char| c.is_whitespace() || matches!(c, '{' | ':' | '['))
            .unwrap_or(info.len());
        let lang = info[..lang_end].to_string();
        let rest = &info[lang_end..];

        let mut line_numbers = default_line_numbers;
        let mut start_line = None;
        if rest.contains(":no-line-numbers") {
            line_numbers = false;
        } else if let Some(pos) = rest.find(":line-numbers") {
            line_numbers = true;
            let after = &rest[pos + ":line-numbers".len()..];
            if let Some(value) = after.strip_prefix('=') {
                let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
                start_line = digits.parse().ok();
            }
        }

        let highlights = rest
            .split_once('{')
            .and_then(|(_, tail)| tail.split_once('}'))
            .map(|(spec, _)| HighlightSet::parse(spec))
            .unwrap_or_default();

        let label = rest
            .split_once('[')
            .and_then(|(_, tail)| tail.split_once(']'))
            .map(|(label, _)| label.trim().to_string())
            .filter(|l| !l.is_empty());

        Self {
            lang,
            line_numbers,
            start_line,
            highlights,
            label,
            lines: body.lines().map(str::to_string).collect(),
        }
    }
}

/// Marker kinds recognized in `// [!code kind]` comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `focus`
    Focus,
    /// `++`
    DiffAdd,
    /// `--`
    DiffRemove,
    /// `error`
    Error,
    /// `warning`
    Warning,
    /// `highlight` or `hl`
    Highlight,
}

impl MarkerKind {
    fn from_token(token: &str) -> Option<Self> {
        let kind = match token {
            "focus" => Self::Focus,
            "++" => Self::DiffAdd,
            "--" => Self::DiffRemove,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "highlight" | "hl" => Self::Highlight,
            _ => return None,
        };
        Some(kind)
    }
}

/// Per-line annotation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAnnotation {
    /// In the `{...}` highlight set or marked `[!code highlight]`.
    pub highlighted: bool,
    /// Marked `[!code focus]`.
    pub focused: bool,
    /// Another line in the block is focused and this one is not.
    pub dimmed: bool,
    /// Marked `[!code ++]`.
    pub diff_add: bool,
    /// Marked `[!code --]`.
    pub diff_remove: bool,
    /// Marked `[!code error]`.
    pub has_error: bool,
    /// Marked `[!code warning]`.
    pub has_warning: bool,
}

impl LineAnnotation {
    /// Folds one marker into the flags. The first diff marker on a line wins.
    pub fn apply(&mut self, kind: MarkerKind) {
        match kind {
            MarkerKind::Focus => self.focused = true,
            MarkerKind::DiffAdd if !self.diff_remove => self.diff_add = true,
            MarkerKind::DiffRemove if !self.diff_add => self.diff_remove = true,
            MarkerKind::DiffAdd | MarkerKind::DiffRemove => {}
            MarkerKind::Error => self.has_error = true,
            MarkerKind::Warning => self.has_warning = true,
            MarkerKind::Highlight => self.highlighted = true,
        }
    }

    /// Class names in fixed order, always starting with `line`.
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["line"];
        let flags = [
            (self.highlighted, "highlighted"),
            (self.focused, "focused"),
            (self.dimmed, "dimmed"),
            (self.diff_add, "diff-add"),
            (self.diff_remove, "diff-remove"),
            (self.has_error, "has-error"),
            (self.has_warning, "has-warning"),
        ];
        classes.extend(flags.iter().filter(|(on, _)| *on).map(|(_, name)| *name));
        classes
    }
}

/// Annotation output: one entry per line, plus the cleaned source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedCode {
    /// Per-line flags, index 0 is line 1.
    pub annotations: Vec<LineAnnotation>,
    /// Lines with marker comments removed.
    pub lines: Vec<String>,
}

impl AnnotatedCode {
    /// Whether any line is focused.
    pub fn has_focus(&self) -> bool {
        self.annotations.iter().any(|a| a.focused)
    }

    /// Whether any line carries a diff marker.
    pub fn has_diff(&self) -> bool {
        self.annotations.iter().any(|a| a.diff_add || a.diff_remove)
    }
}

/// Strips recognized markers from one line, returning the kinds in source order.
pub fn strip_markers(line: &str) -> (String, Vec<MarkerKind>) {
    if !line.contains("[!code") {
        return (line.to_string(), Vec::new());
    }
    let kinds = MARKER_RE
        .captures_iter(line)
        .filter_map(|caps| MarkerKind::from_token(&caps[1]))
        .collect();
    let cleaned = MARKER_RE.replace_all(line, "");
    (cleaned.trim_end().to_string(), kinds)
}

/// Computes annotations and cleaned lines for a block.
pub fn annotate(spec: &CodeBlockSpec) -> AnnotatedCode {
    let mut annotations = Vec::with_capacity(spec.lines.len());
    let mut lines = Vec::with_capacity(spec.lines.len());

    for (idx, raw) in spec.lines.iter().enumerate() {
        let (cleaned, kinds) = strip_markers(raw);
        let mut annotation = kinds.into_iter().fold(LineAnnotation::default(), |mut acc, kind| {
            acc.apply(kind);
            acc
        });
        if spec.highlights.contains(idx + 1) {
            annotation.highlighted = true;
        }
        annotations.push(annotation);
        lines.push(cleaned);
    }

    if annotations.iter().any(|a| a.focused) {
        for annotation in annotations.iter_mut().filter(|a| !a.focused) {
            annotation.dimmed = true;
        }
    }

    AnnotatedCode { annotations, lines }
}

/// Renders a code block to HTML.
///
/// `default_start` is the first line number when the info string gives none.
pub fn render_code_block(
    spec: &CodeBlockSpec,
    highlighter: &dyn Highlighter,
    default_start: usize,
) -> Result<String, PressError> {
    let annotated = annotate(spec);
    let lang = if spec.lang.is_empty() {
        "text"
    } else {
        spec.lang.as_str()
    };
    let rendered = highlighter.highlight(&annotated.lines, lang)?;
    let start = spec.start_line.unwrap_or(default_start);

    let mut pre_classes = vec!["code-block"];
    if spec.line_numbers {
        pre_classes.push("line-numbers-mode");
    }
    if annotated.has_focus() {
        pre_classes.push("has-focused-lines");
    }
    if annotated.has_diff() {
        pre_classes.push("has-diff");
    }

    let lang_attr = html_escape::encode_double_quoted_attribute(lang);
    let mut html = String::new();
    write!(
        html,
        r#"<pre class="{}" data-lang="{}"><code class="language-{}">"#,
        pre_classes.join(" "),
        lang_attr,
        lang_attr
    )
    .ok();

    for (idx, (annotation, line_html)) in annotated.annotations.iter().zip(&rendered).enumerate() {
        if idx > 0 {
            html.push('\n');
        }
        write!(html, r#"<span class="{}">"#, annotation.classes().join(" ")).ok();
        if spec.line_numbers {
            write!(html, r#"<span class="line-number">{}</span>"#, start + idx).ok();
        }
        html.push_str(line_html);
        html.push_str("</span>");
    }

    html.push_str("</code></pre>");
    Ok(html)
}

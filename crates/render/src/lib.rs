#![deny(missing_docs)]
//! mdpress renderer: markdown with documentation-site extensions to HTML.
//!
//! A render runs four stages over one document:
//!
//! 1. include and import directives are resolved (`mdpress_core::resolve`);
//! 2. the expanded text is classified into a block tree ([`blocks`]);
//! 3. heading slugs are assigned and the outline is collected ([`toc`]);
//! 4. blocks are rendered to HTML ([`html`]), with code blocks going through
//!    the annotation engine ([`code`]) and text through the inline pass
//!    ([`inline`]).
//!
//! Broken directives and unterminated structures never fail a render. They
//! are reported in [`RenderOutput::diagnostics`].

/// Parallel rendering of many documents.
pub mod batch;
/// Block classification into an arena tree.
pub mod blocks;
/// Code block annotation and syntax highlighting.
pub mod code;
/// Block tree to HTML.
pub mod html;
/// Inline micro-syntax (emphasis, links, emoji, badges).
pub mod inline;
/// Heading slugs and table of contents.
pub mod toc;

use std::path::Path;

use mdpress_core::{
    Diagnostics, Document, FsLoader, PressError, RenderOptions, SourceLoader, resolve_document,
};

use crate::code::highlight::{HighlightEngine, Highlighter};
use crate::toc::{HeadingEntry, TocConfig};

pub use batch::{BatchStats, render_batch};

/// Result of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// HTML fragment, no document shell.
    pub html: String,
    /// Headings in source order, excluding `toc-ignore` ones.
    pub headings: Vec<HeadingEntry>,
    /// Skipped directives and structural recoveries.
    pub diagnostics: Diagnostics,
}

impl RenderOutput {
    /// Headings as a camelCase JSON array.
    pub fn headings_json(&self) -> Result<String, PressError> {
        Ok(serde_json::to_string(&self.headings)?)
    }
}

/// Renders markdown text whose directives resolve against `base_path`.
pub fn render(
    text: &str,
    base_path: &Path,
    options: &RenderOptions,
) -> Result<RenderOutput, PressError> {
    render_document(&Document::new(text, base_path), &FsLoader, options)
}

/// Renders a document, reading directive targets through `loader`.
///
/// Code is colored with the shared syntect engine, bound to
/// `options.highlight_theme`.
pub fn render_document(
    document: &Document,
    loader: &dyn SourceLoader,
    options: &RenderOptions,
) -> Result<RenderOutput, PressError> {
    let highlighter = HighlightEngine::acquire().with_theme(options.highlight_theme.as_str());
    render_with_highlighter(document, loader, options, &highlighter)
}

/// Renders a document with a caller-supplied highlighter.
pub fn render_with_highlighter(
    document: &Document,
    loader: &dyn SourceLoader,
    options: &RenderOptions,
    highlighter: &dyn Highlighter,
) -> Result<RenderOutput, PressError> {
    let (text, mut diagnostics) = resolve_document(document, loader);
    let tree = blocks::classify_into(&text, &mut diagnostics);

    let slugs = toc::assign_slugs(&tree);
    let headings = toc::collect_headings(&tree, &slugs);
    let config = TocConfig::from_options(options);
    let toc_html = toc::render_toc(&toc::build_toc(&headings, &config), &config.title);

    let html = html::Context::new(&tree, &slugs, &toc_html, options, highlighter).render()?;
    let html = html::post::decorate(&html)?;

    if !diagnostics.is_empty() {
        log::debug!("render finished with {} diagnostics", diagnostics.len());
    }
    Ok(RenderOutput {
        html,
        headings,
        diagnostics,
    })
}

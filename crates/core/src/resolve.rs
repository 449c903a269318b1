//! Directive resolution.
//!
//! Expands `<!--@include: path-->` and `<<< @/path` directives into literal
//! text before any block parsing happens. Resolution is recursive for
//! includes, carries an explicit visited set to cut cycles, and never fails:
//! missing files, missing regions, and malformed ranges drop the directive
//! and record a [`Diagnostic`].
//!
//! Directives inside fenced code blocks are left untouched so documentation
//! can show the syntax itself.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::code_fence::FenceTracker;
use crate::document::Document;
use crate::error::{Diagnostic, Diagnostics, SourceLocation};
use crate::region::{LineRange, Selector, extract};

/// Maximum include nesting before resolution stops descending.
pub const MAX_INCLUDE_DEPTH: usize = 32;

static INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*@include:\s*([^\s{}]+?)\s*(?:\{([^}]*)\})?\s*-->")
        .expect("include pattern is valid")
});

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*<<<\s+@/(\S+?)(?:\{([^}]*)\}|#([\w-]+))?(?:\s+\[([^\]]*)\])?\s*$")
        .expect("import pattern is valid")
});

/// Read-only access to directive targets.
pub trait SourceLoader: Send + Sync {
    /// Reads the text at `path`.
    fn load(&self, path: &Path) -> std::io::Result<String>;
}

/// Loads directive targets from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves directive targets from an in-memory map.
///
/// Keys are normalized the same way resolved directive paths are, so
/// `docs/./a.md` and `docs/a.md` name the same entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), text.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not loaded", path.display()),
                )
            })
    }
}

/// Resolves `text` against the filesystem.
///
/// `visited` holds the files already on the resolution path; a directive
/// naming one of them emits nothing.
pub fn resolve(text: &str, base_path: &Path, visited: &HashSet<PathBuf>) -> String {
    let mut diagnostics = Diagnostics::new();
    Resolver::new(&FsLoader).resolve(text, base_path, visited, &mut diagnostics)
}

/// Resolves a whole document, seeding the visited set with its own path.
pub fn resolve_document(document: &Document, loader: &dyn SourceLoader) -> (String, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let text = Resolver::new(loader).resolve_document(document, &mut diagnostics);
    (text, diagnostics)
}

/// Directive resolver bound to a [`SourceLoader`].
pub struct Resolver<'l> {
    loader: &'l dyn SourceLoader,
    max_depth: usize,
}

struct Frame<'a> {
    base: &'a Path,
    file: Option<&'a Path>,
    visited: &'a HashSet<PathBuf>,
    depth: usize,
}

impl<'l> Resolver<'l> {
    /// Creates a resolver reading through `loader`.
    pub fn new(loader: &'l dyn SourceLoader) -> Self {
        Self {
            loader,
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    /// Overrides the include depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves a document, treating its own path as already visited.
    pub fn resolve_document(&self, document: &Document, diagnostics: &mut Diagnostics) -> String {
        let mut visited = HashSet::new();
        if let Some(path) = &document.path {
            visited.insert(normalize_path(path));
        }
        let frame = Frame {
            base: &document.base_path,
            file: document.path.as_deref(),
            visited: &visited,
            depth: 0,
        };
        self.resolve_frame(&document.text, &frame, diagnostics)
    }

    /// Resolves every directive in `text`.
    pub fn resolve(
        &self,
        text: &str,
        base_path: &Path,
        visited: &HashSet<PathBuf>,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let frame = Frame {
            base: base_path,
            file: None,
            visited,
            depth: 0,
        };
        self.resolve_frame(text, &frame, diagnostics)
    }

    fn resolve_frame(&self, text: &str, frame: &Frame<'_>, diagnostics: &mut Diagnostics) -> String {
        let mut out = String::with_capacity(text.len());
        let mut fence = FenceTracker::new();

        for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
            let line = raw_line.trim_end_matches(['\n', '\r']);
            let newline = &raw_line[line.len()..];
            let location = || match frame.file {
                Some(file) => SourceLocation::in_file(file, idx + 1),
                None => SourceLocation::new(idx + 1),
            };

            if fence.advance(line).is_fenced() {
                out.push_str(raw_line);
                continue;
            }

            if let Some(caps) = IMPORT_RE.captures(line) {
                if let Some(block) = self.expand_import(&caps, frame, location(), diagnostics) {
                    out.push_str(&block);
                    out.push_str(newline);
                }
                continue;
            }

            if INCLUDE_RE.is_match(line) {
                let replaced = INCLUDE_RE.replace_all(line, |caps: &Captures<'_>| {
                    self.expand_include(caps, frame, location(), diagnostics)
                        .unwrap_or_default()
                });
                out.push_str(&replaced);
                out.push_str(newline);
                continue;
            }

            out.push_str(raw_line);
        }

        out
    }

    fn expand_include(
        &self,
        caps: &Captures<'_>,
        frame: &Frame<'_>,
        location: SourceLocation,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let target = normalize_path(&frame.base.join(&caps[1]));
        let selector = parse_selector(caps.get(2).map(|m| m.as_str()), None, &location, diagnostics)?;
        let extracted = self.load_selected(&target, &selector, frame, location, diagnostics)?;

        let mut visited = frame.visited.clone();
        visited.insert(target.clone());
        let child_base = target.parent().map(Path::to_path_buf).unwrap_or_default();
        let child = Frame {
            base: &child_base,
            file: Some(&target),
            visited: &visited,
            depth: frame.depth + 1,
        };
        Some(self.resolve_frame(&extracted, &child, diagnostics))
    }

    fn expand_import(
        &self,
        caps: &Captures<'_>,
        frame: &Frame<'_>,
        location: SourceLocation,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let relative = &caps[1];
        let target = normalize_path(&frame.base.join(relative));
        let selector = parse_selector(
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
            &location,
            diagnostics,
        )?;
        let code = self.load_selected(&target, &selector, frame, location, diagnostics)?;

        let mut info = language_for_path(relative);
        if let Some(label) = caps.get(4) {
            info.push_str(" [");
            info.push_str(label.as_str());
            info.push(']');
        }
        Some(fence_code(&code, &info))
    }

    /// Shared cycle, depth, read, and extraction checks for both directive kinds.
    fn load_selected(
        &self,
        target: &Path,
        selector: &Selector,
        frame: &Frame<'_>,
        location: SourceLocation,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        if frame.visited.contains(target) {
            log::warn!("{}: skipping circular include of {}", location, target.display());
            diagnostics.push(Diagnostic::CycleSkipped {
                path: target.to_path_buf(),
                location,
            });
            return None;
        }

        if frame.depth >= self.max_depth {
            log::warn!("include depth {} exceeded at {}", frame.depth, target.display());
            diagnostics.push(Diagnostic::DepthExceeded {
                path: target.to_path_buf(),
                depth: frame.depth,
            });
            return None;
        }

        let source = match self.loader.load(target) {
            Ok(source) => source,
            Err(err) => {
                log::warn!("{}: cannot read {}: {}", location, target.display(), err);
                diagnostics.push(Diagnostic::MissingTarget {
                    path: target.to_path_buf(),
                    location,
                });
                return None;
            }
        };

        match extract(&source, selector) {
            Some(text) if matches!(selector, Selector::Whole) => {
                Some(text.trim_end_matches(['\n', '\r']).to_string())
            }
            Some(text) => Some(text),
            None => {
                let region = match selector {
                    Selector::Region(name) => name.clone(),
                    _ => String::new(),
                };
                log::warn!(
                    "{}: region '{}' not found in {}",
                    location,
                    region,
                    target.display()
                );
                diagnostics.push(Diagnostic::MissingRegion {
                    path: target.to_path_buf(),
                    region,
                    location,
                });
                None
            }
        }
    }
}

/// Turns the `{...}` body and/or `#name` suffix of a directive into a selector.
fn parse_selector(
    braces: Option<&str>,
    hash: Option<&str>,
    location: &SourceLocation,
    diagnostics: &mut Diagnostics,
) -> Option<Selector> {
    if let Some(name) = hash {
        return Some(Selector::Region(name.to_string()));
    }
    let Some(body) = braces else {
        return Some(Selector::Whole);
    };
    let body = body.trim();
    if let Some(name) = body.strip_prefix('#')
        && !name.is_empty()
    {
        return Some(Selector::Region(name.to_string()));
    }
    match LineRange::parse(body) {
        Some(range) => Some(Selector::Lines(range)),
        None => {
            log::warn!("{}: malformed line range '{{{}}}'", location, body);
            diagnostics.push(Diagnostic::MalformedRange {
                range: body.to_string(),
                location: location.clone(),
            });
            None
        }
    }
}

/// Maps a file extension to the fence language used for imported code.
pub fn language_for_path(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let lang = match ext {
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "mts" | "cts" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "rs" => "rust",
        "cs" => "csharp",
        "sh" | "bash" | "zsh" => "bash",
        "yml" | "yaml" => "yaml",
        "md" => "markdown",
        "kt" => "kotlin",
        "htm" => "html",
        other => other,
    };
    lang.to_string()
}

/// Wraps code in a fence longer than any backtick run it contains.
fn fence_code(code: &str, info: &str) -> String {
    let longest = code
        .lines()
        .map(|line| line.trim_start().chars().take_while(|c| *c == '`').count())
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    if code.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{code}\n{fence}")
    }
}

/// Lexically normalizes a path, folding `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(loader: &MemoryLoader, text: &str) -> (String, Diagnostics) {
        let doc = Document::new(text, "docs").with_path("docs/index.md");
        resolve_document(&doc, loader)
    }

    #[test]
    fn include_whole_file() {
        let loader = MemoryLoader::new().with_file("docs/parts/intro.md", "Intro text\n");
        let (out, diags) = run(&loader, "Before\n<!--@include: ./parts/intro.md-->\nAfter\n");
        assert_eq!(out, "Before\nIntro text\nAfter\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn include_line_range_and_region() {
        let loader = MemoryLoader::new().with_file(
            "docs/shared.md",
            "l1\nl2\nl3\n<!-- #region usage -->\nUse it.\n<!-- #endregion -->\n",
        );
        let (out, _) = run(&loader, "<!--@include: ./shared.md{2-3}-->\n");
        assert_eq!(out, "l2\nl3\n");

        let (out, _) = run(&loader, "<!--@include: ./shared.md{#usage}-->\n");
        assert_eq!(out, "Use it.\n");
    }

    #[test]
    fn nested_includes_resolve_relative_to_target() {
        let loader = MemoryLoader::new()
            .with_file("docs/a/outer.md", "outer\n<!--@include: ./inner.md-->")
            .with_file("docs/a/inner.md", "inner");
        let (out, _) = run(&loader, "<!--@include: ./a/outer.md-->\n");
        assert_eq!(out, "outer\ninner\n");
    }

    #[test]
    fn mutual_includes_terminate() {
        let loader = MemoryLoader::new()
            .with_file("docs/index.md", "A-unique\n<!--@include: ./b.md-->")
            .with_file("docs/b.md", "B-unique\n<!--@include: ./index.md-->");
        let (out, diags) = run(&loader, "A-unique\n<!--@include: ./b.md-->\n");
        assert_eq!(out.matches("A-unique").count(), 1);
        assert_eq!(out.matches("B-unique").count(), 1);
        assert!(!out.contains("@include"));
        assert!(
            diags
                .iter()
                .any(|d| matches!(d, Diagnostic::CycleSkipped { .. }))
        );
    }

    #[test]
    fn self_include_is_cut() {
        let loader = MemoryLoader::new().with_file("docs/loop.md", "loop\n<!--@include: ./loop.md-->");
        let (out, _) = run(&loader, "<!--@include: ./loop.md-->\n");
        assert_eq!(out.matches("loop").count(), 1);
    }

    #[test]
    fn missing_file_is_dropped_and_reported() {
        let loader = MemoryLoader::new();
        let (out, diags) = run(&loader, "Keep\n<!--@include: ./gone.md-->\nAlso keep\n");
        assert_eq!(out, "Keep\n\nAlso keep\n");
        assert!(matches!(
            diags.items.as_slice(),
            [Diagnostic::MissingTarget { .. }]
        ));
    }

    #[test]
    fn missing_region_and_malformed_range_are_dropped() {
        let loader = MemoryLoader::new().with_file("docs/x.md", "content");
        let (out, diags) = run(
            &loader,
            "<!--@include: ./x.md{#absent}-->\n<!--@include: ./x.md{9-2}-->\n",
        );
        assert_eq!(out, "\n\n");
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn import_region_becomes_fenced_code() {
        let loader = MemoryLoader::new().with_file(
            "docs/snippets/example.js",
            "const a = 1\n// #region math\nexport const twice = (n) => n * 2\n// #endregion\n",
        );
        let (out, diags) = run(&loader, "<<< @/snippets/example.js#math\n");
        assert_eq!(
            out,
            "```javascript\nexport const twice = (n) => n * 2\n```\n"
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn import_line_range_with_label() {
        let loader = MemoryLoader::new().with_file("docs/main.py", "a = 1\nb = 2\nc = 3\n");
        let (out, _) = run(&loader, "<<< @/main.py{2-3} [main.py]\n");
        assert_eq!(out, "```python [main.py]\nb = 2\nc = 3\n```\n");
    }

    #[test]
    fn import_of_fenced_markdown_uses_longer_fence() {
        let loader = MemoryLoader::new().with_file("docs/readme.md", "```sh\nls\n```");
        let (out, _) = run(&loader, "<<< @/readme.md\n");
        assert!(out.starts_with("````markdown\n```sh"));
        assert!(out.ends_with("```\n````\n"));
    }

    #[test]
    fn directives_inside_fences_are_literal() {
        let loader = MemoryLoader::new().with_file("docs/a.md", "SHOULD NOT APPEAR");
        let text = "```md\n<!--@include: ./a.md-->\n<<< @/a.md\n```\n";
        let (out, diags) = run(&loader, text);
        assert_eq!(out, text);
        assert!(diags.is_empty());
    }

    #[test]
    fn inline_include_inside_sentence() {
        let loader = MemoryLoader::new().with_file("docs/name.md", "mdpress\n");
        let (out, _) = run(&loader, "Welcome to <!--@include: ./name.md--> docs.\n");
        assert_eq!(out, "Welcome to mdpress docs.\n");
    }

    #[test]
    fn depth_limit_stops_descent() {
        let loader = MemoryLoader::new()
            .with_file("docs/1.md", "one <!--@include: ./2.md-->")
            .with_file("docs/2.md", "two <!--@include: ./3.md-->")
            .with_file("docs/3.md", "three");
        let doc = Document::new("<!--@include: ./1.md-->", "docs");
        let mut diags = Diagnostics::new();
        let out = Resolver::new(&loader)
            .with_max_depth(2)
            .resolve_document(&doc, &mut diags);
        assert_eq!(out, "one two ");
        assert!(matches!(
            diags.items.as_slice(),
            [Diagnostic::DepthExceeded { depth: 2, .. }]
        ));
    }

    #[test]
    fn filesystem_resolution_with_visited_set() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.md"), "From disk\n").unwrap();
        let visited = HashSet::new();
        let out = resolve("<!--@include: ./part.md-->\n", dir.path(), &visited);
        assert_eq!(out, "From disk\n");

        let mut visited = HashSet::new();
        visited.insert(normalize_path(&dir.path().join("part.md")));
        let out = resolve("<!--@include: ./part.md-->\n", dir.path(), &visited);
        assert_eq!(out, "\n");
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize_path(Path::new("docs/./a/../b.md")),
            PathBuf::from("docs/b.md")
        );
    }

    #[test]
    fn language_map() {
        assert_eq!(language_for_path("snippets/example.js"), "javascript");
        assert_eq!(language_for_path("lib.rs"), "rust");
        assert_eq!(language_for_path("conf.toml"), "toml");
        assert_eq!(language_for_path("Makefile"), "");
    }
}

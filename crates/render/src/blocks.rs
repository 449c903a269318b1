//! Block classification.
//!
//! Splits resolved document text into a tree of typed blocks stored in an
//! arena. Containers, alerts and quotes classify their inner lines
//! recursively; fenced code is never split, and fence markers inside
//! containers are tracked so a nested fence cannot close the container.

use mdpress_core::code_fence::{closes_fence, leading_whitespace_info};
use mdpress_core::directives::strip_quote_prefix;
use mdpress_core::{
    AlertKind, ContainerOpening, Diagnostic, Diagnostics, FenceOpening, FenceTracker,
    SourceLocation, extract_custom_id, extract_toc_ignore, is_container_closer, is_toc_macro,
    opens_any_container, parse_alert_marker, parse_container_opening, parse_fence_opening,
};

/// Deepest container/alert/quote nesting that is still classified.
pub const MAX_NESTING_DEPTH: usize = 16;

const HTML_BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "center", "details", "dialog", "div",
    "dl", "fieldset", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "iframe", "main", "nav", "ol", "p", "picture", "section", "summary", "svg", "table",
    "template", "ul", "video",
];

/// Tags whose block runs to the matching closing tag, blank lines included.
const HTML_RAW_TEXT_TAGS: &[&str] = &["pre", "script", "style", "textarea"];

/// Index of a block in its [`BlockTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// A classified block. Text is raw, before inline processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// ATX heading.
    Heading {
        /// Level 1-6.
        level: u8,
        /// Display text with the anchor and ignore markers removed.
        text: String,
        /// Anchor from a trailing `{#id}`.
        custom_id: Option<String>,
        /// Trailing `<!-- toc-ignore -->` was present.
        toc_ignore: bool,
    },
    /// Paragraph text, lines joined with `\n`.
    Paragraph {
        /// Raw text.
        text: String,
    },
    /// List source, rendered through markdown-rs.
    List {
        /// Raw list lines.
        source: String,
    },
    /// GFM pipe table source.
    Table {
        /// Raw table lines.
        source: String,
    },
    /// `:::` container.
    Container {
        /// Kind and title.
        opening: ContainerOpening,
        /// Inner blocks.
        children: Vec<BlockId>,
    },
    /// `> [!KIND]` alert.
    Alert {
        /// Alert kind.
        kind: AlertKind,
        /// Custom title after the marker.
        title: Option<String>,
        /// Inner blocks.
        children: Vec<BlockId>,
    },
    /// Plain blockquote.
    Quote {
        /// Inner blocks.
        children: Vec<BlockId>,
    },
    /// Fenced code.
    CodeBlock {
        /// Info string after the fence marker.
        info: String,
        /// Body lines joined with `\n`, no trailing newline.
        body: String,
    },
    /// `[[toc]]` macro.
    TocMacro,
    /// Raw HTML block, passed through.
    Raw {
        /// HTML lines.
        html: String,
    },
    /// `---`, `***` or `___`.
    ThematicBreak,
    /// Text past the nesting limit, rendered escaped.
    Literal {
        /// Raw text.
        text: String,
    },
}

impl Block {
    /// Child blocks of a container, alert or quote.
    pub fn children(&self) -> &[BlockId] {
        match self {
            Block::Container { children, .. }
            | Block::Alert { children, .. }
            | Block::Quote { children } => children,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
struct BlockNode {
    block: Block,
    line: usize,
}

/// Arena of blocks with the top-level sequence.
#[derive(Debug, Clone, Default)]
pub struct BlockTree {
    nodes: Vec<BlockNode>,
    roots: Vec<BlockId>,
}

impl BlockTree {
    /// Top-level blocks in document order.
    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    /// Block by id.
    pub fn get(&self, id: BlockId) -> &Block {
        &self.nodes[id.0].block
    }

    /// 1-based line where the block starts.
    pub fn line(&self, id: BlockId) -> usize {
        self.nodes[id.0].line
    }

    /// Number of blocks at any depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document had no blocks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All blocks in document order (pre-order), without recursion.
    pub fn walk(&self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<BlockId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.get(id).children().iter().rev().copied());
        }
        order
    }

    fn push(&mut self, block: Block, line: usize) -> BlockId {
        self.nodes.push(BlockNode { block, line });
        BlockId(self.nodes.len() - 1)
    }
}

/// Classifies resolved document text.
pub fn classify(text: &str) -> (BlockTree, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tree = classify_into(text, &mut diagnostics);
    (tree, diagnostics)
}

/// Classifies text, appending structural diagnostics to `diagnostics`.
pub fn classify_into(text: &str, diagnostics: &mut Diagnostics) -> BlockTree {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let mut classifier = Classifier {
        tree: BlockTree::default(),
        diagnostics,
    };
    let roots = classifier.classify_lines(&lines, 1, 0);
    let mut tree = classifier.tree;
    tree.roots = roots;
    tree
}

struct Classifier<'d> {
    tree: BlockTree,
    diagnostics: &'d mut Diagnostics,
}

impl Classifier<'_> {
    fn classify_lines(&mut self, lines: &[&str], first_line: usize, depth: usize) -> Vec<BlockId> {
        if depth > MAX_NESTING_DEPTH {
            self.diagnostics.push(Diagnostic::NestingTooDeep {
                location: SourceLocation::new(first_line),
                depth,
            });
            let text = lines.join("\n");
            if text.trim().is_empty() {
                return Vec::new();
            }
            return vec![self.tree.push(Block::Literal { text }, first_line)];
        }

        let mut ids = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let line_no = first_line + i;

            if line.trim().is_empty() {
                i += 1;
                continue;
            }

            let (block, consumed) = if let Some(opening) = parse_fence_opening(line) {
                let (end, closed) = find_fence_end(lines, i, &opening);
                if !closed {
                    log::debug!("code fence at line {} closed at end of input", line_no);
                    self.diagnostics.push(Diagnostic::UnclosedCodeFence {
                        location: SourceLocation::new(line_no),
                        marker: opening.marker,
                    });
                }
                let body = lines[i + 1..end]
                    .iter()
                    .map(|l| strip_indent(l, opening.indent))
                    .collect::<Vec<_>>()
                    .join("\n");
                let consumed = if closed { end + 1 - i } else { end - i };
                (
                    Some(Block::CodeBlock {
                        info: opening.info,
                        body,
                    }),
                    consumed,
                )
            } else if let Some(opening) = parse_container_opening(line) {
                let (end, closed) = find_container_end(lines, i);
                if !closed {
                    log::debug!("container at line {} closed at end of input", line_no);
                    self.diagnostics.push(Diagnostic::UnclosedContainer {
                        location: SourceLocation::new(line_no),
                        kind: opening.kind.as_str().to_string(),
                    });
                }
                let children = self.classify_lines(&lines[i + 1..end], line_no + 1, depth + 1);
                let consumed = if closed { end + 1 - i } else { end - i };
                (Some(Block::Container { opening, children }), consumed)
            } else if is_container_closer(line) {
                log::debug!("stray container closer at line {}", line_no);
                (None, 1)
            } else if is_toc_macro(line) {
                (Some(Block::TocMacro), 1)
            } else if let Some((level, raw)) = parse_atx_heading(line) {
                (Some(heading_block(level, raw)), 1)
            } else if let Some((kind, title)) = parse_alert_marker(line) {
                let end = quote_end(lines, i);
                let inner: Vec<&str> = lines[i + 1..end]
                    .iter()
                    .filter_map(|l| strip_quote_prefix(l))
                    .collect();
                let children = self.classify_lines(&inner, line_no + 1, depth + 1);
                (
                    Some(Block::Alert {
                        kind,
                        title,
                        children,
                    }),
                    end - i,
                )
            } else if strip_quote_prefix(line).is_some() {
                let end = quote_end(lines, i);
                let inner: Vec<&str> = lines[i..end]
                    .iter()
                    .filter_map(|l| strip_quote_prefix(l))
                    .collect();
                let children = self.classify_lines(&inner, line_no, depth + 1);
                (Some(Block::Quote { children }), end - i)
            } else if is_thematic_break(line) {
                (Some(Block::ThematicBreak), 1)
            } else if starts_table(lines, i) {
                let end = table_end(lines, i);
                let source = lines[i..end].join("\n");
                (Some(Block::Table { source }), end - i)
            } else if list_marker(line).is_some() {
                let end = list_end(lines, i);
                let source = lines[i..end].join("\n");
                (Some(Block::List { source }), end - i)
            } else if let Some(end_rule) = html_block_start(line) {
                let end = html_block_end(lines, i, end_rule);
                let html = lines[i..end].join("\n");
                (Some(Block::Raw { html }), end - i)
            } else {
                let end = paragraph_end(lines, i);
                let text = lines[i..end]
                    .iter()
                    .map(|l| l.trim_start())
                    .collect::<Vec<_>>()
                    .join("\n");
                (Some(Block::Paragraph { text }), end - i)
            };

            if let Some(block) = block {
                ids.push(self.tree.push(block, line_no));
            }
            i += consumed.max(1);
        }
        ids
    }
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let strip = line
        .bytes()
        .take(indent)
        .take_while(|&b| b == b' ')
        .count();
    &line[strip..]
}

/// Returns (index of the closing line or `lines.len()`, whether it closed).
fn find_fence_end(
    lines: &[&str],
    start: usize,
    opening: &FenceOpening,
) -> (usize, bool) {
    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        if closes_fence(line, opening) {
            return (j, true);
        }
    }
    (lines.len(), false)
}

/// Finds the closer matching the container opened at `start`, counting
/// nested openers of any kind and ignoring colons inside fences.
fn find_container_end(lines: &[&str], start: usize) -> (usize, bool) {
    let mut depth = 1usize;
    let mut fence = FenceTracker::new();
    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        if fence.advance(line).is_fenced() {
            continue;
        }
        if opens_any_container(line) {
            depth += 1;
        } else if is_container_closer(line) {
            depth -= 1;
            if depth == 0 {
                return (j, true);
            }
        }
    }
    (lines.len(), false)
}

fn quote_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() && strip_quote_prefix(lines[end]).is_some() {
        end += 1;
    }
    end
}

/// Parses `#` .. `######` headings, returning the level and the content with
/// any closing `#` run removed.
fn parse_atx_heading(line: &str) -> Option<(u8, &str)> {
    let (indent, offset) = leading_whitespace_info(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[offset..];
    let level = rest.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let content = &rest[level..];
    if !content.is_empty() && !content.starts_with([' ', '\t']) {
        return None;
    }
    let content = content.trim();
    let without_closing = content.trim_end_matches('#');
    let content = if without_closing.is_empty() {
        ""
    } else if without_closing.ends_with([' ', '\t']) {
        without_closing.trim_end()
    } else {
        content
    };
    Some((level as u8, content))
}

fn heading_block(level: u8, raw: &str) -> Block {
    let (raw, toc_ignore) = extract_toc_ignore(raw);
    let (text, custom_id) = extract_custom_id(raw);
    Block::Heading {
        level,
        text: text.trim().to_string(),
        custom_id: custom_id.map(str::to_string),
        toc_ignore,
    }
}

fn is_thematic_break(line: &str) -> bool {
    let (indent, offset) = leading_whitespace_info(line);
    if indent > 3 {
        return false;
    }
    let mut marks = line[offset..].chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// Returns the content column of a list item marker line.
fn list_marker(line: &str) -> Option<usize> {
    let (indent, offset) = leading_whitespace_info(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[offset..];
    let marker_len = match rest.as_bytes().first().copied()? {
        b'-' | b'*' | b'+' => 1,
        b'0'..=b'9' => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 9 || !matches!(rest.as_bytes().get(digits).copied(), Some(b'.' | b')')) {
                return None;
            }
            digits + 1
        }
        _ => return None,
    };
    match rest.as_bytes().get(marker_len).copied() {
        None => Some(indent + marker_len),
        Some(b' ' | b'\t') => Some(indent + marker_len + 1),
        _ => None,
    }
}

/// Line text after its list marker, or the trimmed line.
fn list_content(line: &str) -> &str {
    let trimmed = line.trim_start();
    if list_marker(line).is_none() {
        return trimmed;
    }
    let marker = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |pos| pos + 1);
    trimmed[marker..].trim_start()
}

fn list_end(lines: &[&str], start: usize) -> usize {
    let mut fence = FenceTracker::new();
    fence.advance(list_content(lines[start]));
    let mut end = start + 1;
    while end < lines.len() {
        let line = lines[end];
        if fence.is_open() {
            fence.advance(list_content(line));
            end += 1;
            continue;
        }
        if line.trim().is_empty() {
            let next = lines[end..].iter().position(|l| !l.trim().is_empty());
            match next.map(|offset| lines[end + offset]) {
                Some(next) if leading_whitespace_info(next).0 >= 2 || list_marker(next).is_some() => {
                    end += 1;
                    continue;
                }
                _ => break,
            }
        }
        let indented = leading_whitespace_info(line).0 >= 2;
        let lazy = !lines[end - 1].trim().is_empty() && !interrupts_paragraph(lines, end);
        if is_thematic_break(line) && !indented {
            break;
        }
        if indented || list_marker(line).is_some() || lazy {
            fence.advance(list_content(line));
            end += 1;
            continue;
        }
        break;
    }
    while end > start + 1 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    end
}

fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.contains('-') {
        return false;
    }
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').all(|cell| {
        let cell = cell.trim();
        let cell = cell.strip_prefix(':').unwrap_or(cell);
        let cell = cell.strip_suffix(':').unwrap_or(cell);
        !cell.is_empty() && cell.bytes().all(|b| b == b'-')
    })
}

fn starts_table(lines: &[&str], i: usize) -> bool {
    lines[i].contains('|')
        && leading_whitespace_info(lines[i]).0 <= 3
        && lines.get(i + 1).is_some_and(|next| is_table_separator(next))
}

fn table_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 2;
    while end < lines.len() && !lines[end].trim().is_empty() && lines[end].contains('|') {
        end += 1;
    }
    end
}

/// How a raw HTML block ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HtmlBlockEnd {
    /// On the line containing `-->`.
    Comment,
    /// On the line containing `</tag>`.
    ClosingTag(&'static str),
    /// Before the next blank line.
    BlankLine,
}

fn html_block_start(line: &str) -> Option<HtmlBlockEnd> {
    if leading_whitespace_info(line).0 > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    if trimmed.starts_with("<!--") {
        return Some(HtmlBlockEnd::Comment);
    }
    let rest = trimmed.strip_prefix('<')?;
    let closing = rest.starts_with('/');
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let name_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let name = &rest[..name_len];
    let after = rest[name_len..].chars().next();

    if !closing
        && matches!(after, None | Some(' ' | '\t' | '>'))
        && let Some(tag) = HTML_RAW_TEXT_TAGS
            .iter()
            .find(|tag| tag.eq_ignore_ascii_case(name))
    {
        return Some(HtmlBlockEnd::ClosingTag(tag));
    }
    let is_block_tag = HTML_BLOCK_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(name));
    (is_block_tag && matches!(after, None | Some(' ' | '\t' | '>' | '/')))
        .then_some(HtmlBlockEnd::BlankLine)
}

/// Exclusive end of the HTML block opened at `start`.
fn html_block_end(lines: &[&str], start: usize, end_rule: HtmlBlockEnd) -> usize {
    let closes = |line: &str, first: bool| -> bool {
        match end_rule {
            HtmlBlockEnd::Comment => {
                let scan = if first {
                    line.find("<!--").map_or(line, |pos| &line[pos + 4..])
                } else {
                    line
                };
                scan.contains("-->")
            }
            HtmlBlockEnd::ClosingTag(tag) => line
                .to_ascii_lowercase()
                .contains(&format!("</{}>", tag)),
            HtmlBlockEnd::BlankLine => false,
        }
    };

    if end_rule == HtmlBlockEnd::BlankLine {
        let mut end = start + 1;
        while end < lines.len() && !lines[end].trim().is_empty() {
            end += 1;
        }
        return end;
    }
    for (j, line) in lines.iter().enumerate().skip(start) {
        if closes(line, j == start) {
            return j + 1;
        }
    }
    lines.len()
}

/// Whether line `i` starts a block that ends a running paragraph.
fn interrupts_paragraph(lines: &[&str], i: usize) -> bool {
    let line = lines[i];
    parse_fence_opening(line).is_some()
        || parse_container_opening(line).is_some()
        || is_container_closer(line)
        || is_toc_macro(line)
        || parse_atx_heading(line).is_some()
        || strip_quote_prefix(line).is_some()
        || is_thematic_break(line)
        || list_marker(line).is_some_and(|column| line.trim_end().len() > column)
        || html_block_start(line).is_some()
        || starts_table(lines, i)
}

fn paragraph_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() && !lines[end].trim().is_empty() && !interrupts_paragraph(lines, end) {
        end += 1;
    }
    end
}

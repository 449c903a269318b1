//! Heading slugs and table of contents.
//!
//! Slugs are assigned in two phases over the whole document: custom
//! `{#id}` anchors are reserved first, then auto slugs are claimed in
//! document order. A `[[toc]]` macro can therefore list headings that come
//! after it.

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use mdpress_core::{RenderOptions, Slugger};

use crate::blocks::{Block, BlockId, BlockTree};
use crate::inline::{plain_text, render_inline, render_label};

/// A heading listed in the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingEntry {
    /// Heading level, 1-6.
    pub level: u8,
    /// Rendered inline HTML of the heading text.
    pub html: String,
    /// Plain text of the heading.
    pub text: String,
    /// Unique anchor id.
    pub slug: String,
    /// Position among collected headings, in source order.
    pub index: usize,
    /// Link-free rendering used inside TOC links.
    #[serde(skip)]
    pub label: String,
}

/// Anchor ids for every heading block, including toc-ignored ones.
#[derive(Debug, Clone, Default)]
pub struct HeadingSlugs {
    by_block: HashMap<BlockId, String>,
}

impl HeadingSlugs {
    /// Slug assigned to a heading block.
    pub fn get(&self, id: BlockId) -> Option<&str> {
        self.by_block.get(&id).map(String::as_str)
    }
}

/// Assigns a unique slug to every heading in the tree.
///
/// The first heading using a custom anchor keeps it verbatim. A repeated
/// custom anchor, and any auto slug that collides, gets `-2`, `-3`, ...
pub fn assign_slugs(tree: &BlockTree) -> HeadingSlugs {
    let headings: Vec<(BlockId, &str, Option<&str>)> = tree
        .walk()
        .into_iter()
        .filter_map(|id| match tree.get(id) {
            Block::Heading {
                text, custom_id, ..
            } => Some((id, text.as_str(), custom_id.as_deref())),
            _ => None,
        })
        .collect();

    let mut slugger = Slugger::new();
    let mut reserved: HashMap<BlockId, String> = HashMap::new();
    for (id, _, custom) in &headings {
        if let Some(custom) = custom
            && slugger.reserve(custom)
        {
            reserved.insert(*id, custom.to_string());
        }
    }

    let mut by_block = HashMap::with_capacity(headings.len());
    for (id, text, custom) in headings {
        let slug = match (reserved.remove(&id), custom) {
            (Some(slug), _) => slug,
            (None, Some(custom)) => {
                log::debug!("custom anchor {:?} repeats, suffixing", custom);
                slugger.claim(custom)
            }
            (None, None) => slugger.next_slug(text),
        };
        by_block.insert(id, slug);
    }
    HeadingSlugs { by_block }
}

/// Collects TOC-eligible headings (all headings not marked `toc-ignore`).
pub fn collect_headings(tree: &BlockTree, slugs: &HeadingSlugs) -> Vec<HeadingEntry> {
    let mut entries = Vec::new();
    for id in tree.walk() {
        let Block::Heading {
            level,
            text,
            toc_ignore: false,
            ..
        } = tree.get(id)
        else {
            continue;
        };
        let Some(slug) = slugs.get(id) else {
            continue;
        };
        entries.push(HeadingEntry {
            level: *level,
            html: render_inline(text),
            text: plain_text(text),
            slug: slug.to_string(),
            index: entries.len(),
            label: render_label(text),
        });
    }
    entries
}

/// TOC filtering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocConfig {
    /// Shallowest level listed.
    pub min_depth: u8,
    /// Deepest level listed.
    pub max_depth: u8,
    /// Heading texts to leave out; `/.../` entries are regexes.
    pub exclude: Vec<String>,
    /// Title shown above the list.
    pub title: String,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self::from_options(&RenderOptions::default())
    }
}

impl TocConfig {
    /// Builds the TOC config from render options.
    pub fn from_options(options: &RenderOptions) -> Self {
        let (min_depth, max_depth) = options.toc_depth_range();
        Self {
            min_depth,
            max_depth,
            exclude: options.toc_exclude.clone(),
            title: options.toc_title.clone(),
        }
    }
}

enum Exclude {
    Exact(String),
    Pattern(Regex),
}

impl Exclude {
    fn parse(pattern: &str) -> Self {
        if pattern.len() > 2
            && let Some(body) = pattern.strip_prefix('/').and_then(|p| p.strip_suffix('/'))
        {
            match Regex::new(body) {
                Ok(re) => return Exclude::Pattern(re),
                Err(e) => log::warn!("invalid TOC exclude pattern {:?}: {}", pattern, e),
            }
        }
        Exclude::Exact(pattern.to_string())
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Exclude::Exact(exact) => exact == text,
            Exclude::Pattern(re) => re.is_match(text),
        }
    }
}

/// A TOC entry with its nested entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    /// The heading.
    pub entry: HeadingEntry,
    /// Deeper headings under it.
    pub children: Vec<TocNode>,
}

/// Filters entries by depth and exclusion and nests them by level.
///
/// Each entry nests under the nearest preceding entry with a smaller level;
/// an entry with no such predecessor is a root.
pub fn build_toc(entries: &[HeadingEntry], config: &TocConfig) -> Vec<TocNode> {
    let excludes: Vec<Exclude> = config.exclude.iter().map(|p| Exclude::parse(p)).collect();
    let mut roots: Vec<TocNode> = Vec::new();
    let mut levels: Vec<u8> = Vec::new();
    let mut path: Vec<usize> = Vec::new();

    let selected = entries.iter().filter(|entry| {
        (config.min_depth..=config.max_depth).contains(&entry.level)
            && !excludes.iter().any(|ex| ex.matches(&entry.text))
    });
    for entry in selected {
        while levels.last().is_some_and(|&top| top >= entry.level) {
            levels.pop();
            path.pop();
        }
        let siblings = children_at(&mut roots, &path);
        siblings.push(TocNode {
            entry: entry.clone(),
            children: Vec::new(),
        });
        path.push(siblings.len() - 1);
        levels.push(entry.level);
    }
    roots
}

fn children_at<'a>(roots: &'a mut Vec<TocNode>, path: &[usize]) -> &'a mut Vec<TocNode> {
    let mut list = roots;
    for &index in path {
        list = &mut list[index].children;
    }
    list
}

/// Renders a TOC tree. An empty tree still yields the wrapper and list.
pub fn render_toc(nodes: &[TocNode], title: &str) -> String {
    let mut html = format!(
        "<nav class=\"table-of-contents\" aria-label=\"{}\"><div class=\"toc-title\">{}</div><ul class=\"toc-list\">",
        html_escape::encode_double_quoted_attribute(title),
        html_escape::encode_text(title)
    );
    render_items(nodes, &mut html);
    html.push_str("</ul></nav>");
    html
}

fn render_items(nodes: &[TocNode], html: &mut String) {
    for node in nodes {
        let entry = &node.entry;
        html.push_str(&format!(
            "<li class=\"toc-item toc-level-{}\"><a href=\"#{}\" class=\"toc-link\">{}</a>",
            entry.level,
            html_escape::encode_double_quoted_attribute(&entry.slug),
            entry.label
        ));
        if !node.children.is_empty() {
            html.push_str("<ul class=\"toc-sublist\">");
            render_items(&node.children, html);
            html.push_str("</ul>");
        }
        html.push_str("</li>");
    }
}

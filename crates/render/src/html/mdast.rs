//! Lists and tables through markdown-rs.
//!
//! markdown-rs supplies the structure (items, nesting, tightness, task
//! checks, table alignment). Text is sliced back out of the source by node
//! position and sent through the inline pass, so list items and table
//! cells get the same micro-syntax as paragraphs.

use markdown::mdast::{AlignKind, Code, List, ListItem, Node, Table, TableRow};
use once_cell::sync::Lazy;
use regex::Regex;

use mdpress_core::{PressError, RenderOptions};

use crate::code::highlight::Highlighter;
use crate::code::{CodeBlockSpec, render_code_block};
use crate::inline::render_inline;

static TASK_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[ xX]\]\s*").expect("task marker pattern is valid"));

struct MdastRenderer<'a> {
    source: &'a str,
    options: &'a RenderOptions,
    highlighter: &'a dyn Highlighter,
    out: String,
}

/// Parses a list or table block and renders it.
pub(super) fn render_markdown(
    source: &str,
    options: &RenderOptions,
    highlighter: &dyn Highlighter,
) -> Result<String, PressError> {
    let tree = markdown::to_mdast(source, &markdown::ParseOptions::gfm())
        .map_err(|e| PressError::Markdown(e.to_string()))?;
    let mut renderer = MdastRenderer {
        source,
        options,
        highlighter,
        out: String::new(),
    };
    if let Some(children) = tree.children() {
        for child in children {
            renderer.render_block(child, false)?;
        }
    }
    Ok(renderer.out)
}

impl MdastRenderer<'_> {
    /// Source text covered by a node.
    fn slice(&self, node: &Node) -> &str {
        node.position()
            .and_then(|p| self.source.get(p.start.offset..p.end.offset))
            .unwrap_or_default()
    }

    /// Source text spanned by a node's children.
    fn children_slice(&self, children: &[Node]) -> &str {
        let start = children.first().and_then(Node::position);
        let end = children.last().and_then(Node::position);
        match (start, end) {
            (Some(start), Some(end)) => self
                .source
                .get(start.start.offset..end.end.offset)
                .unwrap_or_default(),
            _ => "",
        }
    }

    fn inline(&self, text: &str) -> String {
        let joined = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        render_inline(&joined)
    }

    fn render_block(&mut self, node: &Node, tight: bool) -> Result<(), PressError> {
        match node {
            Node::List(list) => self.render_list(list)?,
            Node::Table(table) => self.render_table(table),
            Node::Code(code) => self.render_code(code)?,
            Node::Paragraph(para) => {
                let html = self.inline(self.children_slice(&para.children));
                if tight {
                    self.out.push_str(&html);
                } else {
                    self.out.push_str(&format!("<p>{}</p>", html));
                }
            }
            Node::Html(html) => self.out.push_str(&html.value),
            Node::ThematicBreak(_) => self.out.push_str("<hr>"),
            Node::Heading(heading) => {
                let html = self.inline(self.children_slice(&heading.children));
                self.out
                    .push_str(&format!("<h{0}>{1}</h{0}>", heading.depth, html));
            }
            Node::Blockquote(quote) => {
                self.out.push_str("<blockquote>");
                for child in &quote.children {
                    self.render_block(child, false)?;
                }
                self.out.push_str("</blockquote>");
            }
            other => {
                let html = self.inline(self.slice(other));
                if !html.is_empty() {
                    self.out.push_str(&format!("<p>{}</p>", html));
                }
            }
        }
        Ok(())
    }

    fn render_list(&mut self, list: &List) -> Result<(), PressError> {
        let tag = if list.ordered { "ol" } else { "ul" };
        match list.start {
            Some(start) if list.ordered && start != 1 => {
                self.out.push_str(&format!("<ol start=\"{}\">", start));
            }
            _ => self.out.push_str(&format!("<{}>", tag)),
        }
        for child in &list.children {
            if let Node::ListItem(item) = child {
                self.render_list_item(item, !list.spread)?;
            }
        }
        self.out.push_str(&format!("</{}>", tag));
        Ok(())
    }

    fn render_list_item(&mut self, item: &ListItem, tight: bool) -> Result<(), PressError> {
        let tight = tight && !item.spread;
        let Some(checked) = item.checked else {
            self.out.push_str("<li>");
            for child in &item.children {
                self.render_block(child, tight)?;
            }
            self.out.push_str("</li>");
            return Ok(());
        };

        let checked_attr = if checked { " checked" } else { "" };
        self.out.push_str(&format!(
            "<li class=\"task-list-item\"><label><input type=\"checkbox\" disabled{}/><span>",
            checked_attr
        ));
        let mut rest = item.children.iter();
        if let Some(Node::Paragraph(para)) = item.children.first() {
            rest.next();
            let text = self.children_slice(&para.children);
            let text = TASK_MARKER_RE.replace(text.trim_start(), "");
            let html = self.inline(&text);
            self.out.push_str(&html);
        }
        self.out.push_str("</span></label>");
        for child in rest {
            self.render_block(child, tight)?;
        }
        self.out.push_str("</li>");
        Ok(())
    }

    fn render_code(&mut self, code: &Code) -> Result<(), PressError> {
        let info = match (&code.lang, &code.meta) {
            (Some(lang), Some(meta)) => format!("{} {}", lang, meta),
            (Some(lang), None) => lang.clone(),
            (None, _) => String::new(),
        };
        let spec = CodeBlockSpec::parse(&info, &code.value, self.options.line_numbers);
        let html = render_code_block(
            &spec,
            self.highlighter,
            self.options.line_number_default_start,
        )?;
        self.out.push_str(&html);
        Ok(())
    }

    fn render_table(&mut self, table: &Table) {
        self.out
            .push_str("<div class=\"table-responsive\"><table class=\"enhanced-table\">");
        let mut rows = table.children.iter().filter_map(|row| match row {
            Node::TableRow(row) => Some(row),
            _ => None,
        });
        if let Some(header) = rows.next() {
            self.out.push_str("<thead>");
            self.render_row(header, true, &table.align);
            self.out.push_str("</thead>");
        }
        let body: Vec<&TableRow> = rows.collect();
        if !body.is_empty() {
            self.out.push_str("<tbody>");
            for row in body {
                self.render_row(row, false, &table.align);
            }
            self.out.push_str("</tbody>");
        }
        self.out.push_str("</table></div>");
    }

    fn render_row(&mut self, row: &TableRow, is_header: bool, aligns: &[AlignKind]) {
        let tag = if is_header { "th" } else { "td" };
        self.out.push_str("<tr>");
        for (i, cell) in row.children.iter().enumerate() {
            let Node::TableCell(cell) = cell else {
                continue;
            };
            let align_attr = match aligns.get(i) {
                Some(AlignKind::Left) => " style=\"text-align: left\"",
                Some(AlignKind::Right) => " style=\"text-align: right\"",
                Some(AlignKind::Center) => " style=\"text-align: center\"",
                Some(AlignKind::None) | None => "",
            };
            let html = self.inline(self.children_slice(&cell.children));
            self.out
                .push_str(&format!("<{tag}{align_attr}>{html}</{tag}>"));
        }
        self.out.push_str("</tr>");
    }
}

//! Block tree to HTML.
//!
//! # Module Structure
//!
//! - `mdast` - lists and tables, parsed with markdown-rs
//! - `post` - lol_html pass over the finished fragment

mod mdast;
pub mod post;

use mdpress_core::{AlertKind, ContainerKind, ContainerOpening, PressError, RenderOptions};

use crate::blocks::{Block, BlockId, BlockTree};
use crate::code::highlight::Highlighter;
use crate::code::{CodeBlockSpec, render_code_block};
use crate::inline::render_inline;
use crate::toc::HeadingSlugs;

/// Rendering state for one document.
pub struct Context<'a> {
    tree: &'a BlockTree,
    slugs: &'a HeadingSlugs,
    toc_html: &'a str,
    options: &'a RenderOptions,
    highlighter: &'a dyn Highlighter,
    code_groups: usize,
    out: String,
}

impl<'a> Context<'a> {
    /// Creates a context. `toc_html` replaces every `[[toc]]` macro.
    pub fn new(
        tree: &'a BlockTree,
        slugs: &'a HeadingSlugs,
        toc_html: &'a str,
        options: &'a RenderOptions,
        highlighter: &'a dyn Highlighter,
    ) -> Self {
        Self {
            tree,
            slugs,
            toc_html,
            options,
            highlighter,
            code_groups: 0,
            out: String::new(),
        }
    }

    /// Renders every top-level block and returns the fragment.
    pub fn render(mut self) -> Result<String, PressError> {
        let roots = self.tree.roots();
        self.render_blocks(roots)?;
        Ok(self.out)
    }

    fn push_raw(&mut self, html: &str) {
        self.out.push_str(html);
    }

    fn render_blocks(&mut self, ids: &[BlockId]) -> Result<(), PressError> {
        for &id in ids {
            self.render_block(id)?;
        }
        Ok(())
    }

    fn render_block(&mut self, id: BlockId) -> Result<(), PressError> {
        let tree = self.tree;
        match tree.get(id) {
            Block::Heading { level, text, .. } => self.render_heading(id, *level, text),
            Block::Paragraph { text } => {
                let html = format!("<p>{}</p>", render_inline(text));
                self.push_raw(&html);
            }
            Block::Literal { text } => {
                let html = format!("<p>{}</p>", html_escape::encode_text(text));
                self.push_raw(&html);
            }
            Block::List { source } | Block::Table { source } => {
                let html = mdast::render_markdown(source, self.options, self.highlighter)?;
                self.push_raw(&html);
            }
            Block::Container { opening, children } => {
                self.render_container(opening, children)?;
            }
            Block::Alert {
                kind,
                title,
                children,
            } => {
                self.render_alert(*kind, title.as_deref(), children)?;
            }
            Block::Quote { children } => {
                self.push_raw("<blockquote>");
                self.render_blocks(children)?;
                self.push_raw("</blockquote>");
            }
            Block::CodeBlock { info, body } => {
                let html = self.code_html(info, body)?;
                self.push_raw(&html);
            }
            Block::TocMacro => {
                let toc = self.toc_html;
                self.push_raw(toc);
            }
            Block::Raw { html } => self.push_raw(html),
            Block::ThematicBreak => self.push_raw("<hr>"),
        }
        Ok(())
    }

    fn code_html(&self, info: &str, body: &str) -> Result<String, PressError> {
        let spec = CodeBlockSpec::parse(info, body, self.options.line_numbers);
        render_code_block(
            &spec,
            self.highlighter,
            self.options.line_number_default_start,
        )
    }

    fn render_heading(&mut self, id: BlockId, level: u8, text: &str) {
        let content = render_inline(text);
        let Some(slug) = self.slugs.get(id) else {
            self.push_raw(&format!("<h{level}>{content}</h{level}>"));
            return;
        };
        let slug = html_escape::encode_double_quoted_attribute(slug).into_owned();
        let mut html = format!("<h{level} id=\"{slug}\">{content}");
        if self.options.heading_anchors {
            html.push_str(&format!(
                " <a class=\"header-anchor\" href=\"#{slug}\" aria-hidden=\"true\">#</a>"
            ));
        }
        html.push_str(&format!("</h{level}>"));
        self.push_raw(&html);
    }

    fn render_container(
        &mut self,
        opening: &ContainerOpening,
        children: &[BlockId],
    ) -> Result<(), PressError> {
        match opening.kind {
            ContainerKind::CodeGroup => return self.render_code_group(children),
            ContainerKind::Raw => {
                self.push_raw("<div class=\"vp-raw\">");
                self.render_blocks(children)?;
                self.push_raw("</div>");
            }
            ContainerKind::Details => {
                let title = render_inline(opening.resolved_title());
                self.push_raw(&format!(
                    "<details class=\"custom-block details\"><summary>{}</summary>",
                    title
                ));
                self.render_blocks(children)?;
                self.push_raw("</details>");
            }
            kind @ (ContainerKind::Info
            | ContainerKind::Tip
            | ContainerKind::Warning
            | ContainerKind::Danger) => {
                let title = render_inline(opening.resolved_title());
                self.push_raw(&format!(
                    "<div class=\"custom-block {}\"><p class=\"custom-block-title\">{}</p>",
                    kind.as_str(),
                    title
                ));
                self.render_blocks(children)?;
                self.push_raw("</div>");
            }
        }
        Ok(())
    }

    fn render_code_group(&mut self, children: &[BlockId]) -> Result<(), PressError> {
        self.code_groups += 1;
        let group_id = format!("code-group-{}", self.code_groups);

        let mut tabs = String::new();
        let mut panels = String::new();
        let mut index = 0usize;
        for &child in children {
            let Block::CodeBlock { info, body } = self.tree.get(child) else {
                log::debug!(
                    "skipping non-code block at line {} inside {}",
                    self.tree.line(child),
                    group_id
                );
                continue;
            };
            let spec = CodeBlockSpec::parse(info, body, self.options.line_numbers);
            let label = match (&spec.label, spec.lang.is_empty()) {
                (Some(label), _) => label.clone(),
                (None, false) => spec.lang.clone(),
                (None, true) => format!("Tab {}", index + 1),
            };
            let code = render_code_block(
                &spec,
                self.highlighter,
                self.options.line_number_default_start,
            )?;
            let active = if index == 0 { " active" } else { "" };
            tabs.push_str(&format!(
                "<button class=\"code-group-tab{active}\" role=\"tab\" data-tab=\"{index}\" aria-controls=\"{group_id}-panel-{index}\" aria-selected=\"{}\">{}</button>",
                index == 0,
                html_escape::encode_text(&label)
            ));
            panels.push_str(&format!(
                "<div class=\"code-group-panel{active}\" id=\"{group_id}-panel-{index}\" data-panel=\"{index}\" role=\"tabpanel\">{code}</div>"
            ));
            index += 1;
        }

        self.push_raw(&format!(
            "<div class=\"code-group\" id=\"{group_id}\"><div class=\"code-group-tabs\" role=\"tablist\">{tabs}</div><div class=\"code-group-panels\">{panels}</div></div>"
        ));
        Ok(())
    }

    fn render_alert(
        &mut self,
        kind: AlertKind,
        title: Option<&str>,
        children: &[BlockId],
    ) -> Result<(), PressError> {
        let title = title
            .map(render_inline)
            .unwrap_or_else(|| kind.default_title().to_string());
        self.push_raw(&format!(
            "<div class=\"github-alert github-alert-{}\"><p class=\"github-alert-title\">{}<span>{}</span></p><div class=\"github-alert-content\">",
            kind.as_str(),
            alert_icon(kind),
            title
        ));
        self.render_blocks(children)?;
        self.push_raw("</div></div>");
        Ok(())
    }
}

fn alert_icon(kind: AlertKind) -> String {
    let path = match kind {
        AlertKind::Note => {
            "M0 8a8 8 0 1 1 16 0A8 8 0 0 1 0 8Zm8-6.5a6.5 6.5 0 1 0 0 13 6.5 6.5 0 0 0 0-13ZM6.5 7.75A.75.75 0 0 1 7.25 7h1a.75.75 0 0 1 .75.75v2.75h.25a.75.75 0 0 1 0 1.5h-2a.75.75 0 0 1 0-1.5h.25v-2h-.25a.75.75 0 0 1-.75-.75ZM8 6a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z"
        }
        AlertKind::Tip => {
            "M8 1.5c-2.363 0-4 1.69-4 3.75 0 .984.424 1.625.984 2.304l.214.253c.223.264.47.556.673.848.284.411.537.896.621 1.49a.75.75 0 0 1-1.484.211c-.04-.282-.163-.547-.37-.847a8.456 8.456 0 0 0-.542-.68c-.084-.1-.173-.205-.268-.32C3.201 7.75 2.5 6.766 2.5 5.25 2.5 2.31 4.863 0 8 0s5.5 2.31 5.5 5.25c0 1.516-.701 2.5-1.328 3.259-.095.115-.184.22-.268.319-.207.245-.383.453-.541.681-.208.3-.33.565-.37.847a.751.751 0 0 1-1.485-.212c.084-.593.337-1.078.621-1.489.203-.292.45-.584.673-.848.075-.088.147-.173.213-.253.561-.679.985-1.32.985-2.304 0-2.06-1.637-3.75-4-3.75ZM5.75 12h4.5a.75.75 0 0 1 0 1.5h-4.5a.75.75 0 0 1 0-1.5ZM6 15.25a.75.75 0 0 1 .75-.75h2.5a.75.75 0 0 1 0 1.5h-2.5a.75.75 0 0 1-.75-.75Z"
        }
        AlertKind::Important => {
            "M0 1.75C0 .784.784 0 1.75 0h12.5C15.216 0 16 .784 16 1.75v9.5A1.75 1.75 0 0 1 14.25 13H8.06l-2.573 2.573A1.458 1.458 0 0 1 3 14.543V13H1.75A1.75 1.75 0 0 1 0 11.25Zm1.75-.25a.25.25 0 0 0-.25.25v9.5c0 .138.112.25.25.25h2a.75.75 0 0 1 .75.75v2.19l2.72-2.72a.749.749 0 0 1 .53-.22h6.5a.25.25 0 0 0 .25-.25v-9.5a.25.25 0 0 0-.25-.25Zm7 2.25v2.5a.75.75 0 0 1-1.5 0v-2.5a.75.75 0 0 1 1.5 0ZM9 9a1 1 0 1 1-2 0 1 1 0 0 1 2 0Z"
        }
        AlertKind::Warning => {
            "M6.457 1.047c.659-1.234 2.427-1.234 3.086 0l6.082 11.378A1.75 1.75 0 0 1 14.082 15H1.918a1.75 1.75 0 0 1-1.543-2.575Zm1.763.707a.25.25 0 0 0-.44 0L1.698 13.132a.25.25 0 0 0 .22.368h12.164a.25.25 0 0 0 .22-.368Zm.53 3.996v2.5a.75.75 0 0 1-1.5 0v-2.5a.75.75 0 0 1 1.5 0ZM9 11a1 1 0 1 1-2 0 1 1 0 0 1 2 0Z"
        }
        AlertKind::Caution => {
            "M4.47.22A.749.749 0 0 1 5 0h6c.199 0 .389.079.53.22l4.25 4.25c.141.14.22.331.22.53v6a.749.749 0 0 1-.22.53l-4.25 4.25A.749.749 0 0 1 11 16H5a.749.749 0 0 1-.53-.22L.22 11.53A.749.749 0 0 1 0 11V5c0-.199.079-.389.22-.53Zm.84 1.28L1.5 5.31v5.38l3.81 3.81h5.38l3.81-3.81V5.31L10.69 1.5ZM8 4a.75.75 0 0 1 .75.75v3.5a.75.75 0 0 1-1.5 0v-3.5A.75.75 0 0 1 8 4Zm0 8a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z"
        }
    };
    format!(
        "<svg class=\"github-alert-icon\" viewBox=\"0 0 16 16\" width=\"16\" height=\"16\" aria-hidden=\"true\"><path d=\"{}\"></path></svg>",
        path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::classify;
    use crate::code::highlight::PlainHighlighter;
    use crate::toc::assign_slugs;

    fn render_with(text: &str, options: &RenderOptions) -> String {
        let (tree, _) = classify(text);
        let slugs = assign_slugs(&tree);
        Context::new(&tree, &slugs, "<nav></nav>", options, &PlainHighlighter)
            .render()
            .unwrap()
    }

    fn render(text: &str) -> String {
        render_with(text, &RenderOptions::default())
    }

    #[test]
    fn info_container_defaults_title() {
        assert_eq!(
            render("::: info\nHello **world**\n:::"),
            "<div class=\"custom-block info\"><p class=\"custom-block-title\">INFO</p><p>Hello <strong>world</strong></p></div>"
        );
    }

    #[test]
    fn details_and_raw() {
        assert_eq!(
            render("::: details Click *me*\nhidden\n:::"),
            "<details class=\"custom-block details\"><summary>Click <em>me</em></summary><p>hidden</p></details>"
        );
        assert_eq!(
            render("::: raw\n<div>kept</div>\n:::"),
            "<div class=\"vp-raw\"><div>kept</div></div>"
        );
    }

    #[test]
    fn heading_ids_and_anchors() {
        assert_eq!(render("## Title {#custom}"), "<h2 id=\"custom\">Title</h2>");
        let options = RenderOptions {
            heading_anchors: true,
            ..RenderOptions::default()
        };
        assert_eq!(
            render_with("### A `b`", &options),
            "<h3 id=\"a-b\">A <code>b</code> <a class=\"header-anchor\" href=\"#a-b\" aria-hidden=\"true\">#</a></h3>"
        );
    }

    #[test]
    fn alert_shape() {
        let html = render("> [!TIP]\n> Use `cargo`.");
        assert!(html.starts_with("<div class=\"github-alert github-alert-tip\"><p class=\"github-alert-title\"><svg class=\"github-alert-icon\" viewBox=\"0 0 16 16\""));
        assert!(html.ends_with("<span>Tip</span></p><div class=\"github-alert-content\"><p>Use <code>cargo</code>.</p></div></div>"));
    }

    #[test]
    fn toc_macro_is_substituted_everywhere() {
        assert_eq!(
            render("[[toc]]\n\n::: tip\n[[TOC]]\n:::"),
            "<nav></nav><div class=\"custom-block tip\"><p class=\"custom-block-title\">TIP</p><nav></nav></div>"
        );
    }

    #[test]
    fn code_groups_number_in_order() {
        let text = "::: code-group\n```sh [npm]\nnpm i\n```\n```sh [pnpm]\npnpm add\n```\n:::\n\n::: code-group\n```js\nx\n```\n:::";
        let html = render(text);
        assert!(html.contains("<div class=\"code-group\" id=\"code-group-1\">"));
        assert!(html.contains("<div class=\"code-group\" id=\"code-group-2\">"));
        assert!(html.contains(">npm</button>"));
        assert!(html.contains(
            "<button class=\"code-group-tab\" role=\"tab\" data-tab=\"1\" aria-controls=\"code-group-1-panel-1\" aria-selected=\"false\">pnpm</button>"
        ));
        assert!(html.contains("<div class=\"code-group-panel active\" id=\"code-group-2-panel-0\""));
        assert!(html.contains(">js</button>"));
    }

    #[test]
    fn line_numbers_start_from_configured_default() {
        let options = RenderOptions {
            line_numbers: true,
            line_number_default_start: 10,
            ..RenderOptions::default()
        };
        let html = render_with("```js
a
b
```

```js:line-numbers=3
c
```", &options);
        assert!(html.contains("<span class=\"line\"><span class=\"line-number\">10</span>a</span>"));
        assert!(html.contains("<span class=\"line\"><span class=\"line-number\">11</span>b</span>"));
        assert!(html.contains("<span class=\"line\"><span class=\"line-number\">3</span>c</span>"));
        assert!(!html.contains(">1</span>"));
    }

    #[test]
    fn literal_and_break() {
        assert_eq!(render("a\n\n***\n\nb"), "<p>a</p><hr><p>b</p>");
    }
}

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use mdpress_core::{Diagnostic, Document, FsLoader, RenderOptions, Selector, extract};
use mdpress_render::code::highlight::{HighlightEngine, PlainHighlighter};
use mdpress_render::{RenderOutput, render, render_with_highlighter};

fn plain(text: &str, base: &Path) -> RenderOutput {
    let document = Document::new(text, base);
    render_with_highlighter(&document, &FsLoader, &RenderOptions::default(), &PlainHighlighter)
        .unwrap()
}

#[test]
fn highlighted_line_from_info_string() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain("```js{2}\nconst a = 1\nconst b = 2\n```", dir.path());
    insta::assert_snapshot!(out.html, @r#"
    <pre class="code-block" data-lang="js"><code class="language-js"><span class="line">const a = 1</span>
    <span class="line highlighted">const b = 2</span></code></pre>
    "#);
}

#[test]
fn info_container_with_strong_text() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain("::: info\nThis is **important**\n:::", dir.path());
    insta::assert_snapshot!(out.html, @r#"<div class="custom-block info"><p class="custom-block-title">INFO</p><p>This is <strong>important</strong></p></div>"#);
}

#[test]
fn custom_anchor_replaces_auto_slug() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain("## Title {#custom}", dir.path());
    assert!(out.html.contains("<h2 id=\"custom\">Title</h2>"));
    assert!(!out.html.contains("id=\"title\""));
    assert_eq!(out.headings[0].slug, "custom");
    assert_eq!(out.headings[0].text, "Title");
}

#[test]
fn region_import_renders_as_code() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("snippets")).unwrap();
    fs::write(
        dir.path().join("snippets/example.js"),
        "const skip = 0\n// #region math\nexport const twice = (n) => n * 2\n// #endregion math\n",
    )
    .unwrap();

    let out = plain("<<< @/snippets/example.js#math", dir.path());
    assert!(out.diagnostics.is_empty());
    insta::assert_snapshot!(out.html, @r#"<pre class="code-block" data-lang="javascript"><code class="language-javascript"><span class="line">export const twice = (n) =&gt; n * 2</span></code></pre>"#);
}

#[test]
fn circular_include_terminates_once_each() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.md");
    let b = dir.path().join("b.md");
    fs::write(&a, "Alpha-marker\n\n<!--@include: ./b.md-->\n").unwrap();
    fs::write(&b, "Beta-marker\n\n<!--@include: ./a.md-->\n").unwrap();

    let document = Document::from_path(&a).unwrap();
    let out = mdpress_render::render_document(&document, &FsLoader, &RenderOptions::default())
        .unwrap();
    assert_eq!(out.html.matches("Alpha-marker").count(), 1);
    assert_eq!(out.html.matches("Beta-marker").count(), 1);
    assert!(!out.html.contains("@include"));
    assert!(
        out.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::CycleSkipped { .. }))
    );
}

#[test]
fn missing_include_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain("Before\n\n<!--@include: ./nope.md-->\n\nAfter", dir.path());
    assert_eq!(out.html, "<p>Before</p><p>After</p>");
    assert_eq!(out.diagnostics.len(), 1);
}

#[test]
fn heading_slugs_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let text = "## Setup\n## Setup\n## Other {#setup-2}\n## Setup";
    let out = plain(text, dir.path());
    let slugs: Vec<&str> = out.headings.iter().map(|h| h.slug.as_str()).collect();
    let unique: HashSet<&str> = slugs.iter().copied().collect();
    assert_eq!(unique.len(), slugs.len(), "slugs: {:?}", slugs);
    assert_eq!(slugs, vec!["setup", "setup-3", "setup-2", "setup-4"]);
}

#[test]
fn markers_never_reach_output() {
    let dir = tempfile::tempdir().unwrap();
    let text = "```ts\nold() // [!code --]\nnew() // [!code ++]\nboom() // [!code error]\nmeh() # [!code warning]\n```";
    let out = plain(text, dir.path());
    assert!(!out.html.contains("[!code"));
    assert!(out.html.contains("<span class=\"line diff-remove\">old()</span>"));
    assert!(out.html.contains("<span class=\"line diff-add\">new()</span>"));
    assert!(out.html.contains("<span class=\"line has-error\">boom()</span>"));
    assert!(out.html.contains("has-diff"));
}

#[test]
fn dimmed_only_with_focus() {
    let dir = tempfile::tempdir().unwrap();
    let unfocused = plain("```js\na\nb\n```", dir.path());
    assert!(!unfocused.html.contains("dimmed"));

    let focused = plain("```js\na\nb // [!code focus]\n```", dir.path());
    assert!(focused.html.contains("<span class=\"line dimmed\">a</span>"));
    assert!(focused.html.contains("<span class=\"line focused\">b</span>"));
    assert!(focused.html.contains("has-focused-lines"));
}

#[test]
fn region_extraction_is_idempotent() {
    let source = "top\n// #region demo\nbody line\n// #endregion demo\nbottom";
    let selector = Selector::Region("demo".to_string());
    let once = extract(source, &selector).unwrap();
    let wrapped = format!("// #region demo\n{}\n// #endregion demo", once);
    assert_eq!(extract(&wrapped, &selector).unwrap(), once);
}

#[test]
fn toc_macro_lists_later_headings() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain("[[toc]]\n\n# Doc\n## First\n### Nested\n## Second", dir.path());
    insta::assert_snapshot!(out.html, @r##"<nav class="table-of-contents" aria-label="Table of Contents"><div class="toc-title">Table of Contents</div><ul class="toc-list"><li class="toc-item toc-level-2"><a href="#first" class="toc-link">First</a><ul class="toc-sublist"><li class="toc-item toc-level-3"><a href="#nested" class="toc-link">Nested</a></li></ul></li><li class="toc-item toc-level-2"><a href="#second" class="toc-link">Second</a></li></ul></nav><h1 id="doc">Doc</h1><h2 id="first">First</h2><h3 id="nested">Nested</h3><h2 id="second">Second</h2>"##);
}

#[test]
fn headings_serialize_as_camel_case_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain("## Hello *there*", dir.path());
    assert_eq!(
        out.headings_json().unwrap(),
        r#"[{"level":2,"html":"Hello <em>there</em>","text":"Hello there","slug":"hello-there","index":0}]"#
    );
}

#[test]
fn whole_file_include_keeps_markdown_around_region_markers() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("shared.md"),
        "<!-- #region usage -->\nUse **it**.\n<!-- #endregion -->\n",
    )
    .unwrap();
    let out = plain("<!-- note -->\nHello **world**\n\n<!--@include: ./shared.md-->", dir.path());
    assert_eq!(
        out.html,
        "<!-- note --><p>Hello <strong>world</strong></p><!-- #region usage --><p>Use <strong>it</strong>.</p><!-- #endregion -->"
    );
}

#[test]
fn raw_html_links_are_decorated() {
    let dir = tempfile::tempdir().unwrap();
    let out = plain(
        "<div class=\"card\">\n<a href=\"https://example.com\">Site</a>\n</div>",
        dir.path(),
    );
    assert!(
        out.html
            .contains("<a href=\"https://example.com\" target=\"_blank\" rel=\"noreferrer noopener\">Site<svg")
    );
}

#[test]
fn syntect_engine_colors_and_keeps_line_structure() {
    let dir = tempfile::tempdir().unwrap();
    let out = render(
        "```rust{1}\nfn main() {} // [!code focus]\nlet x = 1;\n```",
        dir.path(),
        &RenderOptions::default(),
    )
    .unwrap();
    assert!(HighlightEngine::is_loaded());
    assert!(out.html.starts_with("<pre class=\"code-block has-focused-lines\" data-lang=\"rust\">"));
    assert!(out.html.contains("<span class=\"line highlighted focused\"><span style="));
    assert!(out.html.contains("<span class=\"line dimmed\">"));
    assert!(!out.html.contains("[!code"));
}

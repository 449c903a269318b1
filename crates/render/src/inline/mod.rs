//! Inline micro-syntax.
//!
//! Runs a fixed sequence of passes over one text run:
//!
//! 1. code spans and backslash escapes are moved to a stash
//! 2. autolinks, links and images become sentinel tokens
//! 3. remaining text is escaped; author HTML tags go to the stash and
//!    `<Badge />` tags become tokens
//! 4. emphasis delimiters (`**`, `__`, `~~`, `==`, `*`, `_`, `~`, `^`)
//! 5. badges, then emoji shortcodes
//! 6. link and image tokens become tags
//! 7. the stash is expanded
//!
//! Stashed and tokenized content is opaque to later passes, so code spans
//! never gain emphasis and URLs never gain emoji.

mod badge;
mod emoji;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub use badge::{Badge, BadgeKind};

const STASH: char = '\u{E000}';
const END: char = '\u{E001}';
const LINK_OPEN: char = '\u{E002}';
const LINK_CLOSE: char = '\u{E003}';
const IMAGE: char = '\u{E004}';
const BADGE: char = '\u{E005}';

/// Links nested in link labels, and images nested in image alt text, past
/// this depth stay plain text.
const MAX_LINK_NESTING: usize = 32;

pub(crate) const EXTERNAL_ICON: &str = r#"<svg class="external-link-icon" xmlns="http://www.w3.org/2000/svg" width="12" height="12" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true"><path d="M18 13v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V8a2 2 0 0 1 2-2h6"></path><polyline points="15 3 21 3 21 9"></polyline><line x1="10" y1="14" x2="21" y2="3"></line></svg>"#;

static AUTOLINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<((?:https?://|mailto:)[^\s<>]+)>").expect("autolink pattern is valid")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:<!--[\s\S]*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s[^<>]*?)?)\s*(/?)>)")
        .expect("tag pattern is valid")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("entity pattern is valid")
});

static EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z0-9_+\-]+):").expect("emoji pattern is valid"));

static STRIP_TAGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("strip tags pattern is valid"));

/// How link and image tokens are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Full HTML.
    Html,
    /// Label text for navigation: links unwrap to their label, images to alt text.
    Label,
}

struct Link {
    href: String,
    title: Option<String>,
}

struct Image {
    src: String,
    alt: String,
    title: Option<String>,
}

#[derive(Default)]
struct InlineState {
    stash: Vec<String>,
    links: Vec<Link>,
    images: Vec<Image>,
    badges: Vec<Badge>,
}

impl InlineState {
    fn stash(&mut self, html: impl Into<String>) -> String {
        self.stash.push(html.into());
        token(STASH, self.stash.len() - 1)
    }

    fn expand(&self, text: &str) -> String {
        replace_tokens(text, STASH, |i| self.stash[i].clone())
    }

    /// Raw text with stash placeholders expanded and tags removed.
    fn raw(&self, text: &str) -> String {
        let expanded = self.expand(text);
        let stripped = STRIP_TAGS_RE.replace_all(&expanded, "");
        html_escape::decode_html_entities(&stripped).into_owned()
    }
}

fn token(kind: char, index: usize) -> String {
    format!("{}{}{}", kind, index, END)
}

/// Replaces every `kind N END` token with `f(N)`.
fn replace_tokens(text: &str, kind: char, mut f: impl FnMut(usize) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(kind) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + kind.len_utf8()..];
        match after.find(END).and_then(|end| Some((end, after[..end].parse().ok()?))) {
            Some((end, index)) => {
                out.push_str(&f(index));
                rest = &after[end + END.len_utf8()..];
            }
            None => {
                out.push(kind);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders one inline text run to HTML.
pub fn render_inline(text: &str) -> String {
    render(text, Mode::Html, 0)
}

/// Renders heading text for a TOC entry: code spans and emphasis are kept,
/// links are unwrapped to their label and images to their alt text.
pub fn render_label(text: &str) -> String {
    render(text, Mode::Label, 0)
}

/// Plain text of an inline run with all markup removed.
pub fn plain_text(text: &str) -> String {
    plain_text_at(text, 0)
}

fn plain_text_at(text: &str, depth: usize) -> String {
    let html = render(text, Mode::Label, depth);
    let stripped = STRIP_TAGS_RE.replace_all(&html, "");
    html_escape::decode_html_entities(&stripped).into_owned()
}

fn render(text: &str, mode: Mode, depth: usize) -> String {
    let mut state = InlineState::default();
    let clean: String = text
        .chars()
        .filter(|c| !('\u{E000}'..='\u{E005}').contains(c))
        .collect();

    let text = protect_code_spans(&clean, &mut state);
    let text = extract_links(&text, &mut state, depth);
    let text = escape_html(&text, &mut state);
    let text = apply_emphasis(&text);
    let text = render_badges(&text, &state);
    let text = replace_emoji(&text);
    let text = render_links(&text, &state, mode);
    let text = render_images(&text, &state, mode);
    replace_tokens(&text, STASH, |i| state.stash[i].clone())
}

fn protect_code_spans(text: &str, state: &mut InlineState) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < text.len() {
        match bytes[i] {
            b'\\' if i + 1 < text.len() && bytes[i + 1].is_ascii_punctuation() => {
                let escaped = html_escape::encode_text(&text[i + 1..i + 2]).into_owned();
                out.push_str(&state.stash(escaped));
                i += 2;
            }
            b'\\' if bytes.get(i + 1) == Some(&b'\n') => {
                out.push_str(&state.stash("<br>"));
                out.push('\n');
                i += 2;
            }
            b'`' => {
                let run = run_length(bytes, i, b'`');
                match find_closing_run(bytes, i + run, run) {
                    Some(close) => {
                        let code = normalize_code_span(&text[i + run..close]);
                        let html = format!("<code>{}</code>", html_escape::encode_text(&code));
                        out.push_str(&state.stash(html));
                        i = close + run;
                    }
                    None => {
                        out.push_str(&text[i..i + run]);
                        i += run;
                    }
                }
            }
            _ => {
                let Some(ch) = text[i..].chars().next() else {
                    break;
                };
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    out
}

fn run_length(bytes: &[u8], start: usize, byte: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == byte).count()
}

fn find_closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let run = run_length(bytes, i, b'`');
            if run == len {
                return Some(i);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

fn normalize_code_span(code: &str) -> String {
    let code = code.replace('\n', " ");
    if code.len() >= 2 && code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty() {
        code[1..code.len() - 1].to_string()
    } else {
        code
    }
}

fn extract_links(text: &str, state: &mut InlineState, depth: usize) -> String {
    let closers = matching_brackets(text);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];

        if let Some(caps) = AUTOLINK_RE.captures(rest) {
            let url = &caps[1];
            state.links.push(Link {
                href: url.to_string(),
                title: None,
            });
            let index = state.links.len() - 1;
            out.push_str(&token(LINK_OPEN, index));
            let label = html_escape::encode_text(url).into_owned();
            out.push_str(&state.stash(label));
            out.push_str(&token(LINK_CLOSE, index));
            i += caps[0].len();
            continue;
        }

        let is_image = rest.starts_with("![");
        if depth < MAX_LINK_NESTING && (is_image || rest.starts_with('[')) {
            let bracket = if is_image { i + 1 } else { i };
            if let Some(&label_end) = closers.get(&bracket)
                && let Some(tail) = parse_link_tail(text, label_end + 1)
            {
                let label = &text[bracket + 1..label_end];
                let dest = state.raw(&tail.dest);
                let title = tail.title.map(|t| state.raw(&t));
                if is_image {
                    let alt = plain_text_at(&state.expand(label), depth + 1);
                    state.images.push(Image {
                        src: dest,
                        alt,
                        title,
                    });
                    out.push_str(&token(IMAGE, state.images.len() - 1));
                } else {
                    state.links.push(Link { href: dest, title });
                    let index = state.links.len() - 1;
                    let inner = extract_links(label, state, depth + 1);
                    out.push_str(&token(LINK_OPEN, index));
                    out.push_str(&inner);
                    out.push_str(&token(LINK_CLOSE, index));
                }
                i = tail.end;
                continue;
            }
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Maps the byte offset of each `[` to its matching `]`.
fn matching_brackets(text: &str) -> HashMap<usize, usize> {
    let mut pairs = HashMap::new();
    let mut open = Vec::new();
    for (pos, byte) in text.bytes().enumerate() {
        match byte {
            b'[' => open.push(pos),
            b']' => {
                if let Some(start) = open.pop() {
                    pairs.insert(start, pos);
                }
            }
            _ => {}
        }
    }
    pairs
}

struct LinkTail {
    dest: String,
    title: Option<String>,
    end: usize,
}

/// Parses `(dest "title")` starting at `pos`.
fn parse_link_tail(text: &str, pos: usize) -> Option<LinkTail> {
    let bytes = text.as_bytes();
    if bytes.get(pos) != Some(&b'(') {
        return None;
    }
    let mut i = skip_whitespace(bytes, pos + 1);

    let dest = if bytes.get(i) == Some(&b'<') {
        let close = text[i + 1..].find('>')? + i + 1;
        let dest = &text[i + 1..close];
        if dest.contains('\n') {
            return None;
        }
        i = close + 1;
        dest
    } else {
        let start = i;
        let mut depth = 0usize;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                b if b.is_ascii_whitespace() => break,
                _ => {}
            }
            i += 1;
        }
        &text[start..i]
    };

    let after_dest = i;
    i = skip_whitespace(bytes, i);
    let mut title = None;
    if i > after_dest
        && let Some(&quote) = bytes.get(i)
        && (quote == b'"' || quote == b'\'')
    {
        let close = text[i + 1..].find(quote as char)? + i + 1;
        title = Some(text[i + 1..close].to_string());
        i = skip_whitespace(bytes, close + 1);
    }

    if bytes.get(i) != Some(&b')') {
        return None;
    }
    Some(LinkTail {
        dest: dest.to_string(),
        title,
        end: i + 1,
    })
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

fn escape_html(text: &str, state: &mut InlineState) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        match ch {
            '<' => {
                if let Some(caps) = TAG_RE.captures(rest) {
                    let whole = &caps[0];
                    let is_badge = caps.get(1).is_some_and(|m| m.as_str().is_empty())
                        && caps
                            .get(2)
                            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("badge"))
                        && caps.get(4).is_some_and(|m| m.as_str() == "/");
                    if is_badge {
                        let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
                        state.badges.push(Badge::from_attrs(attrs));
                        out.push_str(&token(BADGE, state.badges.len() - 1));
                    } else {
                        out.push_str(&state.stash(whole));
                    }
                    i += whole.len();
                } else {
                    out.push_str("&lt;");
                    i += 1;
                }
            }
            '&' => {
                if let Some(m) = ENTITY_RE.find(rest) {
                    out.push_str(&state.stash(m.as_str()));
                    i += m.len();
                } else {
                    out.push_str("&amp;");
                    i += 1;
                }
            }
            '>' => {
                out.push_str("&gt;");
                i += 1;
            }
            '\n' => {
                let trimmed = out.trim_end_matches(' ').len();
                if out.len() - trimmed >= 2 {
                    out.truncate(trimmed);
                    out.push_str("<br>");
                }
                out.push('\n');
                i += 1;
            }
            _ => {
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    out
}

struct Delimiter {
    marker: &'static str,
    open: &'static str,
    close: &'static str,
    /// May open or close inside a word.
    intraword: bool,
    /// Content may not contain whitespace.
    tight: bool,
}

const DELIMITERS: [Delimiter; 8] = [
    Delimiter { marker: "**", open: "<strong>", close: "</strong>", intraword: true, tight: false },
    Delimiter { marker: "__", open: "<strong>", close: "</strong>", intraword: false, tight: false },
    Delimiter { marker: "~~", open: "<del>", close: "</del>", intraword: true, tight: false },
    Delimiter { marker: "==", open: "<mark>", close: "</mark>", intraword: true, tight: false },
    Delimiter { marker: "*", open: "<em>", close: "</em>", intraword: true, tight: false },
    Delimiter { marker: "_", open: "<em>", close: "</em>", intraword: false, tight: false },
    Delimiter { marker: "~", open: "<sub>", close: "</sub>", intraword: true, tight: true },
    Delimiter { marker: "^", open: "<sup>", close: "</sup>", intraword: true, tight: true },
];

fn apply_emphasis(text: &str) -> String {
    DELIMITERS
        .iter()
        .fold(text.to_string(), |acc, delimiter| apply_delimiter(&acc, delimiter))
}

fn apply_delimiter(text: &str, d: &Delimiter) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(open) = find_opener(rest, out.chars().next_back(), d) else {
            out.push_str(rest);
            break;
        };
        let content_start = open + d.marker.len();
        match find_closer(rest, content_start, d) {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push_str(d.open);
                out.push_str(&rest[content_start..close]);
                out.push_str(d.close);
                rest = &rest[close + d.marker.len()..];
            }
            // Closers are judged without regard to their opener, so no later
            // opener can close either.
            None if !d.tight => {
                out.push_str(rest);
                break;
            }
            None => {
                out.push_str(&rest[..content_start]);
                rest = &rest[content_start..];
            }
        }
    }
    out
}

fn marker_char(d: &Delimiter) -> char {
    d.marker.chars().next().unwrap_or_default()
}

fn find_opener(text: &str, before: Option<char>, d: &Delimiter) -> Option<usize> {
    let c = marker_char(d);
    let single = d.marker.len() == 1;
    for (p, _) in text.match_indices(d.marker) {
        let prev = if p == 0 {
            before
        } else {
            text[..p].chars().next_back()
        };
        let next = text[p + d.marker.len()..].chars().next();
        if prev == Some(c) || (single && next == Some(c)) {
            continue;
        }
        if next.is_none_or(char::is_whitespace) {
            continue;
        }
        if !d.intraword && prev.is_some_and(char::is_alphanumeric) {
            continue;
        }
        return Some(p);
    }
    None
}

fn find_closer(text: &str, from: usize, d: &Delimiter) -> Option<usize> {
    let c = marker_char(d);
    let single = d.marker.len() == 1;
    let limit = if d.tight {
        text[from..]
            .find(char::is_whitespace)
            .map_or(text.len(), |pos| from + pos)
    } else {
        text.len()
    };
    for (offset, _) in text[from..limit].match_indices(d.marker) {
        let mut q = from + offset;
        if q == from {
            continue;
        }
        let prev = text[..q].chars().next_back();
        if prev.is_some_and(char::is_whitespace) || (single && prev == Some(c)) {
            continue;
        }
        let mut next = text[q + d.marker.len()..].chars().next();
        if next == Some(c) {
            if single {
                continue;
            }
            // Close on the last two characters of a longer run.
            let run = text[q..].chars().take_while(|&ch| ch == c).count();
            q += run - d.marker.len();
            next = text[q + d.marker.len()..].chars().next();
        }
        if !d.intraword && next.is_some_and(char::is_alphanumeric) {
            continue;
        }
        return Some(q);
    }
    None
}

fn render_badges(text: &str, state: &InlineState) -> String {
    replace_tokens(text, BADGE, |i| {
        let badge = &state.badges[i];
        format!(
            "{}{}</span>",
            badge.open_tag(),
            html_escape::encode_text(&badge.text)
        )
    })
}

fn replace_emoji(text: &str) -> String {
    EMOJI_RE
        .replace_all(text, |caps: &regex::Captures| {
            emoji::lookup(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub(crate) fn is_external(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
}

fn render_links(text: &str, state: &InlineState, mode: Mode) -> String {
    let text = replace_tokens(text, LINK_OPEN, |i| {
        if mode == Mode::Label {
            return String::new();
        }
        let link = &state.links[i];
        let mut tag = format!(
            "<a href=\"{}\"",
            html_escape::encode_double_quoted_attribute(&link.href)
        );
        if let Some(title) = &link.title {
            tag.push_str(&format!(
                " title=\"{}\"",
                html_escape::encode_double_quoted_attribute(title)
            ));
        }
        if is_external(&link.href) {
            tag.push_str(" target=\"_blank\" rel=\"noreferrer noopener\"");
        }
        tag.push('>');
        tag
    });
    replace_tokens(&text, LINK_CLOSE, |i| match mode {
        Mode::Label => String::new(),
        Mode::Html if is_external(&state.links[i].href) => format!("{}</a>", EXTERNAL_ICON),
        Mode::Html => "</a>".to_string(),
    })
}

fn render_images(text: &str, state: &InlineState, mode: Mode) -> String {
    replace_tokens(text, IMAGE, |i| {
        let image = &state.images[i];
        if mode == Mode::Label {
            return html_escape::encode_text(&image.alt).into_owned();
        }
        let alt = html_escape::encode_double_quoted_attribute(&image.alt);
        let src = html_escape::encode_double_quoted_attribute(&image.src);
        match image.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!(
                "<figure class=\"image-figure\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\" decoding=\"async\"><figcaption>{}</figcaption></figure>",
                src,
                alt,
                html_escape::encode_text(title)
            ),
            None => format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\" decoding=\"async\">",
                src, alt
            ),
        }
    })
}

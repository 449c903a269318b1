use std::collections::HashSet;

/// Extracts a `{#custom-id}` suffix from heading text.
///
/// If the text ends with `{#some-id}` (ASCII alphanumerics, hyphens, or
/// underscores), optionally followed by whitespace, returns the text before
/// the suffix and `Some(id)`. Otherwise returns the original text and `None`.
///
/// # Examples
///
/// ```
/// use mdpress_core::slug::extract_custom_id;
///
/// let (text, id) = extract_custom_id("My Heading {#my-heading}");
/// assert_eq!(text, "My Heading");
/// assert_eq!(id, Some("my-heading"));
///
/// let (text, id) = extract_custom_id("Plain heading");
/// assert_eq!(text, "Plain heading");
/// assert_eq!(id, None);
/// ```
pub fn extract_custom_id(text: &str) -> (&str, Option<&str>) {
    let Some(body) = text.trim_end().strip_suffix('}') else {
        return (text, None);
    };
    let Some((before, id)) = body.rsplit_once("{#") else {
        return (text, None);
    };
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        (before.trim_end(), Some(id))
    } else {
        (text, None)
    }
}

/// Strips a trailing `<!-- toc-ignore -->` comment from heading text.
///
/// Returns the remaining text and whether the marker was present.
pub fn extract_toc_ignore(text: &str) -> (&str, bool) {
    let trimmed = text.trim_end();
    if let Some(body) = trimmed.strip_suffix("-->")
        && let Some((before, comment)) = body.rsplit_once("<!--")
        && comment.trim() == "toc-ignore"
    {
        return (before.trim_end(), true);
    }
    (text, false)
}

/// Allocates document-unique heading slugs.
///
/// Custom anchors should be [`reserve`](Slugger::reserve)d before any
/// automatic slug is generated so auto slugs step around them.
#[derive(Debug, Default)]
pub struct Slugger {
    taken: HashSet<String>,
}

impl Slugger {
    /// Creates an empty slugger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a slug as used. Returns false if it was already taken.
    pub fn reserve(&mut self, slug: &str) -> bool {
        self.taken.insert(slug.to_string())
    }

    /// Claims `base`, or the first free `base-2`, `base-3`, ... variant.
    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Generates the next unique slug for heading text.
    pub fn next_slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        self.claim(&base)
    }
}

/// Returns true if the character is a Unicode combining mark (Mn, Mc, Me).
/// Combining marks belong to the preceding letter, so they count as word
/// characters for scripts like Devanagari, Arabic, or Thai.
fn is_combining_mark(ch: char) -> bool {
    use std::ops::RangeInclusive;

    const RANGES: &[RangeInclusive<u32>] = &[
        0x0300..=0x036F,
        0x0591..=0x05BD,
        0x05BF..=0x05BF,
        0x05C1..=0x05C2,
        0x05C4..=0x05C5,
        0x05C7..=0x05C7,
        0x0610..=0x061A,
        0x064B..=0x065F,
        0x0670..=0x0670,
        0x0900..=0x0903,
        0x093A..=0x094F,
        0x0951..=0x0957,
        0x0962..=0x0963,
        0x0980..=0x0983,
        0x09BC..=0x09CD,
        0x0A01..=0x0A03,
        0x0A3C..=0x0A4D,
        0x0A81..=0x0A83,
        0x0ABC..=0x0ACD,
        0x0B01..=0x0B03,
        0x0BBE..=0x0BCD,
        0x0E31..=0x0E3A,
        0x0E47..=0x0E4E,
        0x1AB0..=0x1AFF,
        0x1DC0..=0x1DFF,
        0x302A..=0x302F,
        0x3099..=0x309A,
        0xFE20..=0xFE2F,
    ];

    let cp = ch as u32;
    RANGES.iter().any(|r| r.contains(&cp))
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || is_combining_mark(ch)
}

/// Reduces heading source to the text a slug is computed from.
///
/// Drops HTML tags, apostrophes, and the inline code and emphasis markers
/// (backticks, `*`, `~`, `==`, and boundary underscores). The display text
/// of the heading is not affected.
pub fn slug_source(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '<' => {
                if let Some(end) = chars[i..].iter().position(|c| *c == '>') {
                    out.push(' ');
                    i += end + 1;
                    continue;
                }
                out.push(ch);
            }
            '`' | '*' | '~' | '\'' | '\u{2019}' => {}
            '=' if chars.get(i + 1) == Some(&'=') => {
                i += 2;
                continue;
            }
            '_' => {
                let prev_word = i > 0 && chars[i - 1].is_alphanumeric();
                let next_word = chars.get(i + 1).is_some_and(|c| c.is_alphanumeric());
                if prev_word && next_word {
                    out.push('_');
                }
            }
            _ => out.push(ch),
        }
        i += 1;
    }
    out
}

/// Slugifies heading text.
///
/// 1. Strip markup via [`slug_source`]
/// 2. Lowercase
/// 3. Replace each run of non-word characters with a single hyphen
/// 4. Trim leading and trailing hyphens
///
/// Empty results fall back to `heading`.
pub fn slugify(text: &str) -> String {
    let source = slug_source(text);
    let mut slug = String::with_capacity(source.len());
    let mut pending_hyphen = false;

    for ch in source.chars() {
        if is_word_char(ch) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.next_slug("Title"), "title");
        assert_eq!(slugger.next_slug("Title"), "title-2");
        assert_eq!(slugger.next_slug("Title"), "title-3");
    }

    #[test]
    fn suffix_skips_taken_candidates() {
        let mut slugger = Slugger::new();
        slugger.reserve("setup-2");
        assert_eq!(slugger.next_slug("Setup"), "setup");
        assert_eq!(slugger.next_slug("Setup"), "setup-3");
    }

    #[test]
    fn reserve_prevents_collision() {
        let mut slugger = Slugger::new();
        assert!(slugger.reserve("intro"));
        assert!(!slugger.reserve("intro"));
        assert_eq!(slugger.next_slug("Intro"), "intro-2");
    }

    #[test]
    fn markup_is_stripped_for_slugs() {
        let cases: Vec<(&str, &str)> = vec![
            ("Using `console.log`", "using-console-log"),
            ("**Bold** and *italic*", "bold-and-italic"),
            ("What's New?", "whats-new"),
            ("snake_case_name", "snake_case_name"),
            ("__init__ method", "init-method"),
            ("Version <Badge type=\"tip\" text=\"2.0\" />", "version"),
            ("  a---b  ", "a-b"),
            ("==Marked== text", "marked-text"),
            ("~~old~~ new", "old-new"),
            ("getStaticPaths()", "getstaticpaths"),
            ("TypeScript & JSX", "typescript-jsx"),
        ];

        for (input, expected) in &cases {
            let actual = slugify(input);
            assert_eq!(
                &actual, expected,
                "Mismatch for {:?}: got {:?}, expected {:?}",
                input, actual, expected
            );
        }
    }

    #[test]
    fn unicode_letters_and_combining_marks_preserved() {
        let cases: Vec<(&str, &str)> = vec![
            ("多言語 ガイド", "多言語-ガイド"),
            ("Héllo Wörld", "héllo-wörld"),
            ("डिफ़ॉल्ट रूप से तेज़", "डिफ़ॉल्ट-रूप-से-तेज़"),
            ("🚀 Getting Started", "getting-started"),
        ];

        for (input, expected) in &cases {
            let actual = slugify(input);
            assert_eq!(
                &actual, expected,
                "Mismatch for {:?}: got {:?}, expected {:?}",
                input, actual, expected
            );
        }
    }

    #[test]
    fn empty_falls_back() {
        assert_eq!(slugify("!!!"), "heading");
    }

    #[test]
    fn extract_custom_id_basic() {
        let (text, id) = extract_custom_id("My Heading {#my-heading}");
        assert_eq!(text, "My Heading");
        assert_eq!(id, Some("my-heading"));
    }

    #[test]
    fn extract_custom_id_with_trailing_space() {
        let (text, id) = extract_custom_id("My Heading {#my-heading}  ");
        assert_eq!(text, "My Heading");
        assert_eq!(id, Some("my-heading"));
    }

    #[test]
    fn extract_custom_id_rejects_invalid() {
        assert_eq!(extract_custom_id("Title {#bad id}"), ("Title {#bad id}", None));
        assert_eq!(extract_custom_id("Title {#}"), ("Title {#}", None));
        assert_eq!(extract_custom_id("Plain"), ("Plain", None));
    }

    #[test]
    fn extract_custom_id_unicode_text() {
        let (text, id) = extract_custom_id("共通データ型 {#common-data-types}");
        assert_eq!(text, "共通データ型");
        assert_eq!(id, Some("common-data-types"));
    }

    #[test]
    fn toc_ignore_comment() {
        assert_eq!(
            extract_toc_ignore("Internal notes <!-- toc-ignore -->"),
            ("Internal notes", true)
        );
        assert_eq!(
            extract_toc_ignore("Kept <!-- other -->"),
            ("Kept <!-- other -->", false)
        );
    }
}

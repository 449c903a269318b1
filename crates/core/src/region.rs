//! Region and line-range extraction.
//!
//! Both directive syntaxes select a slice of the target file the same way:
//! the whole file, a 1-based inclusive line range, or a named region
//! delimited by `region <name>` / `endregion` comment lines.

/// A 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line (1-based)
    pub start: usize,
    /// Last line (inclusive)
    pub end: usize,
}

impl LineRange {
    /// Parses `start-end` as written inside `{...}`.
    ///
    /// Returns `None` when either bound is missing, non-numeric, zero, or
    /// when `start > end`.
    pub fn parse(text: &str) -> Option<Self> {
        let (start, end) = text.split_once('-')?;
        let start: usize = start.trim().parse().ok()?;
        let end: usize = end.trim().parse().ok()?;
        if start == 0 || start > end {
            return None;
        }
        Some(Self { start, end })
    }
}

/// Which part of a file a directive wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The entire file.
    Whole,
    /// A line range, clamped to the file length.
    Lines(LineRange),
    /// The lines between `region <name>` and its matching `endregion`.
    Region(String),
}

/// Applies `selector` to `source`.
///
/// Returns `None` only when a named region does not exist. Line ranges past
/// the end of the file clamp, and a range starting after the last line
/// selects nothing.
pub fn extract(source: &str, selector: &Selector) -> Option<String> {
    match selector {
        Selector::Whole => Some(source.to_string()),
        Selector::Lines(range) => Some(extract_lines(source, *range)),
        Selector::Region(name) => extract_region(source, name),
    }
}

fn extract_lines(source: &str, range: LineRange) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let end = range.end.min(lines.len());
    if range.start > end {
        return String::new();
    }
    lines[range.start - 1..end].join("\n")
}

fn extract_region(source: &str, name: &str) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let start = lines
        .iter()
        .position(|line| matches!(parse_marker(line), Some(Marker::Start(n)) if n == name))?;

    let mut depth = 0usize;
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        match parse_marker(line) {
            Some(Marker::Start(_)) => depth += 1,
            Some(Marker::End) => {
                if depth == 0 {
                    return Some(lines[start + 1..idx].join("\n"));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, PartialEq, Eq)]
enum Marker<'a> {
    Start(&'a str),
    End,
}

/// Recognizes region marker lines in `//`, `#`, `/* */`, and `<!-- -->`
/// comment styles, with or without a `#` before the keyword.
fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let trimmed = line.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("<!--") {
        rest.strip_suffix("-->")?
    } else if let Some(rest) = trimmed.strip_prefix("/*") {
        rest.strip_suffix("*/")?
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix('#') {
        rest
    } else {
        return None;
    };

    let body = body.trim();
    let body = body.strip_prefix('#').unwrap_or(body).trim_start();

    if let Some(rest) = body.strip_prefix("endregion") {
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        return Some(Marker::End);
    }

    let rest = body.strip_prefix("region")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(Marker::Start(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JS: &str = "export function add(a, b) {\n  return a + b\n}\n\n// #region math\nexport function multiply(a, b) {\n  return a * b\n}\n// #endregion\n";

    #[test]
    fn whole_file_is_unchanged() {
        assert_eq!(extract(JS, &Selector::Whole).as_deref(), Some(JS));
    }

    #[test]
    fn js_region_excludes_markers() {
        let region = extract(JS, &Selector::Region("math".into())).unwrap();
        assert_eq!(
            region,
            "export function multiply(a, b) {\n  return a * b\n}"
        );
        assert!(!region.contains("region"));
    }

    #[test]
    fn python_and_html_marker_styles() {
        let py = "import os\n# region calculations\nx = 1\n# endregion\n";
        assert_eq!(
            extract(py, &Selector::Region("calculations".into())).as_deref(),
            Some("x = 1")
        );

        let md = "intro\n<!-- #region usage -->\nRun it.\n<!-- #endregion -->\noutro";
        assert_eq!(
            extract(md, &Selector::Region("usage".into())).as_deref(),
            Some("Run it.")
        );

        let css = "/* #region vars */\n:root {}\n/* #endregion */";
        assert_eq!(
            extract(css, &Selector::Region("vars".into())).as_deref(),
            Some(":root {}")
        );
    }

    #[test]
    fn region_name_must_match_whole_token() {
        let src = "// #region mathematics\na\n// #endregion\n";
        assert_eq!(extract(src, &Selector::Region("math".into())), None);
    }

    #[test]
    fn missing_region_is_none() {
        assert_eq!(extract(JS, &Selector::Region("nope".into())), None);
    }

    #[test]
    fn unterminated_region_is_none() {
        let src = "// #region open\nline\n";
        assert_eq!(extract(src, &Selector::Region("open".into())), None);
    }

    #[test]
    fn nested_regions_keep_inner_markers() {
        let src = "// #region outer\na\n// #region inner\nb\n// #endregion\nc\n// #endregion\n";
        assert_eq!(
            extract(src, &Selector::Region("outer".into())).as_deref(),
            Some("a\n// #region inner\nb\n// #endregion\nc")
        );
        assert_eq!(
            extract(src, &Selector::Region("inner".into())).as_deref(),
            Some("b")
        );
    }

    #[test]
    fn line_ranges_clamp() {
        let src = "one\ntwo\nthree";
        let pick = |start, end| extract(src, &Selector::Lines(LineRange { start, end }));
        assert_eq!(pick(2, 3).as_deref(), Some("two\nthree"));
        assert_eq!(pick(2, 99).as_deref(), Some("two\nthree"));
        assert_eq!(pick(5, 9).as_deref(), Some(""));
    }

    #[test]
    fn parse_line_range() {
        assert_eq!(LineRange::parse("3-10"), Some(LineRange { start: 3, end: 10 }));
        assert_eq!(LineRange::parse("10-3"), None);
        assert_eq!(LineRange::parse("0-3"), None);
        assert_eq!(LineRange::parse("a-3"), None);
        assert_eq!(LineRange::parse("7"), None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = extract(JS, &Selector::Region("math".into()));
        let second = extract(JS, &Selector::Region("math".into()));
        assert_eq!(first, second);
    }
}

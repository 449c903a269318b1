//! Block directive line syntax.
//!
//! Recognizes `::: kind [title]` container openers and `:::` closers,
//! `> [!KIND]` alert markers, and the `[[toc]]` macro line. Only the line
//! syntax lives here; the block classifier decides nesting.

use crate::code_fence::leading_whitespace_info;

/// Supported `:::` container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// `::: info`
    Info,
    /// `::: tip`
    Tip,
    /// `::: warning`
    Warning,
    /// `::: danger`
    Danger,
    /// `::: details`, rendered as a collapsible `<details>`.
    Details,
    /// `::: raw`, content isolated from site styles.
    Raw,
    /// `::: code-group`, tabbed fenced blocks.
    CodeGroup,
}

impl ContainerKind {
    /// Parses a container name as written after the colons.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "info" => Self::Info,
            "tip" => Self::Tip,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            "details" => Self::Details,
            "raw" => Self::Raw,
            "code-group" => Self::CodeGroup,
            _ => return None,
        };
        Some(kind)
    }

    /// CSS class name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Details => "details",
            Self::Raw => "raw",
            Self::CodeGroup => "code-group",
        }
    }

    /// Title used when the opener does not supply one.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Tip => "TIP",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
            Self::Details => "Details",
            Self::Raw | Self::CodeGroup => "",
        }
    }
}

/// A parsed `:::` opener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOpening {
    /// Container kind.
    pub kind: ContainerKind,
    /// Custom title, from `::: tip Title` or `:::tip[Title]`.
    pub title: Option<String>,
}

impl ContainerOpening {
    /// Title to render: the custom one, else the kind default.
    pub fn resolved_title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.kind.default_title())
    }
}

/// Parses an opening container line like `::: tip Heads up` or `:::note[Title]`.
///
/// Returns `None` for unknown kinds, closers, and lines indented as code.
pub fn parse_container_opening(line: &str) -> Option<ContainerOpening> {
    let (indent, _) = leading_whitespace_info(line);
    if indent > 3 {
        return None;
    }

    let trimmed = line.trim();
    let after_colons = trimmed.trim_start_matches(':');
    if trimmed.len() - after_colons.len() < 3 {
        return None;
    }

    let after_colons = after_colons.trim_start();
    let name_len = after_colons
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(after_colons.len());
    let kind = ContainerKind::from_name(&after_colons[..name_len])?;
    let rest = &after_colons[name_len..];

    let title = if let Some(bracketed) = rest.strip_prefix('[') {
        bracketed.split_once(']').map(|(title, _)| title.trim().to_string())
    } else if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim().to_string())
    } else {
        return None;
    };

    Some(ContainerOpening {
        kind,
        title: title.filter(|t| !t.is_empty()),
    })
}

/// Check if a line is a container closer (a bare run of three or more colons).
pub fn is_container_closer(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == ':')
}

/// Whether a line opens a `:::` block of any kind, including names that
/// [`parse_container_opening`] does not know. Used to keep closer counting
/// balanced.
pub fn opens_any_container(line: &str) -> bool {
    if leading_whitespace_info(line).0 > 3 {
        return false;
    }
    let trimmed = line.trim();
    let after_colons = trimmed.trim_start_matches(':');
    trimmed.len() - after_colons.len() >= 3
        && after_colons
            .trim_start()
            .starts_with(|c: char| c.is_ascii_alphanumeric())
}

/// GitHub-style alert kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// `> [!NOTE]`
    Note,
    /// `> [!TIP]`
    Tip,
    /// `> [!IMPORTANT]`
    Important,
    /// `> [!WARNING]`
    Warning,
    /// `> [!CAUTION]`
    Caution,
}

impl AlertKind {
    /// Parses the word inside `[!...]`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_uppercase().as_str() {
            "NOTE" => Self::Note,
            "TIP" => Self::Tip,
            "IMPORTANT" => Self::Important,
            "WARNING" => Self::Warning,
            "CAUTION" => Self::Caution,
            _ => return None,
        };
        Some(kind)
    }

    /// CSS class suffix of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Warning => "warning",
            Self::Caution => "caution",
        }
    }

    /// Display title of the kind.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Tip => "Tip",
            Self::Important => "Important",
            Self::Warning => "Warning",
            Self::Caution => "Caution",
        }
    }
}

/// Parses the first line of an alert, `> [!KIND]` with an optional title after it.
pub fn parse_alert_marker(line: &str) -> Option<(AlertKind, Option<String>)> {
    let (indent, _) = leading_whitespace_info(line);
    if indent > 3 {
        return None;
    }
    let rest = line.trim_start().strip_prefix('>')?.trim_start();
    let rest = rest.strip_prefix("[!")?;
    let (name, after) = rest.split_once(']')?;
    let kind = AlertKind::from_name(name)?;
    let title = after.trim();
    Some((kind, (!title.is_empty()).then(|| title.to_string())))
}

/// Strips one level of blockquote prefix (`>` plus one optional space).
pub fn strip_quote_prefix(line: &str) -> Option<&str> {
    let (indent, offset) = leading_whitespace_info(line);
    if indent > 3 {
        return None;
    }
    let rest = line[offset..].strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Whether the line is a `[[toc]]` macro.
pub fn is_toc_macro(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("[[toc]]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_spaced_opener_with_title() {
        let opening = parse_container_opening("::: warning Mind the gap").unwrap();
        assert_eq!(opening.kind, ContainerKind::Warning);
        assert_eq!(opening.title.as_deref(), Some("Mind the gap"));
        assert_eq!(opening.resolved_title(), "Mind the gap");
    }

    #[test]
    fn default_titles() {
        let cases = [
            ("::: info", "INFO"),
            (":::tip", "TIP"),
            ("::: danger", "DANGER"),
            ("::: details", "Details"),
            ("::: raw", ""),
        ];
        for (line, expected) in cases {
            let opening = parse_container_opening(line).unwrap();
            assert_eq!(opening.resolved_title(), expected, "for {:?}", line);
        }
    }

    #[test]
    fn bracket_title() {
        let opening = parse_container_opening(":::tip[Pro move]").unwrap();
        assert_eq!(opening.title.as_deref(), Some("Pro move"));
    }

    #[test]
    fn code_group_and_longer_colons() {
        let opening = parse_container_opening(":::: code-group").unwrap();
        assert_eq!(opening.kind, ContainerKind::CodeGroup);
        assert_eq!(opening.title, None);
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(parse_container_opening("::: unknown").is_none());
        assert!(parse_container_opening(":: tip").is_none());
        assert!(parse_container_opening(":::tipster").is_none());
        assert!(parse_container_opening(":::").is_none());
        assert!(parse_container_opening("    ::: tip").is_none());
    }

    #[test]
    fn closers() {
        assert!(is_container_closer(":::"));
        assert!(is_container_closer("  ::::  "));
        assert!(!is_container_closer("::: tip"));
        assert!(!is_container_closer("::"));
    }

    #[test]
    fn any_container_opener() {
        let cases = [
            ("::: tip", true),
            (":::foo", true),
            (":::: v-pre extra", true),
            (":::", false),
            (":: tip", false),
            ("::: [x]", false),
            ("    ::: tip", false),
        ];
        for (input, expected) in cases {
            assert_eq!(opens_any_container(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn alert_markers() {
        assert_eq!(
            parse_alert_marker("> [!NOTE]"),
            Some((AlertKind::Note, None))
        );
        assert_eq!(
            parse_alert_marker(">[!warning] Careful"),
            Some((AlertKind::Warning, Some("Careful".to_string())))
        );
        assert_eq!(parse_alert_marker("> [!UNKNOWN]"), None);
        assert_eq!(parse_alert_marker("> plain quote"), None);
    }

    #[test]
    fn quote_prefix() {
        assert_eq!(strip_quote_prefix("> text"), Some("text"));
        assert_eq!(strip_quote_prefix(">text"), Some("text"));
        assert_eq!(strip_quote_prefix(">  two"), Some(" two"));
        assert_eq!(strip_quote_prefix("text"), None);
    }

    #[test]
    fn toc_macro() {
        assert!(is_toc_macro("[[toc]]"));
        assert!(is_toc_macro("  [[TOC]] "));
        assert!(!is_toc_macro("see [[toc]] here"));
    }
}

//! `<Badge type="..." text="..." />` tags.

use once_cell::sync::Lazy;
use regex::Regex;

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(type|text)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("badge attribute pattern is valid")
});

/// Badge color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeKind {
    /// Blue, the default.
    #[default]
    Info,
    /// Green.
    Tip,
    /// Amber.
    Warning,
    /// Red.
    Danger,
}

impl BadgeKind {
    /// Parses a `type` value case-insensitively. Unknown values are `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "info" => Self::Info,
            "tip" => Self::Tip,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            _ => return None,
        };
        Some(kind)
    }

    /// Class suffix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    /// (background, text, border) colors.
    fn colors(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Info => ("#e0f2fe", "#0c4a6e", "#0ea5e9"),
            Self::Tip => ("#dcfce7", "#14532d", "#22c55e"),
            Self::Warning => ("#fef3c7", "#78350f", "#f59e0b"),
            Self::Danger => ("#fee2e2", "#7f1d1d", "#ef4444"),
        }
    }
}

/// A parsed badge tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// Color scheme.
    pub kind: BadgeKind,
    /// Raw badge text (unescaped).
    pub text: String,
}

impl Badge {
    /// Parses the attribute section of a badge tag.
    pub fn from_attrs(attrs: &str) -> Self {
        let mut kind = BadgeKind::default();
        let mut text = String::new();
        for caps in ATTR_RE.captures_iter(attrs) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if caps[1].eq_ignore_ascii_case("type") {
                kind = BadgeKind::from_name(value).unwrap_or_default();
            } else {
                text = value.to_string();
            }
        }
        Self { kind, text }
    }

    /// Opening `<span>` with the inline color style.
    pub fn open_tag(&self) -> String {
        let (bg, fg, border) = self.kind.colors();
        format!(
            "<span class=\"badge badge-{}\" style=\"display: inline-block; padding: 2px 8px; font-size: 0.85em; font-weight: 600; border-radius: 4px; background: {}; color: {}; border: 1px solid {}; margin: 0 4px; vertical-align: middle;\">",
            self.kind.as_str(),
            bg,
            fg,
            border
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attrs_in_any_order() {
        let badge = Badge::from_attrs(r#" text="v2.0" TYPE="Tip" "#);
        assert_eq!(badge.kind, BadgeKind::Tip);
        assert_eq!(badge.text, "v2.0");
    }

    #[test]
    fn unknown_type_defaults_to_info() {
        let badge = Badge::from_attrs(r#"type="neon" text='beta'"#);
        assert_eq!(badge.kind, BadgeKind::Info);
        assert_eq!(badge.text, "beta");
    }

    #[test]
    fn open_tag_carries_colors() {
        let badge = Badge::from_attrs(r#"type="danger" text="x""#);
        let tag = badge.open_tag();
        assert!(tag.starts_with(r#"<span class="badge badge-danger""#));
        assert!(tag.contains("background: #fee2e2; color: #7f1d1d; border: 1px solid #ef4444;"));
    }
}

//! Code fence tracking shared by the directive resolver and block classifier.
//!
//! Follows the CommonMark fence rules: openers are indented at most three
//! columns, use three or more backticks or tildes, and are closed only by a
//! bare run of the same marker that is at least as long as the opener.

/// A parsed fence opening line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOpening {
    /// Fence marker character (`` ` `` or `~`).
    pub marker: char,
    /// Length of the marker run.
    pub length: usize,
    /// Leading whitespace columns before the marker.
    pub indent: usize,
    /// Trimmed info string following the marker run.
    pub info: String,
}

/// Classification of a single line relative to fence state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceLine {
    /// Line opened a new fence.
    Open(FenceOpening),
    /// Line closed the current fence.
    Close,
    /// Line is fence content.
    Inside,
    /// Line is ordinary text.
    Outside,
}

impl FenceLine {
    /// Whether the line belongs to a fenced region (delimiters included).
    pub fn is_fenced(&self) -> bool {
        !matches!(self, FenceLine::Outside)
    }
}

/// Line-by-line fence state machine.
#[derive(Debug, Clone, Default)]
pub struct FenceTracker {
    open: Option<FenceOpening>,
}

impl FenceTracker {
    /// Creates a tracker positioned outside any fence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while inside a fence.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Advance the state machine by one line.
    pub fn advance(&mut self, line: &str) -> FenceLine {
        match &self.open {
            Some(opening) => {
                if closes_fence(line, opening) {
                    self.open = None;
                    FenceLine::Close
                } else {
                    FenceLine::Inside
                }
            }
            None => match parse_fence_opening(line) {
                Some(opening) => {
                    self.open = Some(opening.clone());
                    FenceLine::Open(opening)
                }
                None => FenceLine::Outside,
            },
        }
    }
}

/// Parses a fence opener such as ```` ```js{2} ```` or `~~~`.
pub fn parse_fence_opening(line: &str) -> Option<FenceOpening> {
    let (indent, offset) = leading_whitespace_info(line);
    // 4+ columns is an indented code block
    if indent > 3 {
        return None;
    }
    let after_indent = &line[offset..];
    let (marker, length) = detect_marker_run(after_indent)?;
    let info = after_indent[length..].trim();
    // Backtick fences may not carry backticks in their info string.
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(FenceOpening {
        marker,
        length,
        indent,
        info: info.to_string(),
    })
}

/// Returns true if `line` closes a fence opened by `opening`.
pub fn closes_fence(line: &str, opening: &FenceOpening) -> bool {
    let (indent, offset) = leading_whitespace_info(line);
    if indent > 3 {
        return false;
    }
    let after_indent = &line[offset..];
    match detect_marker_run(after_indent) {
        Some((marker, length)) => {
            marker == opening.marker
                && length >= opening.length
                && after_indent[length..].trim().is_empty()
        }
        None => false,
    }
}

/// Returns (visual_columns, byte_offset) for leading whitespace.
/// Tabs expand to the next 4-column boundary.
pub fn leading_whitespace_info(line: &str) -> (usize, usize) {
    let mut col = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => {
                col += 1;
                bytes += 1;
            }
            b'\t' => {
                col += 4 - (col % 4);
                bytes += 1;
            }
            _ => break,
        }
    }
    (col, bytes)
}

fn detect_marker_run(text: &str) -> Option<(char, usize)> {
    let first = text.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run_len = text.chars().take_while(|c| *c == first).count();
    (run_len >= 3).then_some((first, run_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_closes_backtick_fence() {
        let mut tracker = FenceTracker::new();
        let open = tracker.advance("```js");
        match open {
            FenceLine::Open(opening) => {
                assert_eq!(opening.marker, '`');
                assert_eq!(opening.length, 3);
                assert_eq!(opening.info, "js");
            }
            other => panic!("expected opener, got {:?}", other),
        }
        assert_eq!(tracker.advance("console.log('hi');"), FenceLine::Inside);
        assert_eq!(tracker.advance("```"), FenceLine::Close);
        assert!(!tracker.is_open());
        assert_eq!(tracker.advance("after"), FenceLine::Outside);
    }

    #[test]
    fn four_space_indent_is_not_a_fence() {
        assert!(parse_fence_opening("    ```js").is_none());
        assert!(parse_fence_opening("\t```js").is_none());
        assert!(parse_fence_opening("   ```js").is_some());
    }

    #[test]
    fn mismatched_marker_does_not_close() {
        let mut tracker = FenceTracker::new();
        tracker.advance("~~~ts");
        assert_eq!(tracker.advance("```"), FenceLine::Inside);
        assert!(tracker.is_open());
        assert_eq!(tracker.advance("~~~"), FenceLine::Close);
    }

    #[test]
    fn two_markers_do_not_open() {
        let mut tracker = FenceTracker::new();
        assert_eq!(tracker.advance("``"), FenceLine::Outside);
    }

    #[test]
    fn info_string_line_does_not_close() {
        let mut tracker = FenceTracker::new();
        tracker.advance("```");
        assert_eq!(tracker.advance("```js"), FenceLine::Inside);
        assert!(tracker.is_open());
    }

    #[test]
    fn longer_fence_contains_shorter_fences() {
        let mut tracker = FenceTracker::new();
        tracker.advance("````markdown");
        assert_eq!(tracker.advance("```js"), FenceLine::Inside);
        assert_eq!(tracker.advance("::: tip"), FenceLine::Inside);
        assert_eq!(tracker.advance("```"), FenceLine::Inside);
        assert_eq!(tracker.advance("````"), FenceLine::Close);
    }

    #[test]
    fn longer_closer_closes_shorter_opener() {
        let mut tracker = FenceTracker::new();
        tracker.advance("```");
        assert_eq!(tracker.advance("`````"), FenceLine::Close);
    }

    #[test]
    fn indented_closer_within_three_columns() {
        let mut tracker = FenceTracker::new();
        tracker.advance("```");
        assert_eq!(tracker.advance("      ```"), FenceLine::Inside);
        assert_eq!(tracker.advance("  ```"), FenceLine::Close);
    }

    #[test]
    fn backtick_info_with_backtick_is_not_a_fence() {
        assert!(parse_fence_opening("```a`b").is_none());
        assert!(parse_fence_opening("~~~a`b").is_some());
    }
}

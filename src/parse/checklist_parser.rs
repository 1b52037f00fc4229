use crate::model::todo::Checkbox;

/// Result of parsing a checklist file for one checkbox state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedChecklist {
    /// Titles of the lines whose checkbox matched, in file order
    pub titles: Vec<String>,
    /// Non-blank lines that were not well-formed items of the wanted state
    pub dropped: Vec<String>,
}

/// Parse a single checklist line: `- [ ] title` or `- [x] title`.
///
/// Surrounding whitespace (including a trailing `\r`) is ignored. A line with
/// an empty title is not an item.
pub fn parse_checklist_line(line: &str) -> Option<(Checkbox, &str)> {
    let rest = line.trim().strip_prefix("- [")?;
    let mut chars = rest.chars();
    let state = Checkbox::from_checkbox_char(chars.next()?)?;
    let title = chars.as_str().strip_prefix("] ")?.trim();
    if title.is_empty() {
        return None;
    }
    Some((state, title))
}

/// Parse checklist source, keeping only items in the `wanted` state.
///
/// Blank lines are skipped quietly; anything else that is not a wanted item
/// ends up in `dropped` so callers can report it.
pub fn parse_checklist(source: &str, wanted: Checkbox) -> ParsedChecklist {
    let mut parsed = ParsedChecklist::default();

    for line in source.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_checklist_line(line) {
            Some((state, title)) if state == wanted => parsed.titles.push(title.to_string()),
            _ => parsed.dropped.push(line.to_string()),
        }
    }

    parsed
}

//! Label fitting by display width
//!
//! Widths are measured in terminal columns via `unicode-width`, which is a
//! good enough proxy for proportional fonts at diagram label sizes.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Marker appended to truncated labels
pub const ELLIPSIS: char = '…';

/// Cut `label` to at most `max_width` columns, ending in `…` when cut
///
/// # Example
/// ```
/// use swimlane::core::truncate_label;
///
/// assert_eq!(truncate_label("Review Request", 8), "Review…");
/// assert_eq!(truncate_label("Approve", 8), "Approve");
/// ```
pub fn truncate_label(label: &str, max_width: usize) -> String {
    let label = label.trim();
    if UnicodeWidthStr::width(label) <= max_width {
        return label.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut out = String::new();
    let mut width = 0;
    for c in label.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        out.push(c);
        width += w;
    }
    let mut out = out.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Wrap text on word boundaries into lines of at most `max_width` columns
///
/// Words wider than `max_width` get a line of their own. With `max_width`
/// of 0, or a label that already fits, the label comes back as one line.
pub fn wrap_label(label: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || UnicodeWidthStr::width(label) <= max_width {
        return vec![label.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in label.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);

        if current_width == 0 {
            current_line = word.to_string();
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(current_line);
            current_line = word.to_string();
            current_width = word_width;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Wrap into at most `max_lines` lines, truncating what does not fit
pub fn fit_label(label: &str, max_width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = wrap_label(label, max_width);
    if max_lines > 0 && lines.len() > max_lines {
        // The joined rest never fits, so this always ends in the ellipsis
        let rest = lines.split_off(max_lines - 1).join(" ");
        lines.push(truncate_label(&rest, max_width));
    }
    lines
        .into_iter()
        .map(|line| truncate_label(&line, max_width.max(1)))
        .collect()
}

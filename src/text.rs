//! Text shaping for completion lists and tooltips.

/// Collapse whitespace runs to single spaces and crop to `max_chars`.
///
/// Cropped text ends in `...`; the result never exceeds `max_chars` characters.
pub fn cleanup(line: &str, max_chars: usize) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(3);
    let mut cropped: String = collapsed.chars().take(keep).collect();
    cropped.push_str(&"..."[..max_chars.min(3)]);
    cropped
}

/// Greedy word wrap at `width` characters.
///
/// Words longer than `width` get a line of their own and are not split.
pub fn linewrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len > 0 && line_len + 1 + word_len > width {
            out.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += word_len;
    }
    out
}

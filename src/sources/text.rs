pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max_chars` characters, ellipsis included,
/// preferring a word boundary
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text
        .chars()
        .take(max_chars.saturating_sub(ELLIPSIS.len()))
        .collect();
    match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => format!("{}{}", head[..pos].trim_end(), ELLIPSIS),
        _ => format!("{}{}", head, ELLIPSIS),
    }
}

/// Collapses every whitespace run (including non-breaking spaces) to a single
/// space and trims both ends
///
/// # Examples
///
/// ```
/// use cheap_home::text::normalize_text;
///
/// assert_eq!(normalize_text("  Phòng\u{a0}trọ \n\t giá rẻ "), "Phòng trọ giá rẻ");
/// assert_eq!(normalize_text(""), "");
/// ```
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns at most `max_chars` characters of `text`, never splitting a
/// multi-byte character
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_mixed_whitespace() {
        assert_eq!(normalize_text("a \u{a0}\u{a0} b\r\n\tc"), "a b c");
    }

    #[test]
    fn test_only_whitespace_becomes_empty() {
        assert_eq!(normalize_text(" \u{a0}\n "), "");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("Sơn Trà", 3), "Sơn");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}

//! Small text helpers shared by catalog normalization and narrative cleanup.

const ELLIPSIS: char = '…';

pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes the lightweight markup catalog maintainers put into benefit text:
/// `**bold**` / `__bold__` spans, stray single asterisks, and trailing
/// truncation markers (`...` or `…`).
pub fn strip_markup(value: &str) -> String {
    let without_emphasis = value.replace("**", "").replace("__", "").replace('*', "");
    let mut cleaned = normalize_whitespace(&without_emphasis);

    loop {
        let trimmed = cleaned.trim_end();
        let stripped = trimmed
            .strip_suffix("...")
            .or_else(|| trimmed.strip_suffix(ELLIPSIS))
            .map(str::trim_end);
        match stripped {
            Some(rest) => cleaned = rest.to_string(),
            None => break,
        }
    }

    cleaned
}

/// Truncates to at most `max_chars` characters, preferring a word boundary,
/// and appends an ellipsis when anything was cut.
pub fn truncate_for_display(value: &str, max_chars: usize) -> String {
    let value = value.trim();
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars.saturating_sub(1);
    let cut: String = value.chars().take(budget).collect();
    let boundary = match cut.rfind(char::is_whitespace) {
        Some(index) if index > budget / 2 => &cut[..index],
        _ => cut.as_str(),
    };

    let mut truncated = boundary.trim_end_matches(|c: char| c.is_whitespace() || c == ',').to_string();
    truncated.push(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::{normalize_whitespace, strip_markup, truncate_for_display};

    #[test]
    fn strip_markup_removes_bold_and_truncation_markers() {
        assert_eq!(
            strip_markup("Accept **QRIS** payments   from every bank..."),
            "Accept QRIS payments from every bank"
        );
        assert_eq!(strip_markup("Faster checkout …"), "Faster checkout");
        assert_eq!(strip_markup("__Fewer__ no-shows *guaranteed*"), "Fewer no-shows guaranteed");
    }

    #[test]
    fn truncate_prefers_word_boundary() {
        let text = "Guests scan a QR code at the table and order straight to the kitchen";
        let truncated = truncate_for_display(text, 30);

        assert!(truncated.chars().count() <= 30);
        assert!(truncated.ends_with('…'));
        assert!(truncated.starts_with("Guests scan a QR code"));
    }

    #[test]
    fn truncate_leaves_short_text_untouched() {
        assert_eq!(truncate_for_display("  short  ", 30), "short");
        assert_eq!(normalize_whitespace(" a \n b\tc "), "a b c");
    }
}

//! Small string helpers shared by the display projections.

/// Locale-independent sort key: lowercase, then transliterated to ASCII.
///
/// `é` sorts with `e`, `Z` with `z`.
pub fn collation_key(text: &str) -> String {
    deunicode::deunicode(&text.to_lowercase())
}

/// Sort strings by [`collation_key`]. Equal keys keep their input order.
pub fn unicode_sort<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Vec<S> {
    let mut items: Vec<S> = items.into_iter().collect();
    items.sort_by_cached_key(|item| collation_key(item.as_ref()));
    items
}

/// Truncate to at most `length` characters, marking the cut with `…`.
pub fn ellipsize(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(length.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

//! Slug normalization helpers used by the content API.
//!
//! Slugs are normalized to lowercase `a-z0-9-` with collapsing separators and
//! length bounds enforced by callers.

/// Normalizes user input into a URL-safe slug (`a-z0-9-`) within the provided length bounds.
/// Returns `None` when the normalized result is empty or outside `min..=max`.
/// Caller must still enforce uniqueness.
pub(super) fn normalize_slug(input: &str, min: usize, max: usize) -> Option<String> {
    let mut slug = String::new();
    let mut prev_dash = false;
    for ch in input.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-').to_string();
    if trimmed.is_empty() {
        return None;
    }
    let truncated: String = trimmed.chars().take(max).collect();
    let normalized = truncated.trim_matches('-').to_string();
    if normalized.len() < min || normalized.len() > max {
        return None;
    }
    Some(normalized)
}

/// Builds a slug by appending a numeric `-{suffix}` to an existing base.
/// Returns `None` if the suffix would exceed `max_len` or leaves no non-empty base segment.
/// Used to deterministically resolve slug collisions without changing normalization rules.
pub(super) fn with_suffix(base: &str, suffix: usize, max_len: usize) -> Option<String> {
    let suffix = format!("-{suffix}");
    if suffix.len() >= max_len {
        return None;
    }
    let allowed = max_len.saturating_sub(suffix.len());
    let mut base_part: String = base.chars().take(allowed).collect();
    base_part = base_part.trim_end_matches('-').to_string();
    if base_part.is_empty() {
        return None;
    }
    Some(format!("{base_part}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_collapses_separators() {
        assert_eq!(
            normalize_slug("  Grocery List -- Week 12  ", 1, 64),
            Some("grocery-list-week-12".to_string())
        );
    }

    #[test]
    fn normalize_rejects_empty_and_symbol_only() {
        assert_eq!(normalize_slug("   ", 1, 64), None);
        assert_eq!(normalize_slug("!!!", 1, 64), None);
    }

    #[test]
    fn normalize_enforces_bounds() {
        assert_eq!(normalize_slug("ab", 3, 64), None);
        let long = "a".repeat(100);
        assert_eq!(normalize_slug(&long, 1, 64), Some("a".repeat(64)));
    }

    #[test]
    fn with_suffix_truncates_base() {
        // max_len is inclusive, matching the normalize_slug bounds.
        assert_eq!(with_suffix("abcdef", 2, 6), Some("abcd-2".to_string()));
        assert!(with_suffix("abcdef", 2, 6).is_some_and(|slug| slug.len() <= 6));
        assert_eq!(with_suffix("a", 12345, 6), None);
    }
}

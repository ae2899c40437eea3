//! Output sanitization and string helpers.
//!
//! Model responses for code requests usually arrive wrapped in Markdown
//! code fences. [`trim_code_fences`] strips those before the text goes
//! back to the client; [`truncate_str`] keeps log previews from splitting
//! multi-byte characters.

/// Strip wrapping Markdown code fences from a model response.
///
/// Only applies when the text starts **and** ends with three backticks.
/// Up to three backticks are removed from each end by repeatedly deleting
/// the first and last backtick occurrence in the remaining string. A
/// language tag after the opening fence (e.g. `rust`) is left in place;
/// only the backticks themselves are removed.
///
/// # Examples
///
/// ```
/// use forge_core::text::trim_code_fences;
///
/// assert_eq!(trim_code_fences("```\nfn main() {}\n```"), "\nfn main() {}\n");
/// assert_eq!(trim_code_fences("plain text"), "plain text");
/// ```
pub fn trim_code_fences(input: &str) -> String {
    if !(input.starts_with("```") && input.ends_with("```")) {
        return input.to_string();
    }

    let mut out = input.to_string();
    for _ in 0..3 {
        if let Some(pos) = out.find('`') {
            let _ = out.remove(pos);
        }
    }
    for _ in 0..3 {
        if let Some(pos) = out.rfind('`') {
            let _ = out.remove(pos);
        }
    }
    out
}

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
///
/// Returns the longest prefix of `s` whose byte length is ≤ `max_bytes`
/// and that does not split a multi-byte character.
///
/// # Examples
///
/// ```
/// use forge_core::text::truncate_str;
///
/// assert_eq!(truncate_str("hello", 3), "hel");
/// assert_eq!(truncate_str("ab—cd", 3), "ab");
/// ```
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    // `floor_char_boundary` is nightly-only, so implement it ourselves.
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── trim_code_fences ─────────────────────────────────────────────────

    #[test]
    fn strips_plain_fences() {
        assert_eq!(trim_code_fences("```\ncode\n```"), "\ncode\n");
    }

    #[test]
    fn keeps_language_tag() {
        // Only the backticks go; the language tag stays attached.
        assert_eq!(trim_code_fences("```rust\ncode\n```"), "rust\ncode\n");
    }

    #[test]
    fn unfenced_input_unchanged() {
        assert_eq!(trim_code_fences("fn main() {}"), "fn main() {}");
    }

    #[test]
    fn leading_fence_only_unchanged() {
        assert_eq!(trim_code_fences("```\ncode"), "```\ncode");
    }

    #[test]
    fn trailing_fence_only_unchanged() {
        assert_eq!(trim_code_fences("code\n```"), "code\n```");
    }

    #[test]
    fn empty_string_unchanged() {
        assert_eq!(trim_code_fences(""), "");
    }

    #[test]
    fn bare_fence_collapses_to_empty() {
        // "```" starts and ends with a fence; all three backticks go.
        assert_eq!(trim_code_fences("```"), "");
    }

    #[test]
    fn six_backticks_collapse_to_empty() {
        assert_eq!(trim_code_fences("``````"), "");
    }

    #[test]
    fn five_backticks_collapse_to_empty() {
        // Three removed from the front, the remaining two from the back.
        assert_eq!(trim_code_fences("`````"), "");
    }

    #[test]
    fn interior_backticks_survive() {
        assert_eq!(trim_code_fences("```\nlet s = \"`tick`\";\n```"), "\nlet s = \"`tick`\";\n");
    }

    #[test]
    fn idempotent_on_sanitized_output() {
        let once = trim_code_fences("```\ncode\n```");
        assert_eq!(trim_code_fences(&once), once);
    }

    #[test]
    fn inner_fences_preserved_after_trim() {
        // Nested fences: only the outermost three backticks per side go.
        let input = "```\n```python\nx = 1\n```\n```";
        assert_eq!(trim_code_fences(input), "\n```python\nx = 1\n```\n");
    }

    #[test]
    fn whitespace_before_fence_is_not_a_fence() {
        assert_eq!(trim_code_fences(" ```\ncode\n```"), " ```\ncode\n```");
    }

    #[test]
    fn multibyte_content_between_fences() {
        assert_eq!(trim_code_fences("```\n// 日本語\n```"), "\n// 日本語\n");
    }

    // ── truncate_str ─────────────────────────────────────────────────────

    #[test]
    fn ascii_within_limit() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn ascii_exact_limit() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn ascii_truncated() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn empty_string() {
        assert_eq!(truncate_str("", 5), "");
    }

    #[test]
    fn zero_max() {
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn multibyte_boundary_snaps_back() {
        // '—' (U+2014) is 3 bytes at 2..5; cutting inside snaps to byte 2.
        let s = "ab—cd";
        assert_eq!(truncate_str(s, 3), "ab");
        assert_eq!(truncate_str(s, 4), "ab");
        assert_eq!(truncate_str(s, 5), "ab—");
    }

    #[test]
    fn emoji_4_byte() {
        let s = "hi🦀bye";
        assert_eq!(truncate_str(s, 2), "hi");
        assert_eq!(truncate_str(s, 5), "hi"); // inside the emoji
        assert_eq!(truncate_str(s, 6), "hi🦀");
    }
}

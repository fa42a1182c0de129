//! Statement text normalization.
//!
//! LLMs frequently wrap generated SQL in markdown code fences despite being
//! told not to. This module recovers the raw statement text: leading and
//! trailing triple-backtick fences (optionally language-tagged) are removed
//! and surrounding whitespace is trimmed. Interior whitespace and casing are
//! never touched.
//!
//! `strip_fences` is a pure, total function and is idempotent:
//! `strip_fences(strip_fences(x)) == strip_fences(x)` for all inputs.

/// Strips leading/trailing code-fence markers and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    let mut t = text.trim();

    // Repeated stripping keeps the function idempotent even for stacked
    // fence lines ("```\n```sql\n...").
    while let Some(rest) = strip_leading_fence(t) {
        t = rest.trim_start();
    }
    while let Some(rest) = strip_trailing_fence(t) {
        t = rest.trim_end();
    }

    t.to_string()
}

/// Removes an opening fence (```` ``` ```` plus an optional language tag)
/// from the start of the text, returning the remainder.
fn strip_leading_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Language tags are plain ASCII words ("sql", "tsql", ...).
    let tag_len = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    Some(&rest[tag_len..])
}

/// Removes a closing fence from the end of the text, returning the remainder.
fn strip_trailing_fence(text: &str) -> Option<&str> {
    text.strip_suffix("```")
}

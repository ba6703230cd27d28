// 🔤 Text Normalizer - one canonical form for every comparison
//
// "ООО Ромашка", "ооо ромашка", " ооо  Ромашка " → "ооо ромашка"
// Used for roster names, aliases and post candidates alike.

/// Characters stripped from both ends of a token (quotes, brackets)
pub const WRAPPING_CHARS: &[char] = &['«', '»', '"', '\'', '(', ')', '[', ']'];

/// Normalize free text for comparison
///
/// - Lowercase
/// - Unify `ё` with `е`
/// - Collapse whitespace runs to a single space
/// - Trim whitespace and wrapping quotes/brackets from both ends
///
/// Never fails: empty input yields an empty string. Idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace('ё', "е");

    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .trim_matches(|c: char| c.is_whitespace() || WRAPPING_CHARS.contains(&c))
        .to_string()
}

/// Length in characters (not bytes) - Cyrillic is 2 bytes per letter
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

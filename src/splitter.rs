// ✂️ Mention Splitter - annotation field → candidate tokens
//
// The upstream extractor writes things like:
//   "Компании: Яндекс; Сбер, Тинькофф / VK"
// Everything before the first colon is a label and is discarded.

use crate::normalize::normalize;

/// Token boundaries inside an annotation field (all equivalent)
pub const DELIMITERS: &[char] = &[';', ',', '•', '/', '|', '—', '-', '–', '\n', '.'];

/// Split one annotation field into normalized candidate mentions
///
/// Order follows the source text. Duplicates are kept here; per-post
/// deduplication happens in the matcher.
pub fn split_mentions(field: &str) -> Vec<String> {
    let body = match field.split_once(':') {
        Some((_label, rest)) => rest,
        None => field,
    };

    body.split(|c: char| DELIMITERS.contains(&c))
        .map(normalize)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Split an optional cell (missing cell → no candidates)
pub fn split_mentions_opt(field: Option<&str>) -> Vec<String> {
    field.map(split_mentions).unwrap_or_default()
}

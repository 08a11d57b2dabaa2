//! Canonical, URL- and filesystem-safe names

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Returned when nothing usable survives sanitization.
pub const PLACEHOLDER_NAME: &str = "unknown";

/// Map an arbitrary display name to its canonical identifier.
///
/// Steps, in order:
/// 1. lowercase
/// 2. decompose (NFKD) to base ASCII, dropping marks and anything with no ASCII form
/// 3. whitespace and path separators become `_`
/// 4. drop every character outside `[a-z0-9_.]`
/// 5. collapse `_` runs, trim `_` at both ends
/// 6. empty (or dots only) becomes [`PLACEHOLDER_NAME`]
///
/// Total and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> String {
    let lowered = name.to_lowercase();

    let ascii: String = lowered
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut out = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        let mapped = if c.is_ascii_whitespace() || c == '/' || c == '\\' {
            '_'
        } else {
            c
        };
        if !(mapped.is_ascii_lowercase() || mapped.is_ascii_digit() || mapped == '_' || mapped == '.') {
            continue;
        }
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return PLACEHOLDER_NAME.to_string();
    }
    trimmed.to_string()
}

/// True when `name` is already in canonical form.
pub fn is_canonical(name: &str) -> bool {
    sanitize(name) == name
}

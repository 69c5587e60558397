//! Shared utility helpers.

/// Case-insensitive find — returns byte offset of first occurrence of `needle` in `haystack`.
#[inline]
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle_bytes = needle.as_bytes();
    let haystack_bytes = haystack.as_bytes();
    if needle_bytes.len() > haystack_bytes.len() {
        return None;
    }
    haystack_bytes
        .windows(needle_bytes.len())
        .position(|window| window.eq_ignore_ascii_case(needle_bytes))
}

/// Replace every case-insensitive occurrence of `needle` with `replacement`.
///
/// `needle` must be ASCII (parameter names and placeholder tokens are), which
/// keeps every match aligned to a character boundary of `haystack`.
pub fn replace_all_ci(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = find_ci(rest, needle) {
        out.push_str(&rest[..pos]);
        out.push_str(replacement);
        rest = &rest[pos + needle.len()..];
    }
    out.push_str(rest);
    out
}

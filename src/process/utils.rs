use percent_encoding::percent_decode_str;

/// Canonical form of a header: trimmed, lower-cased, spaces and underscores removed.
/// `" Order_Date "` and `"orderdate"` both become `"orderdate"`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Undo the form-style escaping storage notifications apply to object keys:
/// `+` is a space, `%XX` is a byte. Bytes that don't form valid UTF-8 are replaced.
pub fn decode_object_key(encoded: &str) -> String {
    let spaced = encoded.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Last `/`-separated segment of a key.
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// File name without its final extension (`"jan.csv"` → `"jan"`).
pub fn stem_of(key: &str) -> &str {
    let name = file_name_of(key);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

//! Scan-based helpers for pulling values out of semi-structured page text
//! without parsing the surrounding document.

/// Finds the string value of a `"key": "value"` pair anywhere in `source`.
/// Tolerates whitespace around the colon and escaped quotes inside the
/// value. Occurrences where the key is not followed by a quoted string are
/// skipped.
pub fn get_string_value<'a>(source: &'a str, key: &str) -> Option<&'a str> {
    let quoted = format!("\"{}\"", key);
    let bytes = source.as_bytes();
    let mut from = 0;

    while let Some(rel) = source[from..].find(&quoted) {
        let mut i = from + rel + quoted.len();
        from = i;

        i = skip_whitespace(bytes, i);
        if bytes.get(i) != Some(&b':') {
            continue;
        }
        i = skip_whitespace(bytes, i + 1);
        if bytes.get(i) != Some(&b'"') {
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < bytes.len() {
            if bytes[end] == b'"' && bytes[end - 1] != b'\\' {
                return Some(&source[start..end]);
            }
            end += 1;
        }
        return None;
    }

    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Isolates the first balanced top-level JSON object in `source`. Braces
/// immediately preceded by a backslash do not count towards the depth.
/// Returns `None` when no object opens or the braces never balance.
pub fn extract_object(source: &str) -> Option<&str> {
    let start = source.find('{')?;
    let bytes = source.as_bytes();
    let mut depth: i32 = 0;
    let mut last = 0u8;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if last != b'\\' {
            match b {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
        }
        if depth == 0 {
            return Some(&source[start..=i]);
        }
        last = b;
    }

    None
}

/// Undoes one level of JSON string escaping (`\"`, `\\`, `\/`, `\uXXXX`, ...)
/// by running the span through the JSON string parser.
pub fn unescape(escaped: &str) -> Option<String> {
    serde_json::from_str(&format!("\"{}\"", escaped)).ok()
}

use depot_constants::LATEST_TAG;

/// Pulls the first `MAJOR.MINOR.PATCH` run out of a registry selector.
///
/// `"^4.18.2"` becomes `"4.18.2"`, `">=1.2.3 <2.0.0"` becomes `"1.2.3"`, and
/// `"latest"` is returned as-is. Anything without a dotted triple yields an
/// empty string.
#[must_use]
pub fn extract_version(selector: &str) -> String {
    let selector = selector.trim();
    if is_latest(selector) {
        return selector.to_string();
    }

    let bytes = selector.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if bytes.get(start).is_some_and(u8::is_ascii_digit) {
            if let Some(end) = match_triple(bytes, start) {
                return selector.get(start..end).unwrap_or_default().to_string();
            }
            // Skip the whole digit run so "12.3" doesn't get retried as "2.3".
            while bytes.get(start).is_some_and(u8::is_ascii_digit) {
                start += 1;
            }
        } else {
            start += 1;
        }
    }

    String::new()
}

/// Returns the end offset of `digits.digits.digits` starting at `start`.
fn match_triple(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    for part in 0..3 {
        let run_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        if pos == run_start {
            return None;
        }
        if part < 2 {
            if bytes.get(pos) != Some(&b'.') {
                return None;
            }
            pos += 1;
        }
    }
    Some(pos)
}

/// The dist-tag that stands in for "whatever is newest".
#[must_use]
pub fn is_latest(version: &str) -> bool {
    version == LATEST_TAG
}

//! Utility functions shared by the parser and the writer.

use std::borrow::Cow;

use memchr::memchr_iter;

/// Decode bytes to a string, handling the encodings found in legacy files.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from the file's `encoding:` header)
/// 3. Falls back to Windows-1252 (common in old genealogy exports)
///
/// Returns the decoded string. Uses `Cow<str>` to avoid allocation when the
/// input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    // Try UTF-8 first (handles BOM automatically)
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    // If UTF-8 failed, try the hint encoding
    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    // Fallback: Windows-1252 (superset of ISO-8859-1)
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the declared encoding from a `.gw` header.
///
/// Scans the leading lines for `encoding: <name>`. The scan stops at the
/// first line that is neither blank nor a recognized header line, so a file
/// without a header is rejected cheaply.
pub fn extract_gw_encoding(bytes: &[u8]) -> Option<&str> {
    // The header, when present, sits in the first few lines
    let check_len = bytes.len().min(256);
    for line in bytes[..check_len].split(|&b| b == b'\n') {
        let line = line.trim_ascii();
        if line.is_empty() || line == b"gwplus" {
            continue;
        }
        if let Some(rest) = line.strip_prefix(b"encoding:") {
            return std::str::from_utf8(rest.trim_ascii()).ok();
        }
        break;
    }
    None
}

/// Split text into lines, tolerating both LF and CRLF endings.
///
/// The returned slices never include the terminators. A trailing newline does
/// not produce an empty final line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    for nl in memchr_iter(b'\n', bytes) {
        let mut end = nl;
        if end > start && bytes[end - 1] == b'\r' {
            end -= 1;
        }
        lines.push(&text[start..end]);
        start = nl + 1;
    }

    if start < bytes.len() {
        let mut end = bytes.len();
        if bytes[end - 1] == b'\r' {
            end -= 1;
        }
        lines.push(&text[start..end]);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_utf8() {
        assert_eq!(decode_text("Frédéric".as_bytes(), None), "Frédéric");
    }

    #[test]
    fn test_decode_text_latin1_fallback() {
        // "Frédéric" in ISO-8859-1: é = 0xE9
        let bytes = b"Fr\xE9d\xE9ric";
        assert_eq!(decode_text(bytes, None), "Frédéric");
    }

    #[test]
    fn test_decode_text_with_hint() {
        let bytes = b"Fr\xE9d\xE9ric";
        assert_eq!(decode_text(bytes, Some("iso-8859-1")), "Frédéric");
    }

    #[test]
    fn test_extract_gw_encoding() {
        assert_eq!(
            extract_gw_encoding(b"encoding: iso-8859-1\nfam X Y + Z W\n"),
            Some("iso-8859-1")
        );
        assert_eq!(
            extract_gw_encoding(b"gwplus\nencoding: utf-8\nfam X Y + Z W\n"),
            Some("utf-8")
        );
        assert_eq!(extract_gw_encoding(b"fam X Y + Z W\n"), None);
        assert_eq!(extract_gw_encoding(b""), None);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\r\nb\r\n"), vec!["a", "b"]);
        assert_eq!(split_lines(""), Vec::<&str>::new());
        assert_eq!(split_lines("one line"), vec!["one line"]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
    }
}

//! Text decoding helpers.

use std::borrow::Cow;

use memchr::memmem;

/// How far into a page a `<meta charset>` declaration is looked for.
const CHARSET_SNIFF_LEN: usize = 1024;

/// Decode page bytes to a string.
///
/// 1. UTF-8 (BOM handled by encoding_rs)
/// 2. The encoding named by a `<meta charset=...>` near the top of the page
/// 3. Windows-1252, superset of ISO-8859-1
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(label) = extract_meta_charset(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the label from `<meta charset="...">` in the head of a page.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(CHARSET_SNIFF_LEN)];
    let lowered = head.to_ascii_lowercase();

    let start = memmem::find(&lowered, b"charset=")? + b"charset=".len();
    let rest = &lowered[start..];
    let rest = rest.strip_prefix(b"\"").or_else(|| rest.strip_prefix(b"'")).unwrap_or(rest);
    let end = rest
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b'>' | b'/' | b';') || b.is_ascii_whitespace())
        .unwrap_or(rest.len());

    let label = std::str::from_utf8(&rest[..end]).ok()?;
    (!label.is_empty()).then(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        assert_eq!(decode_text("café".as_bytes()), "café");
    }

    #[test]
    fn test_meta_charset_hint() {
        let mut page = b"<html><head><meta charset=\"iso-8859-15\"></head><body>".to_vec();
        page.push(0xA4); // euro sign in latin-9
        page.extend_from_slice(b"</body></html>");

        assert_eq!(extract_meta_charset(&page).as_deref(), Some("iso-8859-15"));
        assert!(decode_text(&page).contains('€'));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_text(&bytes), "café");
    }

    #[test]
    fn test_http_equiv_charset() {
        let page = br#"<meta http-equiv="Content-Type" content="text/html; charset=windows-1251">"#;
        assert_eq!(extract_meta_charset(page).as_deref(), Some("windows-1251"));
    }
}

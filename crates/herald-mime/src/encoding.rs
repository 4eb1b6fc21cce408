//! MIME encoding utilities.
//!
//! Supports Base64 (wrapped for transport), Quoted-Printable, and RFC 2047
//! header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 without line breaks.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-terminated lines of 76 characters.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);

    // Base64 output is pure ASCII, so byte chunks are valid str boundaries.
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        result.push_str(&String::from_utf8_lossy(chunk));
        result.push_str("\r\n");
    }

    result
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks (`\n` or `\r\n`) are kept as hard CRLF breaks; whitespace at
/// the end of a line is encoded so it survives transport.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let normalized = text.replace("\r\n", "\n");

    for (index, line) in normalized.split('\n').enumerate() {
        if index > 0 {
            result.push_str("\r\n");
        }

        let bytes = line.as_bytes();
        let mut line_length = 0;

        for (pos, byte) in bytes.iter().enumerate() {
            let is_last = pos + 1 == bytes.len();
            let mut token = String::with_capacity(3);

            match byte {
                b'!'..=b'<' | b'>'..=b'~' => token.push(*byte as char),
                b' ' | b'\t' if !is_last => token.push(*byte as char),
                _ => {
                    let _ = write!(token, "={byte:02X}");
                }
            }

            // Soft line break, leaving room for the trailing '='.
            if line_length + token.len() > MAX_LINE_LENGTH - 1 {
                result.push_str("=\r\n");
                line_length = 0;
            }

            line_length += token.len();
            result.push_str(&token);
        }
    }

    result
}

/// Longest encoded word RFC 2047 allows, delimiters included.
const MAX_ENCODED_WORD: usize = 75;

/// Encodes a header value using RFC 2047 encoding when needed.
///
/// Format: `=?charset?B?encoded-text?=`. Plain ASCII values are returned
/// unchanged. Longer values are split on character boundaries into several
/// encoded words separated by a space, each at most 75 characters.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?") {
        return text.to_string();
    }

    // "=?" charset "?B?" payload "?="
    let payload = MAX_ENCODED_WORD.saturating_sub(charset.len() + 7).max(4);
    let max_bytes = payload / 4 * 3;

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (index, c) in text.char_indices() {
        let next = index + c.len_utf8();
        if next - start > max_bytes && end > start {
            words.push(&text[start..end]);
            start = end;
        }
        end = next;
    }
    words.push(&text[start..end]);

    words
        .iter()
        .map(|word| format!("=?{charset}?B?{}?=", encode_base64(word.as_bytes())))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_base64_wrapped_line_length() {
        let data = vec![0xAB_u8; 200];
        let wrapped = encode_base64_wrapped(&data);
        for line in wrapped.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= 76);
        }
        assert!(wrapped.ends_with("\r\n"));
        let joined: String = wrapped.split("\r\n").collect();
        assert_eq!(joined, encode_base64(&data));
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
        assert!(encode_quoted_printable("Héllo, Wørld!").contains("=C3=A9"));
        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");
    }

    #[test]
    fn test_quoted_printable_line_breaks() {
        assert_eq!(encode_quoted_printable("one\ntwo"), "one\r\ntwo");
        assert_eq!(encode_quoted_printable("one\r\ntwo"), "one\r\ntwo");
        assert_eq!(encode_quoted_printable("trailing \nx"), "trailing=20\r\nx");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let long = "x".repeat(200);
        let encoded = encode_quoted_printable(&long);
        for line in encoded.split("\r\n") {
            assert!(line.len() <= 76, "line too long: {}", line.len());
        }
        assert_eq!(encoded.replace("=\r\n", ""), long);
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_long_value_split() {
        let subject = "Überweisung für die Rechnung Nr. 12345 ist eingegangen – vielen Dank für Ihre Zahlung";
        let encoded = encode_rfc2047(subject, "utf-8");

        let words: Vec<_> = encoded.split(' ').collect();
        assert!(words.len() > 1);
        let mut decoded = Vec::new();
        for word in words {
            assert!(word.len() <= 75, "encoded word too long: {}", word.len());
            let payload = word.strip_prefix("=?utf-8?B?").unwrap().strip_suffix("?=").unwrap();
            let bytes = STANDARD.decode(payload).unwrap();
            assert!(std::str::from_utf8(&bytes).is_ok());
            decoded.extend(bytes);
        }
        assert_eq!(String::from_utf8(decoded).unwrap(), subject);
    }

    #[test]
    fn test_rfc2047_multibyte_boundaries() {
        let subject = "日本語".repeat(20);
        for word in encode_rfc2047(&subject, "utf-8").split(' ') {
            assert!(word.len() <= 75);
        }
    }
}

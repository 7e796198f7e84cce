use encoding_rs::UTF_8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    /// Invalid byte sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode as UTF-8 no matter what the response headers or meta tags claim.
/// A leading BOM is dropped; invalid sequences are replaced, never fatal.
pub fn decode_utf8(bytes: &[u8]) -> DecodedHtml {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    DecodedHtml {
        html: text.into_owned(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::decode_utf8;

    #[test]
    fn strips_bom() {
        let decoded = decode_utf8(b"\xEF\xBB\xBFhello");
        assert_eq!(decoded.html, "hello");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn invalid_bytes_are_replaced_not_rejected() {
        let decoded = decode_utf8(b"caf\xe9");
        assert_eq!(decoded.html, "caf\u{FFFD}");
        assert!(decoded.had_errors);
    }
}

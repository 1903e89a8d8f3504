//! Article body normalizer.
//!
//! Bodies are stored as plain UTF-8 text with LF line endings.

use bytes::Bytes;
use scribe_core::{NormalizedPayload, ProgressSink};

use crate::compressor::CompressionError;

pub const DOCUMENT_CONTENT_TYPE: &str = "text/plain";

const UTF8_BOM: &str = "\u{feff}";

pub struct DocumentNormalizer;

impl DocumentNormalizer {
    pub fn normalize(
        raw: &[u8],
        progress: &dyn ProgressSink,
    ) -> Result<NormalizedPayload, CompressionError> {
        progress.on_progress(10);

        let text = std::str::from_utf8(raw)
            .map_err(|e| CompressionError::InvalidText(format!("body is not valid UTF-8: {}", e)))?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        progress.on_progress(50);

        let normalized = if text.contains('\r') {
            text.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            text.to_string()
        };
        progress.on_progress(90);

        Ok(NormalizedPayload {
            bytes: Bytes::from(normalized),
            content_type: DOCUMENT_CONTENT_TYPE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::NoProgress;

    #[test]
    fn test_plain_markdown_is_unchanged() {
        let raw = b"# Title\n\nBody text.\n";
        let out = DocumentNormalizer::normalize(raw, &NoProgress).unwrap();
        assert_eq!(&out.bytes[..], &raw[..]);
        assert_eq!(out.content_type, "text/plain");
    }

    #[test]
    fn test_line_endings_become_lf() {
        let out = DocumentNormalizer::normalize(b"a\r\nb\rc\n", &NoProgress).unwrap();
        assert_eq!(&out.bytes[..], b"a\nb\nc\n");
    }

    #[test]
    fn test_bom_is_removed() {
        let out = DocumentNormalizer::normalize("\u{feff}# Hi".as_bytes(), &NoProgress).unwrap();
        assert_eq!(&out.bytes[..], b"# Hi");
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let err = DocumentNormalizer::normalize(&[0xff, 0xfe, 0x00], &NoProgress).unwrap_err();
        assert!(matches!(err, CompressionError::InvalidText(_)));
    }
}

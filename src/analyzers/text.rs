// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Text decoding

/// Decode file bytes as UTF-8, replacing invalid sequences, dropping a BOM and
/// normalizing line endings to `\n`.
pub fn decode_text(data: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(data);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(decode_text(b"engine room, shift 2"), "engine room, shift 2");
    }

    #[test]
    fn test_bom_and_line_endings() {
        let data = b"\xEF\xBB\xBFline one\r\nline two\rline three";
        assert_eq!(decode_text(data), "line one\nline two\nline three");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let decoded = decode_text(b"caf\xE9");
        assert!(decoded.starts_with("caf"));
        assert!(decoded.contains('\u{fffd}'));
    }
}

//! Byte-array codecs: Base64 and byte-array-in-string (BAIS).
//!
//! BAIS keeps printable-ASCII runs literal so byte arrays that mostly hold
//! text stay readable on the wire, at the cost of `\u00XX` escapes for the
//! rest. Each character of a BAIS string is one byte, so decoding rejects
//! any character above U+00FF.

use alloc::{string::String, vec::Vec};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::ErrorKind;

/// Prefix characters marking a string as BAIS rather than Base64. `!` is
/// what the writer emits; U+0001 is accepted for documents written by hosts
/// that prefer a control character.
pub(crate) const BAIS_PREFIXES: [char; 2] = ['!', '\u{1}'];

pub(crate) fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn base64_decode(text: &str) -> Result<Vec<u8>, ErrorKind> {
    STANDARD.decode(text).map_err(|_| ErrorKind::InvalidBase64)
}

/// Encodes `bytes` as a BAIS string, without any prefix. The JSON string
/// escaper is responsible for making non-printable characters wire-safe.
pub(crate) fn bais_encode(bytes: &[u8], out: &mut String) {
    for &b in bytes {
        if (0x20..=0x7E).contains(&b) {
            out.push(b as char);
        } else {
            out.push(char::from_u32(u32::from(b)).unwrap_or('\u{0}'));
        }
    }
}

/// Decodes a BAIS string whose prefix, if any, has been stripped.
pub(crate) fn bais_decode(text: &str) -> Result<Vec<u8>, ErrorKind> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = u32::from(ch);
        if code > 0xFF {
            return Err(ErrorKind::InvalidByteChar(ch));
        }
        #[allow(clippy::cast_possible_truncation)]
        out.push(code as u8);
    }
    Ok(out)
}

/// Strips a BAIS prefix character, if present.
pub(crate) fn strip_bais_prefix(text: &str) -> Option<&str> {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if BAIS_PREFIXES.contains(&c) => Some(chars.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec};

    use super::*;

    #[test]
    fn bais_keeps_printable_ascii() {
        let mut s = String::new();
        bais_encode(b"abc XYZ 09", &mut s);
        assert_eq!(s, "abc XYZ 09");
    }

    #[test]
    fn bais_round_trips_high_bytes() {
        let bytes = vec![0x00, 0x1F, 0x20, 0x7E, 0x7F, 0x80, 0xFF];
        let mut s = String::new();
        bais_encode(&bytes, &mut s);
        assert_eq!(bais_decode(&s).unwrap(), bytes);
    }

    #[test]
    fn bais_rejects_wide_chars() {
        assert_eq!(
            bais_decode("a\u{100}"),
            Err(ErrorKind::InvalidByteChar('\u{100}'))
        );
    }

    #[test]
    fn prefix_stripping() {
        assert_eq!(strip_bais_prefix("!abc"), Some("abc"));
        assert_eq!(strip_bais_prefix("\u{1}abc"), Some("abc"));
        assert_eq!(strip_bais_prefix("abc"), None);
        assert_eq!(strip_bais_prefix(""), None);
    }
}

//! Numeric decoding over already-spanned ASCII ranges.

use crate::error::ErrorKind;

/// Decodes an integer span.
///
/// Spans of up to 18 digits take the direct byte-arithmetic path; longer
/// spans fall back to a decimal-string parse. `None` means the magnitude
/// does not fit a signed 128-bit integer; callers decide whether to retry
/// the span as a float.
pub(crate) fn decode_integer(bytes: &[u8]) -> Option<i128> {
    let (neg, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return None;
    }
    if digits.len() <= 18 {
        // 18 digits always fit in a 64-bit accumulator.
        let mut acc: i64 = 0;
        for &b in digits {
            debug_assert!(b.is_ascii_digit());
            acc = acc * 10 + i64::from(b - b'0');
        }
        Some(if neg { -i128::from(acc) } else { i128::from(acc) })
    } else {
        let text = core::str::from_utf8(bytes).ok()?;
        text.parse::<i128>().ok()
    }
}

/// Decodes a float span with the locale-invariant parser.
pub(crate) fn decode_float(bytes: &[u8]) -> Result<f64, ErrorKind> {
    let text = core::str::from_utf8(bytes).map_err(|_| ErrorKind::MalformedNumber)?;
    text.parse::<f64>().map_err(|_| ErrorKind::MalformedNumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_integers_accumulate() {
        assert_eq!(decode_integer(b"0"), Some(0));
        assert_eq!(decode_integer(b"-42"), Some(-42));
        assert_eq!(decode_integer(b"999999999999999999"), Some(999_999_999_999_999_999));
    }

    #[test]
    fn long_integers_fall_back() {
        assert_eq!(
            decode_integer(b"170141183460469231731687303715884105727"),
            Some(i128::MAX)
        );
        assert_eq!(decode_integer(b"170141183460469231731687303715884105728"), None);
    }

    #[test]
    fn floats_parse_relaxed_spellings() {
        assert_eq!(decode_float(b"3.25"), Ok(3.25));
        assert_eq!(decode_float(b".5"), Ok(0.5));
        assert_eq!(decode_float(b"1e3"), Ok(1000.0));
        assert_eq!(decode_float(b"+2"), Ok(2.0));
    }
}

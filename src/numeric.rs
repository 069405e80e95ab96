//! Allocation-free integer formatting for the rendering hot path.
//!
//! Renderers call this instead of `format!` so that a log line never
//! creates a temporary string.

/// Enough room for the 20 digits of `u64::MAX`, which covers the magnitude
/// of `i64::MIN`.
const MAX_DIGITS: usize = 20;

/// Appends the decimal representation of `value` to `buf`.
///
/// Negative values get a leading `-`. If the magnitude has fewer than
/// `min_width` digits it is left-padded with `0`; the sign is not counted
/// toward the width. Numbers wider than `min_width` are never truncated.
///
/// # Arguments
///
/// * `buf` - Output buffer, only ever appended to
/// * `value` - Any `i64`, including `i64::MIN`
/// * `min_width` - Minimum number of digits, `0` for no padding
///
/// # Examples
///
/// ```
/// # use access_logger::numeric::write_int;
/// let mut buf = Vec::new();
/// write_int(&mut buf, -1, 5);
/// assert_eq!(buf, b"-00001");
/// ```
#[inline]
pub fn write_int(buf: &mut Vec<u8>, value: i64, min_width: usize) {
    let mut scratch = [0u8; MAX_DIGITS];
    let mut n = value.unsigned_abs();
    let mut pos = MAX_DIGITS;
    loop {
        pos -= 1;
        scratch[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }

    if value < 0 {
        buf.push(b'-');
    }
    let digits = MAX_DIGITS - pos;
    if digits < min_width {
        buf.resize(buf.len() + (min_width - digits), b'0');
    }
    buf.extend_from_slice(&scratch[pos..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: i64, min_width: usize) -> String {
        let mut buf = Vec::new();
        write_int(&mut buf, value, min_width);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_unpadded() {
        assert_eq!(render(0, 0), "0");
        assert_eq!(render(1, 0), "1");
        assert_eq!(render(-1, 0), "-1");
        assert_eq!(render(12345, 0), "12345");
        assert_eq!(render(-12345, 0), "-12345");
        assert_eq!(render(i64::MAX, 0), "9223372036854775807");
        assert_eq!(render(-i64::MAX, 0), "-9223372036854775807");
    }

    #[test]
    fn test_padded() {
        assert_eq!(render(0, 5), "00000");
        assert_eq!(render(1, 5), "00001");
        assert_eq!(render(-1, 5), "-00001");
        assert_eq!(render(12345, 5), "12345");
        assert_eq!(render(-12345, 5), "-12345");
        assert_eq!(render(i64::MAX, 5), "9223372036854775807");
    }

    #[test]
    fn test_min_value() {
        assert_eq!(render(i64::MIN, 0), "-9223372036854775808");
        assert_eq!(render(i64::MIN, 25), "-0000009223372036854775808");
    }

    #[test]
    fn test_appends_without_clearing() {
        let mut buf = b"x=".to_vec();
        write_int(&mut buf, 7, 2);
        assert_eq!(buf, b"x=07");
    }
}

//! Naming and key-normalization rules of the analyzed language
//!
//! Class and function names are case-insensitive and may be written with a
//! leading namespace separator. Array keys written as decimal integer strings
//! are the same key as the integer they spell.

/// Normalizes a class, interface or function name for use as a lookup key:
/// strips a leading `\` and lowercases.
///
/// # Examples
/// ```
/// use sable_utils::names::normalize_name;
///
/// assert_eq!(normalize_name("\\Foo\\Bar"), "foo\\bar");
/// assert_eq!(normalize_name("strlen"), "strlen");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

/// Strips the leading `\` from a name, keeping its case.
#[must_use]
pub fn strip_leading_separator(name: &str) -> &str {
    name.trim_start_matches('\\')
}

/// Interprets a string array key the way the runtime does: a canonical
/// decimal integer string (no sign on zero, no leading zeroes, no whitespace)
/// is the integer key it spells.
///
/// # Examples
/// ```
/// use sable_utils::names::integer_key_from_string;
///
/// assert_eq!(integer_key_from_string("3"), Some(3));
/// assert_eq!(integer_key_from_string("-12"), Some(-12));
/// assert_eq!(integer_key_from_string("03"), None);
/// assert_eq!(integer_key_from_string("3.0"), None);
/// assert_eq!(integer_key_from_string("-0"), None);
/// ```
#[must_use]
pub fn integer_key_from_string(key: &str) -> Option<i64> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if key == "-0" {
        return None;
    }
    key.parse().ok()
}

/// Whether a string would be accepted by the runtime's numeric-string check
/// (integers, decimals and exponent forms, with optional surrounding
/// whitespace on the left).
#[must_use]
pub fn is_numeric_string(value: &str) -> bool {
    let bytes = value.trim_start().as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Names of the superglobal variables, without the leading `$`
pub const SUPERGLOBALS: &[&str] = &[
    "GLOBALS", "_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV",
];

/// Whether a variable name (without `$`) is a superglobal
#[must_use]
pub fn is_superglobal(name: &str) -> bool {
    SUPERGLOBALS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("\\Exception"), "exception");
        assert_eq!(normalize_name("ArrayAccess"), "arrayaccess");
        assert_eq!(strip_leading_separator("\\Foo"), "Foo");
    }

    #[test]
    fn integer_keys_follow_runtime_rules() {
        assert_eq!(integer_key_from_string("0"), Some(0));
        assert_eq!(integer_key_from_string("42"), Some(42));
        assert_eq!(integer_key_from_string(" 4"), None);
        assert_eq!(integer_key_from_string("abc"), None);
        assert_eq!(integer_key_from_string(""), None);
        assert_eq!(integer_key_from_string("-"), None);
    }

    #[test]
    fn numeric_strings() {
        assert!(is_numeric_string("12"));
        assert!(is_numeric_string("1.5e3"));
        assert!(is_numeric_string(" 7"));
        assert!(!is_numeric_string("abc"));
        assert!(!is_numeric_string(""));
        assert!(!is_numeric_string("inf"));
        assert!(!is_numeric_string("1e"));
    }

    #[test]
    fn superglobals_are_recognized() {
        assert!(is_superglobal("_GET"));
        assert!(!is_superglobal("get"));
    }
}

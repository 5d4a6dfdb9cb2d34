//! Scalar resolution.
//!
//! Plain (unquoted) scalars are typed by their literal text. The rules are
//! tried in order and the first match wins:
//!
//! 1. `""`, `~`, `null`, `Null`, `NULL` are null.
//! 2. `true`/`True`/`TRUE` and `false`/`False`/`FALSE` are booleans.
//! 3. `[-+]?[0-9]+`, `0x[0-9a-fA-F]+` and `0o[0-7]+` are 64-bit integers.
//!    A literal outside the signed 64-bit range is an error.
//! 4. Decimal numbers with a fraction and/or exponent, `.nan` and
//!    `[-+]?.inf` (the last two case-insensitive) are floats.
//! 5. Anything else is a string, taken verbatim.
//!
//! Quoted scalars never reach this module; they are always strings.
//! With `allow_inf_nan` turned off, `.nan` and `.inf` fall through to rule 5.

use crate::error::{Error, Result};
use crate::node::Node;
use crate::options::ParseOptions;

/// Resolve the text of a plain scalar into a typed node.
pub fn resolve_plain(text: &str) -> Result<Node> {
    resolve_plain_with(text, &ParseOptions::default())
}

pub(crate) fn resolve_plain_with(text: &str, options: &ParseOptions) -> Result<Node> {
    if is_null(text) {
        return Ok(Node::Null);
    }
    if let Some(b) = parse_bool(text) {
        return Ok(Node::Bool(b));
    }
    if let Some(n) = parse_int(text)? {
        return Ok(Node::Int(n));
    }
    if options.allow_inf_nan {
        if let Some(special) = parse_special_float(text) {
            return Ok(Node::Float(special));
        }
    }
    if let Some(f) = parse_float(text)? {
        return Ok(Node::Float(f));
    }
    Ok(Node::String(text.to_string()))
}

/// Returns true when `text` written as a plain scalar would load back as
/// exactly this string.
pub(crate) fn resolves_to_string(text: &str) -> bool {
    matches!(resolve_plain(text), Ok(Node::String(_)))
}

fn is_null(s: &str) -> bool {
    matches!(s, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Integers
// ============================================================================

fn parse_int(s: &str) -> Result<Option<i64>> {
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x") {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(None);
        }
        (hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o") {
        if oct.is_empty() || !oct.chars().all(|c| ('0'..='7').contains(&c)) {
            return Ok(None);
        }
        (oct, 8)
    } else if is_integer_pattern(s) {
        (s, 10)
    } else {
        return Ok(None);
    };

    // The pattern already matched, so the only possible failure is range.
    i64::from_str_radix(digits, radix)
        .map(Some)
        .map_err(|_| Error::resolve(format!("integer literal out of range: {}", s)))
}

/// Check if string matches integer pattern: [-+]?\d+
fn is_integer_pattern(s: &str) -> bool {
    let s = s
        .strip_prefix('-')
        .or_else(|| s.strip_prefix('+'))
        .unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Floats
// ============================================================================

fn parse_float(s: &str) -> Result<Option<f64>> {
    if !is_float_pattern(s) {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| Error::resolve(format!("invalid float literal: {}", s)))
}

fn parse_special_float(s: &str) -> Option<f64> {
    let lower = s.to_ascii_lowercase();
    match lower.as_str() {
        ".nan" => Some(f64::NAN),
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Check if string matches float pattern: [-+]?(\d+\.\d*|\.\d+)([eE][-+]?\d+)?
/// Also matches exponent-only notation: [-+]?\d+[eE][-+]?\d+
fn is_float_pattern(s: &str) -> bool {
    let s = s
        .strip_prefix('-')
        .or_else(|| s.strip_prefix('+'))
        .unwrap_or(s);

    // Split off exponent part if present
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(e_pos) => (&s[..e_pos], Some(&s[e_pos + 1..])),
        None => (s, None),
    };

    // Validate exponent if present
    if let Some(exp) = exponent {
        let exp = exp
            .strip_prefix('+')
            .or_else(|| exp.strip_prefix('-'))
            .unwrap_or(exp);
        if exp.is_empty() || !exp.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }

    match mantissa.split_once('.') {
        Some((before, after)) => {
            (!before.is_empty() || !after.is_empty())
                && before.chars().all(|c| c.is_ascii_digit())
                && after.chars().all(|c| c.is_ascii_digit())
        }
        // Without a decimal point only the exponent form is a float (1e10)
        None => {
            exponent.is_some()
                && !mantissa.is_empty()
                && mantissa.chars().all(|c| c.is_ascii_digit())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn resolve(s: &str) -> Node {
        resolve_plain(s).unwrap()
    }

    #[test]
    fn test_null_forms() {
        for s in ["", "~", "null", "Null", "NULL"] {
            assert_eq!(resolve(s), Node::Null, "{:?}", s);
        }
        assert_eq!(resolve("nULL"), Node::from("nULL"));
    }

    #[test]
    fn test_bool_forms() {
        assert_eq!(resolve("true"), Node::Bool(true));
        assert_eq!(resolve("True"), Node::Bool(true));
        assert_eq!(resolve("FALSE"), Node::Bool(false));
        assert_eq!(resolve("yes"), Node::from("yes"));
        assert_eq!(resolve("tRUE"), Node::from("tRUE"));
    }

    #[test]
    fn test_integers() {
        assert_eq!(resolve("42"), Node::Int(42));
        assert_eq!(resolve("-10"), Node::Int(-10));
        assert_eq!(resolve("+7"), Node::Int(7));
        assert_eq!(resolve("0x1F"), Node::Int(31));
        assert_eq!(resolve("0o17"), Node::Int(15));
        assert_eq!(resolve("9223372036854775807"), Node::Int(i64::MAX));
        assert_eq!(resolve("-9223372036854775808"), Node::Int(i64::MIN));
        assert_eq!(resolve("0x"), Node::from("0x"));
        assert_eq!(resolve("0o8"), Node::from("0o8"));
        assert_eq!(resolve("1_000"), Node::from("1_000"));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        let err = resolve_plain("9223372036854775808").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolve);
        assert!(err.message().contains("out of range"));
        assert!(resolve_plain("0xFFFFFFFFFFFFFFFF").is_err());
        assert!(resolve_plain("-9223372036854775809").is_err());
    }

    #[test]
    fn test_floats() {
        assert_eq!(resolve("1.5"), Node::Float(1.5));
        assert_eq!(resolve(".5"), Node::Float(0.5));
        assert_eq!(resolve("1."), Node::Float(1.0));
        assert_eq!(resolve("-3.25"), Node::Float(-3.25));
        assert_eq!(resolve("1e10"), Node::Float(1e10));
        assert_eq!(resolve("1.5E-3"), Node::Float(1.5e-3));
        assert_eq!(resolve("+2.5e+2"), Node::Float(250.0));
        assert_eq!(resolve("."), Node::from("."));
        assert_eq!(resolve("-."), Node::from("-."));
        assert_eq!(resolve("1.2.3"), Node::from("1.2.3"));
        assert_eq!(resolve("1e"), Node::from("1e"));
    }

    #[test]
    fn test_special_floats() {
        assert!(resolve(".nan").as_f64().unwrap().is_nan());
        assert!(resolve(".NaN").as_f64().unwrap().is_nan());
        assert_eq!(resolve(".inf"), Node::Float(f64::INFINITY));
        assert_eq!(resolve("+.Inf"), Node::Float(f64::INFINITY));
        assert_eq!(resolve("-.INF"), Node::Float(f64::NEG_INFINITY));
        assert_eq!(resolve("nan"), Node::from("nan"));
        assert_eq!(resolve("-.nan"), Node::from("-.nan"));
    }

    #[test]
    fn test_inf_nan_disabled() {
        let opts = ParseOptions::default().allow_inf_nan(false);
        for s in [".nan", ".inf", "-.Inf", "+.INF"] {
            assert_eq!(resolve_plain_with(s, &opts).unwrap(), Node::from(s));
        }
        assert_eq!(resolve_plain_with("1.5", &opts).unwrap(), Node::Float(1.5));
        assert_eq!(resolve_plain_with("1e3", &opts).unwrap(), Node::Float(1e3));
    }

    #[test]
    fn test_strings() {
        assert_eq!(resolve("John"), Node::from("John"));
        assert_eq!(resolve("2024-01-01"), Node::from("2024-01-01"));
        assert!(resolves_to_string("hello world"));
        assert!(!resolves_to_string("42"));
        assert!(!resolves_to_string("99999999999999999999"));
    }
}

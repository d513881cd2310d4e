//! Field value coercion.
//!
//! Declared entry content is free text. Before it goes over the wire it is
//! turned into a typed scalar with one fixed contract:
//!
//! - text matching `-?(0|[1-9][0-9]*)` is an [`FieldValue::Integer`] when it fits `i64`
//! - text matching `-?(0|[1-9][0-9]*)\.[0-9]+` is a [`FieldValue::Float`] when it has
//!   at most 15 significant digits (so the decimal survives the trip through `f64`)
//! - everything else is kept verbatim as a [`FieldValue::String`]
//!
//! Leading zeros (`"007"`, phone numbers, zip codes), signs other than `-`,
//! exponents and surrounding whitespace all keep the value a string.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Significant decimal digits an `f64` is guaranteed to preserve.
const MAX_FLOAT_DIGITS: usize = f64::DIGITS as usize;

/// A coerced entry field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    String(String),
}

/// Shape of a canonical decimal number.
struct Decimal<'a> {
    integer: &'a str,
    fraction: Option<&'a str>,
}

impl<'a> Decimal<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let unsigned = raw.strip_prefix('-').unwrap_or(raw);
        let (integer, fraction) = match unsigned.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (unsigned, None),
        };

        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(integer) || (integer.len() > 1 && integer.starts_with('0')) {
            return None;
        }
        if fraction.is_some_and(|f| !all_digits(f)) {
            return None;
        }
        Some(Self { integer, fraction })
    }

    fn significant_digits(&self) -> usize {
        let digits: String = self
            .integer
            .chars()
            .chain(self.fraction.unwrap_or_default().chars())
            .collect();
        digits.trim_start_matches('0').trim_end_matches('0').len()
    }
}

/// Coerce declared text into a typed field value.
pub fn coerce(raw: &str) -> FieldValue {
    let keep = || FieldValue::String(raw.to_string());

    let Some(decimal) = Decimal::parse(raw) else {
        return keep();
    };

    if decimal.fraction.is_none() {
        return raw.parse::<i64>().map_or_else(|_| keep(), FieldValue::Integer);
    }

    if decimal.significant_digits() > MAX_FLOAT_DIGITS {
        return keep();
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Float(v),
        _ => keep(),
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            // Keep the decimal point so the text coerces back to a float
            Self::Float(v) if v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Integer(v) => Value::from(v),
            FieldValue::Float(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
            FieldValue::String(s) => Value::String(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(raw: &str) -> FieldValue {
        coerce(&coerce(raw).to_string())
    }

    #[test]
    fn test_integers() {
        assert_eq!(coerce("42"), FieldValue::Integer(42));
        assert_eq!(coerce("-5"), FieldValue::Integer(-5));
        assert_eq!(coerce("0"), FieldValue::Integer(0));
        assert_eq!(coerce("-0"), FieldValue::Integer(0));
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_floats() {
        assert_eq!(coerce("3.14"), FieldValue::Float(3.14));
        assert_eq!(coerce("-0.5"), FieldValue::Float(-0.5));
        assert_eq!(coerce("0.000123"), FieldValue::Float(0.000_123));
    }

    #[test]
    fn test_decimal_with_zero_fraction_stays_float() {
        assert_eq!(coerce("3.0"), FieldValue::Float(3.0));
        assert_eq!(coerce("3.0").to_string(), "3.0");
    }

    #[test]
    fn test_leading_zeros_stay_string() {
        assert_eq!(coerce("007"), FieldValue::String("007".into()));
        assert_eq!(coerce("0044 20 7946 0000"), FieldValue::String("0044 20 7946 0000".into()));
        assert_eq!(coerce("00.5"), FieldValue::String("00.5".into()));
    }

    #[test]
    fn test_plain_text_stays_string() {
        assert_eq!(coerce("tf_test1"), FieldValue::String("tf_test1".into()));
        assert_eq!(coerce(""), FieldValue::String(String::new()));
        assert_eq!(coerce("-"), FieldValue::String("-".into()));
    }

    #[test]
    fn test_non_canonical_numbers_stay_string() {
        for raw in ["+5", " 42", "42 ", "1e3", "inf", "NaN", ".5", "5.", "1_000", "--1", "0x1F"] {
            assert_eq!(coerce(raw), FieldValue::String(raw.into()), "{raw:?}");
        }
    }

    #[test]
    fn test_out_of_range_integer_stays_string() {
        assert_eq!(
            coerce("9223372036854775807"),
            FieldValue::Integer(i64::MAX)
        );
        assert_eq!(
            coerce("9223372036854775808"),
            FieldValue::String("9223372036854775808".into())
        );
    }

    #[test]
    fn test_precision_sensitive_decimal_stays_string() {
        assert_eq!(coerce("0.1234567890123456789"), FieldValue::String("0.1234567890123456789".into()));
        assert_eq!(coerce("123456789012345.6"), FieldValue::String("123456789012345.6".into()));
        assert!(matches!(coerce("12345678901234.5"), FieldValue::Float(_)));
    }

    #[test]
    fn test_coercion_is_idempotent() {
        for raw in [
            "42", "-5", "3.0", "3.14", "-0.5", "100.0", "0.000123", "12345678901234.5", "007",
            "tf_test1", "1e3", "", "9223372036854775808",
        ] {
            assert_eq!(roundtrip(raw), coerce(raw), "{raw:?}");
        }
    }

    #[test]
    fn test_json_representation() {
        assert_eq!(Value::from(coerce("42")), serde_json::json!(42));
        assert_eq!(Value::from(coerce("3.5")), serde_json::json!(3.5));
        assert_eq!(Value::from(coerce("hello")), serde_json::json!("hello"));
        assert_eq!(serde_json::to_string(&coerce("007")).unwrap(), r#""007""#);
    }
}

//! Money amounts as the backend sends them: JSON numbers or numeric strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a JSON number or a numeric string.
pub fn parse(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_str(&n.to_string()),
        Value::String(s) => parse_str(s.trim()),
        _ => None,
    }
}

/// Like [`parse`], but drops every character of a string other than ASCII
/// digits, `.` and `-` first, so `"₹1,234.50"` reads as `1234.50`.
pub fn parse_loose(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => {
            let kept: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            parse_str(&kept)
        }
        other => parse(other),
    }
}

fn parse_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// `deserialize_with` adapter for fields that may be a number or a string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {value}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_numbers_and_strings() {
        assert_eq!(parse(&json!(12)), Some(d("12")));
        assert_eq!(parse(&json!(19.99)), Some(d("19.99")));
        assert_eq!(parse(&json!(" 5.50 ")), Some(d("5.50")));
        assert_eq!(parse(&json!(1e-7)), Some(d("0.0000001")));
        assert_eq!(parse(&json!("₹5")), None);
        assert_eq!(parse(&json!(null)), None);
        assert_eq!(parse(&json!("")), None);
    }

    #[test]
    fn test_parse_loose_strips_symbols() {
        assert_eq!(parse_loose(&json!("₹1,234.50")), Some(d("1234.50")));
        assert_eq!(parse_loose(&json!("-12 USD")), Some(d("-12")));
        assert_eq!(parse_loose(&json!(7)), Some(d("7")));
        assert_eq!(parse_loose(&json!("n/a")), None);
        assert_eq!(parse_loose(&json!("1.2.3")), None);
    }
}

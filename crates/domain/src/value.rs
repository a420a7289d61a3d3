//! Coercion of raw write values into JSON scalars.

use serde_json::{Number, Value};

/// Coerce a raw string into the JSON value stored by a `config.` write.
///
/// - `true` / `false` (any case) become booleans.
/// - All ASCII digits become an integer.
/// - Digits with exactly one `.` become a float.
/// - Anything else, including signed numbers, stays a string.
#[must_use]
pub fn coerce_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if is_ascii_digits(raw) {
        if let Ok(number) = raw.parse::<i64>() {
            return Value::from(number);
        }
        if let Ok(number) = raw.parse::<u64>() {
            return Value::from(number);
        }
        return Value::String(raw.to_owned());
    }
    if raw.matches('.').count() == 1
        && is_ascii_digits(&raw.replacen('.', "", 1))
        && let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Value::Number(number);
    }
    Value::String(raw.to_owned())
}

/// Render a stored value the way the resolver hands it back as text.
///
/// Strings are returned verbatim; everything else uses compact JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_ascii_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booleans_ignore_case() {
        assert_eq!(coerce_value("TRUE"), json!(true));
        assert_eq!(coerce_value("False"), json!(false));
        assert_eq!(coerce_value("yes"), json!("yes"));
    }

    #[test]
    fn digits_become_numbers() {
        assert_eq!(coerce_value("10197"), json!(10197));
        assert_eq!(coerce_value("0.75"), json!(0.75));
        assert_eq!(coerce_value("18446744073709551615"), json!(u64::MAX));
    }

    #[test]
    fn everything_else_stays_text() {
        assert_eq!(coerce_value("-5"), json!("-5"));
        assert_eq!(coerce_value("1.2.3"), json!("1.2.3"));
        assert_eq!(coerce_value("."), json!("."));
        assert_eq!(coerce_value(""), json!(""));
        assert_eq!(coerce_value("99999999999999999999999"), json!("99999999999999999999999"));
    }

    #[test]
    fn display_keeps_strings_verbatim() {
        assert_eq!(display_value(&json!("Fei")), "Fei");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!({"a": true})), r#"{"a":true}"#);
    }
}

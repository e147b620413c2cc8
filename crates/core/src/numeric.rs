//! Locale-tolerant numeric parsing and Finnish-convention formatting.
//!
//! Form submissions arrive with comma decimals and space (or NBSP) thousand
//! separators; everything downstream works on plain `f64`. Both directions
//! are total: garbage parses to `0.0` and formats to `"0"`.

use serde_json::Value;

/// Coerce any JSON value to a finite number. Null, booleans, arrays,
/// objects, and unparseable strings all become `0.0`.
pub fn parse_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(text) => parse_number_str(text),
        _ => 0.0,
    }
}

/// Parse a number written with `","` or `" "` separators: internal
/// whitespace is stripped, a comma becomes the decimal point, and the
/// longest leading numeric prefix is taken (so `"1500 litraa"` is 1500).
pub fn parse_number_str(input: &str) -> f64 {
    let mut cleaned = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            c if c.is_whitespace() => {}
            ',' => cleaned.push('.'),
            c => cleaned.push(c),
        }
    }

    let prefix = numeric_prefix(&cleaned);
    if prefix.is_empty() {
        return 0.0;
    }

    match prefix.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Longest prefix of `input` that parses as a float literal:
/// optional sign, digits, one decimal point, optional exponent.
fn numeric_prefix(input: &str) -> &str {
    let bytes = input.as_bytes();
    let mut cursor = 0;
    let mut end = 0;
    let mut seen_dot = false;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        cursor = 1;
    }

    while cursor < bytes.len() {
        match bytes[cursor] {
            b'0'..=b'9' => {
                cursor += 1;
                end = cursor;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                cursor += 1;
            }
            b'e' | b'E' if end > 0 => {
                let mut exp = cursor + 1;
                if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
                    exp += 1;
                }
                let digits_start = exp;
                while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    exp += 1;
                }
                if exp > digits_start {
                    end = exp;
                }
                break;
            }
            _ => break,
        }
    }

    &input[..end]
}

/// Round to the nearest integer, half away from zero. Non-finite input
/// becomes 0. This is the single rounding primitive of the strategy and
/// metrics layer.
pub fn round_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    value.round() as i64
}

/// Render a number in the Finnish display convention: space-grouped
/// thousands, comma decimal separator. Non-finite input renders as `"0"`.
/// Rounds half away from zero to `fraction_digits`.
pub fn format_number(value: f64, fraction_digits: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let factor = 10f64.powi(fraction_digits as i32);
    let scaled = (value.abs() * factor).round() as i128;
    let divisor = factor as i128;
    let whole = scaled / divisor;
    let fraction = scaled % divisor;

    let mut rendered = group_thousands(whole);
    if fraction_digits > 0 {
        rendered.push(',');
        rendered.push_str(&format!("{:0width$}", fraction, width = fraction_digits));
    }

    if value < 0.0 && scaled != 0 {
        rendered.insert(0, '-');
    }

    rendered
}

fn group_thousands(value: i128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{format_number, parse_number, parse_number_str, round_to_i64};

    #[test]
    fn parses_comma_decimals_and_space_separators() {
        assert_eq!(parse_number_str("2 500,5"), 2500.5);
        assert_eq!(parse_number_str("1 234 567"), 1_234_567.0);
        assert_eq!(parse_number_str("12,5"), 12.5);
        assert_eq!(parse_number_str("-3,75"), -3.75);
    }

    #[test]
    fn parses_nbsp_grouped_input() {
        assert_eq!(parse_number_str("2\u{a0}500,5"), 2500.5);
        assert_eq!(parse_number_str("1\u{202f}000"), 1000.0);
    }

    #[test]
    fn takes_longest_numeric_prefix() {
        assert_eq!(parse_number_str("1500 litraa"), 1500.0);
        assert_eq!(parse_number_str("12.5.3"), 12.5);
        assert_eq!(parse_number_str("1e3"), 1000.0);
    }

    #[test]
    fn is_total_over_arbitrary_json() {
        assert_eq!(parse_number(&json!(null)), 0.0);
        assert_eq!(parse_number(&json!("")), 0.0);
        assert_eq!(parse_number(&json!("ei tiedossa")), 0.0);
        assert_eq!(parse_number(&json!(true)), 0.0);
        assert_eq!(parse_number(&json!([1, 2])), 0.0);
        assert_eq!(parse_number(&json!({"a": 1})), 0.0);
        assert_eq!(parse_number(&json!(42.5)), 42.5);
    }

    #[test]
    fn formats_with_finnish_grouping() {
        assert_eq!(format_number(1_234_567.0, 0), "1 234 567");
        assert_eq!(format_number(1234.56, 1), "1 234,6");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(-1234.5, 0), "-1 235");
        assert_eq!(format_number(999.0, 0), "999");
    }

    #[test]
    fn format_guards_non_finite_input() {
        assert_eq!(format_number(f64::NAN, 0), "0");
        assert_eq!(format_number(f64::INFINITY, 2), "0");
    }

    #[test]
    fn format_preserves_value_to_requested_digits() {
        let formatted = format_number(2500.5, 1);
        assert_eq!(formatted, "2 500,5");
        assert_eq!(parse_number_str(&formatted), 2500.5);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_i64(2500.5), 2501);
        assert_eq!(round_to_i64(-2500.5), -2501);
        assert_eq!(round_to_i64(2500.4), 2500);
        assert_eq!(round_to_i64(f64::NAN), 0);
    }
}

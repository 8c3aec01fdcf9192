//! Display formatting. The only place money gets rounded.

pub const PLACEHOLDER: &str = "—";

/// Whole-dollar amount with thousands separators, e.g. `$1,885` or `-$42`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = group_thousands(rounded.unsigned_abs());
    if rounded < 0 {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Cent precision, used for breakeven and per-ticket figures.
pub fn format_cents(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let whole = group_thousands(cents.unsigned_abs() / 100);
    let frac = cents.unsigned_abs() % 100;
    if cents < 0 {
        format!("-${whole}.{frac:02}")
    } else {
        format!("${whole}.{frac:02}")
    }
}

/// Profit with an explicit sign: `+$635`, `-$120`, `$0`.
pub fn format_signed(value: f64) -> String {
    let rounded = value.round() as i64;
    if rounded > 0 {
        format!("+{}", format_currency(value))
    } else {
        format_currency(value)
    }
}

pub fn format_optional(value: Option<f64>, render: fn(f64) -> String) -> String {
    value
        .filter(|v| v.is_finite())
        .map(render)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_pct(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn group_thousands(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_rounds_to_whole_units() {
        assert_eq!(format_currency(1885.0), "$1,885");
        assert_eq!(format_currency(634.5), "$635");
        assert_eq!(format_currency(-120.4), "-$120");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
    }

    #[test]
    fn cents_keep_two_places() {
        assert_eq!(format_cents(471.25 / 0.9), "$523.61");
        assert_eq!(format_cents(1200.5), "$1,200.50");
        assert_eq!(format_cents(-3.1), "-$3.10");
    }

    #[test]
    fn signed_and_missing_values() {
        assert_eq!(format_signed(635.0), "+$635");
        assert_eq!(format_signed(-12.0), "-$12");
        assert_eq!(format_signed(0.2), "$0");
        assert_eq!(format_optional(None, format_currency), PLACEHOLDER);
        assert_eq!(format_optional(Some(f64::NAN), format_currency), PLACEHOLDER);
        assert_eq!(format_optional(Some(700.0), format_cents), "$700.00");
        assert_eq!(format_pct(Some(25.0)), "25.0%");
        assert_eq!(format_pct(None), PLACEHOLDER);
    }
}

//! Numeric interpretation of cell text.
//!
//! Classification, aggregation and sorting all read numbers through this module
//! so that a cell means the same number everywhere.

/// Normalizes a raw cell for numeric parsing: trims, drops `%` and turns `,`
/// into `.` (decimal comma exports).
pub fn normalize_numeric(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| *ch != '%')
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parses a cell as a finite number after normalization.
///
/// Empty cells, text, `NaN` and infinities yield `None`.
pub fn parse_metric(raw: &str) -> Option<f64> {
    let normalized = normalize_numeric(raw);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Like [`parse_metric`], with non-numeric cells counting as zero.
pub fn metric_or_zero(raw: &str) -> f64 {
    parse_metric(raw).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_percent_and_decimal_comma() {
        assert_eq!(normalize_numeric(" 30% "), "30");
        assert_eq!(normalize_numeric("12,5"), "12.5");
        assert_eq!(parse_metric("12,5"), Some(12.5));
        assert_eq!(parse_metric("30%"), Some(30.0));
    }

    #[test]
    fn rejects_text_and_non_finite_values() {
        assert_eq!(parse_metric(""), None);
        assert_eq!(parse_metric("   "), None);
        assert_eq!(parse_metric("%"), None);
        assert_eq!(parse_metric("(direct)"), None);
        assert_eq!(parse_metric("NaN"), None);
        assert_eq!(parse_metric("inf"), None);
        assert_eq!(parse_metric("1.234,5"), None);
    }

    #[test]
    fn zero_fallback_for_text() {
        assert_eq!(metric_or_zero("google / organic"), 0.0);
        assert_eq!(metric_or_zero("-4"), -4.0);
    }
}

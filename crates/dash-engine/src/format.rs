//! Display formatting for aggregate values.

/// Separator conventions for displayed numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberLocale {
    /// `1.234,5`
    #[default]
    Nl,
    /// `1,234.5`
    En,
}

impl NumberLocale {
    fn separators(self) -> (char, char) {
        match self {
            Self::Nl => ('.', ','),
            Self::En => (',', '.'),
        }
    }
}

/// Formats a number with digit grouping and at most two fraction digits.
///
/// Trailing fraction zeros are dropped, so `1500.0` renders as `1.500` (nl)
/// and `2.5` as `2,5`.
pub fn format_number(value: f64, locale: NumberLocale) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let (group_sep, decimal_sep) = locale.separators();
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    let is_zero = int_part.chars().all(|ch| ch == '0') && frac.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    let digits = int_part.len();
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (digits - idx) % 3 == 0 {
            out.push(group_sep);
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push(decimal_sep);
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_and_fraction() {
        assert_eq!(format_number(1234567.891, NumberLocale::En), "1,234,567.89");
        assert_eq!(format_number(1234567.891, NumberLocale::Nl), "1.234.567,89");
        assert_eq!(format_number(1500.0, NumberLocale::Nl), "1.500");
        assert_eq!(format_number(2.5, NumberLocale::Nl), "2,5");
        assert_eq!(format_number(999.0, NumberLocale::En), "999");
    }

    #[test]
    fn test_negative_and_zero() {
        assert_eq!(format_number(-1234.5, NumberLocale::En), "-1,234.5");
        assert_eq!(format_number(-0.001, NumberLocale::En), "0");
        assert_eq!(format_number(0.0, NumberLocale::Nl), "0");
    }

    #[test]
    fn test_rounds_to_two_digits() {
        assert_eq!(format_number(0.666, NumberLocale::En), "0.67");
        assert_eq!(format_number(99.999, NumberLocale::En), "100");
    }
}

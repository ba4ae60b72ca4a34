//! Fixed-locale display formatting for amounts and dates

use chrono::{DateTime, TimeZone};

/// Group the integer digits of `digits` with commas.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_fixed(amount: f64, min_fraction: usize, max_fraction: usize) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let fixed = format!("{:.*}", max_fraction, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed.clone(), String::new()),
    };
    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min_fraction {
        frac.push('0');
    }
    // -0.0001 rounds to "0", not "-0"
    let negative = amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(&int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

/// Amount as the browser's default `toLocaleString()` shows it:
/// grouped thousands and at most three fraction digits.
pub fn format_amount(amount: f64) -> String {
    format_fixed(amount, 0, 3)
}

/// Amount with the currency code prefix and two fraction digits, e.g. `EGP 1,234.50`
pub fn format_currency(amount: f64, currency: &str) -> String {
    format!("{} {}", currency, format_fixed(amount, 2, 2))
}

/// Date as `18 Oct 2026`
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Utc};

    #[test]
    fn amounts_follow_locale_string() {
        assert_eq!(format_amount(300.0), "300");
        assert_eq!(format_amount(1234.5), "1,234.5");
        assert_eq!(format_amount(1234567.0), "1,234,567");
        assert_eq!(format_amount(0.125), "0.125");
        assert_eq!(format_amount(2.00049), "2");
        assert_eq!(format_amount(-1500.25), "-1,500.25");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn currency_has_two_decimals() {
        assert_eq!(format_currency(1234.5, "EGP"), "EGP 1,234.50");
        assert_eq!(format_currency(0.0, "EGP"), "EGP 0.00");
    }

    #[test]
    fn dates_are_day_month_year() {
        let d = Utc.with_ymd_and_hms(2026, 10, 8, 12, 0, 0).unwrap();
        assert_eq!(format_date(&d), "08 Oct 2026");
        let local = Local.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(format_date(&local), "31 Jan 2025");
    }
}

//! Currency display.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Render an amount as `$1.25M`, `$310.00K`, `-$4.00` and so on.
pub fn format_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    let amount = Decimal::from_f64(scaled)
        .map(|d| d.round_dp(2))
        .unwrap_or_default();
    format!("{sign}${amount:.2}{suffix}")
}

/// Whole dollars with thousands separators, e.g. `$2,345,678`. Negative
/// amounts render as `$0`.
pub fn format_whole_dollars(value: f64) -> String {
    let digits = Decimal::from_f64(value.max(0.0))
        .map(|d| d.floor())
        .unwrap_or_default()
        .to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("${out}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_and_rounds() {
        assert_eq!(format_money(1_250_000.0), "$1.25M");
        assert_eq!(format_money(310_000.0), "$310.00K");
        assert_eq!(format_money(2_500_000_000.0), "$2.50B");
        assert_eq!(format_money(-4.0), "-$4.00");
        assert_eq!(format_money(999.999), "$1000.00");
        assert_eq!(format_money(f64::NAN), "$0.00");
    }

    #[test]
    fn whole_dollars_group_thousands() {
        assert_eq!(format_whole_dollars(2_345_678.9), "$2,345,678");
        assert_eq!(format_whole_dollars(500_000.0), "$500,000");
        assert_eq!(format_whole_dollars(999.0), "$999");
        assert_eq!(format_whole_dollars(-12.0), "$0");
    }
}

//! Currency formatting for predicted prices.

/// Format `value` as `"<symbol> 1,234,567"`, rounded to whole units.
///
/// Ties round to even and a negative value that rounds to zero keeps its
/// sign, the same as a `,.0f` format spec.
pub fn format_price(value: f64, symbol: &str) -> String {
    if !value.is_finite() {
        return format!("{symbol} {value}");
    }
    let rounded = format!("{value:.0}");
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", rounded.as_str()),
    };
    format!("{symbol} {sign}{}", group_thousands(digits))
}

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_and_rounds() {
        assert_eq!(format_price(4_512_345.6, "₹"), "₹ 4,512,346");
        assert_eq!(format_price(999.4, "$"), "$ 999");
        assert_eq!(format_price(1000.0, "$"), "$ 1,000");
        assert_eq!(format_price(0.2, "€"), "€ 0");
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(format_price(2.5, "€"), "€ 2");
        assert_eq!(format_price(3.5, "€"), "€ 4");
        assert_eq!(format_price(2_500_000.5, "₹"), "₹ 2,500,000");
        assert_eq!(format_price(2_500_001.5, "₹"), "₹ 2,500,002");
    }

    #[test]
    fn negative_values_keep_sign_after_symbol() {
        assert_eq!(format_price(-12_345.0, "₹"), "₹ -12,345");
        assert_eq!(format_price(-0.3, "₹"), "₹ -0");
    }
}

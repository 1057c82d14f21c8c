use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount the way customer emails show it: `₱12,500.00`.
pub fn format_peso(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}₱{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_peso_groups_thousands() {
        assert_eq!(format_peso(Decimal::from_str("12500").unwrap()), "₱12,500.00");
        assert_eq!(format_peso(Decimal::from_str("1234567.5").unwrap()), "₱1,234,567.50");
        assert_eq!(format_peso(Decimal::from_str("999.999").unwrap()), "₱1,000.00");
    }

    #[test]
    fn test_format_peso_small_and_negative() {
        assert_eq!(format_peso(Decimal::ZERO), "₱0.00");
        assert_eq!(format_peso(Decimal::from_str("0.05").unwrap()), "₱0.05");
        assert_eq!(format_peso(Decimal::from_str("-1500.25").unwrap()), "-₱1,500.25");
    }
}

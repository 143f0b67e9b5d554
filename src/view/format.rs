//! pt-BR display formatting.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// `R$ 1.234,50`
pub fn currency(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    let text = format!("{rounded:.2}");
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{cents}")
}

/// `05/01/2024`
pub fn date(value: NaiveDate) -> String {
    value.format("%d/%m/%Y").to_string()
}

/// `05/01/2024 14:30`, in `offset`.
pub fn date_time(value: DateTime<Utc>, offset: FixedOffset) -> String {
    value.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string()
}

/// `14:30`, in `offset`.
pub fn time(value: DateTime<Utc>, offset: FixedOffset) -> String {
    value.with_timezone(&offset).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn currency_groups_thousands_and_uses_comma_decimals() {
        assert_eq!(currency(dec!(1234.5)), "R$ 1.234,50");
        assert_eq!(currency(dec!(35)), "R$ 35,00");
        assert_eq!(currency(dec!(0.005)), "R$ 0,01");
        assert_eq!(currency(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(currency(dec!(-12.3)), "-R$ 12,30");
        assert_eq!(currency(Decimal::ZERO), "R$ 0,00");
    }

    #[test]
    fn date_time_is_shown_in_the_configured_offset() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 17, 30, 0).unwrap();
        assert_eq!(date_time(at, offset), "05/01/2024 14:30");
        assert_eq!(time(at, offset), "14:30");

        let late = Utc.with_ymd_and_hms(2024, 1, 6, 1, 0, 0).unwrap();
        assert_eq!(date_time(late, offset), "05/01/2024 22:00");
        assert_eq!(date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()), "05/01/2024");
    }
}

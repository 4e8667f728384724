use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with thousands separators: R$1,234.56
pub fn money(symbol: &str, val: Decimal) -> String {
    let rounded = val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{symbol}{with_commas}.{dec_part}")
    } else {
        format!("{symbol}{with_commas}.{dec_part}")
    }
}

/// Compact axis label: "R$2.5k", "R$3M", "R$750".
pub fn compact(symbol: &str, val: f64) -> String {
    let sign = if val < 0.0 { "-" } else { "" };
    let abs = val.abs();
    let body = if abs >= 1_000_000.0 {
        let m = abs / 1_000_000.0;
        if m == m.floor() {
            format!("{}M", m as u64)
        } else {
            format!("{:.1}M", m)
        }
    } else if abs >= 1000.0 {
        let k = abs / 1000.0;
        if k == k.floor() {
            format!("{}k", k as u64)
        } else {
            format!("{:.1}k", k)
        }
    } else {
        format!("{}", abs.round() as u64)
    };
    format!("{sign}{symbol}{body}")
}

/// Lossy conversion for chart geometry only; never used in sums.
pub fn to_f64(val: Decimal) -> f64 {
    val.to_f64().unwrap_or(0.0)
}

//! Integer amounts in smallest units and their normalization.
//!
//! Conversions go through rust_decimal so that `10^decimals` scaling never
//! picks up binary floating-point drift before the final `f64` cast.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Scale an integer amount down by `10^decimals`.
pub fn normalize(amount: u128, decimals: u8) -> f64 {
    i128::try_from(amount)
        .ok()
        .and_then(|a| Decimal::try_from_i128_with_scale(a, decimals as u32).ok())
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| amount as f64 / 10f64.powi(decimals as i32))
}

/// Convert a human-unit quantity (as returned by some quote APIs) into
/// smallest units, truncating any sub-unit remainder.
pub fn to_base_units(value: f64, decimals: u8) -> Option<u128> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    // Display yields the shortest decimal that round-trips, so 0.1 stays 0.1.
    let exact = Decimal::from_str(&value.to_string()).ok()?;
    let scale = Decimal::from_u64(10u64.checked_pow(decimals as u32)?)?;
    exact.checked_mul(scale)?.trunc().to_u128()
}

/// Parse a base-unit amount from a decimal string.
pub fn parse_units(s: &str) -> Option<u128> {
    s.trim().parse::<u128>().ok()
}

/// Serde helper: accept an amount encoded either as a JSON number or a string.
pub fn de_units<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Float(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n as u128),
        Raw::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u128),
        Raw::Float(f) => Err(de::Error::custom(format!("non-integer amount: {}", f))),
        Raw::Str(s) => parse_units(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid amount: {}", s))),
    }
}

/// Same as [`de_units`] but for fields that may be absent or null.
pub fn de_units_opt<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "de_units")] u128);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|w| w.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_native() {
        assert_eq!(normalize(1_500_000_000, 9), 1.5);
        assert_eq!(normalize(0, 6), 0.0);
    }

    #[test]
    fn test_to_base_units_truncates() {
        assert_eq!(to_base_units(12.3456789, 6), Some(12_345_678));
        assert_eq!(to_base_units(1000.0, 9), Some(1_000_000_000_000));
        assert_eq!(to_base_units(3512.123456, 6), Some(3_512_123_456));
        assert_eq!(to_base_units(-1.0, 9), None);
        assert_eq!(to_base_units(f64::NAN, 9), None);
    }

    #[test]
    fn test_de_units_accepts_strings_and_numbers() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "de_units")]
            amount: u128,
            #[serde(default, deserialize_with = "de_units_opt")]
            fee: Option<u128>,
        }

        let row: Row = serde_json::from_value(serde_json::json!({"amount": "123456789012345678901"})).unwrap();
        assert_eq!(row.amount, 123_456_789_012_345_678_901);
        assert_eq!(row.fee, None);

        let row: Row = serde_json::from_value(serde_json::json!({"amount": 42, "fee": "7"})).unwrap();
        assert_eq!(row.amount, 42);
        assert_eq!(row.fee, Some(7));

        let bad = serde_json::from_value::<Row>(serde_json::json!({"amount": "abc"}));
        assert!(bad.is_err());
    }
}

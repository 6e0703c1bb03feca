//! Lenient field parsers for backend payloads.
//!
//! The game API is not consistent about numbers: some endpoints send `12`,
//! others `"12"`. These helpers accept both and reject anything that does not
//! parse, so a shape mismatch fails the cycle instead of defaulting silently.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn into_text(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.trim().to_string(),
        }
    }
}

pub(crate) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    if text.is_empty() {
        return Err(D::Error::custom("id must not be empty"));
    }
    Ok(text)
}

pub(crate) fn u32_value<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    text.parse::<u32>()
        .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got {:?}", text)))
}

pub(crate) fn u64_value<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    text.parse::<u64>()
        .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got {:?}", text)))
}

pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| D::Error::custom(format!("expected a decimal amount, got {:?}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "id")]
        id: String,
        #[serde(deserialize_with = "u32_value")]
        level: u32,
        #[serde(deserialize_with = "decimal")]
        amount: Decimal,
    }

    #[test]
    fn test_accepts_numbers_and_numeric_strings() {
        let probe: Probe =
            serde_json::from_str(r#"{"id": 42, "level": "7", "amount": 12.5}"#).unwrap();
        assert_eq!(probe.id, "42");
        assert_eq!(probe.level, 7);
        assert_eq!(probe.amount, dec!(12.5));

        let probe: Probe =
            serde_json::from_str(r#"{"id": "h-1", "level": 3, "amount": "0.000001"}"#).unwrap();
        assert_eq!(probe.id, "h-1");
        assert_eq!(probe.amount, dec!(0.000001));
    }

    #[test]
    fn test_rejects_unparseable_numbers() {
        let result: Result<Probe, _> =
            serde_json::from_str(r#"{"id": 1, "level": "high", "amount": 1}"#);
        assert!(result.is_err());

        let result: Result<Probe, _> =
            serde_json::from_str(r#"{"id": 1, "level": -2, "amount": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_id() {
        let result: Result<Probe, _> =
            serde_json::from_str(r#"{"id": "  ", "level": 1, "amount": 1}"#);
        assert!(result.is_err());
    }
}

//! Player balances payload.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::numeric;

/// Token and medal balances of the signed-in player.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    #[serde(deserialize_with = "numeric::decimal")]
    pub phorse: Decimal,
    #[serde(deserialize_with = "numeric::decimal")]
    pub wron: Decimal,
    #[serde(deserialize_with = "numeric::u64_value")]
    pub medals: u64,
}

impl Balances {
    pub fn validate(&self) -> Result<(), String> {
        if self.phorse.is_sign_negative() && !self.phorse.is_zero() {
            return Err(format!("negative phorse balance {}", self.phorse));
        }
        if self.wron.is_sign_negative() && !self.wron.is_zero() {
            return Err(format!("negative wron balance {}", self.wron));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parses_mixed_number_encodings() {
        let balances: Balances =
            serde_json::from_str(r#"{"phorse": "1520.75", "wron": 0.5, "medals": 12}"#).unwrap();
        assert_eq!(balances.phorse, dec!(1520.75));
        assert_eq!(balances.wron, dec!(0.5));
        assert_eq!(balances.medals, 12);
        assert!(balances.validate().is_ok());
    }

    #[test]
    fn test_negative_balance_fails_validation() {
        let balances: Balances =
            serde_json::from_str(r#"{"phorse": "-1", "wron": 0, "medals": 0}"#).unwrap();
        assert!(balances.validate().is_err());
    }

    #[test]
    fn test_missing_medals_is_rejected() {
        let result = serde_json::from_str::<Balances>(r#"{"phorse": 1, "wron": 1}"#);
        assert!(result.is_err());
    }
}

//! Horse list and energy recovery payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::numeric;

/// What a horse is currently doing, as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum HorseStatus {
    Idle,
    Racing,
    Breeding,
    Resting,
    /// A status this client does not know about yet.
    Other(String),
}

impl From<String> for HorseStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "idle" => Self::Idle,
            "racing" => Self::Racing,
            "breeding" => Self::Breeding,
            "resting" => Self::Resting,
            _ => Self::Other(value),
        }
    }
}

impl std::fmt::Display for HorseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Racing => write!(f, "racing"),
            Self::Breeding => write!(f, "breeding"),
            Self::Resting => write!(f, "resting"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A single horse owned by the player.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Horse {
    #[serde(deserialize_with = "numeric::id")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "numeric::u32_value")]
    pub level: u32,
    #[serde(deserialize_with = "numeric::u32_value")]
    pub energy: u32,
    #[serde(deserialize_with = "numeric::u32_value")]
    pub max_energy: u32,
    pub status: HorseStatus,
    #[serde(default)]
    pub stable_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Horse {
    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("horse {} has an empty name", self.id));
        }
        if self.energy > self.max_energy {
            return Err(format!(
                "horse {} has energy {} above its maximum {}",
                self.id, self.energy, self.max_energy
            ));
        }
        Ok(())
    }
}

/// The horse list endpoint answers either with a bare array or wrapped in
/// `{"horses": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HorseListPayload {
    List(Vec<Horse>),
    Wrapped { horses: Vec<Horse> },
}

impl HorseListPayload {
    pub fn into_horses(self) -> Vec<Horse> {
        match self {
            Self::List(horses) | Self::Wrapped { horses } => horses,
        }
    }
}

/// Response of the next energy recovery endpoint.
#[derive(Debug, Deserialize)]
pub struct EnergyRecoveryPayload {
    #[serde(rename = "nextEnergyRecovery", alias = "next_energy_recovery", default)]
    pub next_energy_recovery: Option<DateTime<Utc>>,
}

/// Data held by the horse store.
///
/// `horses` keeps the server's order. `next_energy_recovery` is `None` when
/// every horse is at full energy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HorsesData {
    pub horses: Vec<Horse>,
    pub next_energy_recovery: Option<DateTime<Utc>>,
}

impl HorsesData {
    pub fn find(&self, id: &str) -> Option<&Horse> {
        self.horses.iter().find(|h| h.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_bare_and_wrapped_lists() {
        let bare = r#"[{"id": 1, "name": "Comet", "level": 3, "energy": 10, "maxEnergy": 12, "status": "idle"}]"#;
        let horses = serde_json::from_str::<HorseListPayload>(bare)
            .unwrap()
            .into_horses();
        assert_eq!(horses.len(), 1);
        assert_eq!(horses[0].id, "1");
        assert_eq!(horses[0].status, HorseStatus::Idle);
        assert_eq!(horses[0].stable_id, None);

        let wrapped = r#"{"horses": [{"id": "h2", "name": "Dusk", "level": "5", "energy": "0", "maxEnergy": "8", "status": "RACING", "stableId": "s1"}]}"#;
        let horses = serde_json::from_str::<HorseListPayload>(wrapped)
            .unwrap()
            .into_horses();
        assert_eq!(horses[0].level, 5);
        assert_eq!(horses[0].status, HorseStatus::Racing);
        assert_eq!(horses[0].stable_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let json = r#"{"id": 1, "name": "Comet", "level": 3, "energy": 1, "maxEnergy": 2, "status": "in_derby"}"#;
        let horse: Horse = serde_json::from_str(json).unwrap();
        assert_eq!(horse.status, HorseStatus::Other("in_derby".to_string()));
        assert_eq!(horse.status.to_string(), "in_derby");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"[{"id": 1, "name": "Comet", "energy": 1, "maxEnergy": 2, "status": "idle"}]"#;
        assert!(serde_json::from_str::<HorseListPayload>(json).is_err());
    }

    #[test]
    fn test_energy_above_max_fails_validation() {
        let json = r#"{"id": 9, "name": "Blaze", "level": 1, "energy": 15, "maxEnergy": 12, "status": "idle"}"#;
        let horse: Horse = serde_json::from_str(json).unwrap();
        assert!(horse.validate().is_err());
    }

    #[test]
    fn test_energy_recovery_accepts_null_and_timestamp() {
        let payload: EnergyRecoveryPayload =
            serde_json::from_str(r#"{"nextEnergyRecovery": null}"#).unwrap();
        assert_eq!(payload.next_energy_recovery, None);

        let payload: EnergyRecoveryPayload =
            serde_json::from_str(r#"{"nextEnergyRecovery": "2026-10-18T12:00:00Z"}"#).unwrap();
        assert_eq!(
            payload.next_energy_recovery,
            Some(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
        );
    }
}

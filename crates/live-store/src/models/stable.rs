//! Stable record payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::numeric;

/// The player's stable building.
///
/// The endpoint answers `null` for players who have not bought a stable yet,
/// so the store holds an `Option<Stable>`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stable {
    #[serde(deserialize_with = "numeric::id")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "numeric::u32_value")]
    pub level: u32,
    #[serde(deserialize_with = "numeric::u32_value")]
    pub capacity: u32,
    #[serde(deserialize_with = "numeric::u32_value")]
    pub horse_count: u32,
    /// Set while a level upgrade is under construction.
    #[serde(default)]
    pub upgrade_ends_at: Option<DateTime<Utc>>,
}

impl Stable {
    pub fn validate(&self) -> Result<(), String> {
        if self.horse_count > self.capacity {
            return Err(format!(
                "stable {} holds {} horses but has capacity {}",
                self.id, self.horse_count, self.capacity
            ));
        }
        Ok(())
    }

    pub fn free_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.horse_count)
    }

    pub fn is_upgrading(&self, now: DateTime<Utc>) -> bool {
        self.upgrade_ends_at.is_some_and(|ends| ends > now)
    }
}

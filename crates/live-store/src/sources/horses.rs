use async_trait::async_trait;

use super::invalid;
use crate::errors::LiveStoreError;
use crate::fetch::{Conditional, ConditionalFetcher};
use crate::models::{EnergyRecoveryPayload, HorseListPayload, HorsesData};
use crate::store::LiveSource;

pub const HORSES_RESOURCE: &str = "horses";
pub const NEXT_ENERGY_RECOVERY_RESOURCE: &str = "horses/next-energy-recovery";

/// The player's horses plus the time the next one regains energy.
///
/// Two sub-resources, each with its own validator. Both are fetched every
/// cycle and committed together.
#[derive(Clone, Copy, Debug, Default)]
pub struct HorseSource;

#[async_trait]
impl LiveSource for HorseSource {
    type Data = HorsesData;

    fn name(&self) -> &'static str {
        "horses"
    }

    async fn fetch(
        &self,
        fetcher: &mut ConditionalFetcher,
        current: &HorsesData,
    ) -> Result<Option<HorsesData>, LiveStoreError> {
        let horses = fetcher
            .get_json::<HorseListPayload>(HORSES_RESOURCE)
            .await?
            .map(HorseListPayload::into_horses);
        let recovery = fetcher
            .get_json::<EnergyRecoveryPayload>(NEXT_ENERGY_RECOVERY_RESOURCE)
            .await?;

        if !horses.is_changed() && !recovery.is_changed() {
            return Ok(None);
        }

        let mut next = current.clone();
        if let Conditional::Changed(horses) = horses {
            for horse in &horses {
                horse
                    .validate()
                    .map_err(|message| invalid(HORSES_RESOURCE, message))?;
            }
            next.horses = horses;
        }
        if let Conditional::Changed(recovery) = recovery {
            next.next_energy_recovery = recovery.next_energy_recovery;
        }
        Ok(Some(next))
    }
}

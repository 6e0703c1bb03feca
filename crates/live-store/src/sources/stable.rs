use async_trait::async_trait;

use super::invalid;
use crate::errors::LiveStoreError;
use crate::fetch::ConditionalFetcher;
use crate::models::Stable;
use crate::store::LiveSource;

pub const STABLE_RESOURCE: &str = "stable";

/// The player's stable, or `None` for players without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct StableSource;

#[async_trait]
impl LiveSource for StableSource {
    type Data = Option<Stable>;

    fn name(&self) -> &'static str {
        "stable"
    }

    async fn fetch(
        &self,
        fetcher: &mut ConditionalFetcher,
        _current: &Option<Stable>,
    ) -> Result<Option<Option<Stable>>, LiveStoreError> {
        let Some(stable) = fetcher
            .get_json::<Option<Stable>>(STABLE_RESOURCE)
            .await?
            .changed()
        else {
            return Ok(None);
        };
        if let Some(stable) = &stable {
            stable
                .validate()
                .map_err(|message| invalid(STABLE_RESOURCE, message))?;
        }
        Ok(Some(stable))
    }
}

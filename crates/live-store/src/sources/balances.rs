use async_trait::async_trait;

use super::invalid;
use crate::errors::LiveStoreError;
use crate::fetch::ConditionalFetcher;
use crate::models::Balances;
use crate::scheduler::{LiveStoreConfig, BALANCES_POLL_BASE};
use crate::store::LiveSource;

pub const BALANCES_RESOURCE: &str = "balances";

/// Token and medal balances.
#[derive(Clone, Copy, Debug, Default)]
pub struct BalanceSource;

#[async_trait]
impl LiveSource for BalanceSource {
    type Data = Balances;

    fn name(&self) -> &'static str {
        "balances"
    }

    fn default_config(&self) -> LiveStoreConfig {
        LiveStoreConfig::default().with_poll_base(BALANCES_POLL_BASE)
    }

    async fn fetch(
        &self,
        fetcher: &mut ConditionalFetcher,
        _current: &Balances,
    ) -> Result<Option<Balances>, LiveStoreError> {
        let Some(balances) = fetcher.get_json::<Balances>(BALANCES_RESOURCE).await?.changed()
        else {
            return Ok(None);
        };
        balances
            .validate()
            .map_err(|message| invalid(BALANCES_RESOURCE, message))?;
        Ok(Some(balances))
    }
}

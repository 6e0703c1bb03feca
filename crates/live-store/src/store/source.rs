use async_trait::async_trait;

use crate::errors::LiveStoreError;
use crate::fetch::ConditionalFetcher;
use crate::scheduler::LiveStoreConfig;

/// One data domain a [`LiveStore`](super::LiveStore) keeps in sync.
///
/// A source knows which sub-resources make up its domain and how to fold
/// them into `Data`. It never touches the snapshot itself.
#[async_trait]
pub trait LiveSource: Send + Sync + 'static {
    type Data: Clone + Default + PartialEq + Send + Sync + 'static;

    /// Short name used in logs, events and metrics.
    fn name(&self) -> &'static str;

    /// Scheduling defaults for this domain.
    fn default_config(&self) -> LiveStoreConfig {
        LiveStoreConfig::default()
    }

    /// Runs the conditional fetches of one cycle.
    ///
    /// Returns `Ok(None)` when nothing changed, `Ok(Some(data))` with the
    /// complete new payload otherwise. Any error fails the whole cycle.
    async fn fetch(
        &self,
        fetcher: &mut ConditionalFetcher,
        current: &Self::Data,
    ) -> Result<Option<Self::Data>, LiveStoreError>;
}

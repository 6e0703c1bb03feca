use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde::de::DeserializeOwned;

use super::Transport;
use crate::errors::LiveStoreError;

/// Result of a conditional GET.
#[derive(Clone, Debug, PartialEq)]
pub enum Conditional<T> {
    /// The server answered 304; keep what we have.
    Unchanged,
    /// A fresh payload.
    Changed(T),
}

impl<T> Conditional<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn changed(self) -> Option<T> {
        match self {
            Self::Changed(value) => Some(value),
            Self::Unchanged => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Conditional<U> {
        match self {
            Self::Changed(value) => Conditional::Changed(f(value)),
            Self::Unchanged => Conditional::Unchanged,
        }
    }
}

/// Last-seen cache validator per sub-resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatorCache {
    validators: HashMap<String, String>,
}

impl ValidatorCache {
    pub fn get(&self, resource: &str) -> Option<&str> {
        self.validators.get(resource).map(String::as_str)
    }

    pub fn insert(&mut self, resource: impl Into<String>, validator: impl Into<String>) {
        self.validators.insert(resource.into(), validator.into());
    }

    /// Overwrites entries with those from `other`.
    pub fn merge(&mut self, other: ValidatorCache) {
        self.validators.extend(other.validators);
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Issues the conditional GETs of a single fetch cycle.
///
/// Requests carry the validators known when the cycle started. Validators
/// returned during the cycle are staged and only become known once the
/// caller commits the whole cycle with [`into_staged`](Self::into_staged);
/// a cycle that fails halfway must not leave a fresh validator behind for
/// data it never stored.
pub struct ConditionalFetcher {
    transport: Arc<dyn Transport>,
    known: ValidatorCache,
    staged: ValidatorCache,
}

impl ConditionalFetcher {
    pub fn new(transport: Arc<dyn Transport>, known: ValidatorCache) -> Self {
        Self {
            transport,
            known,
            staged: ValidatorCache::default(),
        }
    }

    /// GETs `resource` and decodes a 2xx body as `T`.
    pub async fn get_json<T>(&mut self, resource: &str) -> Result<Conditional<T>, LiveStoreError>
    where
        T: DeserializeOwned,
    {
        let validator = self.known.get(resource);
        let response = self.transport.get(resource, validator).await?;

        match response.status {
            304 => {
                debug!("{}: not modified", resource);
                Ok(Conditional::Unchanged)
            }
            200..=299 => {
                let value = serde_json::from_slice::<T>(&response.body).map_err(|e| {
                    LiveStoreError::Decode {
                        resource: resource.to_string(),
                        message: e.to_string(),
                    }
                })?;
                if let Some(validator) = response.validator {
                    self.staged.insert(resource, validator);
                }
                Ok(Conditional::Changed(value))
            }
            status => Err(LiveStoreError::from_status(status, &response.body)),
        }
    }

    /// Validators received during this cycle.
    pub fn into_staged(self) -> ValidatorCache {
        self.staged
    }
}

//! The three game domains kept live: horses, balances and the stable.

mod balances;
mod horses;
mod stable;

pub use balances::{BalanceSource, BALANCES_RESOURCE};
pub use horses::{HorseSource, HORSES_RESOURCE, NEXT_ENERGY_RECOVERY_RESOURCE};
pub use stable::{StableSource, STABLE_RESOURCE};

use crate::errors::LiveStoreError;

pub(crate) fn invalid(resource: &str, message: String) -> LiveStoreError {
    LiveStoreError::Validation {
        resource: resource.to_string(),
        message,
    }
}

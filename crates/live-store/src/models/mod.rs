//! Data-transfer types for the payloads the live stores consume.
//!
//! Every payload is parsed into an explicit type and validated at the
//! boundary. Anything that does not fit fails the fetch cycle.

mod balance;
mod horse;
mod numeric;
mod stable;

pub use balance::Balances;
pub use horse::{EnergyRecoveryPayload, Horse, HorseListPayload, HorseStatus, HorsesData};
pub use stable::Stable;

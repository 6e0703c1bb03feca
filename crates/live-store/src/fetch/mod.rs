//! Outbound HTTP for the live stores.
//!
//! - [`Transport`]: the seam to the platform HTTP client
//! - [`HttpTransport`]: `reqwest` implementation with a cookie store
//! - [`ConditionalFetcher`]: `If-None-Match` / `ETag` handling for one cycle

mod conditional;
mod http;
mod transport;

pub use conditional::{Conditional, ConditionalFetcher, ValidatorCache};
pub use http::{HttpTransport, DEFAULT_REQUEST_TIMEOUT};
pub use transport::{Transport, TransportResponse};

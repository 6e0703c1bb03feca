use async_trait::async_trait;

use crate::errors::LiveStoreError;

/// Raw response handed back by a [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// The `ETag` header, if the server sent one.
    pub validator: Option<String>,
    /// Response body. Ignored for 304.
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            validator: None,
            body: body.into(),
        }
    }

    pub fn not_modified() -> Self {
        Self::new(304, Vec::new())
    }

    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }
}

/// Performs GET requests relative to a base URL.
///
/// Dropping the returned future must abort the request; the live store
/// cancels superseded cycles that way.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `path`, sending `validator` as `If-None-Match` when present.
    ///
    /// Only transport-level failures are errors. Any HTTP status, including
    /// 4xx and 5xx, comes back as a [`TransportResponse`].
    async fn get(
        &self,
        path: &str,
        validator: Option<&str>,
    ) -> Result<TransportResponse, LiveStoreError>;
}

//! REST store error types.

use twintank_domain::error::{MalformedDevice, NotFoundError, TwinTankError};

/// Errors specific to the REST device store.
#[derive(Debug, thiserror::Error)]
pub enum RestStoreError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request failed in transit or timed out.
    #[error("request to device store failed")]
    Transport(#[source] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("device store answered {status} for {url}")]
    Status { status: u16, url: String },

    /// The store does not know the record.
    #[error("record {id} not found in device store")]
    NotFound { id: String },

    /// The body could not be decoded.
    #[error("failed to decode device store response")]
    Decode(#[source] serde_json::Error),

    /// The body decoded but does not describe a usable record.
    #[error("device store returned a malformed record")]
    Malformed(#[source] MalformedDevice),
}

impl RestStoreError {
    /// Convert into a [`TwinTankError`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> TwinTankError {
        match self {
            Self::NotFound { id } => NotFoundError {
                entity: "Device",
                id,
            }
            .into(),
            Self::Malformed(err) => err.into(),
            other => TwinTankError::store(other),
        }
    }
}

impl From<RestStoreError> for TwinTankError {
    fn from(err: RestStoreError) -> Self {
        err.into_domain()
    }
}

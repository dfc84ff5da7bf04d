use thiserror::Error;

use crate::transport::TransportError;

/// Error outputs from `TrackKit`
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum TrackKitError {
    /// A session/identity operation was invoked before the SDK was configured.
    /// This is a programmer error and is never silently defaulted.
    #[error("configuration_missing")]
    ConfigurationMissing,
    /// Unexpected error serializing information
    #[error("serialization_error: {0}")]
    SerializationError(String),
    /// Failure delivering a payload to the collection endpoint
    #[error(transparent)]
    Transport(#[from] TransportError),
}

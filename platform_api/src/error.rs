//! Messaging error types

use ipc::{SendFlags, StatusCode};
use thiserror::Error;

/// Errors reported by messaging operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagingError {
    /// Allocation failed, or a bounded resource is full
    #[error("Out of memory")]
    OutOfMemory,

    /// A required message argument was missing
    #[error("Missing message argument")]
    NullArgument,

    /// The operation is not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Send attempted on a channel without destination
    #[error("No route to destination")]
    NoRoute,

    /// Unknown manager, component, channel, type or value
    #[error("Not found: {0}")]
    NotFound(String),

    /// An id counter overflowed; this indicates a leak and is not retried
    #[error("Address space exhausted: {0}")]
    AddressSpaceExhausted(String),

    /// A message without destination reached a manager
    #[error("Message has no destination")]
    NoDestination,

    /// A synchronous exchange got no reply in time
    #[error("Operation timed out")]
    Timeout,

    /// A listener rejected a message
    #[error("Handler failed: {0}")]
    Handler(String),

    /// The platform collaborator failed
    #[error("Platform error: {0}")]
    Platform(String),

    /// A payload could not be (de)serialized
    #[error("Codec error: {0}")]
    Codec(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MessagingError {
    /// Error for a missing message, honouring `SendFlags::OOM_IF_NULL`
    pub fn missing_message(flags: SendFlags) -> Self {
        if flags.contains(SendFlags::OOM_IF_NULL) {
            MessagingError::OutOfMemory
        } else {
            MessagingError::NullArgument
        }
    }

    /// Returns the wire code used in status reports
    pub fn status_code(&self) -> StatusCode {
        match self {
            MessagingError::OutOfMemory => StatusCode::OutOfMemory,
            MessagingError::NullArgument => StatusCode::NullArgument,
            MessagingError::InvalidState(_) => StatusCode::InvalidState,
            MessagingError::NoRoute => StatusCode::NoRoute,
            MessagingError::NotFound(_) => StatusCode::NotFound,
            MessagingError::AddressSpaceExhausted(_) => StatusCode::AddressSpaceExhausted,
            MessagingError::NoDestination => StatusCode::NoDestination,
            MessagingError::Timeout => StatusCode::Timeout,
            MessagingError::Handler(_) => StatusCode::Handler,
            MessagingError::Platform(_) => StatusCode::Platform,
            MessagingError::Codec(_) => StatusCode::Codec,
            MessagingError::Config(_) => StatusCode::Config,
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::Codec(err.to_string())
    }
}

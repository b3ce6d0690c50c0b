use std::time::Duration;

use thiserror::Error;

/// Request-level failure from the remote gateway. Every transport problem is
/// normalized into one of these variants; no gateway call surfaces an
/// unstructured failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },
}

/// Failure of a user-triggered action. Resolved inside the dispatcher and
/// surfaced to the presentation layer as a user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// Bad user input, rejected before any network call.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Another mutating action is already in flight.
    #[error("another action is already in flight")]
    Busy,
    /// The view that would receive the result has been torn down.
    #[error("view is no longer active")]
    ViewInactive,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

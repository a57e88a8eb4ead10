use mathviz_core::error::RequestError;
use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy for a single computation attempt.
///
/// Every completed-but-failed render carries exactly one of these; the
/// orchestrator never retries or remaps them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// The service did not answer within the configured deadline.
    #[error("request timed out after {0:?}; computation took too long")]
    Timeout(Duration),
    /// The service could not be reached, or its reply broke the protocol.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service was reached but reported a failure of its own.
    #[error("service error: {0}")]
    Service(String),
    /// The request violated its parameter contract; nothing was dispatched.
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),
}

/// Outcome of a `render` call that did not produce a result.
///
/// `Busy` is a rejection, not a failure: the call changed nothing and left
/// no report behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("a computation is already in flight")]
    Busy,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

use adapters::coupon::ApiError;
use registry::RegistryError;
use thiserror::Error;

/// Errors surfaced by a test run or a bench command. Individual claim
/// failures are not errors; they end up as failed outcomes in the summary.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("a test run is already in progress")]
    AlreadyRunning,

    #[error("test run cancelled")]
    Cancelled,

    #[error("orchestration failed: {0}")]
    Orchestration(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl RunError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        RunError::PreconditionFailed(msg.into())
    }
}

use census_captcha_service::CaptchaError;
use census_identity_client::IdentityError;
use thiserror::Error;

use crate::core::client::queue::QueueError;

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that stop the worker. Per-job failures never end up here; they are reported to the
/// sink instead.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Missing or invalid startup configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Captcha client error: {0}")]
    CaptchaClientError(#[from] CaptchaError),

    #[error("Identity client error: {0}")]
    IdentityClientError(#[from] IdentityError),

    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    #[error("Logging setup error: {0}")]
    LoggingError(String),

    #[error("Worker error: {0}")]
    WorkerAnyhowError(#[from] anyhow::Error),
}

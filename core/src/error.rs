/// Error types for notification dispatch
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable reply to the capability query
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// The service answered with an error reply
    #[error("Notification rejected by service ({name}): {message}")]
    SendRejected { name: String, message: String },

    /// Transport-level failure: no bus, no owner, broken connection
    #[error("Notification service unreachable: {0}")]
    SendUnreachable(String),

    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl NotifyError {
    /// True when the service itself answered (as opposed to the call never arriving)
    pub fn is_rejection(&self) -> bool {
        matches!(self, NotifyError::SendRejected { .. })
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;

pub mod audio;
pub mod client;
pub mod config;
pub mod context;
pub mod live;
pub mod messages;
pub mod session;
pub mod store;
pub mod wellness;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SolaceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failure: {0}")]
    RequestFailure(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for SolaceError {
    fn from(e: std::io::Error) -> Self {
        SolaceError::StorageError(e.to_string())
    }
}

impl SolaceError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Device access requires user intervention
            SolaceError::PermissionDenied(_) => false,
            // A fresh live session can be started after a transport failure
            SolaceError::ConnectionError(_) => true,
            // Remote calls are typically transient failures
            SolaceError::RequestFailure(_) => true,
            SolaceError::ValidationError(_) => true,
            SolaceError::StorageError(_) => false,
            SolaceError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SolaceError::PermissionDenied(_) => {
                "Microphone access was denied. Please allow it to use voice sessions.".to_string()
            }
            SolaceError::ConnectionError(_) => {
                "The voice connection was lost. Please start a new session.".to_string()
            }
            SolaceError::RequestFailure(_) => {
                "I couldn't reach the support service. Please try again.".to_string()
            }
            SolaceError::ValidationError(_) => {
                "That input couldn't be accepted.".to_string()
            }
            SolaceError::StorageError(_) => {
                "Your data couldn't be saved. Please check disk access.".to_string()
            }
            SolaceError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SolaceError>;

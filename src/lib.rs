pub mod commands;
pub mod gigs;
pub mod integration;
pub mod messages;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GigError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Speech engine error: {0}")]
    SpeechError(String),

    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for GigError {
    fn from(e: std::io::Error) -> Self {
        GigError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for GigError {
    fn from(e: serde_json::Error) -> Self {
        GigError::SerializationError(e.to_string())
    }
}

impl GigError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A failed write leaves the in-memory listing intact
            GigError::StorageError(_) => true,
            GigError::SerializationError(_) => true,
            // Speech failures degrade to text in the chat log
            GigError::SpeechError(_) => true,
            GigError::InvalidForm(_) => true,
            GigError::ConfigError(_) => false,
            GigError::ChannelError(_) => false,
            GigError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            GigError::StorageError(_) => {
                "Could not save gigs. Changes are kept for this session.".to_string()
            }
            GigError::SerializationError(_) => "Saved gigs could not be read.".to_string(),
            GigError::SpeechError(_) => {
                "Voice is unavailable. Replies are shown as text.".to_string()
            }
            GigError::InvalidForm(reason) => format!("Please fix the form: {}", reason),
            GigError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            GigError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            GigError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GigError>;

use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FisandError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// The remote path or reference does not exist.
    #[error("Remote Not Found: {0}")]
    RemoteNotFound(String),

    /// Credentials are missing or were rejected by the remote.
    #[error("Remote Authentication Error: {0}")]
    RemoteAuth(String),

    /// Transport failure or server-side error while talking to the remote.
    #[error("Remote Unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Decode Error in {0}: {1}")]
    Decode(String, String),

    #[error("API Error: {0}")]
    Api(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("IoError: {0}")]
    IoError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl FisandError {
    /// Errors that must stop the whole process instead of being recorded per entry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FisandError::RemoteAuth(_) | FisandError::Config(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            FisandError::RemoteNotFound(_) => true,
            FisandError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<std::io::Error> for FisandError {
    fn from(err: std::io::Error) -> Self {
        FisandError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for FisandError {
    fn from(err: reqwest::Error) -> Self {
        FisandError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for FisandError {
    fn from(err: serde_json::Error) -> Self {
        FisandError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FisandError>;

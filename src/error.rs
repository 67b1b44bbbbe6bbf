use std::path::PathBuf;
use thiserror::Error;

/// Failure while querying the findings service
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Findings request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error! Status: {status}")]
    Http { status: u16, body: String },

    #[error("Failed to decode findings response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure while asking the model for a fix
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Error response from model ({status}): {body}")]
    Unexpected { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failure of a single fix attempt
#[derive(Error, Debug)]
pub enum FixError {
    #[error("Component '{0}' has no file path")]
    InvalidComponent(String),

    #[error("Malformed finding {key}: {reason}")]
    MalformedResponse { key: String, reason: String },

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Errors worth another attempt under a retry policy
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Rate limiting and server-side failures are transient, everything else is final
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Http { status, .. } => is_transient_status(*status),
            FetchError::Decode(_) => false,
        }
    }
}

impl Retryable for AgentError {
    fn is_retryable(&self) -> bool {
        match self {
            AgentError::Request(_) => true,
            AgentError::Unexpected { status, .. } => is_transient_status(*status),
            AgentError::MalformedResponse(_) | AgentError::Decode(_) => false,
        }
    }
}

//! Client error taxonomy
//!
//! Errors surface from the request layer and the task runner. Callers above
//! the client convert them to absence (an empty list or `None`) after logging,
//! so a single failed call never aborts a whole fetch run. The one exception
//! is credential validation, which reports its outcome explicitly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The API rejected the access token (401 or 403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The request never produced an HTTP response
    #[error("Transport failed: {0}")]
    Transport(String),

    /// Still throttled after exhausting the retry budget
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Non-success status outside the handled set
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The mockup generator reported the task as failed
    #[error("Mockup task failed: {0}")]
    TaskFailed(String),

    /// The mockup task never reached a terminal state
    #[error("Mockup task timed out after {attempts} status reads")]
    TaskTimedOut { attempts: u32 },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

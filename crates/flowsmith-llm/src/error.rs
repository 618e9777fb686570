use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: u32, reason: String },

    #[error("generator client configuration error: {0}")]
    Configuration(String),
}

/// Failure of a single HTTP exchange with the generator backend.
#[derive(Debug, Error)]
pub(crate) enum CallError {
    #[error("credential acquisition failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication rejected ({status})")]
    Unauthorized { status: StatusCode, token: String },

    #[error("generator returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response format: {0}")]
    Envelope(String),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected token response: {0}")]
    Envelope(String),
}

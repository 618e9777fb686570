mod client;
mod protocol;

pub use client::*;
pub use protocol::*;

use async_trait::async_trait;
use flowsmith_core::ValidationReport;
use reqwest::StatusCode;
use thiserror::Error;

/// Any failure here means the validator is unavailable for this attempt.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("validator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("validator returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("validator response is not JSON: {0}")]
    Body(String),

    #[error("unexpected validator response format: {0}")]
    Shape(String),
}

/// Structural checker for candidate BPMN documents.
#[async_trait]
pub trait BpmnValidator: Send + Sync {
    async fn validate(&self, xml: &str) -> Result<ValidationReport, ValidatorError>;
}

#[async_trait]
impl<T: BpmnValidator + ?Sized> BpmnValidator for std::sync::Arc<T> {
    async fn validate(&self, xml: &str) -> Result<ValidationReport, ValidatorError> {
        (**self).validate(xml).await
    }
}

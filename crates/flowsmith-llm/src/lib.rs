mod client;
mod credentials;
mod error;
pub mod prompt;
mod types;

pub use client::*;
pub use credentials::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;

/// Text-generation backend producing BPMN drafts.
///
/// Implementations own their transport retries; a returned error means the
/// backend stayed unavailable after those retries.
#[async_trait]
pub trait BpmnGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    /// Produce a first draft from an initial prompt.
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GeneratorError>;

    /// Produce a corrected draft from a repair prompt.
    async fn repair(&self, prompt: &str, temperature: f32) -> Result<String, GeneratorError>;
}

#[async_trait]
impl<T: BpmnGenerator + ?Sized> BpmnGenerator for std::sync::Arc<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GeneratorError> {
        (**self).generate(prompt, temperature).await
    }

    async fn repair(&self, prompt: &str, temperature: f32) -> Result<String, GeneratorError> {
        (**self).repair(prompt, temperature).await
    }
}

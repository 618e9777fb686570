use crate::credentials::CredentialCache;
use crate::error::{CallError, GeneratorError};
use crate::types::{ChatRequest, ChatResponse};
use crate::BpmnGenerator;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct GigaChatConfig {
    pub api_url: String,
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per logical call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled after each further failure.
    pub retry_base_delay: Duration,
}

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            api_url: "https://gigachat.devices.sberbank.ru/api/v1/chat/completions".to_string(),
            model: "GigaChat".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

pub struct GigaChatClient {
    config: GigaChatConfig,
    http: reqwest::Client,
    credentials: Arc<CredentialCache>,
}

impl GigaChatClient {
    pub fn new(
        config: GigaChatConfig,
        credentials: Arc<CredentialCache>,
    ) -> Result<Self, GeneratorError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::Configuration(e.to_string()))?;
        Ok(Self {
            config,
            http,
            credentials,
        })
    }

    /// Send `prompt` with bounded retries and exponential backoff.
    ///
    /// An authentication rejection drops the cached credential once per call
    /// so the next try re-acquires it.
    async fn complete(
        &self,
        label: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GeneratorError> {
        let request = ChatRequest::single_prompt(&self.config.model, prompt, temperature);
        let max_attempts = self.config.max_attempts.max(1);
        let mut delay = self.config.retry_base_delay;
        let mut refreshed = false;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.send_once(&request).await {
                Ok(text) => {
                    info!(call = label, attempt, chars = text.len(), "generator_response");
                    return Ok(text);
                }
                Err(err) => {
                    warn!(call = label, attempt, error = %err, "generator_request_failed");
                    if let CallError::Unauthorized { token, .. } = &err {
                        if !refreshed {
                            self.credentials.invalidate(token).await;
                            refreshed = true;
                        }
                    }
                    last_error = Some(err);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(GeneratorError::Unavailable {
            attempts: max_attempts,
            reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, CallError> {
        let token = self.credentials.bearer().await?;

        debug!("Generator request to {} (model {})", self.config.api_url, request.model);

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CallError::Unauthorized { status, token });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| CallError::Envelope(e.to_string()))?;
        parsed
            .into_text()
            .ok_or_else(|| CallError::Envelope("response has no choices".to_string()))
    }
}

#[async_trait]
impl BpmnGenerator for GigaChatClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GeneratorError> {
        self.complete("generate", prompt, temperature).await
    }

    async fn repair(&self, prompt: &str, temperature: f32) -> Result<String, GeneratorError> {
        self.complete("repair", prompt, temperature).await
    }
}

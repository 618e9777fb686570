use crate::protocol::normalize_report;
use crate::{BpmnValidator, ValidatorError};
use async_trait::async_trait;
use flowsmith_core::ValidationReport;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            url: "http://validator:9000/validate".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the structural validator service.
pub struct ValidatorClient {
    config: ValidatorConfig,
    http: reqwest::Client,
}

impl ValidatorClient {
    pub fn new(config: ValidatorConfig) -> Result<Self, ValidatorError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl BpmnValidator for ValidatorClient {
    async fn validate(&self, xml: &str) -> Result<ValidationReport, ValidatorError> {
        debug!("Validator request to {} ({} bytes)", self.config.url, xml.len());

        let response = self
            .http
            .post(&self.config.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(xml.as_bytes().to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ValidatorError::Status { status, body });
        }

        let body = response.text().await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| ValidatorError::Body(e.to_string()))?;
        let report = normalize_report(value)?;

        info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validator_report"
        );
        Ok(report)
    }
}

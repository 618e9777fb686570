use anyhow::{Result, bail};
use clap::Parser;
use flowsmith_core::RequestLimits;
use flowsmith_llm::{Credentials, GigaChatConfig};
use flowsmith_validator::ValidatorConfig;
use std::time::Duration;

/// Service settings, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "flowsmith", version, about = "Text-to-BPMN generation service")]
pub struct Settings {
    /// Chat completions endpoint of the generator backend.
    #[arg(long, env = "GIGACHAT_API_URL", default_value = "")]
    pub gigachat_api_url: String,

    /// Static bearer token, used when no OAuth endpoint is configured.
    #[arg(long, env = "GIGACHAT_TOKEN", default_value = "", hide_env_values = true)]
    pub gigachat_token: String,

    #[arg(long, env = "GIGACHAT_AUTH_URL")]
    pub gigachat_auth_url: Option<String>,

    /// Long-lived authorization key exchanged for access tokens.
    #[arg(long, env = "GIGACHAT_AUTH_KEY", hide_env_values = true)]
    pub gigachat_auth_key: Option<String>,

    #[arg(long, env = "GIGACHAT_SCOPE", default_value = "GIGACHAT_API_PERS")]
    pub gigachat_scope: String,

    #[arg(long, env = "GIGACHAT_MODEL", default_value = "GigaChat")]
    pub gigachat_model: String,

    #[arg(long, env = "VALIDATOR_URL", default_value = "http://validator:9000/validate")]
    pub validator_url: String,

    #[arg(long, env = "MAX_ATTEMPTS_DEFAULT", default_value_t = 3)]
    pub max_attempts_default: u32,

    #[arg(long, env = "MAX_ATTEMPTS_HARD_LIMIT", default_value_t = 10)]
    pub max_attempts_hard_limit: u32,

    #[arg(long, env = "MAX_TEXT_LEN", default_value_t = 4000)]
    pub max_text_len: usize,

    #[arg(long, env = "LLM_TIMEOUT_SEC", default_value_t = 30.0)]
    pub llm_timeout_sec: f64,

    #[arg(long, env = "VALIDATOR_TIMEOUT_SEC", default_value_t = 10.0)]
    pub validator_timeout_sec: f64,

    /// Delay before the first generator retry, doubled on each further retry.
    #[arg(long, env = "LLM_RETRY_BASE_MS", default_value_t = 1000)]
    pub llm_retry_base_ms: u64,

    /// Fallback log filter when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "FLOWSMITH_ADDR", default_value = "0.0.0.0:8000")]
    pub addr: String,
}

impl Settings {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts_default < 1 || self.max_attempts_hard_limit < 1 {
            bail!("Attempts must be positive");
        }
        if self.max_attempts_default > self.max_attempts_hard_limit {
            bail!(
                "MAX_ATTEMPTS_DEFAULT ({}) exceeds MAX_ATTEMPTS_HARD_LIMIT ({})",
                self.max_attempts_default,
                self.max_attempts_hard_limit
            );
        }
        for (name, secs) in [
            ("LLM_TIMEOUT_SEC", self.llm_timeout_sec),
            ("VALIDATOR_TIMEOUT_SEC", self.validator_timeout_sec),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                bail!("{} must be a positive number of seconds (got {})", name, secs);
            }
        }
        if self.gigachat_api_url.trim().is_empty() {
            bail!("GIGACHAT_API_URL must be set");
        }
        Ok(())
    }

    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            max_text_len: self.max_text_len,
            max_attempts_default: self.max_attempts_default,
            max_attempts_hard_limit: self.max_attempts_hard_limit,
        }
    }

    /// OAuth when both the endpoint and key are configured, the static token otherwise.
    pub fn credentials(&self) -> Credentials {
        match (&self.gigachat_auth_url, &self.gigachat_auth_key) {
            (Some(auth_url), Some(auth_key)) => Credentials::OAuth {
                auth_url: auth_url.clone(),
                auth_key: auth_key.clone(),
                scope: self.gigachat_scope.clone(),
            },
            _ => Credentials::Static(self.gigachat_token.clone()),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.llm_timeout_sec)
    }

    pub fn generator_config(&self) -> GigaChatConfig {
        GigaChatConfig {
            api_url: self.gigachat_api_url.clone(),
            model: self.gigachat_model.clone(),
            timeout: self.llm_timeout(),
            retry_base_delay: Duration::from_millis(self.llm_retry_base_ms),
            ..GigaChatConfig::default()
        }
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            url: self.validator_url.clone(),
            timeout: Duration::from_secs_f64(self.validator_timeout_sec),
        }
    }
}

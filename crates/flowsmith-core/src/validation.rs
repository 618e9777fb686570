use crate::GenerationRequest;
use thiserror::Error;

/// Bounds applied to every request before the repair loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_text_len: usize,
    pub max_attempts_default: u32,
    pub max_attempts_hard_limit: u32,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_text_len: 4000,
            max_attempts_default: 3,
            max_attempts_hard_limit: 10,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("text too long ({len} > {max} characters)")]
    TextTooLong { len: usize, max: usize },

    #[error("temperature must be between 0 and 1 (got {0})")]
    TemperatureOutOfRange(f32),

    #[error("max_attempts must be positive")]
    NonPositiveAttempts,

    #[error("max_attempts exceeds hard limit ({requested} > {limit})")]
    AttemptsAboveLimit { requested: u32, limit: u32 },
}

/// Check a request against `limits` and resolve its attempt budget.
pub fn validate_request(
    request: &GenerationRequest,
    limits: &RequestLimits,
) -> Result<u32, RequestError> {
    if request.text.trim().is_empty() {
        return Err(RequestError::EmptyText);
    }

    let len = request.text.chars().count();
    if len > limits.max_text_len {
        return Err(RequestError::TextTooLong {
            len,
            max: limits.max_text_len,
        });
    }

    // NaN falls outside the range too
    if !(0.0..=1.0).contains(&request.temperature) {
        return Err(RequestError::TemperatureOutOfRange(request.temperature));
    }

    resolve_max_attempts(request.max_attempts, limits)
}

/// Resolve the caller's attempt override against the configured default and hard limit.
pub fn resolve_max_attempts(
    requested: Option<u32>,
    limits: &RequestLimits,
) -> Result<u32, RequestError> {
    let max_attempts = match requested {
        Some(0) => return Err(RequestError::NonPositiveAttempts),
        Some(n) => n,
        None => limits.max_attempts_default,
    };

    if max_attempts > limits.max_attempts_hard_limit {
        return Err(RequestError::AttemptsAboveLimit {
            requested: max_attempts,
            limit: limits.max_attempts_hard_limit,
        });
    }

    Ok(max_attempts)
}

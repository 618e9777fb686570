use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use flowsmith_core::{
    DebugTrace, GenerationOutcome, GenerationRequest, RequestLimits, ValidationReport,
    validate_request,
};
use flowsmith_engine::{GenerationError, RepairLoop};
use flowsmith_llm::{BpmnGenerator, CredentialCache, GigaChatClient};
use flowsmith_validator::{BpmnValidator, ValidatorClient};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::warn;


pub type SharedRepairLoop = RepairLoop<Arc<dyn BpmnGenerator>, Arc<dyn BpmnValidator>>;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub repair_loop: Arc<SharedRepairLoop>,
    pub limits: RequestLimits,
    /// Cancelled on shutdown; aborts in-flight generations.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn BpmnGenerator>,
        validator: Arc<dyn BpmnValidator>,
        limits: RequestLimits,
    ) -> Self {
        Self {
            repair_loop: Arc::new(RepairLoop::new(generator, validator)),
            limits,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the production ports. One credential cache serves every request.
    pub fn from_settings(settings: &crate::config::Settings) -> Result<Self> {
        let credentials = Arc::new(CredentialCache::new(
            settings.credentials(),
            settings.llm_timeout(),
        )?);
        let generator = GigaChatClient::new(settings.generator_config(), credentials)?;
        let validator = ValidatorClient::new(settings.validator_config())?;
        Ok(Self::new(
            Arc::new(generator),
            Arc::new(validator),
            settings.limits(),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate-bpmn", post(generate_bpmn))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct GenerateSuccessResponse {
    pub validated: bool,
    pub attempts_used: u32,
    pub bpmn_xml: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugTrace>,
}

#[derive(Debug, Serialize)]
pub struct GenerateFailureResponse {
    pub validated: bool,
    pub attempts_used: u32,
    pub last_validation_report: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugTrace>,
}

/// Caller-facing error, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Generation(GenerationError),
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        ApiError::Generation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Generation(GenerationError::Generator(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "generator unavailable".to_string(),
            ),
            ApiError::Generation(GenerationError::Validator(_)) => {
                (StatusCode::BAD_GATEWAY, "validator error".to_string())
            }
            ApiError::Generation(GenerationError::Cancelled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "generation cancelled".to_string(),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

async fn generate_bpmn(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, "request_rejected");
        ApiError::BadRequest(e.body_text())
    })?;

    let max_attempts = validate_request(&request, &state.limits).map_err(|e| {
        warn!(error = %e, "request_rejected");
        ApiError::BadRequest(e.to_string())
    })?;

    let outcome = state
        .repair_loop
        .run_until_cancelled(&request, max_attempts, &state.shutdown)
        .await?;

    Ok(outcome_response(outcome))
}

fn outcome_response(outcome: GenerationOutcome) -> Response {
    match outcome {
        GenerationOutcome::Success {
            attempts_used,
            bpmn_xml,
            debug,
        } => (
            StatusCode::OK,
            Json(GenerateSuccessResponse {
                validated: true,
                attempts_used,
                bpmn_xml,
                debug,
            }),
        )
            .into_response(),
        GenerationOutcome::Failure {
            attempts_used,
            last_validation_report,
            debug,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(GenerateFailureResponse {
                validated: false,
                attempts_used,
                last_validation_report,
                debug,
            }),
        )
            .into_response(),
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.repair_loop.generator().model_name(),
    }))
}

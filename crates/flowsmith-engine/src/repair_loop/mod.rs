
use crate::GenerationError;
use flowsmith_core::{DebugTrace, GenerationOutcome, GenerationRequest, ValidationReport};
use flowsmith_llm::BpmnGenerator;
use flowsmith_llm::prompt::{initial_prompt, repair_prompt};
use flowsmith_validator::BpmnValidator;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// Error reported for drafts that fail the local pre-check.
pub const INVALID_XML_MESSAGE: &str = "Invalid XML format";

const ROOT_MARKER: &str = "<bpmn:definitions";

/// Cheap local check that a draft is worth sending to the validator.
pub fn looks_like_bpmn(xml: &str) -> bool {
    xml.trim().starts_with('<') && xml.contains(ROOT_MARKER)
}

/// Fresh process name for requests that did not supply one.
pub fn placeholder_process_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("Process-{}", &id[..8])
}

/// Generate-validate-repair loop over one generator and one validator.
///
/// Attempts run strictly in sequence: each repair prompt is built from the
/// previous draft and the full error list of its report.
pub struct RepairLoop<G, V> {
    generator: G,
    validator: V,
}

impl<G: BpmnGenerator, V: BpmnValidator> RepairLoop<G, V> {
    pub fn new(generator: G, validator: V) -> Self {
        Self {
            generator,
            validator,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Run at most `max_attempts` generate/repair-validate cycles.
    ///
    /// Port failures abort the run; an exhausted budget is a `Failure` outcome
    /// carrying the final attempt's report.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        max_attempts: u32,
    ) -> Result<GenerationOutcome, GenerationError> {
        debug_assert!(max_attempts >= 1, "attempt budget must be positive");
        let max_attempts = max_attempts.max(1);

        let process_name = request
            .explicit_process_name()
            .map(str::to_string)
            .unwrap_or_else(placeholder_process_name);
        let mut trace = request.return_debug.then(DebugTrace::default);

        info!(
            process_name = %process_name,
            language = %request.language,
            max_attempts,
            model = self.generator.model_name(),
            "generation_started"
        );

        let prompt = initial_prompt(&request.text, &process_name, request.language);
        let mut xml = self
            .generator
            .generate(&prompt, request.temperature)
            .await
            .inspect_err(|e| error!(attempt = 1, error = %e, "generator_error"))?;
        let mut attempt = 1;

        loop {
            let report = self.check_draft(&xml, attempt).await?;

            info!(
                attempt,
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                "attempt_finished"
            );
            if let Some(trace) = trace.as_mut() {
                trace.record(attempt, report.clone());
            }

            if report.is_passing() {
                info!(attempts_used = attempt, validated = true, "generation_finished");
                return Ok(GenerationOutcome::Success {
                    attempts_used: attempt,
                    bpmn_xml: xml,
                    debug: trace,
                });
            }

            if attempt >= max_attempts {
                info!(attempts_used = attempt, validated = false, "generation_finished");
                return Ok(GenerationOutcome::Failure {
                    attempts_used: max_attempts,
                    last_validation_report: report,
                    debug: trace,
                });
            }

            attempt += 1;
            let prompt = repair_prompt(
                &request.text,
                request.language,
                &xml,
                &report.errors,
                &process_name,
            );
            xml = self
                .generator
                .repair(&prompt, request.temperature)
                .await
                .inspect_err(|e| error!(attempt, error = %e, "generator_error"))?;
        }
    }

    /// `run`, abandoned as soon as `cancel` fires.
    ///
    /// Cancellation drops the in-flight network call and starts no further
    /// attempts.
    pub async fn run_until_cancelled(
        &self,
        request: &GenerationRequest,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("generation_cancelled");
                Err(GenerationError::Cancelled)
            }
            outcome = self.run(request, max_attempts) => outcome,
        }
    }

    async fn check_draft(
        &self,
        xml: &str,
        attempt: u32,
    ) -> Result<ValidationReport, GenerationError> {
        if !looks_like_bpmn(xml) {
            info!(attempt, "draft_rejected_precheck");
            return Ok(ValidationReport::single_error(INVALID_XML_MESSAGE));
        }

        let report = self
            .validator
            .validate(xml)
            .await
            .inspect_err(|e| error!(attempt, error = %e, "validator_error"))?;
        Ok(report)
    }
}

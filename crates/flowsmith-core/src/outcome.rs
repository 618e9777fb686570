use crate::ValidationReport;
use serde::{Deserialize, Serialize};

/// Validator verdict for one executed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub validation_report: ValidationReport,
}

/// Per-attempt trace returned when the caller asks for debug output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugTrace {
    pub attempts: Vec<AttemptRecord>,
}

impl DebugTrace {
    pub fn record(&mut self, attempt: u32, validation_report: ValidationReport) {
        self.attempts.push(AttemptRecord {
            attempt,
            validation_report,
        });
    }
}

/// Result of one repair-loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success {
        attempts_used: u32,
        bpmn_xml: String,
        debug: Option<DebugTrace>,
    },
    /// Attempt budget exhausted with errors still outstanding.
    Failure {
        attempts_used: u32,
        last_validation_report: ValidationReport,
        debug: Option<DebugTrace>,
    },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    pub fn attempts_used(&self) -> u32 {
        match self {
            GenerationOutcome::Success { attempts_used, .. }
            | GenerationOutcome::Failure { attempts_used, .. } => *attempts_used,
        }
    }

    pub fn debug(&self) -> Option<&DebugTrace> {
        match self {
            GenerationOutcome::Success { debug, .. } | GenerationOutcome::Failure { debug, .. } => {
                debug.as_ref()
            }
        }
    }
}

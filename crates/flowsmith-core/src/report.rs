use serde::{Deserialize, Serialize};

/// A single finding produced by the structural validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub rule: Option<String>,
}

impl ValidationIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: None,
            message: message.into(),
            rule: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// Canonical validator report. Only `errors` decide pass/fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self { errors, warnings }
    }

    /// Report carrying exactly one error and no warnings.
    pub fn single_error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![ValidationIssue::new(message)],
            warnings: Vec::new(),
        }
    }

    pub fn is_passing(&self) -> bool {
        self.errors.is_empty()
    }
}

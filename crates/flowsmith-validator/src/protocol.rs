use crate::ValidatorError;
use flowsmith_core::{ValidationIssue, ValidationReport};
use serde::Deserialize;
use serde_json::Value;

/// Report that already separates errors from warnings.
#[derive(Debug, Deserialize)]
pub struct SplitReport {
    #[serde(default)]
    pub errors: Option<Vec<ValidationIssue>>,
    #[serde(default)]
    pub warnings: Option<Vec<ValidationIssue>>,
}

/// Entry of a flat issue list (bpmnlint style).
#[derive(Debug, Deserialize)]
pub struct FlatIssue {
    #[serde(default)]
    pub id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

impl FlatIssue {
    /// `category` wins when both tags are present.
    pub fn tag(&self) -> Option<&str> {
        self.category.as_deref().or(self.severity.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// `warn`/`warning` in any case is a warning; anything else, or no tag, is an error.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("warn") || t.eq_ignore_ascii_case("warning") => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

/// The closed set of report encodings accepted from the validator.
#[derive(Debug)]
pub enum ReportShape {
    Split(SplitReport),
    Flat(Vec<FlatIssue>),
}

impl ReportShape {
    /// Decode the split form first, then a flat list (bare or under a single key).
    pub fn decode(value: Value) -> Result<Self, ValidatorError> {
        match value {
            Value::Object(map) if map.contains_key("errors") || map.contains_key("warnings") => {
                serde_json::from_value(Value::Object(map))
                    .map(ReportShape::Split)
                    .map_err(|e| ValidatorError::Shape(e.to_string()))
            }
            Value::Array(entries) => decode_flat(entries),
            Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
                Some((_, Value::Array(entries))) => decode_flat(entries),
                Some((key, _)) => Err(ValidatorError::Shape(format!(
                    "key '{}' does not hold an issue list",
                    key
                ))),
                None => Err(ValidatorError::Shape("empty object".to_string())),
            },
            Value::Object(map) => Err(ValidatorError::Shape(format!(
                "object with keys {:?}",
                map.keys().collect::<Vec<_>>()
            ))),
            other => Err(ValidatorError::Shape(format!("unexpected JSON value: {}", other))),
        }
    }

    pub fn into_report(self) -> ValidationReport {
        match self {
            ReportShape::Split(split) => ValidationReport::new(
                split.errors.unwrap_or_default(),
                split.warnings.unwrap_or_default(),
            ),
            ReportShape::Flat(entries) => {
                let mut report = ValidationReport::default();
                for entry in entries {
                    let severity = Severity::from_tag(entry.tag());
                    let issue = ValidationIssue {
                        id: entry.id,
                        message: entry.message,
                        rule: entry.rule,
                    };
                    match severity {
                        Severity::Error => report.errors.push(issue),
                        Severity::Warning => report.warnings.push(issue),
                    }
                }
                report
            }
        }
    }
}

fn decode_flat(entries: Vec<Value>) -> Result<ReportShape, ValidatorError> {
    serde_json::from_value(Value::Array(entries))
        .map(ReportShape::Flat)
        .map_err(|e| ValidatorError::Shape(e.to_string()))
}

/// Normalize any accepted validator response into a canonical report.
pub fn normalize_report(value: Value) -> Result<ValidationReport, ValidatorError> {
    ReportShape::decode(value).map(ReportShape::into_report)
}

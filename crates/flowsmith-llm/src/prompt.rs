//! Prompt builders for the first draft and for repair rounds.
//!
//! Instructions are written in the request language. Both prompts pin the same
//! structural constraints so a repaired draft cannot drift from them.

use flowsmith_core::{Language, ValidationIssue};

/// Prompt asking for a fresh BPMN 2.0 document.
pub fn initial_prompt(text: &str, process_name: &str, language: Language) -> String {
    match language {
        Language::Ru => format!(
            r#"Ты генератор BPMN 2.0 XML. Верни только валидный BPMN 2.0 XML без пояснений.
Требования: один процесс без pool и lane, используй префикс bpmn:, добавь BPMN DI (diagram, plane, shapes, edges).
Минимум: один <bpmn:process id> с именем '{process_name}', startEvent и endEvent, соединенные sequenceFlow.
Уникальные id, простой линейный layout координатами (grid).
Описание процесса ({language}): {text}
"#
        ),
        Language::En => format!(
            r#"You are a BPMN 2.0 XML generator. Return only valid BPMN 2.0 XML with no explanations.
Requirements: a single process without pools or lanes, use the bpmn: prefix, include BPMN DI (diagram, plane, shapes, edges).
At minimum: one <bpmn:process id> named '{process_name}', a startEvent and an endEvent connected by sequenceFlow.
Unique ids, a simple linear grid layout with coordinates.
Process description ({language}): {text}
"#
        ),
    }
}

/// Prompt asking for a minimal fix of `current_xml` given every outstanding error.
pub fn repair_prompt(
    text: &str,
    language: Language,
    current_xml: &str,
    errors: &[ValidationIssue],
    process_name: &str,
) -> String {
    let error_lines = errors
        .iter()
        .map(format_issue)
        .collect::<Vec<_>>()
        .join("\n");

    match language {
        Language::Ru => format!(
            r#"Описание процесса ({language}): {text}
Текущий BPMN XML:
{current_xml}
Ошибки валидации:
{error_lines}
Исправь минимально необходимое, сохрани смысл процесса, верни только BPMN 2.0 XML с DI, один процесс без pool/lane под именем '{process_name}'.
"#
        ),
        Language::En => format!(
            r#"Process description ({language}): {text}
Current BPMN XML:
{current_xml}
Validation errors:
{error_lines}
Make the minimal necessary fix, keep the meaning of the process, return only BPMN 2.0 XML with DI, a single process without pools/lanes named '{process_name}'.
"#
        ),
    }
}

/// One issue per line; absent fields render empty.
pub fn format_issue(issue: &ValidationIssue) -> String {
    format!(
        "- id={} rule={} message={}",
        issue.id.as_deref().unwrap_or_default(),
        issue.rule.as_deref().unwrap_or_default(),
        issue.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_prompt_carries_name_text_and_constraints() {
        let prompt = initial_prompt("Approve an invoice", "Invoice", Language::En);
        assert!(prompt.contains("'Invoice'"));
        assert!(prompt.contains("Approve an invoice"));
        assert!(prompt.contains("(en)"));
        assert!(prompt.contains("without pools or lanes"));
        assert!(prompt.contains("BPMN DI"));
        assert!(prompt.contains("startEvent"));
    }

    #[test]
    fn russian_prompt_is_used_for_ru() {
        let prompt = initial_prompt("Согласовать счет", "Счет", Language::Ru);
        assert!(prompt.contains("Ты генератор BPMN 2.0 XML"));
        assert!(prompt.contains("(ru)"));
    }

    #[test]
    fn format_issue_renders_missing_fields_empty() {
        assert_eq!(
            format_issue(&ValidationIssue::new("issue")),
            "- id= rule= message=issue"
        );
        let full = ValidationIssue::new("Task must have a label")
            .with_id("Task_1")
            .with_rule("label-required");
        assert_eq!(
            format_issue(&full),
            "- id=Task_1 rule=label-required message=Task must have a label"
        );
    }

    #[test]
    fn repair_prompt_lists_every_error_and_the_draft() {
        let errors = vec![
            ValidationIssue::new("first").with_id("A"),
            ValidationIssue::new("second").with_rule("r2"),
        ];
        let prompt = repair_prompt("text", Language::En, "<bpmn:definitions/>", &errors, "P");
        assert!(prompt.contains("<bpmn:definitions/>"));
        assert!(prompt.contains("- id=A rule= message=first"));
        assert!(prompt.contains("- id= rule=r2 message=second"));
        assert!(prompt.contains("named 'P'"));
    }
}

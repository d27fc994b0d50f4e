use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::{AnswerError, AnswerRecord, AnswerValue};
use crate::spec::{QuestionDefinition, Registry};

/// A single problem found in a set of answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub question_id: Option<String>,
    pub path: Option<String>,
    pub message: String,
    pub code: Option<String>,
}

/// Outcome of checking a full answer document against a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
}

/// Validates a JSON answer document (an object keyed by question id).
pub fn validate(registry: &Registry, answers: &Value) -> ValidationResult {
    let (record, errors) = collect(registry, answers);
    finish(registry, answers, &record, errors)
}

/// Converts a JSON answer document into an [`AnswerRecord`], or reports why it cannot.
pub fn parse_record(
    registry: &Registry,
    answers: &Value,
) -> Result<AnswerRecord, ValidationResult> {
    let (record, errors) = collect(registry, answers);
    let unknown_fields = unknown_fields(registry, answers);
    if errors.is_empty() && unknown_fields.is_empty() {
        Ok(record)
    } else {
        Err(finish(registry, answers, &record, errors))
    }
}

fn collect(registry: &Registry, answers: &Value) -> (AnswerRecord, Vec<ValidationError>) {
    let mut record = AnswerRecord::new();
    let mut errors = Vec::new();
    let Some(answers_map) = answers.as_object() else {
        errors.push(ValidationError {
            question_id: None,
            path: Some("/".into()),
            message: "answers must be a JSON object".into(),
            code: Some("not_an_object".into()),
        });
        return (record, errors);
    };

    for question in registry.iter() {
        if let Some(value) = answers_map.get(&question.id) {
            match AnswerValue::from_json(question, value) {
                Ok(answer) => {
                    record.insert(question.id.clone(), answer);
                }
                Err(error) => errors.push(answer_error(question, &error)),
            }
        }
    }

    (record, errors)
}

fn finish(
    registry: &Registry,
    answers: &Value,
    record: &AnswerRecord,
    errors: Vec<ValidationError>,
) -> ValidationResult {
    let missing_required = registry
        .iter()
        .filter(|question| question.required && !record.is_answered(&question.id))
        .filter(|question| {
            !errors
                .iter()
                .any(|error| error.question_id.as_deref() == Some(question.id.as_str()))
        })
        .map(|question| question.id.clone())
        .collect::<Vec<_>>();
    let unknown_fields = unknown_fields(registry, answers);

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn unknown_fields(registry: &Registry, answers: &Value) -> Vec<String> {
    answers
        .as_object()
        .map(|map| {
            map.keys()
                .filter(|key| registry.find(key).is_none())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn answer_error(question: &QuestionDefinition, error: &AnswerError) -> ValidationError {
    let code = match error {
        AnswerError::UnknownQuestion(_) => "unknown_question",
        AnswerError::KindMismatch { .. } => "type_mismatch",
        AnswerError::NotAnOption { .. } => "option_mismatch",
        AnswerError::ScaleOutOfRange { .. } => "scale_range",
    };
    ValidationError {
        question_id: Some(question.id.clone()),
        path: Some(format!("/{}", question.id)),
        message: error.to_string(),
        code: Some(code.into()),
    }
}

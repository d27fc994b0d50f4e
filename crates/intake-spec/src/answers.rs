use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::spec::{QuestionDefinition, QuestionKind};

/// Reasons an answer is refused for a question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnswerError {
    #[error("question '{0}' is not part of this questionnaire")]
    UnknownQuestion(String),
    #[error("question '{id}' expects {expected}")]
    KindMismatch { id: String, expected: &'static str },
    #[error("'{option}' is not an option for question '{id}'")]
    NotAnOption { id: String, option: String },
    #[error("question '{id}' expects a rating between 1 and 5, got {value}")]
    ScaleOutOfRange { id: String, value: i64 },
}

/// A stored answer, shaped by the question kind it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Binary or single-select pick.
    Choice(String),
    Text(String),
    /// Multi-select picks in option order; may be empty.
    Selections(Vec<String>),
    Scale(u8),
}

impl AnswerValue {
    pub fn choice(label: impl Into<String>) -> Self {
        AnswerValue::Choice(label.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        AnswerValue::Text(text.into())
    }

    pub fn selections<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::Selections(labels.into_iter().map(Into::into).collect())
    }

    /// Whether the value counts as an answer for required-answer gating.
    ///
    /// An empty selection and blank text are treated the same as no answer at all.
    pub fn is_present(&self) -> bool {
        match self {
            AnswerValue::Choice(_) | AnswerValue::Scale(_) => true,
            AnswerValue::Text(text) => !text.trim().is_empty(),
            AnswerValue::Selections(labels) => !labels.is_empty(),
        }
    }

    /// Confirms the value has the shape the question's kind demands.
    pub fn check(&self, question: &QuestionDefinition) -> Result<(), AnswerError> {
        match (question.kind, self) {
            (QuestionKind::Binary | QuestionKind::SingleSelect, AnswerValue::Choice(label)) => {
                ensure_option(question, label)
            }
            (QuestionKind::FreeText, AnswerValue::Text(_)) => Ok(()),
            (QuestionKind::MultiSelect, AnswerValue::Selections(labels)) => labels
                .iter()
                .try_for_each(|label| ensure_option(question, label)),
            (QuestionKind::Scale, AnswerValue::Scale(value)) => {
                ensure_scale(question, i64::from(*value))
            }
            _ => Err(mismatch(question)),
        }
    }

    /// Puts selections into the question's option order, dropping repeats.
    pub fn in_option_order(self, question: &QuestionDefinition) -> Self {
        match self {
            AnswerValue::Selections(labels) => AnswerValue::Selections(
                question
                    .options
                    .iter()
                    .filter(|option| labels.contains(option))
                    .cloned()
                    .collect(),
            ),
            other => other,
        }
    }

    /// Builds a value from loosely typed JSON, as posted by a form.
    pub fn from_json(question: &QuestionDefinition, value: &Value) -> Result<Self, AnswerError> {
        let answer = match question.kind {
            QuestionKind::Binary | QuestionKind::SingleSelect => value
                .as_str()
                .map(AnswerValue::choice)
                .ok_or_else(|| mismatch(question))?,
            QuestionKind::FreeText => value
                .as_str()
                .map(AnswerValue::text)
                .ok_or_else(|| mismatch(question))?,
            QuestionKind::MultiSelect => {
                let items = value.as_array().ok_or_else(|| mismatch(question))?;
                let labels = items
                    .iter()
                    .map(|item| item.as_str().map(String::from))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| mismatch(question))?;
                AnswerValue::Selections(labels)
            }
            QuestionKind::Scale => {
                let rating = match value {
                    Value::Number(number) => number.as_i64(),
                    Value::String(text) => text.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| mismatch(question))?;
                ensure_scale(question, rating)?;
                AnswerValue::Scale(rating as u8)
            }
        };
        answer.check(question)?;
        Ok(answer.in_option_order(question))
    }

    /// Parses a line of terminal input.
    ///
    /// Options may be given by label (case-insensitive), unambiguous prefix or
    /// 1-based position; multi-select input is comma separated.
    pub fn parse(question: &QuestionDefinition, raw: &str) -> Result<Self, AnswerError> {
        let raw = raw.trim();
        match question.kind {
            QuestionKind::Binary | QuestionKind::SingleSelect => {
                resolve_option(question, raw).map(AnswerValue::Choice)
            }
            QuestionKind::FreeText => Ok(AnswerValue::text(raw)),
            QuestionKind::MultiSelect => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| resolve_option(question, part))
                .collect::<Result<Vec<_>, _>>()
                .map(|labels| AnswerValue::Selections(labels).in_option_order(question)),
            QuestionKind::Scale => {
                let rating = raw.parse::<i64>().map_err(|_| mismatch(question))?;
                ensure_scale(question, rating)?;
                Ok(AnswerValue::Scale(rating as u8))
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AnswerValue::Choice(text) | AnswerValue::Text(text) => Value::String(text.clone()),
            AnswerValue::Selections(labels) => {
                Value::Array(labels.iter().cloned().map(Value::String).collect())
            }
            AnswerValue::Scale(value) => Value::from(*value),
        }
    }

    /// Short human-readable rendering.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Choice(text) | AnswerValue::Text(text) => text.clone(),
            AnswerValue::Selections(labels) => labels.join(", "),
            AnswerValue::Scale(value) => value.to_string(),
        }
    }
}

fn expected_shape(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::Binary | QuestionKind::SingleSelect => "one of its options",
        QuestionKind::FreeText => "text",
        QuestionKind::MultiSelect => "a list of its options",
        QuestionKind::Scale => "an integer rating",
    }
}

fn mismatch(question: &QuestionDefinition) -> AnswerError {
    AnswerError::KindMismatch {
        id: question.id.clone(),
        expected: expected_shape(question.kind),
    }
}

fn ensure_option(question: &QuestionDefinition, label: &str) -> Result<(), AnswerError> {
    if question.offers(label) {
        Ok(())
    } else {
        Err(AnswerError::NotAnOption {
            id: question.id.clone(),
            option: label.to_string(),
        })
    }
}

fn ensure_scale(question: &QuestionDefinition, value: i64) -> Result<(), AnswerError> {
    let range = i64::from(QuestionKind::SCALE_MIN)..=i64::from(QuestionKind::SCALE_MAX);
    if range.contains(&value) {
        Ok(())
    } else {
        Err(AnswerError::ScaleOutOfRange {
            id: question.id.clone(),
            value,
        })
    }
}

fn resolve_option(question: &QuestionDefinition, raw: &str) -> Result<String, AnswerError> {
    let not_an_option = || AnswerError::NotAnOption {
        id: question.id.clone(),
        option: raw.to_string(),
    };

    if let Ok(index) = raw.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|index| question.options.get(index))
            .cloned()
            .ok_or_else(not_an_option);
    }

    if let Some(exact) = question
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
    {
        return Ok(exact.clone());
    }

    let lowered = raw.to_lowercase();
    let mut prefixed = question
        .options
        .iter()
        .filter(|option| !lowered.is_empty() && option.to_lowercase().starts_with(&lowered));
    match (prefixed.next(), prefixed.next()) {
        (Some(only), None) => Ok(only.clone()),
        _ => Err(not_an_option()),
    }
}

/// Answers collected during one wizard session, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerRecord {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the answer it replaced.
    pub fn insert(
        &mut self,
        question_id: impl Into<String>,
        value: AnswerValue,
    ) -> Option<AnswerValue> {
        self.values.insert(question_id.into(), value)
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.values.get(question_id)
    }

    /// True when a present answer is stored for the question.
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id).is_some_and(AnswerValue::is_present)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.values.iter()
    }

    pub fn to_json(&self) -> Value {
        let map = self
            .values
            .iter()
            .map(|(id, value)| (id.clone(), value.to_json()))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }
}

/// Completed questionnaire handed to a completion handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSet {
    pub registry_id: String,
    pub registry_version: String,
    pub answers: AnswerRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Free-form submission metadata supplied by the embedding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl AnswerSet {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }
}

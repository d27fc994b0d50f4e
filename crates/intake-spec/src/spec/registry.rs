use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::question::{QuestionDefinition, QuestionKind};

/// Problems found while assembling a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry '{0}' has no questions")]
    Empty(String),
    #[error("question id '{0}' is defined more than once")]
    DuplicateId(String),
    #[error("question '{id}' of type {kind} must list options")]
    MissingOptions { id: String, kind: &'static str },
    #[error("question '{id}' of type {kind} cannot list options")]
    UnexpectedOptions { id: String, kind: &'static str },
    #[error("binary question '{id}' must have exactly two options, found {found}")]
    BinaryArity { id: String, found: usize },
    #[error("question '{id}' lists option '{option}' more than once")]
    DuplicateOption { id: String, option: String },
}

/// Serialized registry document, as stored on disk or embedded in the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegistrySpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionDefinition>,
}

/// Immutable, validated, ordered question catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegistrySpec", into = "RegistrySpec")]
pub struct Registry {
    spec: RegistrySpec,
}

impl Registry {
    pub fn new(spec: RegistrySpec) -> Result<Self, RegistryError> {
        if spec.questions.is_empty() {
            return Err(RegistryError::Empty(spec.id));
        }

        let mut seen = BTreeSet::new();
        for question in &spec.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(RegistryError::DuplicateId(question.id.clone()));
            }
            check_options(question)?;
        }

        Ok(Self { spec })
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    pub fn version(&self) -> &str {
        &self.spec.version
    }

    pub fn description(&self) -> Option<&str> {
        self.spec.description.as_deref()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionDefinition> {
        self.spec.questions.get(index)
    }

    /// Question at `index`, clamped to the last entry. Registries are never empty.
    pub fn at(&self, index: usize) -> &QuestionDefinition {
        let last = self.spec.questions.len() - 1;
        &self.spec.questions[index.min(last)]
    }

    pub fn len(&self) -> usize {
        self.spec.questions.len()
    }

    /// Always false for a constructed registry; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.spec.questions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&QuestionDefinition> {
        self.spec.questions.iter().find(|question| question.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.spec.questions.iter().position(|question| question.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionDefinition> {
        self.spec.questions.iter()
    }

    pub fn spec(&self) -> &RegistrySpec {
        &self.spec
    }
}

impl TryFrom<RegistrySpec> for Registry {
    type Error = RegistryError;

    fn try_from(spec: RegistrySpec) -> Result<Self, Self::Error> {
        Registry::new(spec)
    }
}

impl From<Registry> for RegistrySpec {
    fn from(registry: Registry) -> Self {
        registry.spec
    }
}

fn check_options(question: &QuestionDefinition) -> Result<(), RegistryError> {
    let kind = question.kind.as_str();
    if question.kind.has_options() {
        if question.options.is_empty() {
            return Err(RegistryError::MissingOptions {
                id: question.id.clone(),
                kind,
            });
        }
        if question.kind == QuestionKind::Binary && question.options.len() != 2 {
            return Err(RegistryError::BinaryArity {
                id: question.id.clone(),
                found: question.options.len(),
            });
        }
        let mut labels = BTreeSet::new();
        for option in &question.options {
            if !labels.insert(option.as_str()) {
                return Err(RegistryError::DuplicateOption {
                    id: question.id.clone(),
                    option: option.clone(),
                });
            }
        }
    } else if !question.options.is_empty() {
        return Err(RegistryError::UnexpectedOptions {
            id: question.id.clone(),
            kind,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(questions: Vec<QuestionDefinition>) -> RegistrySpec {
        RegistrySpec {
            id: "test".into(),
            title: "Test".into(),
            version: "1.0".into(),
            description: None,
            questions,
        }
    }

    #[test]
    fn rejects_empty_registry() {
        let err = Registry::new(spec_with(vec![])).unwrap_err();
        assert_eq!(err, RegistryError::Empty("test".into()));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Registry::new(spec_with(vec![
            QuestionDefinition::new("a", QuestionKind::FreeText, "A"),
            QuestionDefinition::new("a", QuestionKind::Scale, "A again"),
        ]))
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("a".into()));
    }

    #[test]
    fn select_kinds_need_options() {
        let err = Registry::new(spec_with(vec![QuestionDefinition::new(
            "pick",
            QuestionKind::MultiSelect,
            "Pick",
        )]))
        .unwrap_err();
        assert!(matches!(err, RegistryError::MissingOptions { .. }));
    }

    #[test]
    fn text_kinds_reject_options() {
        let err = Registry::new(spec_with(vec![
            QuestionDefinition::new("rate", QuestionKind::Scale, "Rate").with_options(["1", "2"]),
        ]))
        .unwrap_err();
        assert!(matches!(err, RegistryError::UnexpectedOptions { .. }));
    }

    #[test]
    fn binary_needs_two_options() {
        let err = Registry::new(spec_with(vec![
            QuestionDefinition::new("yn", QuestionKind::Binary, "Y/N").with_options(["Yes"]),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::BinaryArity {
                id: "yn".into(),
                found: 1
            }
        );
    }

    #[test]
    fn lookups_follow_declaration_order() {
        let registry = Registry::new(spec_with(vec![
            QuestionDefinition::new("first", QuestionKind::FreeText, "First"),
            QuestionDefinition::new("second", QuestionKind::Scale, "Second"),
        ]))
        .expect("valid registry");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).map(|q| q.id.as_str()), Some("second"));
        assert_eq!(registry.index_of("first"), Some(0));
        assert!(registry.get(2).is_none());
        assert!(registry.find("missing").is_none());
    }

    #[test]
    fn deserializing_runs_validation() {
        let result: Result<Registry, _> = serde_json::from_str(
            r#"{"id":"x","title":"X","version":"1","questions":[]}"#,
        );
        assert!(result.is_err());
    }
}

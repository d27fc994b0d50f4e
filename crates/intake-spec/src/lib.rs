#![allow(missing_docs)]

pub mod answers;
pub mod catalog;
pub mod render;
pub mod spec;
pub mod validate;

pub use answers::{AnswerError, AnswerRecord, AnswerSet, AnswerValue, Meta};
pub use catalog::{CatalogError, medical_intake};
pub use render::{
    RenderPayload, RenderProgress, RenderQuestion, RenderStatus, build_render_payload,
    render_json_ui, render_text,
};
pub use spec::{QuestionDefinition, QuestionKind, Registry, RegistryError, RegistrySpec};
pub use validate::{ValidationError, ValidationResult, parse_record, validate};

/// JSON Schema describing a registry document.
pub fn registry_schema() -> serde_json::Value {
    schemars::schema_for!(RegistrySpec).to_value()
}

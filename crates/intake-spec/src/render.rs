use serde_json::{Map, Value, json};

use crate::{
    answers::{AnswerRecord, AnswerValue},
    spec::{QuestionKind, Registry},
};

/// Lifecycle label a renderer shows alongside the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The current question is waiting for input.
    NeedInput,
    /// Answers are being submitted; navigation is disabled.
    Submitting,
    /// The questionnaire was submitted.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Submitting => "submitting",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Step counters exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProgress {
    /// 1-based step number of the current question.
    pub step: usize,
    pub total: usize,
    pub fraction: f64,
}

impl RenderProgress {
    pub fn new(position: usize, total: usize) -> Self {
        let step = position + 1;
        Self {
            step,
            total,
            fraction: step as f64 / total as f64,
        }
    }
}

/// Everything a UI needs to draw the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQuestion {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: QuestionKind,
    pub required: bool,
    pub options: Vec<String>,
    pub current_value: Option<AnswerValue>,
    /// Whether the advance control should be enabled.
    pub can_advance: bool,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub form_version: String,
    pub help: Option<String>,
    pub status: RenderStatus,
    pub progress: RenderProgress,
    pub can_retreat: bool,
    pub question: RenderQuestion,
}

/// Builds the payload for the question at `position`.
///
/// `position` is clamped to the last index.
pub fn build_render_payload(
    registry: &Registry,
    position: usize,
    answers: &AnswerRecord,
    status: RenderStatus,
) -> RenderPayload {
    let position = position.min(registry.len().saturating_sub(1));
    let current = registry.at(position);
    let question = RenderQuestion {
        id: current.id.clone(),
        category: current.category.clone(),
        title: current.title.clone(),
        description: current.description.clone(),
        kind: current.kind,
        required: current.required,
        options: current.options.clone(),
        current_value: answers.get(&current.id).cloned(),
        can_advance: status == RenderStatus::NeedInput
            && (!current.required || answers.is_answered(&current.id)),
    };

    RenderPayload {
        form_id: registry.id().to_string(),
        form_title: registry.title().to_string(),
        form_version: registry.version().to_string(),
        help: registry.description().map(String::from),
        status,
        progress: RenderProgress::new(position, registry.len()),
        can_retreat: status == RenderStatus::NeedInput && position > 0,
        question,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let question = &payload.question;
    let mut map = Map::new();
    map.insert("id".into(), Value::String(question.id.clone()));
    map.insert("category".into(), Value::String(question.category.clone()));
    map.insert("title".into(), Value::String(question.title.clone()));
    map.insert(
        "description".into(),
        question
            .description
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    map.insert("type".into(), Value::String(question.kind.as_str().into()));
    map.insert("required".into(), Value::Bool(question.required));
    if !question.options.is_empty() {
        map.insert(
            "options".into(),
            Value::Array(
                question
                    .options
                    .iter()
                    .map(|option| Value::String(option.clone()))
                    .collect(),
            ),
        );
    }
    if let Some(current_value) = &question.current_value {
        map.insert("current_value".into(), current_value.to_json());
    }

    json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "form_version": payload.form_version,
        "status": payload.status.as_str(),
        "progress": {
            "step": payload.progress.step,
            "total": payload.progress.total,
            "fraction": payload.progress.fraction,
        },
        "help": payload.help,
        "actions": {
            "advance": question.can_advance,
            "retreat": payload.can_retreat,
        },
        "question": Value::Object(map),
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let question = &payload.question;
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_title, payload.form_id));
    lines.push(format!(
        "Status: {} ({}/{}, {:.0}%)",
        payload.status.as_str(),
        payload.progress.step,
        payload.progress.total,
        payload.progress.fraction * 100.0
    ));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    if !question.category.is_empty() {
        lines.push(format!("[{}]", question.category));
    }
    let mut title = question.title.clone();
    if question.required {
        title.push_str(" *");
    }
    lines.push(title);
    if let Some(description) = &question.description {
        lines.push(format!("  {}", description));
    }
    for (index, option) in question.options.iter().enumerate() {
        lines.push(format!("  {}) {}", index + 1, option));
    }
    if let Some(hint) = kind_hint(question.kind) {
        lines.push(format!("  {}", hint));
    }
    if let Some(value) = &question.current_value {
        lines.push(format!("  Current value: {}", value.display()));
    }
    if question.required && !question.can_advance && payload.status == RenderStatus::NeedInput {
        lines.push("  An answer is required to continue.".to_string());
    }

    lines.join("\n")
}

fn kind_hint(kind: QuestionKind) -> Option<&'static str> {
    match kind {
        QuestionKind::MultiSelect => Some("(choose any, comma separated)"),
        QuestionKind::Scale => Some("(rate 1-5)"),
        _ => None,
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Answer shapes a question can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Two-option single select, typically yes/no.
    Binary,
    /// Pick exactly one of the listed options.
    SingleSelect,
    /// Free-form text.
    FreeText,
    /// Pick any number of the listed options.
    MultiSelect,
    /// Integer rating from 1 to 5.
    Scale,
}

impl QuestionKind {
    pub const SCALE_MIN: u8 = 1;
    pub const SCALE_MAX: u8 = 5;

    /// Whether questions of this kind list selectable options.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            QuestionKind::Binary | QuestionKind::SingleSelect | QuestionKind::MultiSelect
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Binary => "binary",
            QuestionKind::SingleSelect => "single_select",
            QuestionKind::FreeText => "free_text",
            QuestionKind::MultiSelect => "multi_select",
            QuestionKind::Scale => "scale",
        }
    }
}

/// A single entry of the question registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub category: String,
}

impl QuestionDefinition {
    pub fn new(id: impl Into<String>, kind: QuestionKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: None,
            options: Vec::new(),
            required: false,
            category: String::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn offers(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }
}

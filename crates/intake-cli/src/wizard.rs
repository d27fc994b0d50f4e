use std::fmt::Write;

use intake_spec::{AnswerSet, QuestionKind, RenderPayload, render_json_ui, render_text};
use intake_wizard::{Receipt, WizardError};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status line, help text, full question card.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// How each question is drawn.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Prints prompts and outcomes for an interactive session.
pub struct WizardPresenter {
    verbosity: Verbosity,
    mode: RenderMode,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, mode: RenderMode, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            mode,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed || self.mode == RenderMode::Json {
            return;
        }
        println!("Form: {}", payload.form_title);
        if let Some(help) = &payload.help {
            println!("{}", help);
        }
        println!("Type :back to return to the previous question, :quit to abandon.");
        self.header_printed = true;
    }

    pub fn show_question(&self, payload: &RenderPayload) {
        match self.mode {
            RenderMode::Json => {
                let ui = render_json_ui(payload);
                match serde_json::to_string_pretty(&ui) {
                    Ok(pretty) => println!("{}", pretty),
                    Err(err) => eprintln!("Failed to serialize question to JSON: {}", err),
                }
            }
            RenderMode::Text if self.verbosity.is_verbose() => println!("{}", render_text(payload)),
            RenderMode::Text => self.show_prompt(payload),
        }
    }

    fn show_prompt(&self, payload: &RenderPayload) {
        let question = &payload.question;
        let mut line = format!(
            "{}/{} {}",
            payload.progress.step, payload.progress.total, question.title
        );
        if question.required {
            line.push_str(" *");
        }
        if let Some(hint) = prompt_hint(question.kind) {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(description) = &question.description {
            println!("{}", description);
        }
        for (index, option) in question.options.iter().enumerate() {
            println!("  {}) {}", index + 1, option);
        }
        if let Some(value) = &question.current_value {
            println!("Current answer: {} (press Enter to keep)", value.display());
        }
    }

    pub fn show_parse_error(&self, error: &WizardError) {
        eprintln!("Invalid answer: {}", error);
    }

    pub fn show_blocked(&self) {
        println!("This question requires an answer.");
    }

    pub fn show_first_question(&self) {
        println!("Already at the first question.");
    }

    pub fn show_submitting(&self) {
        if self.verbosity.is_verbose() {
            println!("Submitting answers...");
        }
    }

    pub fn show_submission_failed(&self, error: &WizardError) {
        eprintln!("{}", error);
        println!("Press Enter to retry, or :quit to abandon.");
    }

    pub fn show_abandoned(&self) {
        println!("Questionnaire abandoned; answers were not submitted.");
    }

    pub fn show_completion(&self, receipt: &Receipt, answer_set: &AnswerSet) {
        println!("Done ✅");
        println!("Reference: {}", receipt.reference);
        if let Some(location) = &receipt.location {
            println!("Saved to: {}", location.display());
        }
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match answer_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

fn prompt_hint(kind: QuestionKind) -> Option<&'static str> {
    match kind {
        QuestionKind::Binary | QuestionKind::SingleSelect => Some("(number or label)"),
        QuestionKind::MultiSelect => Some("(comma-separated numbers or labels)"),
        QuestionKind::Scale => Some("(1-5)"),
        QuestionKind::FreeText => None,
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}

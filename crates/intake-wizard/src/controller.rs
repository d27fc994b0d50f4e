use std::fmt;
use std::sync::Arc;

use intake_spec::{
    AnswerError, AnswerRecord, AnswerSet, AnswerValue, Meta, QuestionDefinition, Registry,
    RenderPayload, RenderStatus, build_render_payload,
};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::completion::{CompletionHandler, Receipt};
use crate::error::WizardError;

/// Lifecycle of a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    InProgress,
    /// The completion handler is running; navigation is disabled.
    Completing,
    Submitted,
}

impl WizardPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardPhase::InProgress => "in_progress",
            WizardPhase::Completing => "completing",
            WizardPhase::Submitted => "submitted",
        }
    }

    fn render_status(self) -> RenderStatus {
        match self {
            WizardPhase::InProgress => RenderStatus::NeedInput,
            WizardPhase::Completing => RenderStatus::Submitting,
            WizardPhase::Submitted => RenderStatus::Complete,
        }
    }
}

impl fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a navigation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Position changed to the contained index.
    Moved(usize),
    /// The gate refused the move; nothing changed.
    Blocked,
    /// The completion handler accepted the answers.
    Submitted(Receipt),
    /// The session is past `InProgress`; commands are no-ops.
    Ignored,
}

/// Drives one questionnaire session over a shared registry.
///
/// The controller owns the position, phase and answer record; everything else
/// reads them through accessors.
pub struct WizardController {
    registry: Arc<Registry>,
    handler: Arc<dyn CompletionHandler>,
    position: usize,
    answers: AnswerRecord,
    phase: watch::Sender<WizardPhase>,
    receipt: Option<Receipt>,
    meta: Option<Meta>,
}

impl WizardController {
    pub fn new(registry: Arc<Registry>, handler: Arc<dyn CompletionHandler>) -> Self {
        let (phase, _) = watch::channel(WizardPhase::InProgress);
        debug!(registry = registry.id(), questions = registry.len(), "wizard started");
        Self {
            registry,
            handler,
            position: 0,
            answers: AnswerRecord::new(),
            phase,
            receipt: None,
            meta: None,
        }
    }

    /// Attaches metadata forwarded with the final submission.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Seeds the session with previously collected answers.
    pub fn with_answers(mut self, answers: AnswerRecord) -> Result<Self, WizardError> {
        for (question_id, value) in answers.iter() {
            self.answer(question_id, value.clone())?;
        }
        Ok(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn phase(&self) -> WizardPhase {
        *self.phase.borrow()
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn current_question(&self) -> &QuestionDefinition {
        self.registry.at(self.position)
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.registry.len()
    }

    /// Watch phase changes, e.g. to show a loading indicator while completing.
    pub fn subscribe(&self) -> watch::Receiver<WizardPhase> {
        self.phase.subscribe()
    }

    /// Stores `value` for `question_id`, replacing any earlier answer.
    ///
    /// The value must match the question's kind; rejected values leave the
    /// record untouched.
    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> Result<(), WizardError> {
        self.ensure_open()?;
        let question = self
            .registry
            .find(question_id)
            .ok_or_else(|| AnswerError::UnknownQuestion(question_id.to_string()))?;
        value.check(question)?;
        let value = value.in_option_order(question);
        debug!(question_id, present = value.is_present(), "answer stored");
        self.answers.insert(question_id, value);
        Ok(())
    }

    /// Like [`answer`](Self::answer) but takes loosely typed JSON.
    pub fn answer_json(&mut self, question_id: &str, value: &Value) -> Result<(), WizardError> {
        let question = self
            .registry
            .find(question_id)
            .ok_or_else(|| AnswerError::UnknownQuestion(question_id.to_string()))?;
        let parsed = AnswerValue::from_json(question, value)?;
        self.answer(question_id, parsed)
    }

    /// Parses a line of user input for the current question and stores it.
    pub fn answer_current(&mut self, raw: &str) -> Result<(), WizardError> {
        let question = self.current_question();
        let parsed = AnswerValue::parse(question, raw)?;
        let question_id = question.id.clone();
        self.answer(&question_id, parsed)
    }

    /// Whether the current question permits moving forward.
    pub fn can_advance(&self) -> bool {
        let question = self.current_question();
        !question.required || self.answers.is_answered(&question.id)
    }

    /// Moves forward, or runs the completion handler from the last question.
    ///
    /// A refused gate is not an error: it returns [`Step::Blocked`]. A failed
    /// submission reverts the phase to `InProgress` so the call can be retried.
    pub async fn next(&mut self) -> Result<Step, WizardError> {
        if self.phase() != WizardPhase::InProgress {
            debug!(phase = %self.phase(), "next ignored");
            return Ok(Step::Ignored);
        }
        if !self.can_advance() {
            warn!(
                question_id = %self.current_question().id,
                position = self.position,
                "required answer missing"
            );
            return Ok(Step::Blocked);
        }
        if !self.is_last() {
            self.position += 1;
            debug!(position = self.position, "advanced");
            return Ok(Step::Moved(self.position));
        }

        self.set_phase(WizardPhase::Completing);
        let submission = self.answer_set();
        info!(
            registry = %submission.registry_id,
            answers = submission.answers.len(),
            "submitting questionnaire"
        );
        match self.handler.complete(&submission).await {
            Ok(receipt) => {
                info!(
                    reference = %receipt.reference,
                    handler = %receipt.handler,
                    "questionnaire submitted"
                );
                self.receipt = Some(receipt.clone());
                self.set_phase(WizardPhase::Submitted);
                Ok(Step::Submitted(receipt))
            }
            Err(source) => {
                warn!(error = %source, "submission failed; returning to last question");
                self.set_phase(WizardPhase::InProgress);
                Err(WizardError::CompletionFailed { source })
            }
        }
    }

    /// Steps back one question. Answers are kept so they can be corrected.
    pub fn previous(&mut self) -> Step {
        if self.phase() != WizardPhase::InProgress {
            return Step::Ignored;
        }
        if self.position == 0 {
            return Step::Blocked;
        }
        self.position -= 1;
        debug!(position = self.position, "retreated");
        Step::Moved(self.position)
    }

    /// Fraction of the questionnaire reached, `(position + 1) / len`.
    pub fn progress(&self) -> f64 {
        (self.position + 1) as f64 / self.registry.len() as f64
    }

    /// Submission envelope for the answers collected so far.
    pub fn answer_set(&self) -> AnswerSet {
        AnswerSet {
            registry_id: self.registry.id().to_string(),
            registry_version: self.registry.version().to_string(),
            answers: self.answers.clone(),
            meta: self.meta.clone(),
        }
    }

    pub fn render(&self) -> RenderPayload {
        build_render_payload(
            &self.registry,
            self.position,
            &self.answers,
            self.phase().render_status(),
        )
    }

    /// Ends the session without submitting. Collected answers are dropped.
    pub fn abandon(self) {
        info!(
            registry = self.registry.id(),
            position = self.position,
            answered = self.answers.len(),
            "questionnaire abandoned"
        );
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        match self.phase() {
            WizardPhase::InProgress => Ok(()),
            phase => Err(WizardError::Closed(phase)),
        }
    }

    fn set_phase(&self, phase: WizardPhase) {
        self.phase.send_replace(phase);
    }
}

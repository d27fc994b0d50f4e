use std::path::PathBuf;

use intake_spec::AnswerError;
use thiserror::Error;

use crate::controller::WizardPhase;

/// Failures reported by a completion handler.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("failed to encode submission: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write submission to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the wizard controller.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error("questionnaire is {0} and no longer accepts answers")]
    Closed(WizardPhase),
    #[error("submission failed; answers kept for retry: {source}")]
    CompletionFailed {
        #[source]
        source: CompletionError,
    },
}

//! Linear questionnaire engine.
//!
//! A [`WizardController`] walks a validated [`intake_spec::Registry`] one
//! question at a time, gating forward moves on required answers, and hands the
//! final [`intake_spec::AnswerSet`] to a [`CompletionHandler`].

pub mod completion;
pub mod controller;
pub mod error;

pub use completion::{CompletionHandler, FnHandler, JsonFileSink, Receipt, SimulatedDelay};
pub use controller::{Step, WizardController, WizardPhase};
pub use error::{CompletionError, WizardError};

//! surveyflow-engine: drives respondents through a survey.
//!
//! [`FlowEngine`] wraps a [`SurveyStorage`](surveyflow_storage::SurveyStorage)
//! backend and exposes the request-level operations: authoring lifecycle
//! (save, activate, deactivate, close), starting responses, submitting
//! answers, and deciding the next visible question.

mod config;
mod engine;
mod error;

pub use config::EngineConfig;
pub use engine::{FlowEngine, NextQuestion, SubmitOutcome};
pub use error::EngineError;

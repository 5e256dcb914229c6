//! surveyflow-core: the conditional flow engine of a survey system.
//!
//! Decides, for an answered question, which question comes next, and
//! certifies before activation that a survey's explicit flow configuration
//! cannot loop and reaches an explicit end.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`FlowDeterminant`] -- `Unset` / `GoTo(id)` / `End`
//! - [`Survey`], [`Question`], [`QuestionOption`] -- the question graph model
//! - [`Response`], [`Answer`], [`AnswerValue`] -- respondent state
//! - [`FlowResolver`] -- priority-chain resolution with sequential fallback
//! - [`validate()`] / [`validate_with()`] -- activation-time graph validation
//! - [`VisitedSet`] -- per-response guard against re-showing questions
//! - [`FlowError`] -- error type

pub mod answer;
pub mod determinant;
pub mod error;
pub mod graph;
pub mod model;
pub mod report;
pub mod resolve;
pub mod validate;
pub mod visited;

// ── Convenience re-exports: key types ────────────────────────────────

pub use answer::{Answer, AnswerValue, ResolutionSource, Response};
pub use determinant::FlowDeterminant;
pub use error::FlowError;
pub use graph::{EdgeOrigin, FlowEdge, FlowGraph, TerminalCandidate};
pub use model::{
    Question, QuestionId, QuestionKind, QuestionOption, ResponseId, Routing, Survey, SurveyId,
    SurveyStatus,
};
pub use report::{Finding, FindingSeverity, ValidationOutcome, ValidationReport};
pub use resolve::{FlowResolver, Resolution};
pub use visited::VisitedSet;

// ── Convenience re-exports: entry points ─────────────────────────────

pub use validate::{validate, validate_with, ValidatorOptions};

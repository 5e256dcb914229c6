//! ValidationReport: the activation verdict handed to the authoring layer.

use std::fmt;

use serde::Serialize;

use crate::graph::{EdgeOrigin, TerminalCandidate};
use crate::model::{QuestionId, SurveyId};

/// Severity level for a non-blocking finding.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum FindingSeverity {
    Info,
    Warning,
}

/// Something worth telling the author that does not block activation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub severity: FindingSeverity,
    pub question: Option<QuestionId>,
    pub message: String,
}

/// The blocking verdict. Only `Ok` permits activation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Ok,
    /// `path` runs from the cycle's entry point back to itself.
    CycleDetected {
        path: Vec<QuestionId>,
        explanation: String,
    },
    NoTerminalPath,
    DanglingTarget {
        from: QuestionId,
        target: QuestionId,
        origin: EdgeOrigin,
    },
    Malformed {
        reason: String,
    },
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Ok => write!(f, "ok"),
            ValidationOutcome::CycleDetected { explanation, .. } => {
                write!(f, "cycle detected: {}", explanation)
            }
            ValidationOutcome::NoTerminalPath => write!(
                f,
                "no terminal path: no question or option is explicitly configured to end the survey"
            ),
            ValidationOutcome::DanglingTarget { from, target, .. } => write!(
                f,
                "question {} routes to {}, which is not part of the survey",
                from, target
            ),
            ValidationOutcome::Malformed { reason } => write!(f, "malformed survey: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub survey: SurveyId,
    pub outcome: ValidationOutcome,
    pub question_count: usize,
    pub edge_count: usize,
    pub terminal_candidates: Vec<TerminalCandidate>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.outcome == ValidationOutcome::Ok
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings
            .iter()
            .filter(|f| f.severity == FindingSeverity::Warning)
    }
}

/// Render a question path as `Q1 → Q2 → Q1`.
pub fn render_path(path: &[QuestionId]) -> String {
    path.iter()
        .map(QuestionId::to_string)
        .collect::<Vec<_>>()
        .join(" \u{2192} ")
}

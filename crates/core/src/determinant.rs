//! The navigational atom: what happens after a question is answered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::model::QuestionId;

/// Outcome of a navigation decision.
///
/// `Unset` means no decision was configured at this level and resolution must
/// fall through to the next source. It is never the same thing as `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDeterminant {
    #[default]
    Unset,
    GoTo(QuestionId),
    End,
}

impl FlowDeterminant {
    /// Build a `GoTo` from a raw identifier, rejecting zero and negatives.
    pub fn go_to(raw: i64) -> Result<Self, FlowError> {
        QuestionId::from_raw(raw).map(FlowDeterminant::GoTo)
    }

    /// Import the legacy nullable-integer encoding where `0` meant "end".
    pub fn from_legacy(raw: Option<i64>) -> Result<Self, FlowError> {
        match raw {
            None => Ok(FlowDeterminant::Unset),
            Some(0) => Ok(FlowDeterminant::End),
            Some(n) => FlowDeterminant::go_to(n),
        }
    }

    /// Whether this determinant fully decides the outcome on its own.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, FlowDeterminant::Unset)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, FlowDeterminant::End)
    }

    /// The question a `GoTo` points at.
    pub fn target(&self) -> Option<QuestionId> {
        match self {
            FlowDeterminant::GoTo(id) => Some(*id),
            _ => None,
        }
    }

    /// This determinant if decisive, otherwise `fallback`.
    pub fn or(self, fallback: FlowDeterminant) -> FlowDeterminant {
        if self.is_decisive() {
            self
        } else {
            fallback
        }
    }
}

impl fmt::Display for FlowDeterminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDeterminant::Unset => write!(f, "unset"),
            FlowDeterminant::GoTo(id) => write!(f, "go to {}", id),
            FlowDeterminant::End => write!(f, "end"),
        }
    }
}

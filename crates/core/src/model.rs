//! Question graph model: surveys, questions, and their options.
//!
//! The model is read-only from the engine's point of view. Authoring happens
//! elsewhere; the engine receives a fully loaded [`Survey`] and never mutates
//! it while resolving or validating.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::determinant::FlowDeterminant;
use crate::error::FlowError;

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Stable, positive question identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct QuestionId(NonZeroU64);

impl QuestionId {
    pub const MIN: QuestionId = QuestionId(NonZeroU64::MIN);

    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(QuestionId)
    }

    pub fn from_raw(raw: i64) -> Result<Self, FlowError> {
        u64::try_from(raw)
            .ok()
            .and_then(QuestionId::new)
            .ok_or_else(|| FlowError::InvalidQuestionId {
                raw: raw.to_string(),
            })
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for QuestionId {
    type Error = FlowError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        QuestionId::new(raw).ok_or_else(|| FlowError::InvalidQuestionId {
            raw: raw.to_string(),
        })
    }
}

impl From<QuestionId> for u64 {
    fn from(id: QuestionId) -> u64 {
        id.get()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

impl FromStr for QuestionId {
    type Err = FlowError;

    /// Accepts `7` as well as `Q7` / `q7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FlowError::InvalidQuestionId {
            raw: s.trim().to_string(),
        };
        let digits = s.trim().trim_start_matches(['Q', 'q']);
        let raw: i64 = digits.parse().map_err(|_| invalid())?;
        QuestionId::from_raw(raw).map_err(|_| invalid())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SurveyId(pub u64);

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResponseId(pub u64);

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Question types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    FreeText,
    SingleChoice,
    MultipleChoice,
    Rating,
}

/// How a question picks its next step.
///
/// `PerAnswer` questions can route each answer value differently through
/// option-level determinants; `QuestionDefault` questions always use the
/// question's default determinant, whatever the answer says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    PerAnswer,
    QuestionDefault,
}

impl QuestionKind {
    pub const fn routing(self) -> Routing {
        match self {
            QuestionKind::SingleChoice | QuestionKind::Rating => Routing::PerAnswer,
            QuestionKind::FreeText | QuestionKind::MultipleChoice => Routing::QuestionDefault,
        }
    }

    /// Whether questions of this type carry an option list.
    pub const fn has_options(self) -> bool {
        !matches!(self, QuestionKind::FreeText)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::FreeText => "free text",
            QuestionKind::SingleChoice => "single choice",
            QuestionKind::MultipleChoice => "multiple choice",
            QuestionKind::Rating => "rating",
        };
        f.write_str(name)
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

/// One selectable option of a choice or rating question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    /// 0-based, stable within the owning question.
    pub order_index: u32,
    /// Overrides the question's default determinant when this option is picked.
    #[serde(default)]
    pub flow: FlowDeterminant,
}

impl QuestionOption {
    pub fn new(order_index: u32, text: impl Into<String>) -> Self {
        QuestionOption {
            text: text.into(),
            order_index,
            flow: FlowDeterminant::Unset,
        }
    }

    pub fn with_flow(mut self, flow: FlowDeterminant) -> Self {
        self.flow = flow;
        self
    }
}

// ── Questions ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Display position, unique within the survey. Drives sequential fallback.
    pub order_index: u32,
    pub kind: QuestionKind,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub default_flow: FlowDeterminant,
}

fn default_required() -> bool {
    true
}

impl Question {
    pub fn new(id: QuestionId, order_index: u32, kind: QuestionKind, text: impl Into<String>) -> Self {
        Question {
            id,
            order_index,
            kind,
            text: text.into(),
            required: true,
            options: Vec::new(),
            default_flow: FlowDeterminant::Unset,
        }
    }

    /// A rating question with one synthesized option per value `1..=scale`.
    pub fn rating(id: QuestionId, order_index: u32, text: impl Into<String>, scale: u32) -> Self {
        let options = (0..scale)
            .map(|i| QuestionOption::new(i, (i + 1).to_string()))
            .collect();
        Question::new(id, order_index, QuestionKind::Rating, text).with_options(options)
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_default_flow(mut self, flow: FlowDeterminant) -> Self {
        self.default_flow = flow;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Routing strategy for this question. A rating question without options
    /// has nothing to route on and behaves like a non-branching question.
    pub fn routing(&self) -> Routing {
        match self.kind.routing() {
            Routing::PerAnswer if self.options.is_empty() => Routing::QuestionDefault,
            routing => routing,
        }
    }

    pub fn is_branching(&self) -> bool {
        self.routing() == Routing::PerAnswer
    }

    /// Options sorted by their order index.
    pub fn options_in_order(&self) -> Vec<&QuestionOption> {
        let mut options: Vec<&QuestionOption> = self.options.iter().collect();
        options.sort_by_key(|o| o.order_index);
        options
    }

    pub fn option_at(&self, order_index: u32) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.order_index == order_index)
    }

    pub fn option_by_text(&self, text: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.text == text)
    }
}

// ── Surveys ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    #[default]
    Draft,
    Active,
    Closed,
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyStatus::Draft => f.write_str("draft"),
            SurveyStatus::Active => f.write_str("active"),
            SurveyStatus::Closed => f.write_str("closed"),
        }
    }
}

/// A survey as loaded from the persistence layer: its current authored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    pub id: SurveyId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: SurveyStatus,
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn new(id: SurveyId, title: impl Into<String>, questions: Vec<Question>) -> Self {
        Survey {
            id,
            title: title.into(),
            status: SurveyStatus::Draft,
            questions,
        }
    }

    /// Questions in display order.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.order_index);
        questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }

    /// Look up a question the caller named, failing with `UnknownQuestion`.
    pub fn require_question(&self, id: QuestionId) -> Result<&Question, FlowError> {
        self.question(id).ok_or(FlowError::UnknownQuestion {
            survey: self.id,
            question: id,
        })
    }

    /// The question with the lowest order index.
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.iter().min_by_key(|q| q.order_index)
    }

    /// The question with the smallest order index strictly greater than
    /// `order_index`.
    pub fn next_in_order(&self, order_index: u32) -> Option<&Question> {
        self.questions
            .iter()
            .filter(|q| q.order_index > order_index)
            .min_by_key(|q| q.order_index)
    }

    /// Check the structural invariants the engine relies on.
    pub fn check_structure(&self) -> Result<(), FlowError> {
        let mut ids = BTreeSet::new();
        let mut orders = BTreeSet::new();

        for question in &self.questions {
            if !ids.insert(question.id) {
                return Err(FlowError::malformed(
                    self.id,
                    format!("duplicate question id {}", question.id),
                ));
            }
            if !orders.insert(question.order_index) {
                return Err(FlowError::malformed(
                    self.id,
                    format!(
                        "order index {} is used by more than one question",
                        question.order_index
                    ),
                ));
            }
            check_options(self.id, question)?;
        }

        Ok(())
    }
}

fn check_options(survey: SurveyId, question: &Question) -> Result<(), FlowError> {
    if !question.kind.has_options() {
        if !question.options.is_empty() {
            return Err(FlowError::malformed(
                survey,
                format!("{} question {} cannot have options", question.kind, question.id),
            ));
        }
        return Ok(());
    }

    if question.options.is_empty()
        && matches!(
            question.kind,
            QuestionKind::SingleChoice | QuestionKind::MultipleChoice
        )
    {
        return Err(FlowError::malformed(
            survey,
            format!("{} question {} has no options", question.kind, question.id),
        ));
    }

    let indices: BTreeSet<u32> = question.options.iter().map(|o| o.order_index).collect();
    let contiguous = indices.len() == question.options.len()
        && indices.iter().copied().eq(0..question.options.len() as u32);
    if !contiguous {
        return Err(FlowError::malformed(
            survey,
            format!(
                "options of question {} must be indexed 0..{} without gaps or repeats",
                question.id,
                question.options.len()
            ),
        ));
    }

    Ok(())
}

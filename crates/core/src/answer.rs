//! Responses and the answers recorded within them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::determinant::FlowDeterminant;
use crate::error::FlowError;
use crate::model::{Question, QuestionId, QuestionKind, QuestionOption, ResponseId, SurveyId};
use crate::visited::VisitedSet;

/// Raw value a respondent submitted for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Choice(String),
    Choices(Vec<String>),
    Rating(u32),
    Skipped,
}

impl AnswerValue {
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => text.trim().is_empty(),
            AnswerValue::Choices(selected) => selected.is_empty(),
            AnswerValue::Rating(_) => false,
            AnswerValue::Skipped => true,
        }
    }

    /// Check the value against the question and return the option it selects,
    /// if the question routes per answer.
    pub fn check<'q>(&self, question: &'q Question) -> Result<Option<&'q QuestionOption>, FlowError> {
        if self.is_empty() {
            if question.required {
                return Err(FlowError::invalid_answer(question.id, "an answer is required"));
            }
            return Ok(None);
        }

        match (question.kind, self) {
            (QuestionKind::FreeText, AnswerValue::Text(_)) => Ok(None),
            (QuestionKind::SingleChoice, AnswerValue::Choice(text)) => question
                .option_by_text(text)
                .map(Some)
                .ok_or_else(|| {
                    FlowError::invalid_answer(
                        question.id,
                        format!("'{}' does not match any option", text),
                    )
                }),
            (QuestionKind::MultipleChoice, AnswerValue::Choice(text)) => {
                check_selection(question, std::slice::from_ref(text))
            }
            (QuestionKind::MultipleChoice, AnswerValue::Choices(selected)) => {
                check_selection(question, selected)
            }
            (QuestionKind::Rating, AnswerValue::Rating(value)) => check_rating(question, *value),
            (kind, value) => Err(FlowError::invalid_answer(
                question.id,
                format!("expected a {} answer, got {}", kind, value),
            )),
        }
    }
}

fn check_selection<'q>(
    question: &'q Question,
    selected: &[String],
) -> Result<Option<&'q QuestionOption>, FlowError> {
    let mut seen = BTreeSet::new();
    for text in selected {
        if question.option_by_text(text).is_none() {
            return Err(FlowError::invalid_answer(
                question.id,
                format!("'{}' does not match any option", text),
            ));
        }
        if !seen.insert(text.as_str()) {
            return Err(FlowError::invalid_answer(
                question.id,
                format!("'{}' was selected more than once", text),
            ));
        }
    }
    Ok(None)
}

fn check_rating(question: &Question, value: u32) -> Result<Option<&QuestionOption>, FlowError> {
    if value == 0 {
        return Err(FlowError::invalid_answer(question.id, "ratings start at 1"));
    }
    if question.options.is_empty() {
        return Ok(None);
    }
    question.option_at(value - 1).map(Some).ok_or_else(|| {
        FlowError::invalid_answer(
            question.id,
            format!(
                "rating {} is outside 1..={}",
                value,
                question.options.len()
            ),
        )
    })
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(text) => write!(f, "text '{}'", text),
            AnswerValue::Choice(text) => write!(f, "choice '{}'", text),
            AnswerValue::Choices(selected) => write!(f, "choices [{}]", selected.join(", ")),
            AnswerValue::Rating(value) => write!(f, "rating {}", value),
            AnswerValue::Skipped => write!(f, "no answer"),
        }
    }
}

/// Where a resolved determinant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSource {
    Option { order_index: u32 },
    QuestionDefault,
    SequentialFallback,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::Option { order_index } => write!(f, "option #{}", order_index),
            ResolutionSource::QuestionDefault => write!(f, "question default"),
            ResolutionSource::SequentialFallback => write!(f, "sequential fallback"),
        }
    }
}

/// One question's recorded reply within a response.
///
/// `determinant` is frozen at submission time. Later edits to the survey's
/// flow configuration never change what an already-submitted answer decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
    pub determinant: FlowDeterminant,
    pub source: ResolutionSource,
    /// RFC 3339 timestamp.
    pub answered_at: String,
}

/// One respondent's attempt at one survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub survey_id: SurveyId,
    #[serde(default)]
    pub respondent: String,
    pub complete: bool,
    /// RFC 3339 timestamp.
    pub started_at: String,
    /// RFC 3339 timestamp. None until the response completes.
    pub submitted_at: Option<String>,
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub visited: VisitedSet,
    /// Storage version, bumped on every committed write.
    #[serde(default)]
    pub version: u64,
}

impl Response {
    pub fn new(
        id: ResponseId,
        survey_id: SurveyId,
        respondent: impl Into<String>,
        started_at: impl Into<String>,
    ) -> Self {
        Response {
            id,
            survey_id,
            respondent: respondent.into(),
            complete: false,
            started_at: started_at.into(),
            submitted_at: None,
            answers: Vec::new(),
            visited: VisitedSet::new(),
            version: 0,
        }
    }

    pub fn answer_for(&self, question: QuestionId) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question)
    }

    pub fn last_answer(&self) -> Option<&Answer> {
        self.answers.last()
    }

    /// A question is superseded once navigation has shown another question
    /// after it.
    pub fn is_superseded(&self, question: QuestionId) -> bool {
        match self.visited.iter().position(|q| q == question) {
            Some(idx) => idx + 1 < self.visited.len(),
            None => false,
        }
    }

    /// The question shown to the respondent that still awaits an answer.
    pub fn pending_question(&self) -> Option<QuestionId> {
        self.visited
            .last()
            .filter(|q| self.answer_for(*q).is_none())
    }

    /// Insert the answer, or replace the existing answer to the same question
    /// in place.
    pub fn upsert_answer(&mut self, answer: Answer) {
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
    }

    pub fn mark_complete(&mut self, at: impl Into<String>) {
        self.complete = true;
        self.submitted_at = Some(at.into());
    }

    pub fn has_visited(&self, question: QuestionId) -> bool {
        self.visited.has_visited(question)
    }

    pub fn record_visited(&mut self, question: QuestionId) -> bool {
        self.visited.record_visited(question)
    }

    pub fn clear_visited(&mut self) {
        self.visited.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: u64) -> QuestionId {
        QuestionId::new(n).unwrap()
    }

    fn yes_no() -> Question {
        Question::new(q(1), 0, QuestionKind::SingleChoice, "ok?").with_options(vec![
            QuestionOption::new(0, "Yes"),
            QuestionOption::new(1, "No"),
        ])
    }

    fn answer(question: u64) -> Answer {
        Answer {
            question_id: q(question),
            value: AnswerValue::Text("x".to_string()),
            determinant: FlowDeterminant::End,
            source: ResolutionSource::SequentialFallback,
            answered_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn single_choice_matches_exact_text() {
        let question = yes_no();
        let picked = AnswerValue::Choice("No".into()).check(&question).unwrap();
        assert_eq!(picked.unwrap().order_index, 1);
        assert!(matches!(
            AnswerValue::Choice("no".into()).check(&question),
            Err(FlowError::InvalidAnswer { .. })
        ));
    }

    #[test]
    fn required_question_rejects_missing_answer() {
        let question = yes_no();
        assert!(AnswerValue::Skipped.check(&question).is_err());
        let optional = yes_no().optional();
        assert_eq!(AnswerValue::Skipped.check(&optional).unwrap(), None);
    }

    #[test]
    fn wrong_value_kind_is_invalid() {
        let question = Question::new(q(1), 0, QuestionKind::FreeText, "why?");
        let err = AnswerValue::Rating(3).check(&question).unwrap_err();
        assert!(err.to_string().contains("expected a free text answer"));
    }

    #[test]
    fn multiple_choice_checks_every_selection() {
        let question = Question::new(q(1), 0, QuestionKind::MultipleChoice, "pick").with_options(vec![
            QuestionOption::new(0, "a"),
            QuestionOption::new(1, "b"),
        ]);
        let ok = AnswerValue::Choices(vec!["a".into(), "b".into()]);
        assert_eq!(ok.check(&question).unwrap(), None);
        let bad = AnswerValue::Choices(vec!["a".into(), "z".into()]);
        assert!(bad.check(&question).is_err());
        let twice = AnswerValue::Choices(vec!["a".into(), "a".into()]);
        assert!(twice.check(&question).is_err());
    }

    #[test]
    fn rating_bounds() {
        let question = Question::rating(q(1), 0, "rate", 5);
        assert_eq!(
            AnswerValue::Rating(5).check(&question).unwrap().unwrap().order_index,
            4
        );
        assert!(AnswerValue::Rating(6).check(&question).is_err());
        assert!(AnswerValue::Rating(0).check(&question).is_err());

        let bare = Question::new(q(2), 1, QuestionKind::Rating, "rate");
        assert_eq!(AnswerValue::Rating(42).check(&bare).unwrap(), None);
    }

    #[test]
    fn supersession_and_pending() {
        let mut response = Response::new(ResponseId(1), SurveyId(1), "r", "2026-01-01T00:00:00Z");
        response.record_visited(q(1));
        assert_eq!(response.pending_question(), Some(q(1)));

        response.upsert_answer(answer(1));
        assert_eq!(response.pending_question(), None);
        assert!(!response.is_superseded(q(1)));

        response.record_visited(q(2));
        assert!(response.is_superseded(q(1)));
        assert_eq!(response.pending_question(), Some(q(2)));
        response.upsert_answer(answer(2));
        assert!(!response.is_superseded(q(2)));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut response = Response::new(ResponseId(1), SurveyId(1), "r", "t");
        response.upsert_answer(answer(1));
        let mut revised = answer(1);
        revised.value = AnswerValue::Text("y".into());
        response.upsert_answer(revised);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].value, AnswerValue::Text("y".into()));
    }
}

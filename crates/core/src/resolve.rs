//! Flow resolution: which question comes after this answer.
//!
//! Resolution walks a strict priority chain:
//!
//! 1. the selected option's determinant (per-answer routing only),
//! 2. the question's default determinant,
//! 3. sequential fallback to the next question by order index, or `End`
//!    after the last question.
//!
//! Sequential fallback always moves to a strictly larger order index, so it
//! can never form a cycle on its own.

use serde::Serialize;

use crate::answer::{Answer, AnswerValue, ResolutionSource};
use crate::determinant::FlowDeterminant;
use crate::error::FlowError;
use crate::model::{Question, QuestionId, QuestionOption, Routing, Survey};

/// A resolved determinant together with the level that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub determinant: FlowDeterminant,
    pub source: ResolutionSource,
}

/// Resolves navigation against one survey's current configuration.
pub struct FlowResolver<'s> {
    survey: &'s Survey,
}

impl<'s> FlowResolver<'s> {
    pub fn new(survey: &'s Survey) -> Self {
        FlowResolver { survey }
    }

    pub fn survey(&self) -> &'s Survey {
        self.survey
    }

    /// Compute what answering `question_id` with `value` would lead to.
    /// Pure: nothing is recorded.
    pub fn resolve(&self, question_id: QuestionId, value: &AnswerValue) -> Result<Resolution, FlowError> {
        let question = self.survey.require_question(question_id)?;
        self.resolve_question(question, value)
    }

    pub fn resolve_question(
        &self,
        question: &Question,
        value: &AnswerValue,
    ) -> Result<Resolution, FlowError> {
        let selected = value.check(question)?;
        let resolution = self.decide(question, selected);
        tracing::debug!(
            survey = %self.survey.id,
            question = %question.id,
            determinant = %resolution.determinant,
            source = %resolution.source,
            "resolved flow"
        );
        Ok(resolution)
    }

    /// Resolve and build the answer record with its determinant frozen on it.
    pub fn answer(
        &self,
        question_id: QuestionId,
        value: AnswerValue,
        answered_at: impl Into<String>,
    ) -> Result<Answer, FlowError> {
        let resolution = self.resolve(question_id, &value)?;
        Ok(Answer {
            question_id,
            value,
            determinant: resolution.determinant,
            source: resolution.source,
            answered_at: answered_at.into(),
        })
    }

    /// Re-resolve an existing answer in place, e.g. when its value is revised.
    /// On error the answer is left untouched.
    pub fn resolve_into(&self, answer: &mut Answer) -> Result<FlowDeterminant, FlowError> {
        let resolution = self.resolve(answer.question_id, &answer.value)?;
        answer.determinant = resolution.determinant;
        answer.source = resolution.source;
        Ok(resolution.determinant)
    }

    /// Every outcome the question can produce across all acceptable answers,
    /// in option order, without duplicates.
    pub fn possible_outcomes(&self, question: &Question) -> Vec<Resolution> {
        let mut outcomes = Vec::new();
        let mut push = |r: Resolution| {
            if !outcomes.iter().any(|o: &Resolution| o.determinant == r.determinant) {
                outcomes.push(r);
            }
        };

        match question.routing() {
            Routing::PerAnswer => {
                for option in question.options_in_order() {
                    push(self.decide(question, Some(option)));
                }
                if !question.required {
                    push(self.decide(question, None));
                }
            }
            Routing::QuestionDefault => push(self.decide(question, None)),
        }

        outcomes
    }

    fn decide(&self, question: &Question, selected: Option<&QuestionOption>) -> Resolution {
        let from_option = match question.routing() {
            Routing::PerAnswer => selected
                .filter(|o| o.flow.is_decisive())
                .map(|o| Resolution {
                    determinant: o.flow,
                    source: ResolutionSource::Option {
                        order_index: o.order_index,
                    },
                }),
            Routing::QuestionDefault => None,
        };

        from_option
            .or_else(|| {
                question
                    .default_flow
                    .is_decisive()
                    .then_some(Resolution {
                        determinant: question.default_flow,
                        source: ResolutionSource::QuestionDefault,
                    })
            })
            .unwrap_or_else(|| self.sequential_fallback(question))
    }

    fn sequential_fallback(&self, question: &Question) -> Resolution {
        let determinant = match self.survey.next_in_order(question.order_index) {
            Some(next) => FlowDeterminant::GoTo(next.id),
            None => FlowDeterminant::End,
        };
        Resolution {
            determinant,
            source: ResolutionSource::SequentialFallback,
        }
    }
}

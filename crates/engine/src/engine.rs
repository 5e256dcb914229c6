//! The request-facing flow engine.
//!
//! Every mutating operation runs inside one storage snapshot: the snapshot is
//! committed only when the whole operation succeeded and aborted on every
//! error path, so a resolved determinant is authoritative only once it is
//! persisted.

use serde::Serialize;
use surveyflow_core::{
    validate_with, AnswerValue, FlowDeterminant, FlowError, FlowResolver, QuestionId, Resolution,
    ResolutionSource, Response, ResponseId, Survey, SurveyId, SurveyStatus, ValidationReport,
};
use surveyflow_storage::{StorageError, SurveyStorage};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Result of a successful `submit_answer`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub determinant: FlowDeterminant,
    pub source: ResolutionSource,
    /// The response as committed.
    pub response: Response,
}

/// What the respondent should see next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextQuestion {
    Question(QuestionId),
    SurveyComplete,
}

pub struct FlowEngine<S> {
    storage: S,
    config: EngineConfig,
}

impl<S: SurveyStorage> FlowEngine<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, EngineConfig::default())
    }

    pub fn with_config(storage: S, config: EngineConfig) -> Self {
        FlowEngine { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Authoring ────────────────────────────────────────────────────────────

    /// Store a survey's authored state.
    ///
    /// The stored lifecycle status wins over whatever `survey.status` says;
    /// new surveys start as drafts. Edits to an active survey are refused
    /// once a respondent has answered it, and must still validate otherwise.
    ///
    /// The lock check reads committed state before the save snapshot opens.
    /// A first answer committed between that read and the save is not seen;
    /// its frozen determinants still drive that response.
    pub async fn save_survey(&self, mut survey: Survey) -> Result<(), EngineError> {
        survey.status = match self.storage.load_survey_graph(survey.id).await {
            Ok(existing) => existing.status,
            Err(StorageError::SurveyNotFound { .. }) => SurveyStatus::Draft,
            Err(e) => return Err(e.into()),
        };

        if survey.status == SurveyStatus::Active {
            let answered = self.storage.count_answered_responses(survey.id).await?;
            if answered > 0 {
                tracing::warn!(survey = %survey.id, answered, "refused edit of a live survey");
                return Err(EngineError::SurveyLocked {
                    survey: survey.id,
                    answered,
                });
            }
            let report = validate_with(&survey, self.config.validator_options());
            if !report.is_ok() {
                return Err(EngineError::ActivationRejected(Box::new(report)));
            }
        }

        let survey_id = survey.id;
        let mut snapshot = self.storage.begin_snapshot().await?;
        if let Err(e) = self.storage.save_survey(&mut snapshot, survey).await {
            let _ = self.storage.abort_snapshot(snapshot).await;
            return Err(e.into());
        }
        self.storage.commit_snapshot(snapshot).await?;
        tracing::debug!(survey = %survey_id, "saved survey");
        Ok(())
    }

    /// Run the graph validator against the survey's current stored state.
    pub async fn validate_for_activation(
        &self,
        survey_id: SurveyId,
    ) -> Result<ValidationReport, EngineError> {
        let survey = self.storage.load_survey_graph(survey_id).await?;
        Ok(validate_with(&survey, self.config.validator_options()))
    }

    /// Validate, then move the survey from draft to active. A rejected
    /// survey stays a draft.
    pub async fn activate_survey(
        &self,
        survey_id: SurveyId,
    ) -> Result<ValidationReport, EngineError> {
        let survey = self.storage.load_survey_graph(survey_id).await?;
        if survey.status == SurveyStatus::Closed {
            return Err(EngineError::StatusTransition {
                survey: survey_id,
                from: survey.status,
                to: SurveyStatus::Active,
            });
        }

        let report = validate_with(&survey, self.config.validator_options());
        if !report.is_ok() {
            tracing::warn!(survey = %survey_id, outcome = %report.outcome, "activation rejected");
            return Err(EngineError::ActivationRejected(Box::new(report)));
        }

        if survey.status != SurveyStatus::Active {
            self.set_status(survey_id, SurveyStatus::Active).await?;
            tracing::info!(survey = %survey_id, "survey activated");
        }
        Ok(report)
    }

    /// Return an active survey to draft so it can be edited.
    pub async fn deactivate_survey(&self, survey_id: SurveyId) -> Result<(), EngineError> {
        self.transition(survey_id, &[SurveyStatus::Active], SurveyStatus::Draft)
            .await
    }

    /// Stop accepting responses for good.
    pub async fn close_survey(&self, survey_id: SurveyId) -> Result<(), EngineError> {
        self.transition(
            survey_id,
            &[SurveyStatus::Draft, SurveyStatus::Active],
            SurveyStatus::Closed,
        )
        .await
    }

    async fn transition(
        &self,
        survey_id: SurveyId,
        allowed_from: &[SurveyStatus],
        to: SurveyStatus,
    ) -> Result<(), EngineError> {
        let survey = self.storage.load_survey_graph(survey_id).await?;
        if !allowed_from.contains(&survey.status) {
            return Err(EngineError::StatusTransition {
                survey: survey_id,
                from: survey.status,
                to,
            });
        }
        self.set_status(survey_id, to).await?;
        tracing::info!(survey = %survey_id, from = %survey.status, to = %to, "survey status changed");
        Ok(())
    }

    async fn set_status(&self, survey_id: SurveyId, status: SurveyStatus) -> Result<(), EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        if let Err(e) = self
            .storage
            .set_survey_status(&mut snapshot, survey_id, status)
            .await
        {
            let _ = self.storage.abort_snapshot(snapshot).await;
            return Err(e.into());
        }
        self.storage.commit_snapshot(snapshot).await?;
        Ok(())
    }

    // ── Responding ───────────────────────────────────────────────────────────

    /// Open a new response to an active survey.
    pub async fn start_response(
        &self,
        survey_id: SurveyId,
        respondent: &str,
    ) -> Result<Response, EngineError> {
        let survey = self.storage.load_survey_graph(survey_id).await?;
        ensure_active(&survey)?;

        let started_at = now_rfc3339()?;
        let mut snapshot = self.storage.begin_snapshot().await?;
        let response = match self
            .storage
            .create_response(&mut snapshot, survey_id, respondent, &started_at)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                return Err(e.into());
            }
        };
        self.storage.commit_snapshot(snapshot).await?;
        tracing::info!(survey = %survey_id, response = %response.id, "response started");
        Ok(response)
    }

    /// Resolve and record an answer, freezing its determinant.
    pub async fn submit_answer(
        &self,
        response_id: ResponseId,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<SubmitOutcome, EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let (resolution, mut response) = match self
            .record_answer(&mut snapshot, response_id, question_id, value)
            .await
        {
            Ok(recorded) => recorded,
            Err(e) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                return Err(e);
            }
        };
        self.storage.commit_snapshot(snapshot).await?;
        // Commits bump the version of every response they wrote.
        response.version += 1;

        tracing::info!(
            response = %response_id,
            question = %question_id,
            determinant = %resolution.determinant,
            "answer accepted"
        );
        Ok(SubmitOutcome {
            determinant: resolution.determinant,
            source: resolution.source,
            response,
        })
    }

    async fn record_answer(
        &self,
        snapshot: &mut S::Snapshot,
        response_id: ResponseId,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(Resolution, Response), EngineError> {
        let mut response = self
            .storage
            .load_response_for_update(snapshot, response_id)
            .await?;
        if response.complete {
            return Err(EngineError::ResponseComplete {
                response: response_id,
            });
        }
        let survey = self.storage.load_survey_graph(response.survey_id).await?;
        ensure_active(&survey)?;
        survey.require_question(question_id)?;

        ensure_answerable(&response, question_id, self.config.allow_answer_revision)?;

        let answer = FlowResolver::new(&survey).answer(question_id, value, now_rfc3339()?)?;
        let resolution = Resolution {
            determinant: answer.determinant,
            source: answer.source,
        };

        self.storage
            .persist_answer(snapshot, response_id, answer.clone())
            .await?;
        response.upsert_answer(answer);
        Ok((resolution, response))
    }

    /// Decide which question to show next and mark it visited.
    ///
    /// Follows the frozen determinant of the last answered question. A
    /// question that was shown but not answered yet is returned again. When
    /// the flow ends the response is marked complete.
    pub async fn next_visible_question(
        &self,
        response_id: ResponseId,
    ) -> Result<NextQuestion, EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let next = match self.advance(&mut snapshot, response_id).await {
            Ok(next) => next,
            Err(e) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                return Err(e);
            }
        };
        self.storage.commit_snapshot(snapshot).await?;
        Ok(next)
    }

    async fn advance(
        &self,
        snapshot: &mut S::Snapshot,
        response_id: ResponseId,
    ) -> Result<NextQuestion, EngineError> {
        let mut response = self
            .storage
            .load_response_for_update(snapshot, response_id)
            .await?;
        if response.complete {
            return Ok(NextQuestion::SurveyComplete);
        }
        if let Some(pending) = response.pending_question() {
            return Ok(NextQuestion::Question(pending));
        }

        let survey = self.storage.load_survey_graph(response.survey_id).await?;
        let candidate = match response.visited.last() {
            None => survey.first_question().map(|q| q.id),
            Some(last) => match response.answer_for(last).map(|a| a.determinant) {
                Some(FlowDeterminant::End) => None,
                Some(FlowDeterminant::GoTo(target)) => {
                    if !survey.contains(target) {
                        return Err(FlowError::QuestionNotInSurvey {
                            survey: survey.id,
                            question: target,
                        }
                        .into());
                    }
                    Some(target)
                }
                Some(FlowDeterminant::Unset) | None => survey
                    .question(last)
                    .and_then(|q| survey.next_in_order(q.order_index))
                    .map(|q| q.id),
            },
        };

        let Some(next) = candidate else {
            response.mark_complete(now_rfc3339()?);
            self.storage
                .persist_response_state(snapshot, &response)
                .await?;
            tracing::info!(response = %response_id, answers = response.answers.len(), "response completed");
            return Ok(NextQuestion::SurveyComplete);
        };

        if let Err(e) = response.visited.ensure_unvisited(next) {
            tracing::warn!(response = %response_id, question = %next, "refused to show a question twice");
            return Err(e.into());
        }
        response.record_visited(next);
        self.storage
            .persist_response_state(snapshot, &response)
            .await?;
        tracing::debug!(response = %response_id, question = %next, "showing question");
        Ok(NextQuestion::Question(next))
    }

    /// What answering `question_id` with `value` would lead to, without
    /// recording anything.
    pub async fn preview_answer(
        &self,
        survey_id: SurveyId,
        question_id: QuestionId,
        value: &AnswerValue,
    ) -> Result<Resolution, EngineError> {
        let survey = self.storage.load_survey_graph(survey_id).await?;
        Ok(FlowResolver::new(&survey).resolve(question_id, value)?)
    }

    pub async fn response(&self, response_id: ResponseId) -> Result<Response, EngineError> {
        Ok(self.storage.load_response(response_id).await?)
    }
}

fn ensure_active(survey: &Survey) -> Result<(), EngineError> {
    if survey.status == SurveyStatus::Active {
        Ok(())
    } else {
        Err(EngineError::SurveyNotActive {
            survey: survey.id,
            status: survey.status,
        })
    }
}

/// Only the question on screen may be answered, plus the latest answered
/// question while revision is allowed and nothing later has been shown.
fn ensure_answerable(
    response: &Response,
    question: QuestionId,
    allow_revision: bool,
) -> Result<(), FlowError> {
    if response.answer_for(question).is_some() {
        if !allow_revision || response.is_superseded(question) {
            return Err(FlowError::QuestionAlreadyAnswered { question });
        }
        return Ok(());
    }
    if response.pending_question() == Some(question) {
        return Ok(());
    }
    if response.visited.has_visited(question) {
        tracing::warn!(response = %response.id, question = %question, "refused answer to a skipped question");
        Err(FlowError::QuestionAlreadyVisited { question })
    } else {
        tracing::warn!(response = %response.id, question = %question, "refused answer to a question not shown");
        Err(FlowError::QuestionNotShown { question })
    }
}

fn now_rfc3339() -> Result<String, EngineError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

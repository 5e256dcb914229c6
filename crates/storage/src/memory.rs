//! In-memory `SurveyStorage` backend.
//!
//! Snapshots buffer their writes and apply them under a single lock at
//! commit, so uncommitted work is never visible to queries and an aborted or
//! dropped snapshot leaves no trace.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use surveyflow_core::{Answer, Response, ResponseId, Survey, SurveyId, SurveyStatus};
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::traits::SurveyStorage;

#[derive(Debug, Default)]
struct Committed {
    surveys: BTreeMap<SurveyId, Survey>,
    responses: BTreeMap<ResponseId, Response>,
    last_response_id: u64,
}

/// Pending writes of one in-memory transaction.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    surveys: BTreeMap<SurveyId, Survey>,
    statuses: BTreeMap<SurveyId, SurveyStatus>,
    responses: BTreeMap<ResponseId, Response>,
    expected_versions: BTreeMap<ResponseId, u64>,
    created: BTreeSet<ResponseId>,
    dirty: BTreeSet<ResponseId>,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<Committed>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with committed surveys.
    pub fn with_surveys(surveys: impl IntoIterator<Item = Survey>) -> Self {
        let surveys = surveys.into_iter().map(|s| (s.id, s)).collect();
        MemoryStorage {
            state: Mutex::new(Committed {
                surveys,
                ..Committed::default()
            }),
        }
    }
}

/// Bring a committed response into the snapshot (once) and hand out the
/// staged copy.
fn stage<'a>(
    state: &Committed,
    snapshot: &'a mut MemorySnapshot,
    response_id: ResponseId,
) -> Result<&'a mut Response, StorageError> {
    if !snapshot.responses.contains_key(&response_id) {
        let committed = state
            .responses
            .get(&response_id)
            .ok_or(StorageError::ResponseNotFound { response_id })?;
        snapshot
            .expected_versions
            .insert(response_id, committed.version);
        snapshot.responses.insert(response_id, committed.clone());
    }
    snapshot
        .responses
        .get_mut(&response_id)
        .ok_or(StorageError::ResponseNotFound { response_id })
}

#[async_trait]
impl SurveyStorage for MemoryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        Ok(MemorySnapshot::default())
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;

        for (&response_id, &expected_version) in &snapshot.expected_versions {
            let current = state
                .responses
                .get(&response_id)
                .map(|r| r.version)
                .ok_or(StorageError::ResponseNotFound { response_id })?;
            if current != expected_version {
                return Err(StorageError::ConcurrentConflict {
                    response_id,
                    expected_version,
                });
            }
        }
        for survey_id in snapshot.statuses.keys() {
            if !state.surveys.contains_key(survey_id) && !snapshot.surveys.contains_key(survey_id) {
                return Err(StorageError::SurveyNotFound {
                    survey_id: *survey_id,
                });
            }
        }

        let MemorySnapshot {
            surveys,
            statuses,
            responses,
            expected_versions,
            created,
            dirty,
        } = snapshot;

        state.surveys.extend(surveys);
        for (survey_id, status) in statuses {
            if let Some(survey) = state.surveys.get_mut(&survey_id) {
                survey.status = status;
            }
        }

        let mut written = 0usize;
        for (response_id, mut response) in responses {
            if created.contains(&response_id) {
                response.version = 0;
            } else if dirty.contains(&response_id) {
                response.version = expected_versions.get(&response_id).copied().unwrap_or(0) + 1;
            } else {
                continue;
            }
            state.responses.insert(response_id, response);
            written += 1;
        }

        tracing::debug!(responses = written, "committed in-memory snapshot");
        Ok(())
    }

    async fn abort_snapshot(&self, _snapshot: MemorySnapshot) -> Result<(), StorageError> {
        Ok(())
    }

    async fn save_survey(
        &self,
        snapshot: &mut MemorySnapshot,
        survey: Survey,
    ) -> Result<(), StorageError> {
        snapshot.statuses.remove(&survey.id);
        snapshot.surveys.insert(survey.id, survey);
        Ok(())
    }

    async fn set_survey_status(
        &self,
        snapshot: &mut MemorySnapshot,
        survey_id: SurveyId,
        status: SurveyStatus,
    ) -> Result<(), StorageError> {
        if let Some(staged) = snapshot.surveys.get_mut(&survey_id) {
            staged.status = status;
            return Ok(());
        }
        let state = self.state.lock().await;
        if !state.surveys.contains_key(&survey_id) {
            return Err(StorageError::SurveyNotFound { survey_id });
        }
        snapshot.statuses.insert(survey_id, status);
        Ok(())
    }

    async fn create_response(
        &self,
        snapshot: &mut MemorySnapshot,
        survey_id: SurveyId,
        respondent: &str,
        started_at: &str,
    ) -> Result<Response, StorageError> {
        let mut state = self.state.lock().await;
        if !state.surveys.contains_key(&survey_id) && !snapshot.surveys.contains_key(&survey_id) {
            return Err(StorageError::SurveyNotFound { survey_id });
        }
        state.last_response_id += 1;
        let response = Response::new(
            ResponseId(state.last_response_id),
            survey_id,
            respondent,
            started_at,
        );
        snapshot.created.insert(response.id);
        snapshot.responses.insert(response.id, response.clone());
        Ok(response)
    }

    async fn load_response_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        response_id: ResponseId,
    ) -> Result<Response, StorageError> {
        let state = self.state.lock().await;
        stage(&state, snapshot, response_id).map(|r| r.clone())
    }

    async fn persist_answer(
        &self,
        snapshot: &mut MemorySnapshot,
        response_id: ResponseId,
        answer: Answer,
    ) -> Result<(), StorageError> {
        let state = self.state.lock().await;
        stage(&state, snapshot, response_id)?.upsert_answer(answer);
        snapshot.dirty.insert(response_id);
        Ok(())
    }

    async fn persist_response_state(
        &self,
        snapshot: &mut MemorySnapshot,
        response: &Response,
    ) -> Result<(), StorageError> {
        let state = self.state.lock().await;
        let staged = stage(&state, snapshot, response.id)?;
        staged.complete = response.complete;
        staged.submitted_at = response.submitted_at.clone();
        staged.visited = response.visited.clone();
        snapshot.dirty.insert(response.id);
        Ok(())
    }

    async fn load_survey_graph(&self, survey_id: SurveyId) -> Result<Survey, StorageError> {
        let state = self.state.lock().await;
        state
            .surveys
            .get(&survey_id)
            .cloned()
            .ok_or(StorageError::SurveyNotFound { survey_id })
    }

    async fn load_response(&self, response_id: ResponseId) -> Result<Response, StorageError> {
        let state = self.state.lock().await;
        state
            .responses
            .get(&response_id)
            .cloned()
            .ok_or(StorageError::ResponseNotFound { response_id })
    }

    async fn count_responses(&self, survey_id: SurveyId) -> Result<usize, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .responses
            .values()
            .filter(|r| r.survey_id == survey_id)
            .count())
    }

    async fn count_answered_responses(&self, survey_id: SurveyId) -> Result<usize, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .responses
            .values()
            .filter(|r| r.survey_id == survey_id && !r.answers.is_empty())
            .count())
    }
}

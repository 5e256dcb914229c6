use async_trait::async_trait;
use surveyflow_core::{Answer, Response, ResponseId, Survey, SurveyId, SurveyStatus};

use crate::error::StorageError;

/// The persistence boundary of the flow engine.
///
/// A `SurveyStorage` implementation stores surveys (their current authored
/// state) and responses (answers plus visited set).
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()`: start a transaction, returns a `Snapshot`
/// 2. Call mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)`: commit and consume the transaction
///    OR `abort_snapshot(snapshot)`: roll back and consume the transaction
///
/// Writes inside a snapshot are invisible to the query operations until the
/// snapshot commits. A dropped snapshot MUST behave like an aborted one.
///
/// ## OCC Conflict Detection
///
/// A response loaded with `load_response_for_update` remembers its version.
/// `commit_snapshot` fails with `StorageError::ConcurrentConflict` if another
/// snapshot committed that response in between, and applies nothing.
/// Successful commits bump the version of every response they wrote.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so one storage can back
/// many concurrent requests.
#[async_trait]
pub trait SurveyStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Survey operations (within snapshot) ──────────────────────────────────

    /// Insert or replace a survey's authored state.
    async fn save_survey(
        &self,
        snapshot: &mut Self::Snapshot,
        survey: Survey,
    ) -> Result<(), StorageError>;

    /// Change a survey's lifecycle status.
    ///
    /// Returns `Err(StorageError::SurveyNotFound)` if the survey does not exist.
    async fn set_survey_status(
        &self,
        snapshot: &mut Self::Snapshot,
        survey_id: SurveyId,
        status: SurveyStatus,
    ) -> Result<(), StorageError>;

    // ── Response operations (within snapshot) ────────────────────────────────

    /// Create a new, empty response at version 0 and assign it an id.
    async fn create_response(
        &self,
        snapshot: &mut Self::Snapshot,
        survey_id: SurveyId,
        respondent: &str,
        started_at: &str,
    ) -> Result<Response, StorageError>;

    /// Read a response for modification, recording its version for the
    /// commit-time conflict check.
    ///
    /// Returns `Err(StorageError::ResponseNotFound)` if the response does not exist.
    async fn load_response_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        response_id: ResponseId,
    ) -> Result<Response, StorageError>;

    /// Insert the answer into the response, replacing any earlier answer to
    /// the same question.
    async fn persist_answer(
        &self,
        snapshot: &mut Self::Snapshot,
        response_id: ResponseId,
        answer: Answer,
    ) -> Result<(), StorageError>;

    /// Persist completion state, timestamps, and the visited set. Answers are
    /// written only through `persist_answer`.
    async fn persist_response_state(
        &self,
        snapshot: &mut Self::Snapshot,
        response: &Response,
    ) -> Result<(), StorageError>;

    // ── Query operations (outside snapshot, committed state only) ─────────────

    /// Load a survey's current authored state: questions with their options
    /// and determinants. Only this survey's questions are returned.
    ///
    /// Returns `Err(StorageError::SurveyNotFound)` if the survey does not exist.
    async fn load_survey_graph(&self, survey_id: SurveyId) -> Result<Survey, StorageError>;

    /// Read a response with its answers and visited set.
    ///
    /// Returns `Err(StorageError::ResponseNotFound)` if the response does not exist.
    async fn load_response(&self, response_id: ResponseId) -> Result<Response, StorageError>;

    /// Number of committed responses to a survey.
    async fn count_responses(&self, survey_id: SurveyId) -> Result<usize, StorageError>;

    /// Number of committed responses to a survey that hold at least one
    /// answer. Started but unanswered responses are not counted.
    async fn count_answered_responses(&self, survey_id: SurveyId) -> Result<usize, StorageError>;
}

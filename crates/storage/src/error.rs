use surveyflow_core::{ResponseId, SurveyId};

/// All errors that can be returned by a SurveyStorage implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No survey with the given id.
    #[error("survey not found: {survey_id}")]
    SurveyNotFound { survey_id: SurveyId },

    /// No response with the given id.
    #[error("response not found: {response_id}")]
    ResponseNotFound { response_id: ResponseId },

    /// Optimistic concurrency control conflict: the response was committed by
    /// another snapshot after this one loaded it.
    #[error("concurrent conflict on response {response_id}: expected version {expected_version}")]
    ConcurrentConflict {
        response_id: ResponseId,
        expected_version: u64,
    },

    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

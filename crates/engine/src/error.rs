use surveyflow_core::{FlowError, ResponseId, SurveyId, SurveyStatus, ValidationReport};
use surveyflow_storage::StorageError;

/// Everything a [`FlowEngine`](crate::FlowEngine) operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Responses can only be started or answered while the survey is active.
    #[error("survey {survey} is {status}, not active")]
    SurveyNotActive {
        survey: SurveyId,
        status: SurveyStatus,
    },

    #[error("response {response} is already complete")]
    ResponseComplete { response: ResponseId },

    /// The validator refused the survey's flow configuration.
    #[error("survey {} cannot be activated: {}", .0.survey, .0.outcome)]
    ActivationRejected(Box<ValidationReport>),

    /// The survey is live and already answered by at least one respondent.
    #[error("survey {survey} is active with {answered} answered response(s); deactivate it before editing")]
    SurveyLocked { survey: SurveyId, answered: usize },

    #[error("survey {survey} cannot move from {from} to {to}")]
    StatusTransition {
        survey: SurveyId,
        from: SurveyStatus,
        to: SurveyStatus,
    },

    #[error("failed to format timestamp: {0}")]
    Clock(#[from] time::error::Format),
}

impl EngineError {
    /// The validation report behind a rejected activation, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            EngineError::ActivationRejected(report) => Some(report),
            _ => None,
        }
    }
}

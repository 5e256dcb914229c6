use crate::model::{QuestionId, SurveyId};

/// Errors raised by the flow engine while checking answers, resolving
/// navigation, or inspecting a survey's structure.
///
/// None of these are transient: each one points either at a malformed request
/// or at an authoring defect, so callers should surface them instead of
/// retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// The submitted value does not fit the question (no matching option,
    /// rating out of range, wrong value kind, or a required answer missing).
    #[error("invalid answer for question {question}: {reason}")]
    InvalidAnswer { question: QuestionId, reason: String },

    /// The question named in a request is not part of the survey.
    #[error("question {question} is not part of survey {survey}")]
    UnknownQuestion {
        survey: SurveyId,
        question: QuestionId,
    },

    /// A frozen navigation target no longer exists in the (edited) survey.
    #[error("question {question} targeted by a recorded answer no longer exists in survey {survey}")]
    QuestionNotInSurvey {
        survey: SurveyId,
        question: QuestionId,
    },

    /// The question was answered and navigation has already moved past it.
    #[error("question {question} has already been answered")]
    QuestionAlreadyAnswered { question: QuestionId },

    /// The question already appeared in this response and cannot be shown
    /// again.
    #[error("question {question} cannot be answered again")]
    QuestionAlreadyVisited { question: QuestionId },

    /// The question was never shown in this response, so it cannot be
    /// answered yet.
    #[error("question {question} has not been shown in this response")]
    QuestionNotShown { question: QuestionId },

    /// Question identifiers are positive integers; zero, negatives and
    /// non-numeric input are rejected. `raw` keeps the input as given.
    #[error("invalid question id '{raw}': question ids must be positive integers")]
    InvalidQuestionId { raw: String },

    /// The survey definition violates a structural invariant.
    #[error("survey {survey} is malformed: {reason}")]
    MalformedSurvey { survey: SurveyId, reason: String },
}

impl FlowError {
    pub(crate) fn invalid_answer(question: QuestionId, reason: impl Into<String>) -> Self {
        FlowError::InvalidAnswer {
            question,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(survey: SurveyId, reason: impl Into<String>) -> Self {
        FlowError::MalformedSurvey {
            survey,
            reason: reason.into(),
        }
    }
}

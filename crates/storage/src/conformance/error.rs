use std::future::Future;

use surveyflow_core::{ResponseId, SurveyId, SurveyStatus};

use super::{sample_answer, TestResult};
use crate::{StorageError, SurveyStorage};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "missing_survey_is_survey_not_found",
            missing_survey_is_survey_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "missing_response_is_response_not_found",
            missing_response_is_response_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "create_response_requires_survey",
            create_response_requires_survey(factory).await,
        ),
        TestResult::from_result(
            "error",
            "status_change_requires_survey",
            status_change_requires_survey(factory).await,
        ),
        TestResult::from_result(
            "error",
            "persist_answer_requires_response",
            persist_answer_requires_response(factory).await,
        ),
    ]
}

fn expect_survey_not_found<T: std::fmt::Debug>(
    result: Result<T, StorageError>,
    survey: u64,
) -> Result<(), String> {
    match result {
        Err(StorageError::SurveyNotFound { survey_id }) if survey_id == SurveyId(survey) => Ok(()),
        other => Err(format!("expected SurveyNotFound({survey}), got {other:?}")),
    }
}

fn expect_response_not_found<T: std::fmt::Debug>(
    result: Result<T, StorageError>,
    response: u64,
) -> Result<(), String> {
    match result {
        Err(StorageError::ResponseNotFound { response_id }) if response_id == ResponseId(response) => {
            Ok(())
        }
        other => Err(format!("expected ResponseNotFound({response}), got {other:?}")),
    }
}

async fn missing_survey_is_survey_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    expect_survey_not_found(s.load_survey_graph(SurveyId(404)).await, 404)
}

async fn missing_response_is_response_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    expect_response_not_found(s.load_response(ResponseId(404)).await, 404)?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.load_response_for_update(&mut snap, ResponseId(404)).await;
    let _ = s.abort_snapshot(snap).await;
    expect_response_not_found(result, 404)
}

async fn create_response_requires_survey<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_response(&mut snap, SurveyId(9), "r", "2025-01-01T00:00:00Z")
        .await;
    let _ = s.abort_snapshot(snap).await;
    expect_survey_not_found(result, 9)
}

async fn status_change_requires_survey<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .set_survey_status(&mut snap, SurveyId(9), SurveyStatus::Active)
        .await;
    let _ = s.abort_snapshot(snap).await;
    expect_survey_not_found(result, 9)
}

async fn persist_answer_requires_response<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: SurveyStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .persist_answer(&mut snap, ResponseId(77), sample_answer(1, "x"))
        .await;
    let _ = s.abort_snapshot(snap).await;
    expect_response_not_found(result, 77)
}
